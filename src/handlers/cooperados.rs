// src/handlers/cooperados.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::SessaoAtual, i18n::Locale},
    models::{
        cooperado::{Cooperado, CooperadoPayload},
        unidade::UnidadeBeneficiaria,
    },
};

/// Cooperado com as unidades vinculadas.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CooperadoDetalhe {
    #[serde(flatten)]
    pub cooperado: Cooperado,
    pub unidades: Vec<UnidadeBeneficiaria>,
}

// POST /api/cooperados
#[utoipa::path(
    post,
    path = "/api/cooperados",
    tag = "Cooperados",
    request_body = CooperadoPayload,
    responses(
        (status = 201, description = "Cooperado cadastrado", body = Cooperado),
        (status = 400, description = "CPF/CNPJ inválido"),
        (status = 409, description = "Documento já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_cooperado(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Json(payload): Json<CooperadoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cooperado = app_state
        .cooperado_service
        .create(&sessao, app_state.notifier.as_ref(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(cooperado)))
}

// GET /api/cooperados
#[utoipa::path(
    get,
    path = "/api/cooperados",
    tag = "Cooperados",
    responses((status = 200, description = "Cooperados ativos", body = Vec<Cooperado>)),
    security(("api_jwt" = []))
)]
pub async fn list_cooperados(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
) -> Result<impl IntoResponse, ApiError> {
    let cooperados = app_state
        .cooperado_service
        .list(&sessao)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cooperados)))
}

// GET /api/cooperados/{id}
#[utoipa::path(
    get,
    path = "/api/cooperados/{id}",
    tag = "Cooperados",
    params(("id" = Uuid, Path, description = "ID do cooperado")),
    responses(
        (status = 200, description = "Cooperado e suas unidades", body = CooperadoDetalhe),
        (status = 404, description = "Cooperado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cooperado(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (cooperado, unidades) = app_state
        .cooperado_service
        .get_with_unidades(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(CooperadoDetalhe { cooperado, unidades })))
}

// PUT /api/cooperados/{id}
#[utoipa::path(
    put,
    path = "/api/cooperados/{id}",
    tag = "Cooperados",
    request_body = CooperadoPayload,
    params(("id" = Uuid, Path, description = "ID do cooperado")),
    responses(
        (status = 200, description = "Cooperado atualizado", body = Cooperado),
        (status = 404, description = "Cooperado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_cooperado(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<CooperadoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cooperado = app_state
        .cooperado_service
        .update(&sessao, app_state.notifier.as_ref(), id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cooperado)))
}

// DELETE /api/cooperados/{id}
#[utoipa::path(
    delete,
    path = "/api/cooperados/{id}",
    tag = "Cooperados",
    params(("id" = Uuid, Path, description = "ID do cooperado")),
    responses(
        (status = 204, description = "Cooperado excluído"),
        (status = 404, description = "Cooperado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_cooperado(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .cooperado_service
        .delete(&sessao, app_state.notifier.as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/cooperados/{id}/ficha
#[utoipa::path(
    get,
    path = "/api/cooperados/{id}/ficha",
    tag = "Cooperados",
    params(("id" = Uuid, Path, description = "ID do cooperado")),
    responses(
        (status = 200, description = "Ficha cadastral em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Cooperado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn ficha_cooperado(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .ficha_cooperado(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Abre no navegador em vez de forçar o download
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"ficha_{}.pdf\"", id)),
    ];

    Ok((headers, pdf_bytes).into_response())
}
