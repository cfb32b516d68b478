// src/handlers/unidades.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::SessaoAtual, i18n::Locale},
    models::unidade::{FiltroUnidades, SaidaUnidadePayload, UnidadeBeneficiaria, UnidadePayload},
};

// POST /api/unidades
#[utoipa::path(
    post,
    path = "/api/unidades",
    tag = "Unidades",
    request_body = UnidadePayload,
    responses(
        (status = 201, description = "Unidade cadastrada", body = UnidadeBeneficiaria),
        (status = 404, description = "Cooperado ou template inexistente"),
        (status = 409, description = "Número de UC já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_unidade(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Json(payload): Json<UnidadePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let unidade = app_state
        .unidade_service
        .create(&sessao, app_state.notifier.as_ref(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(unidade)))
}

// GET /api/unidades
#[utoipa::path(
    get,
    path = "/api/unidades",
    tag = "Unidades",
    params(
        ("cooperadoId" = Option<Uuid>, Query, description = "Filtra por cooperado"),
        ("usinaId" = Option<Uuid>, Query, description = "Filtra por usina"),
        ("somenteAtivas" = Option<bool>, Query, description = "Apenas unidades sem data de saída")
    ),
    responses((status = 200, description = "Unidades beneficiárias", body = Vec<UnidadeBeneficiaria>)),
    security(("api_jwt" = []))
)]
pub async fn list_unidades(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Query(filtro): Query<FiltroUnidades>,
) -> Result<impl IntoResponse, ApiError> {
    let unidades = app_state
        .unidade_service
        .list(&sessao, &filtro)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(unidades)))
}

// GET /api/unidades/{id}
#[utoipa::path(
    get,
    path = "/api/unidades/{id}",
    tag = "Unidades",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Unidade", body = UnidadeBeneficiaria),
        (status = 404, description = "Unidade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_unidade(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let unidade = app_state
        .unidade_service
        .get(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(unidade)))
}

// PUT /api/unidades/{id}
#[utoipa::path(
    put,
    path = "/api/unidades/{id}",
    tag = "Unidades",
    request_body = UnidadePayload,
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Unidade atualizada", body = UnidadeBeneficiaria),
        (status = 404, description = "Unidade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_unidade(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<UnidadePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let unidade = app_state
        .unidade_service
        .update(&sessao, app_state.notifier.as_ref(), id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(unidade)))
}

// POST /api/unidades/{id}/saida
#[utoipa::path(
    post,
    path = "/api/unidades/{id}/saida",
    tag = "Unidades",
    request_body = SaidaUnidadePayload,
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Saída registrada", body = UnidadeBeneficiaria),
        (status = 400, description = "Saída anterior à entrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_exit(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaidaUnidadePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let unidade = app_state
        .unidade_service
        .register_exit(&sessao, app_state.notifier.as_ref(), id, payload.data_saida)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(unidade)))
}
