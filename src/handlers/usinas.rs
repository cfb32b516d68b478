// src/handlers/usinas.rs

use axum::{
    extract::{Path, State},
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
    models::{
        unidade::UnidadeBeneficiaria,
        usina::{PagamentoUsina, PagamentoUsinaPayload, RateioPayload, Usina, UsinaPayload},
    },
};

// POST /api/usinas
#[utoipa::path(
    post,
    path = "/api/usinas",
    tag = "Usinas",
    request_body = UsinaPayload,
    responses(
        (status = 201, description = "Usina cadastrada", body = Usina),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_usina(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Json(payload): Json<UsinaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let usina = app_state
        .usina_service
        .create(&sessao, app_state.notifier.as_ref(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(usina)))
}

// GET /api/usinas
#[utoipa::path(
    get,
    path = "/api/usinas",
    tag = "Usinas",
    responses((status = 200, description = "Usinas da cooperativa", body = Vec<Usina>)),
    security(("api_jwt" = []))
)]
pub async fn list_usinas(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
) -> Result<impl IntoResponse, ApiError> {
    let usinas = app_state
        .usina_service
        .list(&sessao)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(usinas)))
}

// GET /api/usinas/{id}
#[utoipa::path(
    get,
    path = "/api/usinas/{id}",
    tag = "Usinas",
    params(("id" = Uuid, Path, description = "ID da usina")),
    responses(
        (status = 200, description = "Usina", body = Usina),
        (status = 404, description = "Usina não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_usina(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let usina = app_state
        .usina_service
        .get(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(usina)))
}

// PUT /api/usinas/{id}
#[utoipa::path(
    put,
    path = "/api/usinas/{id}",
    tag = "Usinas",
    request_body = UsinaPayload,
    params(("id" = Uuid, Path, description = "ID da usina")),
    responses(
        (status = 200, description = "Usina atualizada", body = Usina),
        (status = 404, description = "Usina não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_usina(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<UsinaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let usina = app_state
        .usina_service
        .update(&sessao, app_state.notifier.as_ref(), id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(usina)))
}

// PUT /api/usinas/{id}/rateio
#[utoipa::path(
    put,
    path = "/api/usinas/{id}/rateio",
    tag = "Usinas",
    request_body = RateioPayload,
    params(("id" = Uuid, Path, description = "ID da usina")),
    responses(
        (status = 200, description = "Unidades com o novo rateio", body = Vec<UnidadeBeneficiaria>),
        (status = 400, description = "Percentuais somam mais de 100% ou unidade repetida")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_rateio(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<RateioPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let unidades = app_state
        .usina_service
        .set_rateio(&sessao, app_state.notifier.as_ref(), id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(unidades)))
}

// POST /api/usinas/{id}/pagamentos
#[utoipa::path(
    post,
    path = "/api/usinas/{id}/pagamentos",
    tag = "Usinas",
    request_body = PagamentoUsinaPayload,
    params(("id" = Uuid, Path, description = "ID da usina")),
    responses(
        (status = 201, description = "Pagamento registrado", body = PagamentoUsina),
        (status = 409, description = "Pagamento do período já registrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_pagamento(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<PagamentoUsinaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let pagamento = app_state
        .usina_service
        .create_pagamento(&sessao, app_state.notifier.as_ref(), id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(pagamento)))
}

// GET /api/usinas/{id}/pagamentos
#[utoipa::path(
    get,
    path = "/api/usinas/{id}/pagamentos",
    tag = "Usinas",
    params(("id" = Uuid, Path, description = "ID da usina")),
    responses((status = 200, description = "Pagamentos da usina", body = Vec<PagamentoUsina>)),
    security(("api_jwt" = []))
)]
pub async fn list_pagamentos(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pagamentos = app_state
        .usina_service
        .list_pagamentos(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pagamentos)))
}
