// src/handlers/templates.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::SessaoAtual, i18n::Locale},
    models::template::{TemplateCalculo, TemplatePayload, VariaveisDisponiveis},
    services::template_service::TemplateService,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPadraoPayload {
    /// Template que continua como padrão (opcional).
    pub except_id: Option<Uuid>,
}

// GET /api/templates
#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    responses((status = 200, description = "Templates da cooperativa", body = Vec<TemplateCalculo>)),
    security(("api_jwt" = []))
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
) -> Result<impl IntoResponse, ApiError> {
    let templates = app_state
        .template_service
        .list(&sessao)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(templates)))
}

// GET /api/templates/variaveis
#[utoipa::path(
    get,
    path = "/api/templates/variaveis",
    tag = "Templates",
    responses((status = 200, description = "Variáveis aceitas nas fórmulas", body = VariaveisDisponiveis))
)]
pub async fn list_variaveis() -> impl IntoResponse {
    Json(TemplateService::variables())
}

// GET /api/templates/padrao
#[utoipa::path(
    get,
    path = "/api/templates/padrao",
    tag = "Templates",
    responses(
        (status = 200, description = "Template padrão", body = TemplateCalculo),
        (status = 422, description = "Nenhum template padrão configurado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_default_template(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
) -> Result<impl IntoResponse, ApiError> {
    let template = app_state
        .template_service
        .get_default(&sessao)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(template)))
}

// POST /api/templates
#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "Templates",
    request_body = TemplatePayload,
    responses(
        (status = 201, description = "Template criado", body = TemplateCalculo),
        (status = 400, description = "Fórmula inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Json(payload): Json<TemplatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let template = app_state
        .template_service
        .create(&sessao, app_state.notifier.as_ref(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(template)))
}

// GET /api/templates/{id}
#[utoipa::path(
    get,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = Uuid, Path, description = "ID do template")),
    responses(
        (status = 200, description = "Template", body = TemplateCalculo),
        (status = 404, description = "Template não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_template(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let template = app_state
        .template_service
        .get(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(template)))
}

// PUT /api/templates/{id}
#[utoipa::path(
    put,
    path = "/api/templates/{id}",
    tag = "Templates",
    request_body = TemplatePayload,
    params(("id" = Uuid, Path, description = "ID do template")),
    responses(
        (status = 200, description = "Template atualizado", body = TemplateCalculo),
        (status = 404, description = "Template não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_template(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<TemplatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let template = app_state
        .template_service
        .update(&sessao, app_state.notifier.as_ref(), id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(template)))
}

// POST /api/templates/reset-padrao
#[utoipa::path(
    post,
    path = "/api/templates/reset-padrao",
    tag = "Templates",
    request_body = ResetPadraoPayload,
    responses((status = 200, description = "Quantidade de templates rebaixados")),
    security(("api_jwt" = []))
)]
pub async fn reset_default_templates(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Json(payload): Json<ResetPadraoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let rebaixados = app_state
        .template_service
        .reset_default_templates(&sessao, payload.except_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "rebaixados": rebaixados }))))
}

// DELETE /api/templates/{id}
#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = Uuid, Path, description = "ID do template")),
    responses(
        (status = 204, description = "Template excluído"),
        (status = 422, description = "Template em uso por unidades")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_template(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .template_service
        .delete(&sessao, app_state.notifier.as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
