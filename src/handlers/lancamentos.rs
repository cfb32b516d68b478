// src/handlers/lancamentos.rs

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
    models::{
        historico::HistoricoLancamento,
        lancamento::{
            CreateLancamentoPayload, FiltroLancamentos, LancamentoFinanceiro, PagamentoInfo,
            TransicaoLancamentoPayload,
        },
    },
};

// POST /api/lancamentos
#[utoipa::path(
    post,
    path = "/api/lancamentos",
    tag = "Financeiro",
    request_body = CreateLancamentoPayload,
    responses(
        (status = 201, description = "Lançamento criado", body = LancamentoFinanceiro),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lancamento(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Json(payload): Json<CreateLancamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lancamento = app_state
        .lancamento_service
        .create(&sessao, app_state.notifier.as_ref(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lancamento)))
}

// GET /api/lancamentos
#[utoipa::path(
    get,
    path = "/api/lancamentos",
    tag = "Financeiro",
    params(
        ("tipo" = Option<String>, Query, description = "receita | despesa"),
        ("status" = Option<String>, Query, description = "Status do lançamento")
    ),
    responses(
        (status = 200, description = "Lançamentos não excluídos", body = Vec<LancamentoFinanceiro>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_lancamentos(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Query(filtro): Query<FiltroLancamentos>,
) -> Result<impl IntoResponse, ApiError> {
    let lancamentos = app_state
        .lancamento_service
        .list(&sessao, &filtro)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lancamentos)))
}

// GET /api/lancamentos/{id}
#[utoipa::path(
    get,
    path = "/api/lancamentos/{id}",
    tag = "Financeiro",
    params(("id" = Uuid, Path, description = "ID do lançamento")),
    responses(
        (status = 200, description = "Lançamento", body = LancamentoFinanceiro),
        (status = 404, description = "Lançamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lancamento(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lancamento = app_state
        .lancamento_service
        .get(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lancamento)))
}

// GET /api/lancamentos/{id}/historico
#[utoipa::path(
    get,
    path = "/api/lancamentos/{id}/historico",
    tag = "Financeiro",
    params(("id" = Uuid, Path, description = "ID do lançamento")),
    responses(
        (status = 200, description = "Histórico, mais recente primeiro", body = Vec<HistoricoLancamento>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_historico(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let historico = app_state
        .lancamento_service
        .historico(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(historico)))
}

// POST /api/lancamentos/{id}/status
#[utoipa::path(
    post,
    path = "/api/lancamentos/{id}/status",
    tag = "Financeiro",
    request_body = TransicaoLancamentoPayload,
    params(("id" = Uuid, Path, description = "ID do lançamento")),
    responses(
        (status = 200, description = "Status alterado", body = LancamentoFinanceiro),
        (status = 409, description = "Lançamento alterado por outra sessão"),
        (status = 422, description = "Transição não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn transition_lancamento(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransicaoLancamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lancamento = app_state
        .lancamento_service
        .transition_status(&sessao, app_state.notifier.as_ref(), id, payload.novo_status, payload.observacao)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lancamento)))
}

// POST /api/lancamentos/{id}/pagamento
#[utoipa::path(
    post,
    path = "/api/lancamentos/{id}/pagamento",
    tag = "Financeiro",
    request_body = PagamentoInfo,
    params(("id" = Uuid, Path, description = "ID do lançamento")),
    responses(
        (status = 200, description = "Pagamento registrado", body = LancamentoFinanceiro),
        (status = 422, description = "Lançamento não pode ser pago no status atual")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<PagamentoInfo>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lancamento = app_state
        .lancamento_service
        .register_payment(&sessao, app_state.notifier.as_ref(), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lancamento)))
}

// DELETE /api/lancamentos/{id}
#[utoipa::path(
    delete,
    path = "/api/lancamentos/{id}",
    tag = "Financeiro",
    params(("id" = Uuid, Path, description = "ID do lançamento")),
    responses(
        (status = 204, description = "Lançamento excluído"),
        (status = 404, description = "Lançamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lancamento(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lancamento_service
        .delete(&sessao, app_state.notifier.as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
