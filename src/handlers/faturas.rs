// src/handlers/faturas.rs

use axum::{
    body::Bytes,
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
        fatura::{
            DadosFaturaPayload, Fatura, FiltroFaturas, GeracaoResultado, GerarFaturasPayload,
            TransicaoFaturaPayload, VerificacaoAtrasoResultado,
        },
        historico::HistoricoFatura,
    },
};

// =============================================================================
//  CONSULTAS
// =============================================================================

// GET /api/faturas
#[utoipa::path(
    get,
    path = "/api/faturas",
    tag = "Faturas",
    params(
        ("mes" = Option<u32>, Query, description = "Mês de referência"),
        ("ano" = Option<i32>, Query, description = "Ano de referência"),
        ("status" = Option<String>, Query, description = "Status da fatura"),
        ("unidadeBeneficiariaId" = Option<Uuid>, Query, description = "Unidade beneficiária")
    ),
    responses(
        (status = 200, description = "Lista de faturas", body = Vec<Fatura>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_faturas(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Query(filtro): Query<FiltroFaturas>,
) -> Result<impl IntoResponse, ApiError> {
    let faturas = app_state
        .fatura_service
        .list(&sessao, &filtro)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(faturas)))
}

// GET /api/faturas/{id}
#[utoipa::path(
    get,
    path = "/api/faturas/{id}",
    tag = "Faturas",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura", body = Fatura),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_fatura(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let fatura = app_state
        .fatura_service
        .get(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(fatura)))
}

// GET /api/faturas/{id}/historico
#[utoipa::path(
    get,
    path = "/api/faturas/{id}/historico",
    tag = "Faturas",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Histórico, mais recente primeiro", body = Vec<HistoricoFatura>)
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
        .fatura_service
        .historico(&sessao, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(historico)))
}

// =============================================================================
//  AÇÕES
// =============================================================================

// POST /api/faturas/gerar
#[utoipa::path(
    post,
    path = "/api/faturas/gerar",
    tag = "Faturas",
    request_body = GerarFaturasPayload,
    responses(
        (status = 200, description = "Resumo da geração", body = GeracaoResultado),
        (status = 422, description = "Período futuro")
    ),
    security(("api_jwt" = []))
)]
pub async fn gerar_faturas(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Json(payload): Json<GerarFaturasPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let resultado = app_state
        .fatura_service
        .generate_for_period(&sessao, app_state.notifier.as_ref(), payload.mes, payload.ano)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resultado)))
}

// POST /api/faturas/{id}/status
#[utoipa::path(
    post,
    path = "/api/faturas/{id}/status",
    tag = "Faturas",
    request_body = TransicaoFaturaPayload,
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Status alterado", body = Fatura),
        (status = 409, description = "Fatura alterada por outra sessão"),
        (status = 422, description = "Transição não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn transition_fatura(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransicaoFaturaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let fatura = app_state
        .fatura_service
        .transition_status(&sessao, app_state.notifier.as_ref(), id, payload.novo_status, payload.observacao)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(fatura)))
}

// PUT /api/faturas/{id}/dados
#[utoipa::path(
    put,
    path = "/api/faturas/{id}/dados",
    tag = "Faturas",
    request_body = DadosFaturaPayload,
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Dados salvos e valores calculados", body = Fatura),
        (status = 409, description = "Fatura alterada por outra sessão"),
        (status = 422, description = "Fatura não aceita edição no status atual")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_dados(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    Json(payload): Json<DadosFaturaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let fatura = app_state
        .fatura_service
        .update_dados(&sessao, app_state.notifier.as_ref(), id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(fatura)))
}

// PUT /api/faturas/{id}/arquivo
#[utoipa::path(
    put,
    path = "/api/faturas/{id}/arquivo",
    tag = "Faturas",
    request_body(content = Vec<u8>, content_type = "application/pdf"),
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Arquivo anexado", body = Fatura),
        (status = 400, description = "Arquivo não é PDF")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_arquivo(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
    corpo: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let fatura = app_state
        .fatura_service
        .upload_arquivo(&sessao, app_state.notifier.as_ref(), id, &corpo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(fatura)))
}

// DELETE /api/faturas/{id}
#[utoipa::path(
    delete,
    path = "/api/faturas/{id}",
    tag = "Faturas",
    params(("id" = Uuid, Path, description = "ID da fatura")),
    responses(
        (status = 204, description = "Fatura excluída"),
        (status = 404, description = "Fatura não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_fatura(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .fatura_service
        .delete(&sessao, app_state.notifier.as_ref(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/faturas/verificar-atrasos
#[utoipa::path(
    post,
    path = "/api/faturas/verificar-atrasos",
    tag = "Faturas",
    responses(
        (status = 200, description = "Faturas e lançamentos marcados como atrasados", body = VerificacaoAtrasoResultado)
    ),
    security(("api_jwt" = []))
)]
pub async fn verificar_atrasos(
    State(app_state): State<AppState>,
    locale: Locale,
    SessaoAtual(sessao): SessaoAtual,
) -> Result<impl IntoResponse, ApiError> {
    let resultado = app_state
        .fatura_service
        .mark_overdue(&sessao, app_state.notifier.as_ref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resultado)))
}
