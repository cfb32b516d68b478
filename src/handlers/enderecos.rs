// src/handlers/enderecos.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::endereco::Endereco,
};

// GET /api/enderecos/{cep}
#[utoipa::path(
    get,
    path = "/api/enderecos/{cep}",
    tag = "Endereços",
    params(("cep" = String, Path, description = "CEP com ou sem máscara")),
    responses(
        (status = 200, description = "Endereço do CEP", body = Endereco),
        (status = 400, description = "CEP mal formado"),
        (status = 404, description = "CEP não encontrado"),
        (status = 503, description = "Serviço de CEP indisponível")
    ),
    security(("api_jwt" = []))
)]
pub async fn lookup_cep(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(cep): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let endereco = app_state
        .cep_service
        .lookup(&cep)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(endereco)))
}
