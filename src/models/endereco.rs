// src/models/endereco.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Endereço devolvido pela consulta de CEP, usado para pré-preencher cadastros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Endereco {
    #[schema(example = "01310100")]
    pub cep: String,
    #[schema(example = "Avenida Paulista")]
    pub logradouro: String,
    pub complemento: Option<String>,
    #[schema(example = "Bela Vista")]
    pub bairro: String,
    #[schema(example = "São Paulo")]
    pub cidade: String,
    #[schema(example = "SP")]
    pub uf: String,
}
