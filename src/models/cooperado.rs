// src/models/cooperado.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::documento;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_pessoa", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TipoPessoa {
    Fisica,
    Juridica,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cooperado {
    pub id: Uuid,
    #[schema(ignore)]
    pub cooperativa_id: Uuid,

    #[schema(example = "Maria da Silva")]
    pub nome: String,
    pub tipo_pessoa: TipoPessoa,
    /// Só dígitos.
    #[schema(example = "52998224725")]
    pub documento: String,

    pub email: Option<String>,
    pub telefone: Option<String>,
    pub numero_cadastro: Option<String>,

    pub cep: Option<String>,
    pub logradouro: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    pub uf: Option<String>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_documento_matches_tipo"))]
pub struct CooperadoPayload {
    #[validate(length(min = 2, max = 200, message = "O nome é obrigatório."))]
    pub nome: String,

    pub tipo_pessoa: TipoPessoa,

    #[validate(custom(function = "documento::validate_documento"))]
    pub documento: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub numero_cadastro: Option<String>,

    #[validate(custom(function = "documento::validate_cep"))]
    pub cep: Option<String>,
    pub logradouro: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    #[validate(length(equal = 2, message = "UF deve ter 2 letras."))]
    pub uf: Option<String>,
}

// CPF para pessoa física, CNPJ para jurídica
fn validate_documento_matches_tipo(payload: &CooperadoPayload) -> Result<(), ValidationError> {
    let digitos = documento::only_digits(&payload.documento).len();
    let esperado = match payload.tipo_pessoa {
        TipoPessoa::Fisica => 11,
        TipoPessoa::Juridica => 14,
    };
    if digitos == esperado {
        Ok(())
    } else {
        let mut err = ValidationError::new("documento_tipo");
        err.message = Some("Documento não corresponde ao tipo de pessoa.".into());
        Err(err)
    }
}
