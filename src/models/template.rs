// src/models/template.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCalculo {
    pub id: Uuid,
    #[schema(ignore)]
    pub cooperativa_id: Uuid,

    #[schema(example = "Padrão residencial")]
    pub nome: String,
    pub descricao: Option<String>,

    #[schema(example = "(total_fatura - iluminacao_publica - outros_valores) * percentual_desconto / 100")]
    pub formula_desconto: String,
    #[schema(example = "total_fatura - valor_desconto - fatura_concessionaria")]
    pub formula_assinatura: String,

    pub is_padrao: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePayload {
    #[validate(length(min = 1, max = 120, message = "O nome é obrigatório."))]
    pub nome: String,
    pub descricao: Option<String>,

    #[validate(length(min = 1, max = 500, message = "A fórmula de desconto deve ter entre 1 e 500 caracteres."))]
    pub formula_desconto: String,
    #[validate(length(min = 1, max = 500, message = "A fórmula de assinatura deve ter entre 1 e 500 caracteres."))]
    pub formula_assinatura: String,

    #[serde(default)]
    pub is_padrao: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariaveisDisponiveis {
    pub variaveis: Vec<&'static str>,
}
