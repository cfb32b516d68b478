// src/models/usina.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Usina {
    pub id: Uuid,
    #[schema(ignore)]
    pub cooperativa_id: Uuid,

    #[schema(example = "Usina Solar Vale Verde")]
    pub nome: String,
    #[schema(example = "75.0")]
    pub potencia_kwp: Decimal,

    #[schema(example = "Investimentos Sol Ltda")]
    pub investidor_nome: String,
    pub investidor_documento: Option<String>,

    /// Valor pago ao investidor por kWh gerado.
    #[schema(example = "0.45")]
    pub valor_kwh: Decimal,

    pub ativa: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsinaPayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    pub nome: String,
    #[validate(custom(function = "crate::models::validate_positive"))]
    pub potencia_kwp: Decimal,
    #[validate(length(min = 1, max = 200, message = "O investidor é obrigatório."))]
    pub investidor_nome: String,
    #[validate(custom(function = "crate::common::documento::validate_documento"))]
    pub investidor_documento: Option<String>,
    #[validate(custom(function = "crate::models::validate_not_negative"))]
    pub valor_kwh: Decimal,
    #[serde(default = "default_true")]
    pub ativa: bool,
}

fn default_true() -> bool {
    true
}

// =============================================================================
//  RATEIO
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateioItem {
    pub unidade_beneficiaria_id: Uuid,
    #[validate(custom(function = "crate::models::validate_percentage"))]
    #[schema(example = "25.0")]
    pub percentual: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateioPayload {
    #[validate(nested)]
    pub itens: Vec<RateioItem>,
}

impl RateioPayload {
    /// Soma ≤ 100% e nenhuma unidade repetida.
    pub fn ensure_consistent(&self) -> Result<(), AppError> {
        let total: Decimal = self.itens.iter().map(|i| i.percentual).sum();
        if total > Decimal::ONE_HUNDRED {
            return Err(AppError::RateioExceeded(format!("total de {}%", total.normalize())));
        }
        let mut vistos = std::collections::HashSet::new();
        for item in &self.itens {
            if !vistos.insert(item.unidade_beneficiaria_id) {
                return Err(AppError::UniqueConstraintViolation(format!(
                    "unidade {} repetida no rateio",
                    item.unidade_beneficiaria_id
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
//  PAGAMENTOS AO INVESTIDOR
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagamentoUsina {
    pub id: Uuid,
    #[schema(ignore)]
    pub cooperativa_id: Uuid,
    pub usina_id: Uuid,
    pub mes: i32,
    pub ano: i32,
    #[schema(example = "9800.0")]
    pub geracao_kwh: Decimal,
    #[schema(example = "4410.00")]
    pub valor_total: Decimal,
    #[schema(value_type = String, format = Date, example = "2024-04-15")]
    pub data_vencimento: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagamentoUsinaPayload {
    #[validate(range(min = 1, max = 12, message = "Mês deve estar entre 1 e 12."))]
    pub mes: u32,
    #[validate(range(min = 2000, max = 2100, message = "Ano inválido."))]
    pub ano: i32,
    #[validate(custom(function = "crate::models::validate_not_negative"))]
    pub geracao_kwh: Decimal,
    /// Se ausente, `geracao_kwh * valor_kwh` da usina.
    #[validate(custom(function = "crate::models::validate_not_negative"))]
    pub valor_total: Option<Decimal>,
    #[schema(value_type = String, format = Date, example = "2024-04-15")]
    pub data_vencimento: NaiveDate,
}
