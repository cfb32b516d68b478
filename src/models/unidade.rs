// src/models/unidade.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::periodo::Periodo;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnidadeBeneficiaria {
    pub id: Uuid,
    #[schema(ignore)]
    pub cooperativa_id: Uuid,
    pub cooperado_id: Uuid,

    #[schema(example = "3012345678")]
    pub numero_uc: String,
    #[schema(example = "Casa de praia")]
    pub apelido: Option<String>,

    pub cep: Option<String>,
    pub logradouro: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    pub uf: Option<String>,

    #[schema(example = "15.00")]
    pub percentual_desconto: Decimal,

    #[schema(value_type = String, format = Date, example = "2024-03-15")]
    pub data_entrada: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub data_saida: Option<NaiveDate>,

    /// `None` usa o template padrão da cooperativa.
    pub template_calculo_id: Option<Uuid>,

    // Rateio
    pub usina_id: Option<Uuid>,
    pub percentual_rateio: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UnidadeBeneficiaria {
    pub fn is_active(&self) -> bool {
        self.data_saida.is_none()
    }

    /// Regra de elegibilidade para a geração mensal: unidade ativa, que
    /// entrou até o primeiro dia do mês ou durante o próprio mês.
    pub fn is_eligible_for(&self, periodo: &Periodo) -> bool {
        self.is_active()
            && self.data_entrada <= periodo.last_day()
            && (self.data_entrada <= periodo.first_day() || periodo.contains(self.data_entrada))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnidadePayload {
    pub cooperado_id: Uuid,

    #[validate(length(min = 1, max = 30, message = "O número da UC é obrigatório."))]
    pub numero_uc: String,
    pub apelido: Option<String>,

    #[validate(custom(function = "crate::common::documento::validate_cep"))]
    pub cep: Option<String>,
    pub logradouro: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    #[validate(length(equal = 2, message = "UF deve ter 2 letras."))]
    pub uf: Option<String>,

    #[validate(custom(function = "crate::models::validate_percentage"))]
    pub percentual_desconto: Decimal,

    #[schema(value_type = String, format = Date, example = "2024-03-15")]
    pub data_entrada: NaiveDate,

    pub template_calculo_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaidaUnidadePayload {
    #[schema(value_type = String, format = Date, example = "2024-06-30")]
    pub data_saida: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiltroUnidades {
    pub cooperado_id: Option<Uuid>,
    pub usina_id: Option<Uuid>,
    #[serde(default)]
    pub somente_ativas: bool,
}

impl FiltroUnidades {
    pub fn matches(&self, u: &UnidadeBeneficiaria) -> bool {
        self.cooperado_id.is_none_or(|c| u.cooperado_id == c)
            && self.usina_id.is_none_or(|usina| u.usina_id == Some(usina))
            && (!self.somente_ativas || u.is_active())
    }
}
