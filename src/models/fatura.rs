// src/models/fatura.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::historico::{HistoricoFatura, StatusHistory};
use crate::models::periodo::Periodo;
use crate::models::status::{ensure_transition, StatusFatura};

pub const NOTA_CRIACAO: &str = "Fatura criada, aguardando preenchimento";

// --- Linha crua do banco (histórico ainda como JSONB) ---

#[derive(Debug, Clone, FromRow)]
pub struct FaturaRow {
    pub id: Uuid,
    pub cooperativa_id: Uuid,
    pub unidade_beneficiaria_id: Uuid,
    pub mes: i32,
    pub ano: i32,
    pub consumo_kwh: Decimal,
    pub total_fatura: Decimal,
    pub iluminacao_publica: Decimal,
    pub outros_valores: Decimal,
    pub fatura_concessionaria: Decimal,
    pub valor_desconto: Decimal,
    pub valor_assinatura: Decimal,
    pub economia_mes: Decimal,
    pub economia_acumulada: Decimal,
    pub saldo_energia_kwh: Decimal,
    pub data_vencimento: Option<NaiveDate>,
    pub status: StatusFatura,
    pub historico_status: Value,
    pub arquivo_concessionaria: Option<String>,
    pub data_envio: Option<DateTime<Utc>>,
    pub data_confirmacao_pagamento: Option<DateTime<Utc>>,
    pub data_pagamento: Option<DateTime<Utc>>,
    pub versao: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Fatura {
    pub id: Uuid,
    #[schema(ignore)]
    pub cooperativa_id: Uuid,
    pub unidade_beneficiaria_id: Uuid,
    #[schema(example = 3)]
    pub mes: i32,
    #[schema(example = 2024)]
    pub ano: i32,

    // Dados da conta da concessionária
    #[schema(example = "350.0")]
    pub consumo_kwh: Decimal,
    #[schema(example = "420.50")]
    pub total_fatura: Decimal,
    pub iluminacao_publica: Decimal,
    pub outros_valores: Decimal,
    pub fatura_concessionaria: Decimal,

    // Valores calculados pelo template
    pub valor_desconto: Decimal,
    pub valor_assinatura: Decimal,
    pub economia_mes: Decimal,
    pub economia_acumulada: Decimal,
    pub saldo_energia_kwh: Decimal,

    #[schema(value_type = Option<String>, format = Date, example = "2024-04-10")]
    pub data_vencimento: Option<NaiveDate>,

    pub status: StatusFatura,
    #[schema(value_type = Vec<HistoricoFatura>)]
    pub historico_status: StatusHistory<HistoricoFatura>,

    pub arquivo_concessionaria: Option<String>,
    pub data_envio: Option<DateTime<Utc>>,
    pub data_confirmacao_pagamento: Option<DateTime<Utc>>,
    pub data_pagamento: Option<DateTime<Utc>>,

    /// Contador de concorrência otimista.
    pub versao: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FaturaRow> for Fatura {
    type Error = AppError;

    fn try_from(row: FaturaRow) -> Result<Self, Self::Error> {
        Ok(Self {
            historico_status: StatusHistory::parse(row.historico_status)?,
            id: row.id,
            cooperativa_id: row.cooperativa_id,
            unidade_beneficiaria_id: row.unidade_beneficiaria_id,
            mes: row.mes,
            ano: row.ano,
            consumo_kwh: row.consumo_kwh,
            total_fatura: row.total_fatura,
            iluminacao_publica: row.iluminacao_publica,
            outros_valores: row.outros_valores,
            fatura_concessionaria: row.fatura_concessionaria,
            valor_desconto: row.valor_desconto,
            valor_assinatura: row.valor_assinatura,
            economia_mes: row.economia_mes,
            economia_acumulada: row.economia_acumulada,
            saldo_energia_kwh: row.saldo_energia_kwh,
            data_vencimento: row.data_vencimento,
            status: row.status,
            arquivo_concessionaria: row.arquivo_concessionaria,
            data_envio: row.data_envio,
            data_confirmacao_pagamento: row.data_confirmacao_pagamento,
            data_pagamento: row.data_pagamento,
            versao: row.versao,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// --- Criação (geração mensal) ---

#[derive(Debug, Clone)]
pub struct NovaFatura {
    pub unidade_beneficiaria_id: Uuid,
    pub periodo: Periodo,
    pub historico_status: StatusHistory<HistoricoFatura>,
}

impl NovaFatura {
    /// Fatura zerada em `pendente`, aguardando os dados da conta.
    pub fn pendente(unidade_id: Uuid, periodo: Periodo, agora: DateTime<Utc>) -> Result<Self, AppError> {
        let historico = StatusHistory::default().appended(HistoricoFatura {
            status: StatusFatura::Pendente,
            data: agora,
            observacao: Some(NOTA_CRIACAO.to_string()),
        })?;
        Ok(Self {
            unidade_beneficiaria_id: unidade_id,
            periodo,
            historico_status: historico,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeracaoResultado {
    pub gerados: usize,
    pub ignorados: usize,
    pub erros: usize,
    pub log_erros: Vec<String>,
}

// --- Transição de status ---

/// A atualização completa de uma transição aceita: status, histórico e
/// carimbos derivados vão juntos num único UPDATE.
#[derive(Debug, Clone)]
pub struct FaturaStatusUpdate {
    pub id: Uuid,
    pub versao_esperada: i32,
    pub status_anterior: StatusFatura,
    pub novo_status: StatusFatura,
    pub historico_status: StatusHistory<HistoricoFatura>,
    pub data_envio: Option<DateTime<Utc>>,
    pub data_confirmacao_pagamento: Option<DateTime<Utc>>,
    pub data_pagamento: Option<DateTime<Utc>>,
}

impl Fatura {
    pub fn periodo(&self) -> Result<Periodo, AppError> {
        let mes = u32::try_from(self.mes).map_err(|_| AppError::InvalidPeriod { mes: 0, ano: self.ano })?;
        Periodo::new(mes, self.ano)
    }

    /// Valida e monta a transição sem tocar em `self`.
    pub fn plan_transition(
        &self,
        novo_status: StatusFatura,
        observacao: Option<String>,
        agora: DateTime<Utc>,
    ) -> Result<FaturaStatusUpdate, AppError> {
        ensure_transition(self.status, novo_status)?;

        let historico = self.historico_status.appended(HistoricoFatura {
            status: novo_status,
            data: agora,
            observacao,
        })?;

        let mut update = FaturaStatusUpdate {
            id: self.id,
            versao_esperada: self.versao,
            status_anterior: self.status,
            novo_status,
            historico_status: historico,
            data_envio: self.data_envio,
            data_confirmacao_pagamento: self.data_confirmacao_pagamento,
            data_pagamento: self.data_pagamento,
        };

        match novo_status {
            StatusFatura::Enviada => update.data_envio = Some(agora),
            StatusFatura::Paga => {
                update.data_confirmacao_pagamento = Some(agora);
                update.data_pagamento = Some(agora);
            }
            _ => {}
        }

        Ok(update)
    }
}

// --- Lançamento de dados da conta ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DadosFaturaPayload {
    pub versao: i32,

    #[validate(custom(function = "crate::models::validate_not_negative"))]
    pub consumo_kwh: Decimal,
    #[validate(custom(function = "crate::models::validate_not_negative"))]
    pub total_fatura: Decimal,
    #[validate(custom(function = "crate::models::validate_not_negative"))]
    #[serde(default)]
    pub iluminacao_publica: Decimal,
    #[serde(default)]
    pub outros_valores: Decimal,
    #[validate(custom(function = "crate::models::validate_not_negative"))]
    #[serde(default)]
    pub fatura_concessionaria: Decimal,
    #[serde(default)]
    pub saldo_energia_kwh: Decimal,

    #[schema(value_type = Option<String>, format = Date, example = "2024-04-10")]
    pub data_vencimento: Option<NaiveDate>,
}

/// Valores prontos para gravar após o cálculo do template.
#[derive(Debug, Clone)]
pub struct DadosCalculados {
    pub id: Uuid,
    pub versao_esperada: i32,
    pub consumo_kwh: Decimal,
    pub total_fatura: Decimal,
    pub iluminacao_publica: Decimal,
    pub outros_valores: Decimal,
    pub fatura_concessionaria: Decimal,
    pub saldo_energia_kwh: Decimal,
    pub data_vencimento: Option<NaiveDate>,
    pub valor_desconto: Decimal,
    pub valor_assinatura: Decimal,
    pub economia_mes: Decimal,
    pub economia_acumulada: Decimal,
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GerarFaturasPayload {
    #[validate(range(min = 1, max = 12, message = "Mês deve estar entre 1 e 12."))]
    pub mes: u32,
    #[validate(range(min = 2000, max = 2100, message = "Ano inválido."))]
    pub ano: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransicaoFaturaPayload {
    pub novo_status: StatusFatura,
    #[validate(length(max = 500, message = "Observação muito longa."))]
    pub observacao: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiltroFaturas {
    pub mes: Option<u32>,
    pub ano: Option<i32>,
    pub status: Option<StatusFatura>,
    pub unidade_beneficiaria_id: Option<Uuid>,
}

impl FiltroFaturas {
    pub fn matches(&self, fatura: &Fatura) -> bool {
        self.mes.is_none_or(|m| fatura.mes == m as i32)
            && self.ano.is_none_or(|a| fatura.ano == a)
            && self.status.is_none_or(|s| fatura.status == s)
            && self
                .unidade_beneficiaria_id
                .is_none_or(|u| fatura.unidade_beneficiaria_id == u)
    }
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificacaoAtrasoResultado {
    pub faturas_atrasadas: usize,
    pub lancamentos_atrasados: usize,
    pub log_erros: Vec<String>,
}
