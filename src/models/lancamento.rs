// src/models/lancamento.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::historico::{HistoricoLancamento, StatusHistory};
use crate::models::status::{ensure_transition, StatusLancamento};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_lancamento", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TipoLancamento {
    Receita, // A Receber (cooperado / fatura)
    Despesa, // A Pagar (investidor / usina)
}

// --- Structs ---

#[derive(Debug, Clone, FromRow)]
pub struct LancamentoRow {
    pub id: Uuid,
    pub cooperativa_id: Uuid,
    pub tipo: TipoLancamento,
    pub descricao: String,
    pub valor: Decimal,
    pub valor_pago: Option<Decimal>,
    pub juros: Option<Decimal>,
    pub desconto: Option<Decimal>,
    pub data_vencimento: NaiveDate,
    pub data_pagamento: Option<DateTime<Utc>>,
    pub status: StatusLancamento,
    pub historico_status: Value,
    pub fatura_id: Option<Uuid>,
    pub pagamento_usina_id: Option<Uuid>,
    pub cooperado_id: Option<Uuid>,
    pub observacao: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub versao: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LancamentoFinanceiro {
    pub id: Uuid,
    #[schema(ignore)]
    pub cooperativa_id: Uuid,
    pub tipo: TipoLancamento,

    #[schema(example = "Fatura 03/2024 - UC 123456")]
    pub descricao: String,

    // Valores
    #[schema(example = "150.00")]
    pub valor: Decimal,
    pub valor_pago: Option<Decimal>,
    pub juros: Option<Decimal>,
    pub desconto: Option<Decimal>,

    // Datas
    #[schema(value_type = String, format = Date, example = "2024-04-10")]
    pub data_vencimento: NaiveDate,
    pub data_pagamento: Option<DateTime<Utc>>,

    pub status: StatusLancamento,
    #[schema(value_type = Vec<HistoricoLancamento>)]
    pub historico_status: StatusHistory<HistoricoLancamento>,

    // Vínculos
    pub fatura_id: Option<Uuid>,
    pub pagamento_usina_id: Option<Uuid>,
    pub cooperado_id: Option<Uuid>,

    pub observacao: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub versao: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LancamentoRow> for LancamentoFinanceiro {
    type Error = AppError;

    fn try_from(row: LancamentoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            historico_status: StatusHistory::parse(row.historico_status)?,
            id: row.id,
            cooperativa_id: row.cooperativa_id,
            tipo: row.tipo,
            descricao: row.descricao,
            valor: row.valor,
            valor_pago: row.valor_pago,
            juros: row.juros,
            desconto: row.desconto,
            data_vencimento: row.data_vencimento,
            data_pagamento: row.data_pagamento,
            status: row.status,
            fatura_id: row.fatura_id,
            pagamento_usina_id: row.pagamento_usina_id,
            cooperado_id: row.cooperado_id,
            observacao: row.observacao,
            deleted_at: row.deleted_at,
            versao: row.versao,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NovoLancamento {
    pub tipo: TipoLancamento,
    pub descricao: String,
    pub valor: Decimal,
    pub data_vencimento: NaiveDate,
    pub fatura_id: Option<Uuid>,
    pub pagamento_usina_id: Option<Uuid>,
    pub cooperado_id: Option<Uuid>,
    pub observacao: Option<String>,
}

/// Dados opcionais do fluxo "registrar pagamento".
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagamentoInfo {
    #[validate(custom(function = "crate::models::validate_not_negative"))]
    pub valor_pago: Option<Decimal>,
    #[validate(custom(function = "crate::models::validate_not_negative"))]
    pub juros: Option<Decimal>,
    #[validate(custom(function = "crate::models::validate_not_negative"))]
    pub desconto: Option<Decimal>,
    #[validate(length(max = 500, message = "Observação muito longa."))]
    pub observacao: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LancamentoStatusUpdate {
    pub id: Uuid,
    pub versao_esperada: i32,
    pub status_anterior: StatusLancamento,
    pub novo_status: StatusLancamento,
    pub historico_status: StatusHistory<HistoricoLancamento>,
    pub data_pagamento: Option<DateTime<Utc>>,
    pub valor_pago: Option<Decimal>,
    pub juros: Option<Decimal>,
    pub desconto: Option<Decimal>,
    pub observacao: Option<String>,
}

impl LancamentoFinanceiro {
    /// Valida a transição e calcula os campos derivados.
    ///
    /// `pagamento` só é aceito quando o destino é `pago`.
    pub fn plan_transition(
        &self,
        novo_status: StatusLancamento,
        observacao: Option<String>,
        pagamento: Option<PagamentoInfo>,
        agora: DateTime<Utc>,
    ) -> Result<LancamentoStatusUpdate, AppError> {
        ensure_transition(self.status, novo_status)?;
        self.build_update(novo_status, observacao, pagamento, agora)
    }

    /// Marca um lançamento `pendente` vencido como `atrasado`.
    ///
    /// `atrasado` não é destino de nenhuma transição do operador; só a
    /// verificação de vencimento chega nele.
    pub fn plan_overdue(&self, hoje: NaiveDate, agora: DateTime<Utc>) -> Option<Result<LancamentoStatusUpdate, AppError>> {
        if self.status != StatusLancamento::Pendente || self.data_vencimento >= hoje {
            return None;
        }
        Some(self.build_update(
            StatusLancamento::Atrasado,
            Some(format!("Vencido em {}", self.data_vencimento.format("%d/%m/%Y"))),
            None,
            agora,
        ))
    }

    fn build_update(
        &self,
        novo_status: StatusLancamento,
        observacao: Option<String>,
        pagamento: Option<PagamentoInfo>,
        agora: DateTime<Utc>,
    ) -> Result<LancamentoStatusUpdate, AppError> {
        if pagamento.is_some() && novo_status != StatusLancamento::Pago {
            let mut errors = validator::ValidationErrors::new();
            errors.add("pagamento", validator::ValidationError::new("payment_requires_pago"));
            return Err(AppError::ValidationError(errors));
        }

        let nota = observacao
            .clone()
            .or_else(|| pagamento.as_ref().and_then(|p| p.observacao.clone()));

        let historico = self.historico_status.appended(HistoricoLancamento {
            status_anterior: self.status,
            novo_status,
            data: agora,
            observacao: nota,
        })?;

        let mut update = LancamentoStatusUpdate {
            id: self.id,
            versao_esperada: self.versao,
            status_anterior: self.status,
            novo_status,
            historico_status: historico,
            data_pagamento: self.data_pagamento,
            valor_pago: self.valor_pago,
            juros: self.juros,
            desconto: self.desconto,
            observacao: self.observacao.clone(),
        };

        match novo_status {
            StatusLancamento::Pago => {
                update.data_pagamento = Some(agora);
                if let Some(p) = pagamento {
                    update.valor_pago = p.valor_pago.or(update.valor_pago);
                    update.juros = p.juros.or(update.juros);
                    update.desconto = p.desconto.or(update.desconto);
                    if p.observacao.is_some() {
                        update.observacao = p.observacao;
                    }
                }
            }
            StatusLancamento::Pendente if self.status == StatusLancamento::Pago => {
                // estorno: o pagamento deixa de existir
                update.data_pagamento = None;
                update.valor_pago = None;
                update.juros = None;
                update.desconto = None;
            }
            _ => {}
        }

        Ok(update)
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLancamentoPayload {
    pub tipo: TipoLancamento,

    #[validate(length(min = 1, max = 255, message = "A descrição é obrigatória."))]
    pub descricao: String,

    #[validate(custom(function = "crate::models::validate_positive"))]
    #[schema(example = "150.00")]
    pub valor: Decimal,

    #[schema(value_type = String, format = Date, example = "2024-04-10")]
    pub data_vencimento: NaiveDate,

    pub cooperado_id: Option<Uuid>,
    pub observacao: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransicaoLancamentoPayload {
    pub novo_status: StatusLancamento,
    #[validate(length(max = 500, message = "Observação muito longa."))]
    pub observacao: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiltroLancamentos {
    pub tipo: Option<TipoLancamento>,
    pub status: Option<StatusLancamento>,
}

impl FiltroLancamentos {
    pub fn matches(&self, l: &LancamentoFinanceiro) -> bool {
        l.deleted_at.is_none()
            && self.tipo.is_none_or(|t| l.tipo == t)
            && self.status.is_none_or(|s| l.status == s)
    }
}
