// src/models/historico.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::common::error::AppError;
use crate::models::status::{StatusFatura, StatusLancamento};

/// Uma entrada de histórico de status com carimbo de tempo.
pub trait HistoryEntry {
    fn recorded_at(&self) -> DateTime<Utc>;
}

/// Entrada do histórico de uma fatura.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct HistoricoFatura {
    pub status: StatusFatura,
    pub data: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacao: Option<String>,
}

impl HistoryEntry for HistoricoFatura {
    fn recorded_at(&self) -> DateTime<Utc> {
        self.data
    }
}

/// Entrada do histórico de um lançamento financeiro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct HistoricoLancamento {
    pub status_anterior: StatusLancamento,
    pub novo_status: StatusLancamento,
    pub data: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacao: Option<String>,
}

impl HistoryEntry for HistoricoLancamento {
    fn recorded_at(&self) -> DateTime<Utc> {
        self.data
    }
}

/// Histórico append-only, armazenado em ordem de inserção.
///
/// A única forma de crescer é [`StatusHistory::appended`], que devolve uma
/// cópia com a nova entrada no fim; entradas anteriores nunca mudam.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatusHistory<E> {
    entries: Vec<E>,
}

impl<E> Default for StatusHistory<E> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<E: HistoryEntry + Clone> StatusHistory<E> {
    /// Valida a ordem temporal das entradas vindas do banco.
    pub fn from_entries(entries: Vec<E>) -> Result<Self, AppError> {
        for (posicao, par) in entries.windows(2).enumerate() {
            if par[1].recorded_at() < par[0].recorded_at() {
                return Err(AppError::MalformedHistory(format!(
                    "entrada {} anterior à entrada {}",
                    posicao + 1,
                    posicao
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&E> {
        self.entries.last()
    }

    /// `history ++ [entry]`. Rejeita entradas mais antigas que a última.
    pub fn appended(&self, entry: E) -> Result<Self, AppError> {
        if let Some(ultima) = self.entries.last() {
            if entry.recorded_at() < ultima.recorded_at() {
                return Err(AppError::MalformedHistory(
                    "nova entrada anterior à última registrada".to_string(),
                ));
            }
        }
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.extend(self.entries.iter().cloned());
        entries.push(entry);
        Ok(Self { entries })
    }

    /// Ordem de exibição: mais recente primeiro.
    pub fn most_recent_first(&self) -> Vec<E> {
        self.entries.iter().rev().cloned().collect()
    }
}

impl<E> StatusHistory<E>
where
    E: HistoryEntry + Clone + for<'de> Deserialize<'de>,
{
    /// Converte o JSONB do banco no histórico tipado.
    pub fn parse(value: Value) -> Result<Self, AppError> {
        let entries: Vec<E> = serde_json::from_value(value)
            .map_err(|e| AppError::MalformedHistory(e.to_string()))?;
        Self::from_entries(entries)
    }
}

impl<E: Serialize> StatusHistory<E> {
    pub fn to_json(&self) -> Result<Value, AppError> {
        serde_json::to_value(&self.entries).map_err(|e| AppError::InternalServerError(e.into()))
    }
}

impl<'de, E> Deserialize<'de> for StatusHistory<E>
where
    E: HistoryEntry + Clone + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<E>::deserialize(deserializer)?;
        Self::from_entries(entries).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, 0, 0).unwrap()
    }

    fn entrada(status: StatusFatura, h: u32) -> HistoricoFatura {
        HistoricoFatura { status, data: at(h), observacao: None }
    }

    #[test]
    fn append_keeps_prior_entries_in_place() {
        let base = StatusHistory::default()
            .appended(entrada(StatusFatura::Pendente, 8))
            .unwrap()
            .appended(entrada(StatusFatura::Enviada, 9))
            .unwrap();

        let novo = base.appended(entrada(StatusFatura::Paga, 10)).unwrap();

        assert_eq!(novo.len(), base.len() + 1);
        assert_eq!(&novo.entries()[..base.len()], base.entries());
        assert_eq!(novo.last().unwrap().status, StatusFatura::Paga);
        // o original não muda
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn append_rejects_entry_older_than_last() {
        let base = StatusHistory::default()
            .appended(entrada(StatusFatura::Pendente, 10))
            .unwrap();
        assert!(matches!(
            base.appended(entrada(StatusFatura::Enviada, 9)),
            Err(AppError::MalformedHistory(_))
        ));
    }

    #[test]
    fn display_order_is_most_recent_first() {
        let h = StatusHistory::from_entries(vec![
            entrada(StatusFatura::Pendente, 8),
            entrada(StatusFatura::Enviada, 9),
        ])
        .unwrap();
        let exibicao = h.most_recent_first();
        assert_eq!(exibicao[0].status, StatusFatura::Enviada);
        assert_eq!(exibicao[1].status, StatusFatura::Pendente);
        assert_eq!(h.entries()[0].status, StatusFatura::Pendente);
    }

    #[test]
    fn parse_accepts_well_formed_invoice_history() {
        let value = json!([
            {"status": "pendente", "data": "2024-03-15T08:00:00Z", "observacao": "Fatura criada, aguardando preenchimento"},
            {"status": "enviada", "data": "2024-03-16T08:00:00Z"}
        ]);
        let h: StatusHistory<HistoricoFatura> = StatusHistory::parse(value).unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(h.entries()[1].observacao, None);
    }

    #[test]
    fn parse_rejects_malformed_history() {
        let casos = vec![
            json!({"status": "pendente"}),
            json!([{"status": "pendente"}]),
            json!([{"status": "quitada", "data": "2024-03-15T08:00:00Z"}]),
            json!([{"status": "pendente", "data": "2024-03-15T08:00:00Z", "extra": 1}]),
            json!([
                {"status": "enviada", "data": "2024-03-16T08:00:00Z"},
                {"status": "pendente", "data": "2024-03-15T08:00:00Z"}
            ]),
        ];
        for caso in casos {
            let resultado: Result<StatusHistory<HistoricoFatura>, _> = StatusHistory::parse(caso.clone());
            assert!(matches!(resultado, Err(AppError::MalformedHistory(_))), "{caso}");
        }
    }

    #[test]
    fn lancamento_entries_use_previous_and_new_status() {
        let value = json!([
            {"status_anterior": "pendente", "novo_status": "pago", "data": "2024-03-15T08:00:00Z"}
        ]);
        let h: StatusHistory<HistoricoLancamento> = StatusHistory::parse(value.clone()).unwrap();
        assert_eq!(h.entries()[0].novo_status, StatusLancamento::Pago);
        assert_eq!(h.to_json().unwrap(), value);

        // formato de fatura não serve para lançamento
        let errado = json!([{"status": "pago", "data": "2024-03-15T08:00:00Z"}]);
        assert!(StatusHistory::<HistoricoLancamento>::parse(errado).is_err());
    }
}
