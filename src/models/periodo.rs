// src/models/periodo.rs

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

/// Mês de referência de uma fatura (ou de um pagamento de usina).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct Periodo {
    // `ano` primeiro: a ordem derivada fica cronológica
    pub ano: i32,
    pub mes: u32,
}

impl Periodo {
    pub fn new(mes: u32, ano: i32) -> Result<Self, AppError> {
        if !(1..=12).contains(&mes) || !(2000..=2100).contains(&ano) {
            return Err(AppError::InvalidPeriod { mes, ano });
        }
        Ok(Self { ano, mes })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self { ano: date.year(), mes: date.month() }
    }

    pub fn first_day(&self) -> NaiveDate {
        // mes validado em `new`
        NaiveDate::from_ymd_opt(self.ano, self.mes, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    pub fn next(&self) -> Self {
        if self.mes == 12 {
            Self { ano: self.ano + 1, mes: 1 }
        } else {
            Self { ano: self.ano, mes: self.mes + 1 }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }

    /// Verdadeiro se o período começa depois do mês de `hoje`.
    pub fn is_future(&self, hoje: NaiveDate) -> bool {
        *self > Self::of(hoje)
    }
}
