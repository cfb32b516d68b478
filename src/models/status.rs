// src/models/status.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

// --- Contrato comum dos ciclos de vida ---

/// Um vocabulário de status com sua tabela de transições.
///
/// A tabela de cada entidade vive somente aqui; serviços e repositórios
/// validam transições através de [`ensure_transition`].
pub trait StatusLifecycle: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Nome da entidade usado nas mensagens de erro.
    const ENTIDADE: &'static str;

    /// Todos os valores do vocabulário, em ordem de declaração.
    const TODOS: &'static [Self];

    /// Próximos status permitidos a partir de `self`.
    fn allowed_next(self) -> &'static [Self];

    fn as_str(self) -> &'static str;

    fn can_transition_to(self, requested: Self) -> bool {
        self.allowed_next().contains(&requested)
    }

    fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }
}

/// Aceita ou rejeita a transição `atual -> solicitado`.
pub fn ensure_transition<S: StatusLifecycle>(atual: S, solicitado: S) -> Result<(), AppError> {
    if atual.can_transition_to(solicitado) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            entidade: S::ENTIDADE,
            atual: atual.as_str().to_string(),
            solicitado: solicitado.as_str().to_string(),
        })
    }
}

// =============================================================================
//  FATURAS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_fatura", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusFatura {
    Pendente,
    Gerada,
    Enviada,
    Corrigida,
    Reenviada,
    Atrasada,
    Paga,
    Finalizada,
}

impl StatusLifecycle for StatusFatura {
    const ENTIDADE: &'static str = "fatura";

    const TODOS: &'static [Self] = &[
        Self::Pendente,
        Self::Gerada,
        Self::Enviada,
        Self::Corrigida,
        Self::Reenviada,
        Self::Atrasada,
        Self::Paga,
        Self::Finalizada,
    ];

    fn allowed_next(self) -> &'static [Self] {
        use StatusFatura::*;
        match self {
            Gerada => &[Pendente],
            Pendente => &[Enviada],
            Enviada => &[Corrigida, Atrasada, Paga],
            Corrigida => &[Reenviada],
            Reenviada => &[Corrigida, Atrasada, Paga],
            Atrasada => &[Paga],
            Paga => &[Finalizada],
            Finalizada => &[],
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::Gerada => "gerada",
            Self::Enviada => "enviada",
            Self::Corrigida => "corrigida",
            Self::Reenviada => "reenviada",
            Self::Atrasada => "atrasada",
            Self::Paga => "paga",
            Self::Finalizada => "finalizada",
        }
    }
}

impl StatusFatura {
    /// Status em que o operador ainda pode lançar os valores da conta.
    pub fn accepts_data_entry(self) -> bool {
        matches!(self, Self::Pendente | Self::Gerada | Self::Corrigida)
    }
}

// =============================================================================
//  LANÇAMENTOS FINANCEIROS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_lancamento", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusLancamento {
    Pendente,
    Pago,
    Atrasado,
    Cancelado,
}

impl StatusLifecycle for StatusLancamento {
    const ENTIDADE: &'static str = "lançamento";

    const TODOS: &'static [Self] = &[Self::Pendente, Self::Pago, Self::Atrasado, Self::Cancelado];

    fn allowed_next(self) -> &'static [Self] {
        use StatusLancamento::*;
        match self {
            Pendente => &[Pago, Cancelado],
            Atrasado => &[Pago, Pendente, Cancelado],
            Pago => &[Pendente],
            Cancelado => &[Pendente],
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::Pago => "pago",
            Self::Atrasado => "atrasado",
            Self::Cancelado => "cancelado",
        }
    }
}

// --- Display / FromStr (parsing estrito, sem fallback) ---

macro_rules! impl_text_conversions {
    ($tipo:ty) => {
        impl fmt::Display for $tipo {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $tipo {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$tipo as StatusLifecycle>::TODOS
                    .iter()
                    .copied()
                    .find(|status| status.as_str() == s)
                    .ok_or_else(|| AppError::UnknownStatus {
                        entidade: <$tipo as StatusLifecycle>::ENTIDADE,
                        valor: s.to_string(),
                    })
            }
        }
    };
}

impl_text_conversions!(StatusFatura);
impl_text_conversions!(StatusLancamento);
