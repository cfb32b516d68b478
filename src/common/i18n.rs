// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "pt";

/// Catálogo de mensagens de erro por idioma.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

const PT: &[(&str, &str)] = &[
    ("validation_error", "Um ou mais campos são inválidos."),
    ("invalid_transition", "Transição de status não permitida."),
    ("unknown_status", "Status desconhecido."),
    ("malformed_history", "Histórico de status corrompido."),
    ("invalid_period", "Mês ou ano inválido."),
    ("future_period", "Não é possível gerar faturas para um mês futuro."),
    ("template_in_use", "Este template está em uso por unidades beneficiárias e não pode ser excluído."),
    ("template_not_configured", "Nenhum template de cálculo configurado para a unidade."),
    ("invalid_formula", "Fórmula inválida."),
    ("data_entry_locked", "A fatura não pode ser editada no status atual."),
    ("rateio_exceeded", "A soma do rateio não pode ultrapassar 100%."),
    ("conflict", "O registro foi alterado por outra sessão. Recarregue e tente novamente."),
    ("resource_not_found", "Registro não encontrado."),
    ("unique_violation", "Registro duplicado."),
    ("email_already_exists", "Este e-mail já está em uso."),
    ("invalid_credentials", "E-mail ou senha inválidos."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("user_not_found", "Usuário não encontrado."),
    ("cep_not_found", "CEP não encontrado. Preencha o endereço manualmente."),
    ("cep_unavailable", "Consulta de CEP indisponível. Preencha o endereço manualmente."),
    ("internal_error", "Ocorreu um erro inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("validation_error", "One or more fields are invalid."),
    ("invalid_transition", "Status transition not allowed."),
    ("unknown_status", "Unknown status."),
    ("malformed_history", "Corrupted status history."),
    ("invalid_period", "Invalid month or year."),
    ("future_period", "Invoices cannot be generated for a future month."),
    ("template_in_use", "This template is used by billing units and cannot be deleted."),
    ("template_not_configured", "No calculation template configured for the billing unit."),
    ("invalid_formula", "Invalid formula."),
    ("data_entry_locked", "The invoice cannot be edited in its current status."),
    ("rateio_exceeded", "The allocation total cannot exceed 100%."),
    ("conflict", "The record was changed by another session. Reload and try again."),
    ("resource_not_found", "Record not found."),
    ("unique_violation", "Duplicate record."),
    ("email_already_exists", "This e-mail is already in use."),
    ("invalid_credentials", "Invalid e-mail or password."),
    ("invalid_token", "Missing or invalid authentication token."),
    ("user_not_found", "User not found."),
    ("cep_not_found", "Postal code not found. Fill in the address manually."),
    ("cep_unavailable", "Postal code lookup unavailable. Fill in the address manually."),
    ("internal_error", "An unexpected error occurred."),
];

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();
        messages.insert("pt", PT.iter().copied().collect());
        messages.insert("en", EN.iter().copied().collect());
        Self { messages }
    }

    /// Instância global, usada quando não há estado da aplicação à mão.
    pub fn shared() -> &'static I18nStore {
        static STORE: OnceLock<I18nStore> = OnceLock::new();
        STORE.get_or_init(I18nStore::new)
    }

    pub fn translate(&self, lang: &str, code: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|catalog| catalog.get(code))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|c| c.get(code)))
            .map(|m| m.to_string())
            .unwrap_or_else(|| code.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(store.translate("fr", "conflict"), store.translate("pt", "conflict"));
    }

    #[test]
    fn catalogs_cover_the_same_codes() {
        let pt: Vec<_> = PT.iter().map(|(k, _)| *k).collect();
        let en: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        assert_eq!(pt, en);
    }
}
