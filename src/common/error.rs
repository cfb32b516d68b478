use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Transição de {entidade} inválida: {atual} -> {solicitado}")]
    InvalidTransition {
        entidade: &'static str,
        atual: String,
        solicitado: String,
    },

    #[error("Status de {entidade} desconhecido: {valor}")]
    UnknownStatus { entidade: &'static str, valor: String },

    #[error("Histórico de status malformado: {0}")]
    MalformedHistory(String),

    #[error("Período inválido: {mes}/{ano}")]
    InvalidPeriod { mes: u32, ano: i32 },

    #[error("Período futuro: {mes}/{ano}")]
    FuturePeriod { mes: u32, ano: i32 },

    #[error("Template {0} em uso por unidades beneficiárias")]
    TemplateInUse(Uuid),

    #[error("Nenhum template de cálculo disponível")]
    TemplateNotConfigured,

    #[error("Fórmula inválida: {0}")]
    InvalidFormula(String),

    #[error("Fatura em status {0} não aceita lançamento de dados")]
    DataEntryLocked(String),

    #[error("Rateio excede 100%: {0}")]
    RateioExceeded(String),

    #[error("Registro alterado por outra sessão")]
    Conflict,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("CEP não encontrado: {0}")]
    CepNotFound(String),

    #[error("Serviço de CEP indisponível: {0}")]
    CepServiceUnavailable(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de armazenamento de arquivo: {0}")]
    StorageError(#[from] std::io::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Formato HTTP dos erros.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Chave da mensagem no catálogo de traduções.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::UnknownStatus { .. } => "unknown_status",
            AppError::MalformedHistory(_) => "malformed_history",
            AppError::InvalidPeriod { .. } => "invalid_period",
            AppError::FuturePeriod { .. } => "future_period",
            AppError::TemplateInUse(_) => "template_in_use",
            AppError::TemplateNotConfigured => "template_not_configured",
            AppError::InvalidFormula(_) => "invalid_formula",
            AppError::DataEntryLocked(_) => "data_entry_locked",
            AppError::RateioExceeded(_) => "rateio_exceeded",
            AppError::Conflict => "conflict",
            AppError::ResourceNotFound(_) => "resource_not_found",
            AppError::UniqueConstraintViolation(_) => "unique_violation",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::CepNotFound(_) => "cep_not_found",
            AppError::CepServiceUnavailable(_) => "cep_unavailable",
            _ => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidPeriod { .. }
            | AppError::UnknownStatus { .. }
            | AppError::InvalidFormula(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. }
            | AppError::FuturePeriod { .. }
            | AppError::TemplateInUse(_)
            | AppError::TemplateNotConfigured
            | AppError::DataEntryLocked(_)
            | AppError::RateioExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict
            | AppError::UniqueConstraintViolation(_)
            | AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::ResourceNotFound(_) | AppError::UserNotFound | AppError::CepNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::CepServiceUnavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Traduz o erro para a resposta HTTP no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        } else {
            tracing::warn!(code = self.code(), "{}", self);
        }

        let mut message = store.translate(&locale.0, self.code());
        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(details))
            }
            AppError::InvalidTransition { entidade, atual, solicitado } => {
                Some(json!({ "entidade": entidade, "atual": atual, "solicitado": solicitado }))
            }
            AppError::FuturePeriod { mes, ano } | AppError::InvalidPeriod { mes, ano } => {
                Some(json!({ "mes": mes, "ano": ano }))
            }
            AppError::TemplateInUse(id) => Some(json!({ "templateId": id })),
            AppError::InvalidFormula(detail)
            | AppError::RateioExceeded(detail)
            | AppError::MalformedHistory(detail) => Some(json!({ "detail": detail })),
            AppError::ResourceNotFound(what)
            | AppError::UniqueConstraintViolation(what)
            | AppError::CepNotFound(what) => {
                message = format!("{} ({})", message, what);
                None
            }
            _ => None,
        };

        ApiError { status, error: message, details }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error(&Locale::default(), I18nStore::shared())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Converte violação de unicidade do Postgres em erro de negócio.
pub fn map_unique_violation(e: sqlx::Error, what: impl Into<String>) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(what.into());
        }
    }
    AppError::DatabaseError(e)
}

/// Converte violação de chave estrangeira no erro de negócio informado.
pub fn map_foreign_key_violation(e: sqlx::Error, erro: AppError) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return erro;
        }
    }
    AppError::DatabaseError(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_is_unprocessable_with_details() {
        let err = AppError::InvalidTransition {
            entidade: "fatura",
            atual: "enviada".into(),
            solicitado: "finalizada".into(),
        };
        let api = err.to_api_error(&Locale("pt".into()), I18nStore::shared());
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.details.unwrap()["solicitado"], "finalizada");
    }

    #[test]
    fn messages_follow_locale() {
        let store = I18nStore::shared();
        let pt = AppError::TemplateInUse(Uuid::nil()).to_api_error(&Locale("pt".into()), store);
        let en = AppError::TemplateInUse(Uuid::nil()).to_api_error(&Locale("en".into()), store);
        assert_ne!(pt.error, en.error);
        assert_eq!(pt.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("segredo"));
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
        assert!(api.details.is_none());
    }

    #[derive(Debug)]
    struct ChaveEstrangeira;

    impl std::fmt::Display for ChaveEstrangeira {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("violates foreign key constraint")
        }
    }

    impl std::error::Error for ChaveEstrangeira {}

    impl sqlx::error::DatabaseError for ChaveEstrangeira {
        fn message(&self) -> &str {
            "violates foreign key constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::ForeignKeyViolation
        }
    }

    #[test]
    fn foreign_key_violation_becomes_business_error() {
        let id = Uuid::from_u128(7);
        let err = map_foreign_key_violation(
            sqlx::Error::Database(Box::new(ChaveEstrangeira)),
            AppError::TemplateInUse(id),
        );
        assert!(matches!(err, AppError::TemplateInUse(t) if t == id));

        let err = map_foreign_key_violation(sqlx::Error::RowNotFound, AppError::TemplateInUse(id));
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
