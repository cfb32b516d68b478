pub mod arquivo_storage;
pub mod auth;
pub mod cep_service;
pub mod cooperado_service;
pub mod document_service;
pub mod fatura_service;
pub mod formula;
pub mod lancamento_service;
pub mod template_service;
pub mod unidade_service;
pub mod usina_service;
