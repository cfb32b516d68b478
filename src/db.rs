pub mod user_repo;
pub use user_repo::{PgUserRepository, UserRepository};
pub mod fatura_repo;
pub use fatura_repo::{FaturaRepository, PgFaturaRepository};
pub mod lancamento_repo;
pub use lancamento_repo::{LancamentoRepository, PgLancamentoRepository};
pub mod unidade_repo;
pub use unidade_repo::{PgUnidadeRepository, UnidadeRepository};
pub mod template_repo;
pub use template_repo::{PgTemplateRepository, TemplateRepository};
pub mod cooperado_repo;
pub use cooperado_repo::{CooperadoRepository, PgCooperadoRepository};
pub mod usina_repo;
pub use usina_repo::{NovoPagamentoUsina, PgUsinaRepository, UsinaRepository};

#[cfg(test)]
pub mod memory;
