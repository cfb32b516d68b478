// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::{clock::Clock, error::AppError, i18n::I18nStore, notifier::Notifier},
    db::{
        CooperadoRepository, FaturaRepository, LancamentoRepository, PgCooperadoRepository, PgFaturaRepository,
        PgLancamentoRepository, PgTemplateRepository, PgUnidadeRepository, PgUserRepository, PgUsinaRepository,
        TemplateRepository, UnidadeRepository, UserRepository, UsinaRepository,
    },
    services::{
        arquivo_storage::ArquivoStorage, auth::AuthService, cep_service::CepService,
        cooperado_service::CooperadoService, document_service::DocumentService, fatura_service::FaturaService,
        lancamento_service::LancamentoService, template_service::TemplateService,
        unidade_service::UnidadeService, usina_service::UsinaService,
    },
};

/// Configuração lida do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub cep_api_url: String,
    pub cep_timeout: Duration,
    pub uploads_dir: PathBuf,
    pub fonts_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().context("DB_MAX_CONNECTIONS inválido")?,
            None => 5,
        };
        let cep_timeout_secs: u64 = match get("CEP_TIMEOUT_SECS") {
            Some(v) => v.parse().context("CEP_TIMEOUT_SECS inválido")?,
            None => 5,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            cep_api_url: get("CEP_API_URL").unwrap_or_else(|| "https://viacep.com.br/ws".to_string()),
            cep_timeout: Duration::from_secs(cep_timeout_secs),
            uploads_dir: get("UPLOADS_DIR").unwrap_or_else(|| "./uploads".to_string()).into(),
            fonts_dir: get("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()).into(),
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

/// Implementações dos repositórios usadas para montar os serviços.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub faturas: Arc<dyn FaturaRepository>,
    pub lancamentos: Arc<dyn LancamentoRepository>,
    pub unidades: Arc<dyn UnidadeRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub cooperados: Arc<dyn CooperadoRepository>,
    pub usinas: Arc<dyn UsinaRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            faturas: Arc::new(PgFaturaRepository::new(pool.clone())),
            lancamentos: Arc::new(PgLancamentoRepository::new(pool.clone())),
            unidades: Arc::new(PgUnidadeRepository::new(pool.clone())),
            templates: Arc::new(PgTemplateRepository::new(pool.clone())),
            cooperados: Arc::new(PgCooperadoRepository::new(pool.clone())),
            usinas: Arc::new(PgUsinaRepository::new(pool)),
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,
    pub notifier: Arc<dyn Notifier>,
    pub auth_service: AuthService,
    pub fatura_service: FaturaService,
    pub lancamento_service: LancamentoService,
    pub template_service: TemplateService,
    pub unidade_service: UnidadeService,
    pub cooperado_service: CooperadoService,
    pub usina_service: UsinaService,
    pub cep_service: CepService,
    pub document_service: DocumentService,
}

impl AppState {
    /// Monta o gráfico de dependências.
    pub fn build(
        settings: Settings,
        repos: Repositories,
        storage: Arc<dyn ArquivoStorage>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppError> {
        let template_service = TemplateService::new(repos.templates.clone());
        let cooperado_service = CooperadoService::new(repos.cooperados.clone(), repos.unidades.clone());

        Ok(Self {
            auth_service: AuthService::new(repos.users.clone(), settings.jwt_secret.clone()),
            fatura_service: FaturaService::new(
                repos.faturas.clone(),
                repos.lancamentos.clone(),
                repos.unidades.clone(),
                template_service.clone(),
                storage,
                clock.clone(),
            ),
            lancamento_service: LancamentoService::new(repos.lancamentos.clone(), clock),
            unidade_service: UnidadeService::new(
                repos.unidades.clone(),
                repos.cooperados.clone(),
                repos.templates.clone(),
            ),
            usina_service: UsinaService::new(repos.usinas, repos.unidades, repos.lancamentos),
            cep_service: CepService::new(settings.cep_api_url.clone(), settings.cep_timeout)?,
            document_service: DocumentService::new(cooperado_service.clone(), settings.fonts_dir.clone()),
            template_service,
            cooperado_service,
            i18n_store: Arc::new(I18nStore::new()),
            notifier,
            settings: Arc::new(settings),
        })
    }
}
