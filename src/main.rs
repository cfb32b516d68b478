//src/main.rs

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod router;
mod services;

#[cfg(test)]
mod test_utils;

use crate::{
    common::{clock::SystemClock, notifier::TracingNotifier},
    config::{AppState, Repositories, Settings},
    services::arquivo_storage::LocalArquivoStorage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Sem configuração válida a aplicação não sobe
    let settings = Settings::from_env()?;
    let pool = settings.connect().await?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let storage = Arc::new(LocalArquivoStorage::new(settings.uploads_dir.clone()));
    let bind_addr = settings.bind_addr.clone();

    let app_state = AppState::build(
        settings,
        Repositories::postgres(pool),
        storage,
        Arc::new(SystemClock),
        Arc::new(TracingNotifier),
    )?;

    let app = router::create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
