use sqlx::{PgPool, Postgres, Transaction};

use crate::common::error::AppError;
use crate::models::auth::Sessao;

// ---
// Helper RLS: a "chave" da cooperativa para o banco de dados
// ---
/// Abre uma transação e define as variáveis RLS da sessão.
///
/// `set_config(..., true)` vale só até o fim da transação, então a conexão
/// volta limpa para a pool.
pub(crate) async fn begin_scoped(
    pool: &PgPool,
    sessao: &Sessao,
) -> Result<Transaction<'static, Postgres>, AppError> {
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT set_config('app.cooperativa_id', $1, true)")
        .bind(sessao.cooperativa_id.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(sessao.user_id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
