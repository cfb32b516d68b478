// src/db/lancamento_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_scoped, error::AppError},
    models::{
        auth::Sessao,
        lancamento::{FiltroLancamentos, LancamentoFinanceiro, LancamentoRow, LancamentoStatusUpdate, NovoLancamento},
    },
};

/// Lançamentos com `deleted_at` preenchido não aparecem em nenhuma consulta.
#[async_trait]
pub trait LancamentoRepository: Send + Sync {
    async fn list(&self, sessao: &Sessao, filtro: &FiltroLancamentos) -> Result<Vec<LancamentoFinanceiro>, AppError>;

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<LancamentoFinanceiro>, AppError>;

    async fn find_by_fatura(&self, sessao: &Sessao, fatura_id: Uuid) -> Result<Option<LancamentoFinanceiro>, AppError>;

    async fn insert(&self, sessao: &Sessao, novo: &NovoLancamento) -> Result<LancamentoFinanceiro, AppError>;

    async fn update_status(
        &self,
        sessao: &Sessao,
        update: &LancamentoStatusUpdate,
    ) -> Result<LancamentoFinanceiro, AppError>;

    /// Devolve `false` se o lançamento não existe (ou já foi excluído).
    async fn soft_delete(&self, sessao: &Sessao, id: Uuid) -> Result<bool, AppError>;

    async fn list_overdue(&self, sessao: &Sessao, hoje: NaiveDate) -> Result<Vec<LancamentoFinanceiro>, AppError>;
}

const COLUNAS: &str = r#"
    id, cooperativa_id, tipo, descricao, valor, valor_pago, juros, desconto,
    data_vencimento, data_pagamento, status, historico_status,
    fatura_id, pagamento_usina_id, cooperado_id, observacao,
    deleted_at, versao, created_at, updated_at
"#;

fn into_lancamentos(rows: Vec<LancamentoRow>) -> Result<Vec<LancamentoFinanceiro>, AppError> {
    rows.into_iter().map(LancamentoFinanceiro::try_from).collect()
}

#[derive(Clone)]
pub struct PgLancamentoRepository {
    pool: PgPool,
}

impl PgLancamentoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LancamentoRepository for PgLancamentoRepository {
    async fn list(&self, sessao: &Sessao, filtro: &FiltroLancamentos) -> Result<Vec<LancamentoFinanceiro>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        // get_lancamentos_by_tipo já filtra cooperativa (RLS) e excluídos
        let sql = format!(
            r#"
            SELECT {COLUNAS}
            FROM get_lancamentos_by_tipo($1)
            WHERE ($2::status_lancamento IS NULL OR status = $2)
            ORDER BY data_vencimento, created_at
            "#
        );
        let rows = sqlx::query_as::<_, LancamentoRow>(&sql)
            .bind(filtro.tipo)
            .bind(filtro.status)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        into_lancamentos(rows)
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<LancamentoFinanceiro>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            SELECT {COLUNAS} FROM lancamentos_financeiros
            WHERE id = $1 AND cooperativa_id = $2 AND deleted_at IS NULL
            "#
        );
        let row = sqlx::query_as::<_, LancamentoRow>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        row.map(LancamentoFinanceiro::try_from).transpose()
    }

    async fn find_by_fatura(&self, sessao: &Sessao, fatura_id: Uuid) -> Result<Option<LancamentoFinanceiro>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            SELECT {COLUNAS} FROM lancamentos_financeiros
            WHERE fatura_id = $1 AND cooperativa_id = $2 AND deleted_at IS NULL
            ORDER BY created_at
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, LancamentoRow>(&sql)
            .bind(fatura_id)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        row.map(LancamentoFinanceiro::try_from).transpose()
    }

    async fn insert(&self, sessao: &Sessao, novo: &NovoLancamento) -> Result<LancamentoFinanceiro, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            INSERT INTO lancamentos_financeiros (
                cooperativa_id, tipo, descricao, valor, data_vencimento,
                status, historico_status,
                fatura_id, pagamento_usina_id, cooperado_id, observacao
            )
            VALUES ($1, $2, $3, $4, $5, 'pendente', '[]'::jsonb, $6, $7, $8, $9)
            RETURNING {COLUNAS}
            "#
        );
        let row = sqlx::query_as::<_, LancamentoRow>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(novo.tipo)
            .bind(&novo.descricao)
            .bind(novo.valor)
            .bind(novo.data_vencimento)
            .bind(novo.fatura_id)
            .bind(novo.pagamento_usina_id)
            .bind(novo.cooperado_id)
            .bind(&novo.observacao)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        LancamentoFinanceiro::try_from(row)
    }

    async fn update_status(
        &self,
        sessao: &Sessao,
        update: &LancamentoStatusUpdate,
    ) -> Result<LancamentoFinanceiro, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            UPDATE lancamentos_financeiros
            SET status = $3,
                historico_status = $4,
                data_pagamento = $5,
                valor_pago = $6,
                juros = $7,
                desconto = $8,
                observacao = $9,
                versao = versao + 1,
                updated_at = NOW()
            WHERE id = $1 AND versao = $2 AND cooperativa_id = $10 AND deleted_at IS NULL
            RETURNING {COLUNAS}
            "#
        );
        let row = sqlx::query_as::<_, LancamentoRow>(&sql)
            .bind(update.id)
            .bind(update.versao_esperada)
            .bind(update.novo_status)
            .bind(update.historico_status.to_json()?)
            .bind(update.data_pagamento)
            .bind(update.valor_pago)
            .bind(update.juros)
            .bind(update.desconto)
            .bind(&update.observacao)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::Conflict)?;

        tx.commit().await?;
        LancamentoFinanceiro::try_from(row)
    }

    async fn soft_delete(&self, sessao: &Sessao, id: Uuid) -> Result<bool, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let result = sqlx::query(
            r#"
            UPDATE lancamentos_financeiros
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND cooperativa_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(sessao.cooperativa_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_overdue(&self, sessao: &Sessao, hoje: NaiveDate) -> Result<Vec<LancamentoFinanceiro>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            SELECT {COLUNAS} FROM lancamentos_financeiros
            WHERE cooperativa_id = $1
              AND deleted_at IS NULL
              AND status = 'pendente'
              AND data_vencimento < $2
            ORDER BY data_vencimento
            "#
        );
        let rows = sqlx::query_as::<_, LancamentoRow>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(hoje)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        into_lancamentos(rows)
    }
}
