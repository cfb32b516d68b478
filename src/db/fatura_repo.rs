// src/db/fatura_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_scoped, error::AppError},
    models::{
        auth::Sessao,
        fatura::{DadosCalculados, Fatura, FaturaRow, FaturaStatusUpdate, FiltroFaturas, NovaFatura},
        periodo::Periodo,
    },
};

#[async_trait]
pub trait FaturaRepository: Send + Sync {
    async fn list(&self, sessao: &Sessao, filtro: &FiltroFaturas) -> Result<Vec<Fatura>, AppError>;

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<Fatura>, AppError>;

    async fn exists_for_period(
        &self,
        sessao: &Sessao,
        unidade_id: Uuid,
        periodo: Periodo,
    ) -> Result<bool, AppError>;

    /// Falha com `UniqueConstraintViolation` se já houver fatura no período.
    async fn insert(&self, sessao: &Sessao, nova: &NovaFatura) -> Result<Fatura, AppError>;

    /// Grava status, histórico e carimbos juntos. `Conflict` se `versao` mudou.
    async fn update_status(&self, sessao: &Sessao, update: &FaturaStatusUpdate) -> Result<Fatura, AppError>;

    async fn update_dados(&self, sessao: &Sessao, dados: &DadosCalculados) -> Result<Fatura, AppError>;

    async fn set_arquivo(&self, sessao: &Sessao, id: Uuid, caminho: &str) -> Result<Fatura, AppError>;

    /// Soma de `economia_mes` das faturas da unidade anteriores ao período.
    async fn sum_economia_before(
        &self,
        sessao: &Sessao,
        unidade_id: Uuid,
        periodo: Periodo,
    ) -> Result<Decimal, AppError>;

    /// Faturas enviadas/reenviadas com vencimento antes de `hoje`.
    async fn list_overdue(&self, sessao: &Sessao, hoje: NaiveDate) -> Result<Vec<Fatura>, AppError>;

    /// Remove a fatura e devolve o caminho do arquivo anexado, se houver.
    async fn delete(&self, sessao: &Sessao, id: Uuid) -> Result<Option<String>, AppError>;
}

const COLUNAS: &str = r#"
    id, cooperativa_id, unidade_beneficiaria_id, mes, ano,
    consumo_kwh, total_fatura, iluminacao_publica, outros_valores, fatura_concessionaria,
    valor_desconto, valor_assinatura, economia_mes, economia_acumulada, saldo_energia_kwh,
    data_vencimento, status, historico_status, arquivo_concessionaria,
    data_envio, data_confirmacao_pagamento, data_pagamento,
    versao, created_at, updated_at
"#;

fn into_faturas(rows: Vec<FaturaRow>) -> Result<Vec<Fatura>, AppError> {
    rows.into_iter().map(Fatura::try_from).collect()
}

#[derive(Clone)]
pub struct PgFaturaRepository {
    pool: PgPool,
}

impl PgFaturaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FaturaRepository for PgFaturaRepository {
    async fn list(&self, sessao: &Sessao, filtro: &FiltroFaturas) -> Result<Vec<Fatura>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            SELECT {COLUNAS}
            FROM faturas
            WHERE cooperativa_id = $1
              AND ($2::int IS NULL OR mes = $2)
              AND ($3::int IS NULL OR ano = $3)
              AND ($4::status_fatura IS NULL OR status = $4)
              AND ($5::uuid IS NULL OR unidade_beneficiaria_id = $5)
            ORDER BY ano DESC, mes DESC, created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, FaturaRow>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(filtro.mes.map(|m| m as i32))
            .bind(filtro.ano)
            .bind(filtro.status)
            .bind(filtro.unidade_beneficiaria_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        into_faturas(rows)
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<Fatura>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!("SELECT {COLUNAS} FROM faturas WHERE id = $1 AND cooperativa_id = $2");
        let row = sqlx::query_as::<_, FaturaRow>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        row.map(Fatura::try_from).transpose()
    }

    async fn exists_for_period(
        &self,
        sessao: &Sessao,
        unidade_id: Uuid,
        periodo: Periodo,
    ) -> Result<bool, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let existe: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM faturas
                WHERE unidade_beneficiaria_id = $1 AND mes = $2 AND ano = $3
            )
            "#,
        )
        .bind(unidade_id)
        .bind(periodo.mes as i32)
        .bind(periodo.ano)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(existe)
    }

    async fn insert(&self, sessao: &Sessao, nova: &NovaFatura) -> Result<Fatura, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        // Valores monetários ficam com o DEFAULT 0 da tabela
        let sql = format!(
            r#"
            INSERT INTO faturas (cooperativa_id, unidade_beneficiaria_id, mes, ano, status, historico_status)
            VALUES ($1, $2, $3, $4, 'pendente', $5)
            RETURNING {COLUNAS}
            "#
        );
        let row = sqlx::query_as::<_, FaturaRow>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(nova.unidade_beneficiaria_id)
            .bind(nova.periodo.mes as i32)
            .bind(nova.periodo.ano)
            .bind(nova.historico_status.to_json()?)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                crate::common::error::map_unique_violation(
                    e,
                    format!("fatura {:02}/{} da unidade {}", nova.periodo.mes, nova.periodo.ano, nova.unidade_beneficiaria_id),
                )
            })?;

        tx.commit().await?;
        Fatura::try_from(row)
    }

    async fn update_status(&self, sessao: &Sessao, update: &FaturaStatusUpdate) -> Result<Fatura, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            UPDATE faturas
            SET status = $3,
                historico_status = $4,
                data_envio = $5,
                data_confirmacao_pagamento = $6,
                data_pagamento = $7,
                versao = versao + 1,
                updated_at = NOW()
            WHERE id = $1 AND versao = $2 AND cooperativa_id = $8
            RETURNING {COLUNAS}
            "#
        );
        let row = sqlx::query_as::<_, FaturaRow>(&sql)
            .bind(update.id)
            .bind(update.versao_esperada)
            .bind(update.novo_status)
            .bind(update.historico_status.to_json()?)
            .bind(update.data_envio)
            .bind(update.data_confirmacao_pagamento)
            .bind(update.data_pagamento)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::Conflict)?;

        tx.commit().await?;
        Fatura::try_from(row)
    }

    async fn update_dados(&self, sessao: &Sessao, dados: &DadosCalculados) -> Result<Fatura, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            UPDATE faturas
            SET consumo_kwh = $3,
                total_fatura = $4,
                iluminacao_publica = $5,
                outros_valores = $6,
                fatura_concessionaria = $7,
                saldo_energia_kwh = $8,
                data_vencimento = $9,
                valor_desconto = $10,
                valor_assinatura = $11,
                economia_mes = $12,
                economia_acumulada = $13,
                versao = versao + 1,
                updated_at = NOW()
            WHERE id = $1 AND versao = $2 AND cooperativa_id = $14
            RETURNING {COLUNAS}
            "#
        );
        let row = sqlx::query_as::<_, FaturaRow>(&sql)
            .bind(dados.id)
            .bind(dados.versao_esperada)
            .bind(dados.consumo_kwh)
            .bind(dados.total_fatura)
            .bind(dados.iluminacao_publica)
            .bind(dados.outros_valores)
            .bind(dados.fatura_concessionaria)
            .bind(dados.saldo_energia_kwh)
            .bind(dados.data_vencimento)
            .bind(dados.valor_desconto)
            .bind(dados.valor_assinatura)
            .bind(dados.economia_mes)
            .bind(dados.economia_acumulada)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::Conflict)?;

        tx.commit().await?;
        Fatura::try_from(row)
    }

    async fn set_arquivo(&self, sessao: &Sessao, id: Uuid, caminho: &str) -> Result<Fatura, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            UPDATE faturas
            SET arquivo_concessionaria = $2, updated_at = NOW()
            WHERE id = $1 AND cooperativa_id = $3
            RETURNING {COLUNAS}
            "#
        );
        let row = sqlx::query_as::<_, FaturaRow>(&sql)
            .bind(id)
            .bind(caminho)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("fatura {}", id)))?;

        tx.commit().await?;
        Fatura::try_from(row)
    }

    async fn sum_economia_before(
        &self,
        sessao: &Sessao,
        unidade_id: Uuid,
        periodo: Periodo,
    ) -> Result<Decimal, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(economia_mes), 0)
            FROM faturas
            WHERE unidade_beneficiaria_id = $1
              AND (ano < $2 OR (ano = $2 AND mes < $3))
            "#,
        )
        .bind(unidade_id)
        .bind(periodo.ano)
        .bind(periodo.mes as i32)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(total)
    }

    async fn list_overdue(&self, sessao: &Sessao, hoje: NaiveDate) -> Result<Vec<Fatura>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            SELECT {COLUNAS}
            FROM faturas
            WHERE cooperativa_id = $1
              AND status IN ('enviada', 'reenviada')
              AND data_vencimento < $2
            ORDER BY data_vencimento
            "#
        );
        let rows = sqlx::query_as::<_, FaturaRow>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(hoje)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        into_faturas(rows)
    }

    async fn delete(&self, sessao: &Sessao, id: Uuid) -> Result<Option<String>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        // A procedure também faz o soft-delete dos lançamentos da fatura
        let arquivo: Option<String> = sqlx::query_scalar("SELECT delete_fatura($1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(arquivo)
    }
}
