// src/db/usina_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_scoped,
        error::{map_unique_violation, AppError},
    },
    models::{
        auth::Sessao,
        periodo::Periodo,
        usina::{PagamentoUsina, Usina, UsinaPayload},
    },
};

/// Dados de um pagamento de usina já resolvidos (valor total calculado).
#[derive(Debug, Clone)]
pub struct NovoPagamentoUsina {
    pub usina_id: Uuid,
    pub periodo: Periodo,
    pub geracao_kwh: Decimal,
    pub valor_total: Decimal,
    pub data_vencimento: NaiveDate,
}

#[async_trait]
pub trait UsinaRepository: Send + Sync {
    async fn list(&self, sessao: &Sessao) -> Result<Vec<Usina>, AppError>;

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<Usina>, AppError>;

    async fn insert(&self, sessao: &Sessao, payload: &UsinaPayload) -> Result<Usina, AppError>;

    async fn update(&self, sessao: &Sessao, id: Uuid, payload: &UsinaPayload) -> Result<Option<Usina>, AppError>;

    /// Um pagamento por usina e período.
    async fn insert_pagamento(&self, sessao: &Sessao, novo: &NovoPagamentoUsina) -> Result<PagamentoUsina, AppError>;

    async fn list_pagamentos(&self, sessao: &Sessao, usina_id: Uuid) -> Result<Vec<PagamentoUsina>, AppError>;
}

const COLUNAS: &str = r#"
    id, cooperativa_id, nome, potencia_kwp, investidor_nome, investidor_documento,
    valor_kwh, ativa, created_at, updated_at
"#;

const COLUNAS_PAGAMENTO: &str = r#"
    id, cooperativa_id, usina_id, mes, ano, geracao_kwh, valor_total, data_vencimento, created_at
"#;

#[derive(Clone)]
pub struct PgUsinaRepository {
    pool: PgPool,
}

impl PgUsinaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsinaRepository for PgUsinaRepository {
    async fn list(&self, sessao: &Sessao) -> Result<Vec<Usina>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!("SELECT {COLUNAS} FROM usinas WHERE cooperativa_id = $1 ORDER BY nome");
        let usinas = sqlx::query_as::<_, Usina>(&sql)
            .bind(sessao.cooperativa_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(usinas)
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<Usina>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!("SELECT {COLUNAS} FROM usinas WHERE id = $1 AND cooperativa_id = $2");
        let usina = sqlx::query_as::<_, Usina>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(usina)
    }

    async fn insert(&self, sessao: &Sessao, payload: &UsinaPayload) -> Result<Usina, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            INSERT INTO usinas (cooperativa_id, nome, potencia_kwp, investidor_nome, investidor_documento, valor_kwh, ativa)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUNAS}
            "#
        );
        let usina = sqlx::query_as::<_, Usina>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(&payload.nome)
            .bind(payload.potencia_kwp)
            .bind(&payload.investidor_nome)
            .bind(&payload.investidor_documento)
            .bind(payload.valor_kwh)
            .bind(payload.ativa)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(usina)
    }

    async fn update(&self, sessao: &Sessao, id: Uuid, payload: &UsinaPayload) -> Result<Option<Usina>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            UPDATE usinas
            SET nome = $3, potencia_kwp = $4, investidor_nome = $5, investidor_documento = $6,
                valor_kwh = $7, ativa = $8, updated_at = NOW()
            WHERE id = $1 AND cooperativa_id = $2
            RETURNING {COLUNAS}
            "#
        );
        let usina = sqlx::query_as::<_, Usina>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .bind(&payload.nome)
            .bind(payload.potencia_kwp)
            .bind(&payload.investidor_nome)
            .bind(&payload.investidor_documento)
            .bind(payload.valor_kwh)
            .bind(payload.ativa)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(usina)
    }

    async fn insert_pagamento(&self, sessao: &Sessao, novo: &NovoPagamentoUsina) -> Result<PagamentoUsina, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            INSERT INTO pagamentos_usina (cooperativa_id, usina_id, mes, ano, geracao_kwh, valor_total, data_vencimento)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUNAS_PAGAMENTO}
            "#
        );
        let pagamento = sqlx::query_as::<_, PagamentoUsina>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(novo.usina_id)
            .bind(novo.periodo.mes as i32)
            .bind(novo.periodo.ano)
            .bind(novo.geracao_kwh)
            .bind(novo.valor_total)
            .bind(novo.data_vencimento)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                map_unique_violation(e, format!("pagamento {:02}/{}", novo.periodo.mes, novo.periodo.ano))
            })?;

        tx.commit().await?;
        Ok(pagamento)
    }

    async fn list_pagamentos(&self, sessao: &Sessao, usina_id: Uuid) -> Result<Vec<PagamentoUsina>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            SELECT {COLUNAS_PAGAMENTO} FROM pagamentos_usina
            WHERE usina_id = $1 AND cooperativa_id = $2
            ORDER BY ano DESC, mes DESC
            "#
        );
        let pagamentos = sqlx::query_as::<_, PagamentoUsina>(&sql)
            .bind(usina_id)
            .bind(sessao.cooperativa_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(pagamentos)
    }
}
