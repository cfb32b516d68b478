// src/db/cooperado_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_scoped,
        documento,
        error::{map_unique_violation, AppError},
    },
    models::{
        auth::Sessao,
        cooperado::{Cooperado, CooperadoPayload},
    },
};

#[async_trait]
pub trait CooperadoRepository: Send + Sync {
    async fn list(&self, sessao: &Sessao) -> Result<Vec<Cooperado>, AppError>;

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<Cooperado>, AppError>;

    async fn insert(&self, sessao: &Sessao, payload: &CooperadoPayload) -> Result<Cooperado, AppError>;

    async fn update(&self, sessao: &Sessao, id: Uuid, payload: &CooperadoPayload)
        -> Result<Option<Cooperado>, AppError>;

    async fn soft_delete(&self, sessao: &Sessao, id: Uuid) -> Result<bool, AppError>;
}

const COLUNAS: &str = r#"
    id, cooperativa_id, nome, tipo_pessoa, documento, email, telefone, numero_cadastro,
    cep, logradouro, numero, complemento, bairro, cidade, uf,
    deleted_at, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgCooperadoRepository {
    pool: PgPool,
}

impl PgCooperadoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CooperadoRepository for PgCooperadoRepository {
    async fn list(&self, sessao: &Sessao) -> Result<Vec<Cooperado>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            "SELECT {COLUNAS} FROM cooperados WHERE cooperativa_id = $1 AND deleted_at IS NULL ORDER BY nome"
        );
        let cooperados = sqlx::query_as::<_, Cooperado>(&sql)
            .bind(sessao.cooperativa_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(cooperados)
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<Cooperado>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            "SELECT {COLUNAS} FROM cooperados WHERE id = $1 AND cooperativa_id = $2 AND deleted_at IS NULL"
        );
        let cooperado = sqlx::query_as::<_, Cooperado>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(cooperado)
    }

    async fn insert(&self, sessao: &Sessao, payload: &CooperadoPayload) -> Result<Cooperado, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;
        let doc = documento::normalize(&payload.documento);

        let sql = format!(
            r#"
            INSERT INTO cooperados (
                cooperativa_id, nome, tipo_pessoa, documento, email, telefone, numero_cadastro,
                cep, logradouro, numero, complemento, bairro, cidade, uf
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {COLUNAS}
            "#
        );
        let cooperado = sqlx::query_as::<_, Cooperado>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(&payload.nome)
            .bind(payload.tipo_pessoa)
            .bind(&doc)
            .bind(&payload.email)
            .bind(&payload.telefone)
            .bind(&payload.numero_cadastro)
            .bind(payload.cep.as_deref().map(documento::normalize))
            .bind(&payload.logradouro)
            .bind(&payload.numero)
            .bind(&payload.complemento)
            .bind(&payload.bairro)
            .bind(&payload.cidade)
            .bind(&payload.uf)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, format!("documento {}", doc)))?;

        tx.commit().await?;
        Ok(cooperado)
    }

    async fn update(
        &self,
        sessao: &Sessao,
        id: Uuid,
        payload: &CooperadoPayload,
    ) -> Result<Option<Cooperado>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;
        let doc = documento::normalize(&payload.documento);

        let sql = format!(
            r#"
            UPDATE cooperados
            SET nome = $3, tipo_pessoa = $4, documento = $5, email = $6, telefone = $7,
                numero_cadastro = $8, cep = $9, logradouro = $10, numero = $11,
                complemento = $12, bairro = $13, cidade = $14, uf = $15,
                updated_at = NOW()
            WHERE id = $1 AND cooperativa_id = $2 AND deleted_at IS NULL
            RETURNING {COLUNAS}
            "#
        );
        let cooperado = sqlx::query_as::<_, Cooperado>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .bind(&payload.nome)
            .bind(payload.tipo_pessoa)
            .bind(&doc)
            .bind(&payload.email)
            .bind(&payload.telefone)
            .bind(&payload.numero_cadastro)
            .bind(payload.cep.as_deref().map(documento::normalize))
            .bind(&payload.logradouro)
            .bind(&payload.numero)
            .bind(&payload.complemento)
            .bind(&payload.bairro)
            .bind(&payload.cidade)
            .bind(&payload.uf)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, format!("documento {}", doc)))?;

        tx.commit().await?;
        Ok(cooperado)
    }

    async fn soft_delete(&self, sessao: &Sessao, id: Uuid) -> Result<bool, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let result = sqlx::query(
            r#"
            UPDATE cooperados SET deleted_at = NOW(), updated_at = NOW()
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
}
