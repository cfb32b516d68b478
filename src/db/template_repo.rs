// src/db/template_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_scoped,
        error::{map_foreign_key_violation, map_unique_violation, AppError},
    },
    models::{
        auth::Sessao,
        template::{TemplateCalculo, TemplatePayload},
    },
};

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn list(&self, sessao: &Sessao) -> Result<Vec<TemplateCalculo>, AppError>;

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<TemplateCalculo>, AppError>;

    async fn get_default(&self, sessao: &Sessao) -> Result<Option<TemplateCalculo>, AppError>;

    /// Com `is_padrao`, rebaixa os demais e grava o novo na mesma transação.
    async fn insert(&self, sessao: &Sessao, payload: &TemplatePayload) -> Result<TemplateCalculo, AppError>;

    async fn update(
        &self,
        sessao: &Sessao,
        id: Uuid,
        payload: &TemplatePayload,
    ) -> Result<Option<TemplateCalculo>, AppError>;

    /// Tira `is_padrao` de todos os templates exceto `except_id`.
    async fn reset_default_templates(&self, sessao: &Sessao, except_id: Option<Uuid>) -> Result<u64, AppError>;

    /// Falha com `TemplateInUse` se alguma unidade ainda usa o template.
    async fn delete(&self, sessao: &Sessao, id: Uuid) -> Result<bool, AppError>;
}

const COLUNAS: &str = r#"
    id, cooperativa_id, nome, descricao, formula_desconto, formula_assinatura,
    is_padrao, created_at, updated_at
"#;

async fn reset_defaults_in(
    tx: &mut Transaction<'static, Postgres>,
    cooperativa_id: Uuid,
    except_id: Option<Uuid>,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE templates_calculo
        SET is_padrao = FALSE, updated_at = NOW()
        WHERE cooperativa_id = $1
          AND is_padrao
          AND ($2::uuid IS NULL OR id <> $2)
        "#,
    )
    .bind(cooperativa_id)
    .bind(except_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

#[derive(Clone)]
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn list(&self, sessao: &Sessao) -> Result<Vec<TemplateCalculo>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            "SELECT {COLUNAS} FROM templates_calculo WHERE cooperativa_id = $1 ORDER BY is_padrao DESC, nome"
        );
        let templates = sqlx::query_as::<_, TemplateCalculo>(&sql)
            .bind(sessao.cooperativa_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(templates)
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<TemplateCalculo>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!("SELECT {COLUNAS} FROM templates_calculo WHERE id = $1 AND cooperativa_id = $2");
        let template = sqlx::query_as::<_, TemplateCalculo>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(template)
    }

    async fn get_default(&self, sessao: &Sessao) -> Result<Option<TemplateCalculo>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!("SELECT {COLUNAS} FROM get_default_template($1)");
        let template = sqlx::query_as::<_, TemplateCalculo>(&sql)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(template)
    }

    async fn insert(&self, sessao: &Sessao, payload: &TemplatePayload) -> Result<TemplateCalculo, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        if payload.is_padrao {
            reset_defaults_in(&mut tx, sessao.cooperativa_id, None).await?;
        }

        let sql = format!(
            r#"
            INSERT INTO templates_calculo (cooperativa_id, nome, descricao, formula_desconto, formula_assinatura, is_padrao)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUNAS}
            "#
        );
        let template = sqlx::query_as::<_, TemplateCalculo>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(&payload.nome)
            .bind(&payload.descricao)
            .bind(&payload.formula_desconto)
            .bind(&payload.formula_assinatura)
            .bind(payload.is_padrao)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, "template padrão"))?;

        tx.commit().await?;
        Ok(template)
    }

    async fn update(
        &self,
        sessao: &Sessao,
        id: Uuid,
        payload: &TemplatePayload,
    ) -> Result<Option<TemplateCalculo>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        if payload.is_padrao {
            reset_defaults_in(&mut tx, sessao.cooperativa_id, Some(id)).await?;
        }

        let sql = format!(
            r#"
            UPDATE templates_calculo
            SET nome = $3, descricao = $4, formula_desconto = $5, formula_assinatura = $6,
                is_padrao = $7, updated_at = NOW()
            WHERE id = $1 AND cooperativa_id = $2
            RETURNING {COLUNAS}
            "#
        );
        let template = sqlx::query_as::<_, TemplateCalculo>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .bind(&payload.nome)
            .bind(&payload.descricao)
            .bind(&payload.formula_desconto)
            .bind(&payload.formula_assinatura)
            .bind(payload.is_padrao)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, "template padrão"))?;

        // Template inexistente: nada é gravado, nem o reset
        if template.is_none() {
            return Ok(None);
        }

        tx.commit().await?;
        Ok(template)
    }

    async fn reset_default_templates(&self, sessao: &Sessao, except_id: Option<Uuid>) -> Result<u64, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;
        let rebaixados = reset_defaults_in(&mut tx, sessao.cooperativa_id, except_id).await?;
        tx.commit().await?;
        Ok(rebaixados)
    }

    async fn delete(&self, sessao: &Sessao, id: Uuid) -> Result<bool, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let em_uso: bool = sqlx::query_scalar("SELECT check_template_in_use($1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if em_uso {
            return Err(AppError::TemplateInUse(id));
        }

        // Unidade vinculada depois da checagem cai na FK
        let result = sqlx::query("DELETE FROM templates_calculo WHERE id = $1 AND cooperativa_id = $2")
            .bind(id)
            .bind(sessao.cooperativa_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_foreign_key_violation(e, AppError::TemplateInUse(id)))?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    const MIGRACAO: &str = include_str!("../../migrations/0001_init.sql");

    #[test]
    fn schema_allows_a_single_default_per_cooperative() {
        assert!(MIGRACAO.contains(
            "CREATE UNIQUE INDEX templates_padrao_unico ON templates_calculo (cooperativa_id) WHERE is_padrao;"
        ));
    }
}
