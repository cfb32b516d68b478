// src/db/unidade_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_scoped,
        error::{map_unique_violation, AppError},
    },
    models::{
        auth::Sessao,
        unidade::{FiltroUnidades, UnidadeBeneficiaria, UnidadePayload},
        usina::RateioItem,
    },
};

#[async_trait]
pub trait UnidadeRepository: Send + Sync {
    async fn list(&self, sessao: &Sessao, filtro: &FiltroUnidades) -> Result<Vec<UnidadeBeneficiaria>, AppError>;

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<UnidadeBeneficiaria>, AppError>;

    async fn insert(&self, sessao: &Sessao, payload: &UnidadePayload) -> Result<UnidadeBeneficiaria, AppError>;

    async fn update(
        &self,
        sessao: &Sessao,
        id: Uuid,
        payload: &UnidadePayload,
    ) -> Result<Option<UnidadeBeneficiaria>, AppError>;

    async fn set_saida(
        &self,
        sessao: &Sessao,
        id: Uuid,
        data_saida: NaiveDate,
    ) -> Result<Option<UnidadeBeneficiaria>, AppError>;

    /// Unidades ativas que entraram até `ultimo_dia` (candidatas da geração).
    async fn list_active_entered_by(
        &self,
        sessao: &Sessao,
        ultimo_dia: NaiveDate,
    ) -> Result<Vec<UnidadeBeneficiaria>, AppError>;

    /// Substitui o rateio da usina numa única transação.
    async fn replace_rateio(
        &self,
        sessao: &Sessao,
        usina_id: Uuid,
        itens: &[RateioItem],
    ) -> Result<Vec<UnidadeBeneficiaria>, AppError>;
}

const COLUNAS: &str = r#"
    id, cooperativa_id, cooperado_id, numero_uc, apelido,
    cep, logradouro, numero, complemento, bairro, cidade, uf,
    percentual_desconto, data_entrada, data_saida, template_calculo_id,
    usina_id, percentual_rateio, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgUnidadeRepository {
    pool: PgPool,
}

impl PgUnidadeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnidadeRepository for PgUnidadeRepository {
    async fn list(&self, sessao: &Sessao, filtro: &FiltroUnidades) -> Result<Vec<UnidadeBeneficiaria>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            SELECT {COLUNAS} FROM unidades_beneficiarias
            WHERE cooperativa_id = $1
              AND ($2::uuid IS NULL OR cooperado_id = $2)
              AND ($3::uuid IS NULL OR usina_id = $3)
              AND (NOT $4 OR data_saida IS NULL)
            ORDER BY numero_uc
            "#
        );
        let unidades = sqlx::query_as::<_, UnidadeBeneficiaria>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(filtro.cooperado_id)
            .bind(filtro.usina_id)
            .bind(filtro.somente_ativas)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(unidades)
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<UnidadeBeneficiaria>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!("SELECT {COLUNAS} FROM unidades_beneficiarias WHERE id = $1 AND cooperativa_id = $2");
        let unidade = sqlx::query_as::<_, UnidadeBeneficiaria>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(unidade)
    }

    async fn insert(&self, sessao: &Sessao, payload: &UnidadePayload) -> Result<UnidadeBeneficiaria, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            INSERT INTO unidades_beneficiarias (
                cooperativa_id, cooperado_id, numero_uc, apelido,
                cep, logradouro, numero, complemento, bairro, cidade, uf,
                percentual_desconto, data_entrada, template_calculo_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {COLUNAS}
            "#
        );
        let unidade = sqlx::query_as::<_, UnidadeBeneficiaria>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(payload.cooperado_id)
            .bind(&payload.numero_uc)
            .bind(&payload.apelido)
            .bind(&payload.cep)
            .bind(&payload.logradouro)
            .bind(&payload.numero)
            .bind(&payload.complemento)
            .bind(&payload.bairro)
            .bind(&payload.cidade)
            .bind(&payload.uf)
            .bind(payload.percentual_desconto)
            .bind(payload.data_entrada)
            .bind(payload.template_calculo_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, format!("UC {}", payload.numero_uc)))?;

        tx.commit().await?;
        Ok(unidade)
    }

    async fn update(
        &self,
        sessao: &Sessao,
        id: Uuid,
        payload: &UnidadePayload,
    ) -> Result<Option<UnidadeBeneficiaria>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            UPDATE unidades_beneficiarias
            SET cooperado_id = $3, numero_uc = $4, apelido = $5,
                cep = $6, logradouro = $7, numero = $8, complemento = $9,
                bairro = $10, cidade = $11, uf = $12,
                percentual_desconto = $13, data_entrada = $14, template_calculo_id = $15,
                updated_at = NOW()
            WHERE id = $1 AND cooperativa_id = $2
            RETURNING {COLUNAS}
            "#
        );
        let unidade = sqlx::query_as::<_, UnidadeBeneficiaria>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .bind(payload.cooperado_id)
            .bind(&payload.numero_uc)
            .bind(&payload.apelido)
            .bind(&payload.cep)
            .bind(&payload.logradouro)
            .bind(&payload.numero)
            .bind(&payload.complemento)
            .bind(&payload.bairro)
            .bind(&payload.cidade)
            .bind(&payload.uf)
            .bind(payload.percentual_desconto)
            .bind(payload.data_entrada)
            .bind(payload.template_calculo_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, format!("UC {}", payload.numero_uc)))?;

        tx.commit().await?;
        Ok(unidade)
    }

    async fn set_saida(
        &self,
        sessao: &Sessao,
        id: Uuid,
        data_saida: NaiveDate,
    ) -> Result<Option<UnidadeBeneficiaria>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            UPDATE unidades_beneficiarias
            SET data_saida = $3, updated_at = NOW()
            WHERE id = $1 AND cooperativa_id = $2
            RETURNING {COLUNAS}
            "#
        );
        let unidade = sqlx::query_as::<_, UnidadeBeneficiaria>(&sql)
            .bind(id)
            .bind(sessao.cooperativa_id)
            .bind(data_saida)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(unidade)
    }

    async fn list_active_entered_by(
        &self,
        sessao: &Sessao,
        ultimo_dia: NaiveDate,
    ) -> Result<Vec<UnidadeBeneficiaria>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        let sql = format!(
            r#"
            SELECT {COLUNAS} FROM unidades_beneficiarias
            WHERE cooperativa_id = $1
              AND data_saida IS NULL
              AND data_entrada <= $2
            ORDER BY data_entrada, numero_uc
            "#
        );
        let unidades = sqlx::query_as::<_, UnidadeBeneficiaria>(&sql)
            .bind(sessao.cooperativa_id)
            .bind(ultimo_dia)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(unidades)
    }

    async fn replace_rateio(
        &self,
        sessao: &Sessao,
        usina_id: Uuid,
        itens: &[RateioItem],
    ) -> Result<Vec<UnidadeBeneficiaria>, AppError> {
        let mut tx = begin_scoped(&self.pool, sessao).await?;

        sqlx::query(
            r#"
            UPDATE unidades_beneficiarias
            SET usina_id = NULL, percentual_rateio = NULL, updated_at = NOW()
            WHERE usina_id = $1 AND cooperativa_id = $2
            "#,
        )
        .bind(usina_id)
        .bind(sessao.cooperativa_id)
        .execute(&mut *tx)
        .await?;

        for item in itens {
            let result = sqlx::query(
                r#"
                UPDATE unidades_beneficiarias
                SET usina_id = $1, percentual_rateio = $2, updated_at = NOW()
                WHERE id = $3 AND cooperativa_id = $4
                "#,
            )
            .bind(usina_id)
            .bind(item.percentual)
            .bind(item.unidade_beneficiaria_id)
            .bind(sessao.cooperativa_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // drop(tx) faz o rollback
                return Err(AppError::ResourceNotFound(format!(
                    "unidade {}",
                    item.unidade_beneficiaria_id
                )));
            }
        }

        let sql = format!(
            "SELECT {COLUNAS} FROM unidades_beneficiarias WHERE usina_id = $1 AND cooperativa_id = $2 ORDER BY numero_uc"
        );
        let unidades = sqlx::query_as::<_, UnidadeBeneficiaria>(&sql)
            .bind(usina_id)
            .bind(sessao.cooperativa_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(unidades)
    }
}
