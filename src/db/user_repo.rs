// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::User};

// Fora do escopo RLS: login e registro acontecem antes de existir sessão.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        nome: Option<&str>,
        cooperativa_id: Uuid,
    ) -> Result<User, AppError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, cooperativa_id, email, nome, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, cooperativa_id, email, nome, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    // E-mail duplicado vira EmailAlreadyExists
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        nome: Option<&str>,
        cooperativa_id: Uuid,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, nome, cooperativa_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, cooperativa_id, email, nome, password_hash, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(nome)
        .bind(cooperativa_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return match db_err.constraint() {
                        Some("users_email_key") | None => AppError::EmailAlreadyExists,
                        Some(constraint) => AppError::UniqueConstraintViolation(constraint.to_string()),
                    };
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::ResourceNotFound(format!("cooperativa {}", cooperativa_id));
                }
            }
            e.into()
        })?;

        Ok(user)
    }
}
