// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        error::AppError,
        query::{push_order_and_page, push_search},
    },
    db::begin_snapshot,
    models::auth::{User, UserFilter, UserQuery, UserRole},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'.
// A listagem não tem filtro de tenant: só é chamada no escopo administrativo.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Cria com papel `user`, ativo.
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError>;

    async fn list(&self, query: &UserQuery) -> Result<(Vec<User>, i64), AppError>;

    async fn update_status(&self, id: i64, active: bool) -> Result<Option<User>, AppError>;

    async fn update_role(&self, id: i64, role: UserRole) -> Result<Option<User>, AppError>;
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE TRUE");

    if let Some(term) = &filter.search {
        push_search(qb, &["u.username", "u.email"], term);
    }
    if let Some(role) = filter.role {
        qb.push(" AND u.role = ").push_bind(role);
    }
    if let Some(active) = filter.active {
        qb.push(" AND u.active = ").push_bind(active);
    }
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
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Converte violação de chave única em um erro mais amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return match db_err.constraint() {
                        Some("users_email_key") => AppError::EmailAlreadyExists,
                        _ => AppError::UsernameAlreadyExists,
                    };
                }
            }
            AppError::DatabaseError(e)
        })
    }

    async fn list(&self, query: &UserQuery) -> Result<(Vec<User>, i64), AppError> {
        let mut tx = begin_snapshot(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        push_user_filters(&mut count, &query.filter);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT u.* FROM users u");
        push_user_filters(&mut select, &query.filter);
        push_order_and_page(&mut select, "u", &query.sorting, &query.page);
        let users = select.build_query_as::<User>().fetch_all(&mut *tx).await?;

        tx.commit().await?;
        Ok((users, total))
    }

    async fn update_status(&self, id: i64, active: bool) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET active = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_role(&self, id: i64, role: UserRole) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
