// src/db/activity_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::{error::AppError, query::PageRequest},
    db::begin_snapshot,
    models::activity::ActivityLog,
};

const COUNT_FOR_USER: &str = "SELECT COUNT(*) FROM activity_logs WHERE user_id = $1";

// Desempate pelo id v7, que preserva a ordem de enfileiramento.
const PAGE_FOR_USER: &str =
    "SELECT * FROM activity_logs WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3";

/// Log de atividades: só inserção e leitura.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn append(&self, entry: &ActivityLog) -> Result<(), AppError>;

    /// Entradas do usuário, mais recentes primeiro.
    async fn list_for_user(&self, user_id: i64, page: PageRequest) -> Result<(Vec<ActivityLog>, i64), AppError>;
}

#[derive(Clone)]
pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn append(&self, entry: &ActivityLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, user_id, log_type, entity_type, entity_id, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.log_type)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: i64, page: PageRequest) -> Result<(Vec<ActivityLog>, i64), AppError> {
        // O worker continua gravando: total e página precisam do mesmo snapshot.
        let mut tx = begin_snapshot(&self.pool).await?;

        let total: i64 = sqlx::query_scalar(COUNT_FOR_USER)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        let entries = sqlx::query_as::<_, ActivityLog>(PAGE_FOR_USER)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((entries, total))
    }
}
