pub mod activity_repo;
pub mod assignment_repo;
#[cfg(test)]
pub mod memory;
pub mod project_repo;
pub mod user_repo;
pub mod worker_repo;

pub use activity_repo::{ActivityLogRepository, PgActivityLogRepository};
pub use assignment_repo::{AssignOutcome, AssignmentRepository, PgAssignmentRepository};
#[cfg(test)]
pub use memory::InMemoryStore;
pub use project_repo::{PgProjectRepository, ProjectRepository};
pub use user_repo::{PgUserRepository, UserRepository};
pub use worker_repo::{PgWorkerRepository, WorkerRepository};

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};

use crate::common::error::AppError;

/// Todos os repositórios, atrás de trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub workers: Arc<dyn WorkerRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub activity: Arc<dyn ActivityLogRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            workers: Arc::new(PgWorkerRepository::new(pool.clone())),
            projects: Arc::new(PgProjectRepository::new(pool.clone())),
            assignments: Arc::new(PgAssignmentRepository::new(pool.clone())),
            activity: Arc::new(PgActivityLogRepository::new(pool)),
        }
    }

    #[cfg(test)]
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            users: store.clone(),
            workers: store.clone(),
            projects: store.clone(),
            assignments: store.clone(),
            activity: store,
        }
    }
}

/// Transação somente leitura em REPEATABLE READ: várias consultas veem o mesmo snapshot.
pub(crate) async fn begin_snapshot(pool: &PgPool) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}
