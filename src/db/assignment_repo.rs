// src/db/assignment_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::{error::AppError, query::push_order_and_page},
    db::{begin_snapshot, worker_repo::push_worker_filters},
    middleware::tenancy::TenantContext,
    models::{
        project::{Project, ProjectDetail},
        worker::{Worker, WorkerQuery},
    },
};

/// Resultado de uma tentativa de alocação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned,
    AlreadyAssigned,
    ProjectNotFound,
    WorkerNotFound,
}

/// Tabela de junção `worker_projects`.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Confere projeto e trabalhador no tenant e cria o vínculo se ainda não existir.
    async fn assign(&self, tenant: TenantContext, project_id: i64, worker_id: i64) -> Result<AssignOutcome, AppError>;

    /// `false` se o vínculo não existia.
    async fn unassign(&self, tenant: TenantContext, project_id: i64, worker_id: i64) -> Result<bool, AppError>;

    /// Trabalhadores alocados no projeto, por id.
    /// Projeto e trabalhadores alocados lidos do mesmo snapshot. `None` se o projeto não é do tenant.
    async fn project_detail(&self, tenant: TenantContext, project_id: i64) -> Result<Option<ProjectDetail>, AppError>;

    /// Trabalhadores do tenant ainda não alocados no projeto.
    /// O filtro é aplicado antes da paginação; `total` conta só os disponíveis.
    async fn available_workers(
        &self,
        tenant: TenantContext,
        project_id: i64,
        query: &WorkerQuery,
    ) -> Result<(Vec<Worker>, i64), AppError>;
}

fn push_not_assigned(qb: &mut QueryBuilder<'_, Postgres>, project_id: i64) {
    qb.push(
        " AND NOT EXISTS (SELECT 1 FROM worker_projects wp WHERE wp.worker_id = w.id AND wp.project_id = ",
    );
    qb.push_bind(project_id);
    qb.push(")");
}

#[derive(Clone)]
pub struct PgAssignmentRepository {
    pool: PgPool,
}

impl PgAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for PgAssignmentRepository {
    async fn assign(&self, tenant: TenantContext, project_id: i64, worker_id: i64) -> Result<AssignOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE segura as duas linhas até o commit: um DELETE concorrente espera.
        let project: Option<i64> =
            sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 AND user_id = $2 FOR SHARE")
                .bind(project_id)
                .bind(tenant.0)
                .fetch_optional(&mut *tx)
                .await?;
        if project.is_none() {
            return Ok(AssignOutcome::ProjectNotFound);
        }

        let worker: Option<i64> =
            sqlx::query_scalar("SELECT id FROM workers WHERE id = $1 AND user_id = $2 FOR SHARE")
                .bind(worker_id)
                .bind(tenant.0)
                .fetch_optional(&mut *tx)
                .await?;
        if worker.is_none() {
            return Ok(AssignOutcome::WorkerNotFound);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO worker_projects (worker_id, project_id, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (worker_id, project_id) DO NOTHING
            "#,
        )
        .bind(worker_id)
        .bind(project_id)
        .bind(tenant.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(if inserted == 0 {
            AssignOutcome::AlreadyAssigned
        } else {
            AssignOutcome::Assigned
        })
    }

    async fn unassign(&self, tenant: TenantContext, project_id: i64, worker_id: i64) -> Result<bool, AppError> {
        let removed = sqlx::query(
            "DELETE FROM worker_projects WHERE project_id = $1 AND worker_id = $2 AND user_id = $3",
        )
        .bind(project_id)
        .bind(worker_id)
        .bind(tenant.0)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(removed > 0)
    }

    async fn project_detail(&self, tenant: TenantContext, project_id: i64) -> Result<Option<ProjectDetail>, AppError> {
        let mut tx = begin_snapshot(&self.pool).await?;

        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(tenant.0)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(project) = project else {
            tx.commit().await?;
            return Ok(None);
        };

        let workers = sqlx::query_as::<_, Worker>(
            r#"
            SELECT w.*
            FROM workers w
            INNER JOIN worker_projects wp ON wp.worker_id = w.id
            WHERE wp.project_id = $1 AND wp.user_id = $2 AND w.user_id = $2
            ORDER BY w.id ASC
            "#,
        )
        .bind(project_id)
        .bind(tenant.0)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(ProjectDetail { project, workers }))
    }

    async fn available_workers(
        &self,
        tenant: TenantContext,
        project_id: i64,
        query: &WorkerQuery,
    ) -> Result<(Vec<Worker>, i64), AppError> {
        let mut tx = begin_snapshot(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM workers w");
        push_worker_filters(&mut count, tenant, &query.filter);
        push_not_assigned(&mut count, project_id);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT w.* FROM workers w");
        push_worker_filters(&mut select, tenant, &query.filter);
        push_not_assigned(&mut select, project_id);
        push_order_and_page(&mut select, "w", &query.sorting, &query.page);
        let workers = select.build_query_as::<Worker>().fetch_all(&mut *tx).await?;

        tx.commit().await?;
        Ok((workers, total))
    }
}
