// src/db/worker_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        error::AppError,
        query::{like_pattern, push_order_and_page, push_search, push_tenant_scope},
    },
    db::begin_snapshot,
    middleware::tenancy::TenantContext,
    models::worker::{Worker, WorkerFilter, WorkerPayload, WorkerQuery},
};

/// Acesso à tabela `workers`, sempre escopado pelo tenant.
#[async_trait]
pub trait WorkerRepository: Send + Sync {
    /// Página de trabalhadores e o total filtrado (antes da paginação).
    async fn list(&self, tenant: TenantContext, query: &WorkerQuery) -> Result<(Vec<Worker>, i64), AppError>;

    async fn find_by_id(&self, tenant: TenantContext, id: i64) -> Result<Option<Worker>, AppError>;

    async fn create(&self, tenant: TenantContext, payload: &WorkerPayload) -> Result<Worker, AppError>;

    /// `None` se a linha não existe ou pertence a outro tenant.
    async fn update(
        &self,
        tenant: TenantContext,
        id: i64,
        payload: &WorkerPayload,
    ) -> Result<Option<Worker>, AppError>;

    /// Remove o trabalhador e suas alocações na mesma transação.
    async fn delete(&self, tenant: TenantContext, id: i64) -> Result<bool, AppError>;
}

pub(crate) fn push_worker_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    tenant: TenantContext,
    filter: &WorkerFilter,
) {
    push_tenant_scope(qb, "w", tenant);

    if let Some(term) = &filter.search {
        push_search(qb, &["w.name", "w.position"], term);
    }
    if let Some(position) = &filter.position {
        qb.push(" AND w.position ILIKE ").push_bind(like_pattern(position));
    }
    if let Some(min) = filter.min_age {
        qb.push(" AND w.age >= ").push_bind(min);
    }
    if let Some(max) = filter.max_age {
        qb.push(" AND w.age <= ").push_bind(max);
    }
    if let Some(min) = filter.min_salary {
        qb.push(" AND w.salary >= ").push_bind(min);
    }
    if let Some(max) = filter.max_salary {
        qb.push(" AND w.salary <= ").push_bind(max);
    }
}

#[derive(Clone)]
pub struct PgWorkerRepository {
    pool: PgPool,
}

impl PgWorkerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkerRepository for PgWorkerRepository {
    async fn list(&self, tenant: TenantContext, query: &WorkerQuery) -> Result<(Vec<Worker>, i64), AppError> {
        // Contagem e página sobre o mesmo snapshot.
        let mut tx = begin_snapshot(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM workers w");
        push_worker_filters(&mut count, tenant, &query.filter);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT w.* FROM workers w");
        push_worker_filters(&mut select, tenant, &query.filter);
        push_order_and_page(&mut select, "w", &query.sorting, &query.page);
        let workers = select.build_query_as::<Worker>().fetch_all(&mut *tx).await?;

        tx.commit().await?;
        Ok((workers, total))
    }

    async fn find_by_id(&self, tenant: TenantContext, id: i64) -> Result<Option<Worker>, AppError> {
        let worker = sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(tenant.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(worker)
    }

    async fn create(&self, tenant: TenantContext, payload: &WorkerPayload) -> Result<Worker, AppError> {
        let worker = sqlx::query_as::<_, Worker>(
            r#"
            INSERT INTO workers (user_id, name, position, age, salary)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant.0)
        .bind(&payload.name)
        .bind(&payload.position)
        .bind(payload.age)
        .bind(payload.salary)
        .fetch_one(&self.pool)
        .await?;
        Ok(worker)
    }

    async fn update(
        &self,
        tenant: TenantContext,
        id: i64,
        payload: &WorkerPayload,
    ) -> Result<Option<Worker>, AppError> {
        // O predicado de dono vai no próprio UPDATE: checagem na linha, não só na montagem.
        let worker = sqlx::query_as::<_, Worker>(
            r#"
            UPDATE workers
            SET name = $1, position = $2, age = $3, salary = $4, updated_at = NOW()
            WHERE id = $5 AND user_id = $6
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.position)
        .bind(payload.age)
        .bind(payload.salary)
        .bind(id)
        .bind(tenant.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(worker)
    }

    async fn delete(&self, tenant: TenantContext, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM worker_projects WHERE worker_id = $1 AND user_id = $2")
            .bind(id)
            .bind(tenant.0)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM workers WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(tenant.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            // Drop do tx = rollback.
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}
