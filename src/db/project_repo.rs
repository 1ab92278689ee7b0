// src/db/project_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        error::AppError,
        query::{like_pattern, push_order_and_page, push_search, push_tenant_scope},
    },
    db::begin_snapshot,
    middleware::tenancy::TenantContext,
    models::project::{Project, ProjectFilter, ProjectPayload, ProjectQuery},
};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn list(&self, tenant: TenantContext, query: &ProjectQuery) -> Result<(Vec<Project>, i64), AppError>;

    async fn find_by_id(&self, tenant: TenantContext, id: i64) -> Result<Option<Project>, AppError>;

    async fn create(&self, tenant: TenantContext, payload: &ProjectPayload) -> Result<Project, AppError>;

    async fn update(
        &self,
        tenant: TenantContext,
        id: i64,
        payload: &ProjectPayload,
    ) -> Result<Option<Project>, AppError>;

    /// Remove o projeto e todas as suas alocações na mesma transação.
    async fn delete(&self, tenant: TenantContext, id: i64) -> Result<bool, AppError>;
}

pub(crate) fn push_project_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    tenant: TenantContext,
    filter: &ProjectFilter,
) {
    push_tenant_scope(qb, "p", tenant);

    if let Some(term) = &filter.search {
        push_search(qb, &["p.name", "p.description"], term);
    }
    if let Some(name) = &filter.name {
        qb.push(" AND p.name ILIKE ").push_bind(like_pattern(name));
    }
    if let Some(status) = filter.status {
        qb.push(" AND p.status = ").push_bind(status);
    }
    if let Some(from) = filter.start_date_from {
        qb.push(" AND p.start_date >= ").push_bind(from);
    }
    if let Some(to) = filter.start_date_to {
        qb.push(" AND p.start_date <= ").push_bind(to);
    }
}

#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn list(&self, tenant: TenantContext, query: &ProjectQuery) -> Result<(Vec<Project>, i64), AppError> {
        let mut tx = begin_snapshot(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects p");
        push_project_filters(&mut count, tenant, &query.filter);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT p.* FROM projects p");
        push_project_filters(&mut select, tenant, &query.filter);
        push_order_and_page(&mut select, "p", &query.sorting, &query.page);
        let projects = select.build_query_as::<Project>().fetch_all(&mut *tx).await?;

        tx.commit().await?;
        Ok((projects, total))
    }

    async fn find_by_id(&self, tenant: TenantContext, id: i64) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(tenant.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn create(&self, tenant: TenantContext, payload: &ProjectPayload) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (
                user_id, name, description, status, start_date, end_date, latitude, longitude
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant.0)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.status)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.latitude)
        .bind(payload.longitude)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    async fn update(
        &self,
        tenant: TenantContext,
        id: i64,
        payload: &ProjectPayload,
    ) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $1, description = $2, status = $3, start_date = $4,
                end_date = $5, latitude = $6, longitude = $7, updated_at = NOW()
            WHERE id = $8 AND user_id = $9
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.status)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.latitude)
        .bind(payload.longitude)
        .bind(id)
        .bind(tenant.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn delete(&self, tenant: TenantContext, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM worker_projects WHERE project_id = $1 AND user_id = $2")
            .bind(id)
            .bind(tenant.0)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(tenant.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::query::{PageRequest, SortOrder, Sorting},
        models::project::{ProjectSort, ProjectStatus},
    };

    #[test]
    fn status_and_date_range_are_bound() {
        let filter = ProjectFilter {
            status: Some(ProjectStatus::Active),
            start_date_from: chrono::NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.* FROM projects p");
        push_project_filters(&mut qb, TenantContext(1), &filter);
        push_order_and_page(
            &mut qb,
            "p",
            &Sorting::new(ProjectSort::Id, SortOrder::Desc),
            &PageRequest::default(),
        );

        assert_eq!(
            qb.sql(),
            "SELECT p.* FROM projects p WHERE p.user_id = $1 AND p.status = $2 \
             AND p.start_date >= $3 ORDER BY p.id DESC LIMIT $4 OFFSET $5"
        );
    }
}
