// src/services/worker_service.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    common::{error::AppError, query::Paginated},
    db::WorkerRepository,
    middleware::tenancy::TenantContext,
    models::{
        activity::{EntityType, LogType},
        worker::{Worker, WorkerPayload, WorkerQuery},
    },
    services::activity_log::{Action, ActivityLogger},
};

const ENTITY: &str = "Trabalhador";

#[derive(Clone)]
pub struct WorkerService {
    repo: Arc<dyn WorkerRepository>,
    activity: ActivityLogger,
}

impl WorkerService {
    pub fn new(repo: Arc<dyn WorkerRepository>, activity: ActivityLogger) -> Self {
        Self { repo, activity }
    }

    pub async fn list(&self, tenant: TenantContext, query: &WorkerQuery) -> Result<Paginated<Worker>, AppError> {
        let (workers, total) = self.repo.list(tenant, query).await?;
        Ok(Paginated::new(workers, total, query.page))
    }

    pub async fn get(&self, tenant: TenantContext, id: i64) -> Result<Worker, AppError> {
        self.repo
            .find_by_id(tenant, id)
            .await?
            .ok_or(AppError::NotFound(ENTITY))
    }

    pub async fn create(&self, tenant: TenantContext, payload: WorkerPayload) -> Result<Worker, AppError> {
        payload.validate()?;

        let action = Action::new(tenant.0, LogType::Create, EntityType::Worker)
            .detail(format!("Trabalhador '{}' criado", payload.name));
        self.activity
            .audit(action, self.repo.create(tenant, &payload))
            .await
    }

    pub async fn update(&self, tenant: TenantContext, id: i64, payload: WorkerPayload) -> Result<Worker, AppError> {
        payload.validate()?;

        let action = Action::new(tenant.0, LogType::Update, EntityType::Worker).entity(id);
        self.activity
            .audit(action, async {
                self.repo
                    .update(tenant, id, &payload)
                    .await?
                    .ok_or(AppError::NotFound(ENTITY))
            })
            .await
    }

    pub async fn delete(&self, tenant: TenantContext, id: i64) -> Result<(), AppError> {
        let action = Action::new(tenant.0, LogType::Delete, EntityType::Worker).entity(id);
        self.activity
            .audit(action, async {
                if self.repo.delete(tenant, id).await? {
                    Ok(())
                } else {
                    Err(AppError::NotFound(ENTITY))
                }
            })
            .await
    }
}
