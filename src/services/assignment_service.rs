// src/services/assignment_service.rs

use std::sync::Arc;

use crate::{
    common::{error::AppError, query::Paginated},
    db::{AssignOutcome, AssignmentRepository, ProjectRepository},
    middleware::tenancy::TenantContext,
    models::{
        activity::{ActivityLog, EntityType, LogType},
        worker::{Worker, WorkerQuery},
    },
    services::{activity_log::ActivityLogger, project_service},
};

#[derive(Clone)]
pub struct AssignmentService {
    repo: Arc<dyn AssignmentRepository>,
    projects: Arc<dyn ProjectRepository>,
    activity: ActivityLogger,
}

impl AssignmentService {
    pub fn new(
        repo: Arc<dyn AssignmentRepository>,
        projects: Arc<dyn ProjectRepository>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            repo,
            projects,
            activity,
        }
    }

    /// Idempotente: alocar de novo não duplica o vínculo nem gera log.
    pub async fn assign(&self, tenant: TenantContext, project_id: i64, worker_id: i64) -> Result<(), AppError> {
        match self.repo.assign(tenant, project_id, worker_id).await? {
            AssignOutcome::Assigned => {
                self.activity.record(ActivityLog::new(
                    Some(tenant.0),
                    LogType::Assign,
                    EntityType::Project,
                    Some(project_id),
                    format!("Trabalhador {worker_id} alocado"),
                ));
                Ok(())
            }
            AssignOutcome::AlreadyAssigned => Ok(()),
            AssignOutcome::ProjectNotFound => Err(AppError::NotFound(project_service::ENTITY)),
            AssignOutcome::WorkerNotFound => Err(AppError::NotFound("Trabalhador")),
        }
    }

    /// Remover um vínculo inexistente também é sucesso.
    pub async fn unassign(&self, tenant: TenantContext, project_id: i64, worker_id: i64) -> Result<(), AppError> {
        if self.repo.unassign(tenant, project_id, worker_id).await? {
            self.activity.record(ActivityLog::new(
                Some(tenant.0),
                LogType::Unassign,
                EntityType::Project,
                Some(project_id),
                format!("Trabalhador {worker_id} removido"),
            ));
        }
        Ok(())
    }

    /// Trabalhadores do tenant ainda fora do projeto, com os filtros da listagem comum.
    pub async fn available_workers(
        &self,
        tenant: TenantContext,
        project_id: i64,
        query: &WorkerQuery,
    ) -> Result<Paginated<Worker>, AppError> {
        if self.projects.find_by_id(tenant, project_id).await?.is_none() {
            return Err(AppError::NotFound(project_service::ENTITY));
        }
        let (workers, total) = self.repo.available_workers(tenant, project_id, query).await?;
        Ok(Paginated::new(workers, total, query.page))
    }
}
