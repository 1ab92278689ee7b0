// src/services/project_service.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    common::{error::AppError, query::Paginated},
    db::{AssignmentRepository, ProjectRepository},
    middleware::tenancy::TenantContext,
    models::{
        activity::{EntityType, LogType},
        project::{Project, ProjectDetail, ProjectPayload, ProjectQuery},
    },
    services::activity_log::{Action, ActivityLogger},
};

pub(crate) const ENTITY: &str = "Projeto";

#[derive(Clone)]
pub struct ProjectService {
    repo: Arc<dyn ProjectRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    activity: ActivityLogger,
}

impl ProjectService {
    pub fn new(
        repo: Arc<dyn ProjectRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            repo,
            assignments,
            activity,
        }
    }

    pub async fn list(&self, tenant: TenantContext, query: &ProjectQuery) -> Result<Paginated<Project>, AppError> {
        let (projects, total) = self.repo.list(tenant, query).await?;
        Ok(Paginated::new(projects, total, query.page))
    }

    /// Projeto com a lista de trabalhadores alocados.
    pub async fn get(&self, tenant: TenantContext, id: i64) -> Result<ProjectDetail, AppError> {
        self.assignments
            .project_detail(tenant, id)
            .await?
            .ok_or(AppError::NotFound(ENTITY))
    }

    pub async fn create(&self, tenant: TenantContext, payload: ProjectPayload) -> Result<Project, AppError> {
        payload.validate()?;

        let action = Action::new(tenant.0, LogType::Create, EntityType::Project)
            .detail(format!("Projeto '{}' criado", payload.name));
        self.activity
            .audit(action, self.repo.create(tenant, &payload))
            .await
    }

    pub async fn update(&self, tenant: TenantContext, id: i64, payload: ProjectPayload) -> Result<Project, AppError> {
        payload.validate()?;

        let action = Action::new(tenant.0, LogType::Update, EntityType::Project).entity(id);
        self.activity
            .audit(action, async {
                self.repo
                    .update(tenant, id, &payload)
                    .await?
                    .ok_or(AppError::NotFound(ENTITY))
            })
            .await
    }

    /// Remove o projeto e todos os vínculos dele, atomicamente.
    pub async fn delete(&self, tenant: TenantContext, id: i64) -> Result<(), AppError> {
        let action = Action::new(tenant.0, LogType::Delete, EntityType::Project).entity(id);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::query::ListParams,
        db::{InMemoryStore, WorkerRepository},
        models::{project::ProjectStatus, worker::WorkerPayload},
    };
    use chrono::NaiveDate;

    const T1: TenantContext = TenantContext(1);
    const T2: TenantContext = TenantContext(2);

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payload(name: &str, status: ProjectStatus, start: NaiveDate) -> ProjectPayload {
        ProjectPayload {
            name: name.into(),
            description: format!("{name} - obra"),
            status,
            start_date: start,
            end_date: None,
            latitude: 46.77,
            longitude: 23.59,
        }
    }

    fn setup() -> (ProjectService, Arc<InMemoryStore>, crate::services::activity_log::ActivityLogWorker) {
        let store = Arc::new(InMemoryStore::new());
        let (logger, worker) = ActivityLogger::spawn(store.clone(), 64);
        (ProjectService::new(store.clone(), store.clone(), logger), store, worker)
    }

    #[tokio::test]
    async fn detail_lists_assigned_workers() {
        let (service, store, _log) = setup();
        let project = service
            .create(T1, payload("Ponte", ProjectStatus::Active, date(2025, 3, 1)))
            .await
            .unwrap();

        let workers: Arc<dyn WorkerRepository> = store.clone();
        let assignments: Arc<dyn AssignmentRepository> = store.clone();
        let ana = workers
            .create(
                T1,
                &WorkerPayload {
                    name: "Ana".into(),
                    position: "Engineer".into(),
                    age: 30,
                    salary: 5000,
                },
            )
            .await
            .unwrap();
        assignments.assign(T1, project.id, ana.id).await.unwrap();

        let detail = service.get(T1, project.id).await.unwrap();
        assert_eq!(detail.project, project);
        assert_eq!(detail.workers, vec![ana]);

        assert!(matches!(service.get(T2, project.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn detail_follows_unassign_and_delete() {
        let (service, store, _log) = setup();
        let project = service
            .create(T1, payload("Ponte", ProjectStatus::Active, date(2025, 3, 1)))
            .await
            .unwrap();

        let workers: Arc<dyn WorkerRepository> = store.clone();
        let assignments: Arc<dyn AssignmentRepository> = store.clone();
        let mut ids = Vec::new();
        for name in ["Ana", "Bruno"] {
            let worker = workers
                .create(
                    T1,
                    &WorkerPayload {
                        name: name.into(),
                        position: "Mason".into(),
                        age: 40,
                        salary: 3000,
                    },
                )
                .await
                .unwrap();
            assignments.assign(T1, project.id, worker.id).await.unwrap();
            ids.push(worker.id);
        }

        assignments.unassign(T1, project.id, ids[0]).await.unwrap();
        let detail = service.get(T1, project.id).await.unwrap();
        assert_eq!(detail.workers.iter().map(|w| w.id).collect::<Vec<_>>(), vec![ids[1]]);

        service.delete(T1, project.id).await.unwrap();
        assert!(matches!(service.get(T1, project.id).await, Err(AppError::NotFound(_))));
        assert!(assignments.project_detail(T1, project.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn end_date_before_start_is_rejected() {
        let (service, _store, _log) = setup();
        let mut bad = payload("Ponte", ProjectStatus::Active, date(2025, 3, 1));
        bad.end_date = Some(date(2025, 2, 1));

        let err = service.create(T1, bad).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn foreign_tenant_sees_nothing() {
        let (service, _store, _log) = setup();
        let project = service
            .create(T1, payload("Ponte", ProjectStatus::Active, date(2025, 3, 1)))
            .await
            .unwrap();

        let page = service.list(T2, &ProjectQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.data.is_empty());

        let update = service
            .update(T2, project.id, payload("Outro", ProjectStatus::Completed, date(2025, 1, 1)))
            .await;
        assert!(matches!(update, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete(T2, project.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn filters_by_status_and_start_range() {
        let (service, _store, _log) = setup();
        for (name, status, start) in [
            ("Ponte", ProjectStatus::Active, date(2025, 1, 10)),
            ("Escola", ProjectStatus::Completed, date(2024, 6, 1)),
            ("Hospital", ProjectStatus::Active, date(2025, 5, 20)),
            ("Estrada", ProjectStatus::OnHold, date(2025, 2, 1)),
        ] {
            service.create(T1, payload(name, status, start)).await.unwrap();
        }

        let params = ListParams::new()
            .with("status", "active")
            .with("start_date_from", "2025-01-01")
            .with("start_date_to", "2025-03-31");
        let page = service.list(T1, &ProjectQuery::from_params(&params)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].name, "Ponte");

        let params = ListParams::new().with("sort_by", "start_date").with("sort_order", "desc");
        let page = service.list(T1, &ProjectQuery::from_params(&params)).await.unwrap();
        let names: Vec<_> = page.data.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Hospital", "Estrada", "Ponte", "Escola"]);
    }

    #[tokio::test]
    async fn delete_logs_once_and_only_on_success() {
        let (service, store, log) = setup();
        let project = service
            .create(T1, payload("Ponte", ProjectStatus::Active, date(2025, 3, 1)))
            .await
            .unwrap();
        service.delete(T1, project.id).await.unwrap();
        let _ = service.delete(T1, project.id).await;
        log.shutdown().await;

        let types: Vec<_> = store.activity_entries().iter().map(|e| e.log_type).collect();
        assert_eq!(types, [LogType::Create, LogType::Delete]);
    }
}
