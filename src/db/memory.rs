// src/db/memory.rs
//
// Implementação em memória de todos os repositórios, compilada só nos testes.
// Um único RwLock guarda o estado inteiro, então cada operação de várias
// linhas é atômica.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering as AtomicOrdering},
        RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    common::{
        error::AppError,
        query::{PageRequest, SortKey, SortOrder, Sorting},
    },
    db::{
        activity_repo::ActivityLogRepository,
        assignment_repo::{AssignOutcome, AssignmentRepository},
        project_repo::ProjectRepository,
        user_repo::UserRepository,
        worker_repo::WorkerRepository,
    },
    middleware::tenancy::TenantContext,
    models::{
        activity::ActivityLog,
        auth::{User, UserQuery, UserRole},
        project::{Project, ProjectDetail, ProjectPayload, ProjectQuery},
        worker::{Worker, WorkerPayload, WorkerQuery},
    },
};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    workers: BTreeMap<i64, Worker>,
    projects: BTreeMap<i64, Project>,
    // (project_id, worker_id) -> user_id
    assignments: BTreeMap<(i64, i64), i64>,
    activity: Vec<ActivityLog>,
    sequences: HashMap<&'static str, i64>,
}

impl MemoryState {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let seq = self.sequences.entry(table).or_insert(0);
        *seq += 1;
        *seq
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    outage: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simula uma queda do banco: toda operação passa a falhar.
    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, AtomicOrdering::SeqCst);
    }

    /// Quantidade de vínculos gravados para o par.
    pub fn assignment_count(&self, project_id: i64, worker_id: i64) -> usize {
        self.state
            .read()
            .map(|s| s.assignments.contains_key(&(project_id, worker_id)) as usize)
            .unwrap_or(0)
    }

    /// Total de vínculos de um projeto, de qualquer trabalhador.
    pub fn project_assignment_count(&self, project_id: i64) -> usize {
        self.state
            .read()
            .map(|s| s.assignments.keys().filter(|(p, _)| *p == project_id).count())
            .unwrap_or(0)
    }

    pub fn activity_entries(&self) -> Vec<ActivityLog> {
        self.state.read().map(|s| s.activity.clone()).unwrap_or_default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, AppError> {
        self.check()?;
        self.state
            .read()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("lock poisoned")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, AppError> {
        self.check()?;
        self.state
            .write()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("lock poisoned")))
    }

    fn check(&self) -> Result<(), AppError> {
        if self.outage.load(AtomicOrdering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// Ordena como o ORDER BY do Postgres (coluna, depois id ASC) e corta a página.
fn sort_and_page<T: Clone, S: SortKey>(
    mut items: Vec<T>,
    sorting: &Sorting<S>,
    page: &PageRequest,
    compare: impl Fn(S, &T, &T) -> Ordering,
    id: impl Fn(&T) -> i64,
) -> (Vec<T>, i64) {
    items.sort_by(|a, b| {
        let primary = compare(sorting.key, a, b);
        let primary = match sorting.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| id(a).cmp(&id(b)))
    });
    let total = items.len() as i64;
    (page.slice(&items), total)
}

// =========================================================================
//  WORKERS
// =========================================================================

#[async_trait]
impl WorkerRepository for InMemoryStore {
    async fn list(&self, tenant: TenantContext, query: &WorkerQuery) -> Result<(Vec<Worker>, i64), AppError> {
        let state = self.read()?;
        let items: Vec<Worker> = state
            .workers
            .values()
            .filter(|w| w.user_id == tenant.0 && query.filter.matches(w))
            .cloned()
            .collect();
        Ok(sort_and_page(items, &query.sorting, &query.page, |k, a, b| k.compare(a, b), |w| w.id))
    }

    async fn find_by_id(&self, tenant: TenantContext, id: i64) -> Result<Option<Worker>, AppError> {
        let state = self.read()?;
        Ok(state.workers.get(&id).filter(|w| w.user_id == tenant.0).cloned())
    }

    async fn create(&self, tenant: TenantContext, payload: &WorkerPayload) -> Result<Worker, AppError> {
        let mut state = self.write()?;
        let now = Utc::now();
        let worker = Worker {
            id: state.next_id("workers"),
            user_id: tenant.0,
            name: payload.name.clone(),
            position: payload.position.clone(),
            age: payload.age,
            salary: payload.salary,
            created_at: now,
            updated_at: now,
        };
        state.workers.insert(worker.id, worker.clone());
        Ok(worker)
    }

    async fn update(
        &self,
        tenant: TenantContext,
        id: i64,
        payload: &WorkerPayload,
    ) -> Result<Option<Worker>, AppError> {
        let mut state = self.write()?;
        let Some(worker) = state.workers.get_mut(&id).filter(|w| w.user_id == tenant.0) else {
            return Ok(None);
        };
        worker.name = payload.name.clone();
        worker.position = payload.position.clone();
        worker.age = payload.age;
        worker.salary = payload.salary;
        worker.updated_at = Utc::now();
        Ok(Some(worker.clone()))
    }

    async fn delete(&self, tenant: TenantContext, id: i64) -> Result<bool, AppError> {
        let mut state = self.write()?;
        if !state.workers.get(&id).is_some_and(|w| w.user_id == tenant.0) {
            return Ok(false);
        }
        state.workers.remove(&id);
        state.assignments.retain(|(_, worker_id), _| *worker_id != id);
        Ok(true)
    }
}

// =========================================================================
//  PROJECTS
// =========================================================================

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn list(&self, tenant: TenantContext, query: &ProjectQuery) -> Result<(Vec<Project>, i64), AppError> {
        let state = self.read()?;
        let items: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.user_id == tenant.0 && query.filter.matches(p))
            .cloned()
            .collect();
        Ok(sort_and_page(items, &query.sorting, &query.page, |k, a, b| k.compare(a, b), |p| p.id))
    }

    async fn find_by_id(&self, tenant: TenantContext, id: i64) -> Result<Option<Project>, AppError> {
        let state = self.read()?;
        Ok(state.projects.get(&id).filter(|p| p.user_id == tenant.0).cloned())
    }

    async fn create(&self, tenant: TenantContext, payload: &ProjectPayload) -> Result<Project, AppError> {
        let mut state = self.write()?;
        let now = Utc::now();
        let project = Project {
            id: state.next_id("projects"),
            user_id: tenant.0,
            name: payload.name.clone(),
            description: payload.description.clone(),
            status: payload.status,
            start_date: payload.start_date,
            end_date: payload.end_date,
            latitude: payload.latitude,
            longitude: payload.longitude,
            created_at: now,
            updated_at: now,
        };
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update(
        &self,
        tenant: TenantContext,
        id: i64,
        payload: &ProjectPayload,
    ) -> Result<Option<Project>, AppError> {
        let mut state = self.write()?;
        let Some(project) = state.projects.get_mut(&id).filter(|p| p.user_id == tenant.0) else {
            return Ok(None);
        };
        project.name = payload.name.clone();
        project.description = payload.description.clone();
        project.status = payload.status;
        project.start_date = payload.start_date;
        project.end_date = payload.end_date;
        project.latitude = payload.latitude;
        project.longitude = payload.longitude;
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete(&self, tenant: TenantContext, id: i64) -> Result<bool, AppError> {
        let mut state = self.write()?;
        if !state.projects.get(&id).is_some_and(|p| p.user_id == tenant.0) {
            return Ok(false);
        }
        state.projects.remove(&id);
        state.assignments.retain(|(project_id, _), _| *project_id != id);
        Ok(true)
    }
}

// =========================================================================
//  ASSIGNMENTS
// =========================================================================

#[async_trait]
impl AssignmentRepository for InMemoryStore {
    async fn assign(&self, tenant: TenantContext, project_id: i64, worker_id: i64) -> Result<AssignOutcome, AppError> {
        let mut state = self.write()?;
        if !state.projects.get(&project_id).is_some_and(|p| p.user_id == tenant.0) {
            return Ok(AssignOutcome::ProjectNotFound);
        }
        if !state.workers.get(&worker_id).is_some_and(|w| w.user_id == tenant.0) {
            return Ok(AssignOutcome::WorkerNotFound);
        }
        if state.assignments.contains_key(&(project_id, worker_id)) {
            return Ok(AssignOutcome::AlreadyAssigned);
        }
        state.assignments.insert((project_id, worker_id), tenant.0);
        Ok(AssignOutcome::Assigned)
    }

    async fn unassign(&self, tenant: TenantContext, project_id: i64, worker_id: i64) -> Result<bool, AppError> {
        let mut state = self.write()?;
        let owned = state
            .assignments
            .get(&(project_id, worker_id))
            .is_some_and(|user_id| *user_id == tenant.0);
        if owned {
            state.assignments.remove(&(project_id, worker_id));
        }
        Ok(owned)
    }

    async fn project_detail(&self, tenant: TenantContext, project_id: i64) -> Result<Option<ProjectDetail>, AppError> {
        let state = self.read()?;
        let Some(project) = state.projects.get(&project_id).filter(|p| p.user_id == tenant.0) else {
            return Ok(None);
        };
        let workers = state
            .assignments
            .iter()
            .filter(|((p, _), user_id)| *p == project_id && **user_id == tenant.0)
            .filter_map(|((_, w), _)| state.workers.get(w))
            .filter(|w| w.user_id == tenant.0)
            .cloned()
            .collect();
        Ok(Some(ProjectDetail {
            project: project.clone(),
            workers,
        }))
    }

    async fn available_workers(
        &self,
        tenant: TenantContext,
        project_id: i64,
        query: &WorkerQuery,
    ) -> Result<(Vec<Worker>, i64), AppError> {
        let state = self.read()?;
        let items: Vec<Worker> = state
            .workers
            .values()
            .filter(|w| w.user_id == tenant.0 && query.filter.matches(w))
            .filter(|w| !state.assignments.contains_key(&(project_id, w.id)))
            .cloned()
            .collect();
        Ok(sort_and_page(items, &query.sorting, &query.page, |k, a, b| k.compare(a, b), |w| w.id))
    }
}

// =========================================================================
//  USERS
// =========================================================================

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let state = self.read()?;
        Ok(state.users.get(&id).cloned())
    }

    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.username == username) {
            return Err(AppError::UsernameAlreadyExists);
        }
        if state.users.values().any(|u| u.email == email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: state.next_id("users"),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: UserRole::User,
            active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list(&self, query: &UserQuery) -> Result<(Vec<User>, i64), AppError> {
        let state = self.read()?;
        let items: Vec<User> = state
            .users
            .values()
            .filter(|u| query.filter.matches(u))
            .cloned()
            .collect();
        Ok(sort_and_page(items, &query.sorting, &query.page, |k, a, b| k.compare(a, b), |u| u.id))
    }

    async fn update_status(&self, id: i64, active: bool) -> Result<Option<User>, AppError> {
        let mut state = self.write()?;
        Ok(state.users.get_mut(&id).map(|u| {
            u.active = active;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn update_role(&self, id: i64, role: UserRole) -> Result<Option<User>, AppError> {
        let mut state = self.write()?;
        Ok(state.users.get_mut(&id).map(|u| {
            u.role = role;
            u.updated_at = Utc::now();
            u.clone()
        }))
    }
}

// =========================================================================
//  ACTIVITY LOG
// =========================================================================

#[async_trait]
impl ActivityLogRepository for InMemoryStore {
    async fn append(&self, entry: &ActivityLog) -> Result<(), AppError> {
        let mut state = self.write()?;
        state.activity.push(entry.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: i64, page: PageRequest) -> Result<(Vec<ActivityLog>, i64), AppError> {
        let state = self.read()?;
        let mut entries: Vec<ActivityLog> = state
            .activity
            .iter()
            .filter(|e| e.user_id == Some(user_id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        let total = entries.len() as i64;
        Ok((page.slice(&entries), total))
    }
}

impl InMemoryStore {
    /// Promove um usuário direto no estado (semente de testes e dev).
    pub fn seed_admin(&self, user_id: i64) {
        if let Ok(mut state) = self.state.write() {
            if let Some(user) = state.users.get_mut(&user_id) {
                user.role = UserRole::Admin;
            }
        }
    }
}
