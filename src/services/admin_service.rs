// src/services/admin_service.rs
//
// Leitura administrativa: sem filtro de tenant, mas só com um `AdminScope`
// em mãos, que por sua vez só sai de uma checagem de papel.

use std::sync::Arc;

use crate::{
    common::{
        error::AppError,
        query::{PageRequest, Paginated},
    },
    db::{ActivityLogRepository, UserRepository},
    middleware::rbac::AdminScope,
    models::{
        activity::{ActivityLog, EntityType, LogType},
        auth::{User, UserQuery, UserRole},
    },
    services::activity_log::{Action, ActivityLogger},
};

const ENTITY: &str = "Usuário";

#[derive(Clone)]
pub struct AdminService {
    users: Arc<dyn UserRepository>,
    logs: Arc<dyn ActivityLogRepository>,
    activity: ActivityLogger,
}

impl AdminService {
    pub fn new(users: Arc<dyn UserRepository>, logs: Arc<dyn ActivityLogRepository>, activity: ActivityLogger) -> Self {
        Self { users, logs, activity }
    }

    pub async fn list_users(&self, _scope: &AdminScope, query: &UserQuery) -> Result<Paginated<User>, AppError> {
        let (users, total) = self.users.list(query).await?;
        Ok(Paginated::new(users, total, query.page))
    }

    pub async fn update_status(&self, scope: &AdminScope, user_id: i64, active: bool) -> Result<User, AppError> {
        let action = Action::new(scope.admin_id(), LogType::Update, EntityType::User)
            .entity(user_id)
            .detail(if active { "Usuário ativado" } else { "Usuário desativado" });
        self.activity
            .audit(action, async {
                self.users
                    .update_status(user_id, active)
                    .await?
                    .ok_or(AppError::NotFound(ENTITY))
            })
            .await
    }

    pub async fn update_role(&self, scope: &AdminScope, user_id: i64, role: UserRole) -> Result<User, AppError> {
        let action = Action::new(scope.admin_id(), LogType::Update, EntityType::User)
            .entity(user_id)
            .detail(format!("Papel alterado para {role:?}"));
        self.activity
            .audit(action, async {
                self.users
                    .update_role(user_id, role)
                    .await?
                    .ok_or(AppError::NotFound(ENTITY))
            })
            .await
    }

    /// Histórico de um usuário, mais recente primeiro.
    pub async fn user_activity(
        &self,
        _scope: &AdminScope,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Paginated<ActivityLog>, AppError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound(ENTITY));
        }
        let (entries, total) = self.logs.list_for_user(user_id, page).await?;
        Ok(Paginated::new(entries, total, page))
    }
}
