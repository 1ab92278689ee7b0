// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "activity_log_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Login,
    LoginFailed,
    Register,
    RegisterFailed,
    Create,
    Update,
    Delete,
    Assign,
    Unassign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "activity_entity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Worker,
    Project,
    User,
}

/// Entrada gravada no log de atividades. Nunca é alterada nem apagada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActivityLog {
    pub id: Uuid,
    // Nulo apenas em tentativas de login de usuários inexistentes.
    pub user_id: Option<i64>,
    pub log_type: LogType,
    pub entity_type: EntityType,
    pub entity_id: Option<i64>,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// O id (v7) e o horário são fixados no momento da operação, não na gravação.
    pub fn new(
        user_id: Option<i64>,
        log_type: LogType,
        entity_type: EntityType,
        entity_id: Option<i64>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            log_type,
            entity_type,
            entity_id,
            detail: detail.into(),
            created_at: Utc::now(),
        }
    }
}
