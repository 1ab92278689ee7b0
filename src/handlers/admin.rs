// src/handlers/admin.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    common::{
        error::AppError,
        query::{ListParams, Paginated},
    },
    config::AppState,
    middleware::rbac::RequireAdmin,
    models::{
        activity::ActivityLog,
        auth::{UpdateUserRolePayload, UpdateUserStatusPayload, User, UserQuery},
    },
};

// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(
        ("page" = Option<u32>, Query),
        ("page_size" = Option<u32>, Query),
        ("search" = Option<String>, Query, description = "Busca em usuário e e-mail"),
        ("role" = Option<String>, Query, description = "user ou admin"),
        ("active" = Option<bool>, Query),
        ("sort_by" = Option<String>, Query, description = "id, username, email, role, created_at"),
        ("sort_order" = Option<String>, Query)
    ),
    responses(
        (status = 200, body = Paginated<User>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    RequireAdmin(scope): RequireAdmin,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Paginated<User>>, AppError> {
    let query = UserQuery::from_params(&ListParams::from(params));
    Ok(Json(app_state.admin_service.list_users(&scope, &query).await?))
}

// PUT /api/admin/users/{id}/status
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/status",
    tag = "Admin",
    params(("id" = i64, Path, description = "ID do usuário")),
    request_body = UpdateUserStatusPayload,
    responses(
        (status = 200, body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user_status(
    State(app_state): State<AppState>,
    RequireAdmin(scope): RequireAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserStatusPayload>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .admin_service
        .update_status(&scope, id, payload.active)
        .await?;
    Ok(Json(user))
}

// PUT /api/admin/users/{id}/role
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    tag = "Admin",
    params(("id" = i64, Path, description = "ID do usuário")),
    request_body = UpdateUserRolePayload,
    responses(
        (status = 200, body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user_role(
    State(app_state): State<AppState>,
    RequireAdmin(scope): RequireAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRolePayload>,
) -> Result<Json<User>, AppError> {
    let user = app_state.admin_service.update_role(&scope, id, payload.role).await?;
    Ok(Json(user))
}

// GET /api/admin/users/{id}/activity
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}/activity",
    tag = "Admin",
    params(
        ("id" = i64, Path, description = "ID do usuário"),
        ("page" = Option<u32>, Query),
        ("page_size" = Option<u32>, Query)
    ),
    responses(
        (status = 200, description = "Mais recentes primeiro", body = Paginated<ActivityLog>),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn user_activity(
    State(app_state): State<AppState>,
    RequireAdmin(scope): RequireAdmin,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Paginated<ActivityLog>>, AppError> {
    let page = ListParams::from(params).page();
    Ok(Json(app_state.admin_service.user_activity(&scope, id, page).await?))
}
