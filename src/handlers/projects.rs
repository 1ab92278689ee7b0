// src/handlers/projects.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    common::{
        error::AppError,
        query::{ListParams, Paginated},
    },
    config::AppState,
    middleware::tenancy::TenantContext,
    models::{
        project::{Project, ProjectDetail, ProjectPayload, ProjectQuery},
        worker::{Worker, WorkerQuery},
    },
};

// =============================================================================
//  PROJETOS
// =============================================================================

// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    params(
        ("page" = Option<u32>, Query),
        ("page_size" = Option<u32>, Query),
        ("search" = Option<String>, Query, description = "Busca em nome e descrição"),
        ("name" = Option<String>, Query),
        ("status" = Option<String>, Query, description = "active, completed, on_hold, cancelled"),
        ("start_date_from" = Option<String>, Query, description = "AAAA-MM-DD"),
        ("start_date_to" = Option<String>, Query, description = "AAAA-MM-DD"),
        ("sort_by" = Option<String>, Query, description = "id, name, status, start_date, end_date, created_at"),
        ("sort_order" = Option<String>, Query)
    ),
    responses((status = 200, body = Paginated<Project>)),
    security(("api_jwt" = []))
)]
pub async fn list_projects(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Paginated<Project>>, AppError> {
    let query = ProjectQuery::from_params(&ListParams::from(params));
    Ok(Json(app_state.project_service.list(tenant, &query).await?))
}

// GET /api/projects/{id}
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = i64, Path, description = "ID do projeto")),
    responses(
        (status = 200, description = "Projeto com os trabalhadores alocados", body = ProjectDetail),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<ProjectDetail>, AppError> {
    Ok(Json(app_state.project_service.get(tenant, id).await?))
}

// POST /api/projects
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Projects",
    request_body = ProjectPayload,
    responses(
        (status = 201, description = "Projeto criado", body = Project),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    let project = app_state.project_service.create(tenant, payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

// PUT /api/projects/{id}
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = i64, Path, description = "ID do projeto")),
    request_body = ProjectPayload,
    responses(
        (status = 200, body = Project),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(app_state.project_service.update(tenant, id, payload).await?))
}

// DELETE /api/projects/{id}
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = i64, Path, description = "ID do projeto")),
    responses(
        (status = 204, description = "Removido, junto com as alocações"),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_project(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.project_service.delete(tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ALOCAÇÕES
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignWorkerPayload {
    #[schema(example = 7)]
    pub worker_id: i64,
}

// POST /api/projects/{id}/workers
#[utoipa::path(
    post,
    path = "/api/projects/{id}/workers",
    tag = "Projects",
    params(("id" = i64, Path, description = "ID do projeto")),
    request_body = AssignWorkerPayload,
    responses(
        (status = 200, description = "Alocado (ou já estava)", body = ProjectDetail),
        (status = 404, description = "Projeto ou trabalhador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_worker(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(project_id): Path<i64>,
    Json(payload): Json<AssignWorkerPayload>,
) -> Result<Json<ProjectDetail>, AppError> {
    app_state
        .assignment_service
        .assign(tenant, project_id, payload.worker_id)
        .await?;
    Ok(Json(app_state.project_service.get(tenant, project_id).await?))
}

// DELETE /api/projects/{id}/workers/{worker_id}
#[utoipa::path(
    delete,
    path = "/api/projects/{id}/workers/{worker_id}",
    tag = "Projects",
    params(
        ("id" = i64, Path, description = "ID do projeto"),
        ("worker_id" = i64, Path, description = "ID do trabalhador")
    ),
    responses((status = 204, description = "Vínculo removido (ou inexistente)")),
    security(("api_jwt" = []))
)]
pub async fn unassign_worker(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path((project_id, worker_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    app_state
        .assignment_service
        .unassign(tenant, project_id, worker_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/projects/{id}/workers/available
#[utoipa::path(
    get,
    path = "/api/projects/{id}/workers/available",
    tag = "Projects",
    params(
        ("id" = i64, Path, description = "ID do projeto"),
        ("page" = Option<u32>, Query),
        ("page_size" = Option<u32>, Query),
        ("search" = Option<String>, Query),
        ("position" = Option<String>, Query),
        ("sort_by" = Option<String>, Query),
        ("sort_order" = Option<String>, Query)
    ),
    responses(
        (status = 200, description = "Trabalhadores ainda não alocados", body = Paginated<Worker>),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn available_workers(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(project_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Paginated<Worker>>, AppError> {
    let query = WorkerQuery::from_params(&ListParams::from(params));
    let page = app_state
        .assignment_service
        .available_workers(tenant, project_id, &query)
        .await?;
    Ok(Json(page))
}
