// src/handlers/workers.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{
        error::AppError,
        query::{ListParams, Paginated},
    },
    config::AppState,
    middleware::tenancy::TenantContext,
    models::worker::{Worker, WorkerPayload, WorkerQuery},
};

// GET /api/workers
#[utoipa::path(
    get,
    path = "/api/workers",
    tag = "Workers",
    params(
        ("page" = Option<u32>, Query, description = "Página (1 em diante)"),
        ("page_size" = Option<u32>, Query, description = "Itens por página (máx. 100)"),
        ("search" = Option<String>, Query, description = "Busca em nome e cargo"),
        ("position" = Option<String>, Query, description = "Filtro por cargo"),
        ("min_age" = Option<i32>, Query),
        ("max_age" = Option<i32>, Query),
        ("min_salary" = Option<i64>, Query),
        ("max_salary" = Option<i64>, Query),
        ("sort_by" = Option<String>, Query, description = "id, name, position, age, salary, created_at"),
        ("sort_order" = Option<String>, Query, description = "asc ou desc")
    ),
    responses(
        (status = 200, description = "Trabalhadores do usuário", body = Paginated<Worker>),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_workers(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Paginated<Worker>>, AppError> {
    let query = WorkerQuery::from_params(&ListParams::from(params));
    let page = app_state.worker_service.list(tenant, &query).await?;
    Ok(Json(page))
}

// GET /api/workers/{id}
#[utoipa::path(
    get,
    path = "/api/workers/{id}",
    tag = "Workers",
    params(("id" = i64, Path, description = "ID do trabalhador")),
    responses(
        (status = 200, body = Worker),
        (status = 404, description = "Trabalhador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_worker(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<Worker>, AppError> {
    Ok(Json(app_state.worker_service.get(tenant, id).await?))
}

// POST /api/workers
#[utoipa::path(
    post,
    path = "/api/workers",
    tag = "Workers",
    request_body = WorkerPayload,
    responses(
        (status = 201, description = "Trabalhador criado", body = Worker),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_worker(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<WorkerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let worker = app_state.worker_service.create(tenant, payload).await?;
    Ok((StatusCode::CREATED, Json(worker)))
}

// PUT /api/workers/{id}
#[utoipa::path(
    put,
    path = "/api/workers/{id}",
    tag = "Workers",
    params(("id" = i64, Path, description = "ID do trabalhador")),
    request_body = WorkerPayload,
    responses(
        (status = 200, body = Worker),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Trabalhador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_worker(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<WorkerPayload>,
) -> Result<Json<Worker>, AppError> {
    Ok(Json(app_state.worker_service.update(tenant, id, payload).await?))
}

// DELETE /api/workers/{id}
#[utoipa::path(
    delete,
    path = "/api/workers/{id}",
    tag = "Workers",
    params(("id" = i64, Path, description = "ID do trabalhador")),
    responses(
        (status = 204, description = "Removido, junto com as alocações"),
        (status = 404, description = "Trabalhador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_worker(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    app_state.worker_service.delete(tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
