// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Workers ---
        handlers::workers::list_workers,
        handlers::workers::get_worker,
        handlers::workers::create_worker,
        handlers::workers::update_worker,
        handlers::workers::delete_worker,

        // --- Projects ---
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::projects::assign_worker,
        handlers::projects::unassign_worker,
        handlers::projects::available_workers,

        // --- Admin ---
        handlers::admin::list_users,
        handlers::admin::update_user_status,
        handlers::admin::update_user_role,
        handlers::admin::user_activity,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::UpdateUserStatusPayload,
            models::auth::UpdateUserRolePayload,

            // --- Workers ---
            models::worker::Worker,
            models::worker::WorkerPayload,

            // --- Projects ---
            models::project::ProjectStatus,
            models::project::Project,
            models::project::ProjectDetail,
            models::project::ProjectPayload,
            handlers::projects::AssignWorkerPayload,

            // --- Activity ---
            models::activity::LogType,
            models::activity::EntityType,
            models::activity::ActivityLog,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Workers", description = "Trabalhadores do usuário"),
        (name = "Projects", description = "Projetos e alocação de trabalhadores"),
        (name = "Admin", description = "Administração de usuários e log de atividades")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/users/me",
            "/api/workers/{id}",
            "/api/projects/{id}/workers/available",
            "/api/admin/users/{id}/activity",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} ausente");
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("api_jwt"));
    }
}
