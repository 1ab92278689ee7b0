// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::User,
};

/// Escopo administrativo: dispensa o filtro de tenant.
/// Só existe depois de uma checagem de papel bem-sucedida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminScope {
    admin_id: i64,
}

impl AdminScope {
    pub fn elevate(user: &User) -> Result<Self, AppError> {
        if user.active && user.is_admin() {
            Ok(Self { admin_id: user.id })
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn admin_id(&self) -> i64 {
        self.admin_id
    }
}

/// Extrator (guardião) para as rotas de administração.
pub struct RequireAdmin(pub AdminScope);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::Unauthenticated)?;

        AdminScope::elevate(&user.0).map(RequireAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use chrono::Utc;

    fn user(role: UserRole, active: bool) -> User {
        User {
            id: 42,
            username: "root".into(),
            email: "root@example.com".into(),
            password_hash: String::new(),
            role,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_active_admins_are_elevated() {
        assert_eq!(AdminScope::elevate(&user(UserRole::Admin, true)).unwrap().admin_id(), 42);
        assert!(matches!(
            AdminScope::elevate(&user(UserRole::User, true)),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            AdminScope::elevate(&user(UserRole::Admin, false)),
            Err(AppError::Forbidden)
        ));
    }
}
