// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser};

// O tenant resolvido para a requisição: é sempre o próprio usuário autenticado.
// Todo repositório não-administrativo exige este valor e o injeta como
// `user_id = tenant` em cada leitura e escrita.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantContext(pub i64);

impl From<&crate::models::auth::User> for TenantContext {
    fn from(user: &crate::models::auth::User) -> Self {
        TenantContext(user.id)
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|user| TenantContext::from(&user.0))
            .ok_or(AppError::Unauthenticated)
    }
}
