// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::query::{FromParams, ListParams, ListQuery, SortKey};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(()),
        }
    }
}

// Representa um usuário (tenant) vindo do banco de dados
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct User {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "maria")]
    pub username: String,
    #[schema(example = "maria@email.com")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub role: UserRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 3, max = 50, message = "O usuário deve ter entre 3 e 50 caracteres."))]
    #[schema(example = "maria")]
    pub username: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "maria@email.com")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "maria")]
    pub username: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,         // Subject (ID do usuário)
    pub role: UserRole,
    pub exp: usize,       // Expiration time
    pub iat: usize,       // Issued At
}

// --- Administração ---

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateUserStatusPayload {
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateUserRolePayload {
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

impl FromParams for UserFilter {
    fn from_params(params: &ListParams) -> Self {
        Self {
            search: params.text("search"),
            role: params.parse("role"),
            active: params.parse("active"),
        }
    }
}

#[cfg(test)]
impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        use crate::common::query::contains_ci;

        self.search.as_deref().is_none_or(|term| {
            contains_ci(&user.username, term) || contains_ci(&user.email, term)
        }) && self.role.is_none_or(|r| user.role == r)
            && self.active.is_none_or(|a| user.active == a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Id,
    Username,
    Email,
    Role,
    CreatedAt,
}

impl SortKey for UserSort {
    const DEFAULT: Self = UserSort::Id;

    fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(UserSort::Id),
            "username" => Some(UserSort::Username),
            "email" => Some(UserSort::Email),
            "role" => Some(UserSort::Role),
            "created_at" => Some(UserSort::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            UserSort::Id => "id",
            UserSort::Username => "username",
            UserSort::Email => "email",
            UserSort::Role => "role",
            UserSort::CreatedAt => "created_at",
        }
    }
}

#[cfg(test)]
impl UserSort {
    pub fn compare(self, a: &User, b: &User) -> std::cmp::Ordering {
        match self {
            UserSort::Id => a.id.cmp(&b.id),
            UserSort::Username => a.username.cmp(&b.username),
            UserSort::Email => a.email.cmp(&b.email),
            UserSort::Role => a.role.cmp(&b.role),
            UserSort::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

pub type UserQuery = ListQuery<UserFilter, UserSort>;
