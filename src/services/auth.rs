// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        activity::{ActivityLog, EntityType, LogType},
        auth::{AuthResponse, Claims, LoginUserPayload, RegisterUserPayload, User},
    },
    services::activity_log::ActivityLogger,
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_secret: String,
    token_ttl: Duration,
    bcrypt_cost: u32,
    activity: ActivityLogger,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt_secret: String,
        token_ttl: Duration,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            users,
            jwt_secret,
            token_ttl,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            activity,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Toda tentativa deixa exatamente uma entrada no log, qualquer que seja o motivo da falha.
    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<AuthResponse, AppError> {
        let username = payload.username.clone();
        let user = match self.create_account(payload).await {
            Ok(user) => user,
            Err(e) => {
                self.log(None, LogType::RegisterFailed, None, format!("Registro de '{}' falhou: {}", username, e));
                return Err(e);
            }
        };

        self.log(Some(user.id), LogType::Register, Some(user.id), format!("Usuário '{}' registrado", user.username));

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    async fn create_account(&self, payload: RegisterUserPayload) -> Result<User, AppError> {
        payload.validate()?;

        // O hash roda fora das threads do runtime
        let password = payload.password.clone();
        let cost = self.bcrypt_cost;
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        self.users
            .create_user(&payload.username, &payload.email, &hashed_password)
            .await
    }

    /// Mesma regra do registro: sucesso ou falha, uma entrada por tentativa.
    pub async fn login_user(&self, payload: LoginUserPayload) -> Result<AuthResponse, AppError> {
        let username = payload.username.clone();
        let user = match self.authenticate(payload).await {
            Ok(user) => user,
            Err((user_id, e)) => {
                self.log(user_id, LogType::LoginFailed, user_id, format!("Login de '{}' falhou: {}", username, e));
                return Err(e);
            }
        };

        self.log(Some(user.id), LogType::Login, Some(user.id), "Login realizado");

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    // Na falha, devolve também o id do usuário quando ele chegou a ser identificado.
    async fn authenticate(&self, payload: LoginUserPayload) -> Result<User, (Option<i64>, AppError)> {
        if let Err(e) = payload.validate() {
            return Err((None, AppError::from(e)));
        }

        let user = match self.users.find_by_username(&payload.username).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err((None, AppError::InvalidCredentials)),
            Err(e) => return Err((None, e)),
        };

        match self.check_password(payload.password, &user).await {
            Ok(true) if user.active => Ok(user),
            Ok(true) => Err((Some(user.id), AppError::AccountDisabled)),
            Ok(false) => Err((Some(user.id), AppError::InvalidCredentials)),
            Err(e) => Err((Some(user.id), e)),
        }
    }

    async fn check_password(&self, password: String, user: &User) -> Result<bool, AppError> {
        let password_hash = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
        Ok(is_password_valid)
    }

    /// Token válido de um usuário ainda ativo; qualquer outra coisa é `Unauthenticated`.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthenticated)?;

        self.users
            .find_by_id(token_data.claims.sub)
            .await?
            .filter(|user| user.active)
            .ok_or(AppError::Unauthenticated)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    fn log(&self, user_id: Option<i64>, log_type: LogType, entity_id: Option<i64>, detail: impl Into<String>) {
        self.activity
            .record(ActivityLog::new(user_id, log_type, EntityType::User, entity_id, detail));
    }
}
