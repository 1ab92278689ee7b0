// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::Mutex;

use crate::{
    db::Repositories,
    services::{
        activity_log::{ActivityLogWorker, ActivityLogger, DEFAULT_QUEUE_CAPACITY},
        admin_service::AdminService,
        assignment_service::AssignmentService,
        auth::AuthService,
        project_service::ProjectService,
        worker_service::WorkerService,
    },
};

// Configurações lidas do ambiente (e do .env, se existir)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_max_lifetime: Duration,
    pub db_acquire_timeout: Duration,
    pub activity_queue_capacity: usize,
    pub jwt_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            port: var_or("PORT", 8080)?,
            allowed_origins,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 100)?,
            db_min_connections: var_or("DB_MIN_CONNECTIONS", 10)?,
            db_max_lifetime: Duration::from_secs(var_or("DB_MAX_LIFETIME_SECS", 3600)?),
            db_acquire_timeout: Duration::from_secs(var_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            activity_queue_capacity: var_or("ACTIVITY_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?,
            jwt_ttl: chrono::Duration::hours(var_or("JWT_TTL_HOURS", 168)?),
            bcrypt_cost: var_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }
}

fn var_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} tem um valor inválido: {raw}")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub auth_service: AuthService,
    pub worker_service: WorkerService,
    pub project_service: ProjectService,
    pub assignment_service: AssignmentService,
    pub admin_service: AdminService,
    pub activity: ActivityLogger,
    log_worker: Arc<Mutex<Option<ActivityLogWorker>>>,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .min_connections(settings.db_min_connections)
            .max_lifetime(settings.db_max_lifetime)
            .acquire_timeout(settings.db_acquire_timeout)
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let mut state = Self::from_repositories(Repositories::postgres(db_pool.clone()), settings);
        state.db_pool = Some(db_pool);
        Ok(state)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_repositories(repos: Repositories, settings: &Settings) -> Self {
        let (activity, log_worker) = ActivityLogger::spawn(repos.activity.clone(), settings.activity_queue_capacity);

        let auth_service = AuthService::new(
            repos.users.clone(),
            settings.jwt_secret.clone(),
            settings.jwt_ttl,
            activity.clone(),
        )
        .with_bcrypt_cost(settings.bcrypt_cost);

        Self {
            db_pool: None,
            auth_service,
            worker_service: WorkerService::new(repos.workers.clone(), activity.clone()),
            project_service: ProjectService::new(repos.projects.clone(), repos.assignments.clone(), activity.clone()),
            assignment_service: AssignmentService::new(
                repos.assignments.clone(),
                repos.projects.clone(),
                activity.clone(),
            ),
            admin_service: AdminService::new(repos.users, repos.activity, activity.clone()),
            activity,
            log_worker: Arc::new(Mutex::new(Some(log_worker))),
        }
    }

    /// Drena a fila do log de atividades e fecha o pool. Chamadas repetidas não fazem nada.
    pub async fn shutdown(&self) {
        if let Some(worker) = self.log_worker.lock().await.take() {
            worker.shutdown().await;
            tracing::info!(
                failed = self.activity.failed_writes(),
                dropped = self.activity.dropped_entries(),
                "log de atividades drenado"
            );
        }
        if let Some(pool) = &self.db_pool {
            pool.close().await;
        }
    }
}
