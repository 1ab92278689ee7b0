// src/services/activity_log.rs
//
// Log de atividades fora do caminho da requisição: as operações enfileiram
// uma entrada e seguem; uma task dedicada grava no banco. Falha de gravação
// nunca volta para o chamador nem desfaz a operação principal.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    common::error::AppError,
    db::ActivityLogRepository,
    models::{
        activity::{ActivityLog, EntityType, LogType},
        auth::User,
        project::Project,
        worker::Worker,
    },
};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Valores que sabem qual entidade representam (para preencher `entity_id`).
pub trait Audited {
    fn entity_id(&self) -> Option<i64>;
}

impl Audited for Worker {
    fn entity_id(&self) -> Option<i64> {
        Some(self.id)
    }
}

impl Audited for Project {
    fn entity_id(&self) -> Option<i64> {
        Some(self.id)
    }
}

impl Audited for User {
    fn entity_id(&self) -> Option<i64> {
        Some(self.id)
    }
}

impl Audited for () {
    fn entity_id(&self) -> Option<i64> {
        None
    }
}

/// O que registrar quando a operação der certo.
#[derive(Debug, Clone)]
pub struct Action {
    pub user_id: i64,
    pub log_type: LogType,
    pub entity_type: EntityType,
    pub entity_id: Option<i64>,
    pub detail: String,
}

impl Action {
    pub fn new(user_id: i64, log_type: LogType, entity_type: EntityType) -> Self {
        Self {
            user_id,
            log_type,
            entity_type,
            entity_id: None,
            detail: String::new(),
        }
    }

    pub fn entity(mut self, id: i64) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Handle barato de clonar que enfileira entradas.
#[derive(Clone)]
pub struct ActivityLogger {
    tx: mpsc::Sender<ActivityLog>,
    counters: Arc<Counters>,
}

/// Task gravadora. `shutdown` drena a fila antes de encerrar.
pub struct ActivityLogWorker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ActivityLogger {
    pub fn spawn(repo: Arc<dyn ActivityLogRepository>, capacity: usize) -> (Self, ActivityLogWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let counters = Arc::new(Counters::default());

        let handle = tokio::spawn(run(repo, rx, shutdown_rx, counters.clone()));

        (
            Self { tx, counters },
            ActivityLogWorker {
                shutdown: shutdown_tx,
                handle,
            },
        )
    }

    /// Enfileira sem esperar. Fila cheia ou fechada: a entrada vai só para o log de diagnóstico.
    pub fn record(&self, entry: ActivityLog) {
        if let Err(err) = self.tx.try_send(entry) {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            let entry = match err {
                mpsc::error::TrySendError::Full(entry) | mpsc::error::TrySendError::Closed(entry) => entry,
            };
            tracing::warn!(
                target: "activity_log",
                entry_id = %entry.id,
                user_id = ?entry.user_id,
                log_type = ?entry.log_type,
                entity_type = ?entry.entity_type,
                entity_id = ?entry.entity_id,
                "fila de log de atividades indisponível; entrada descartada"
            );
        }
    }

    /// Executa a operação e, se ela tiver sucesso, registra a ação.
    /// O resultado é devolvido intacto em qualquer caso.
    pub async fn audit<T, Fut>(&self, action: Action, op: Fut) -> Result<T, AppError>
    where
        T: Audited,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let result = op.await;
        if let Ok(value) = &result {
            self.record(ActivityLog::new(
                Some(action.user_id),
                action.log_type,
                action.entity_type,
                value.entity_id().or(action.entity_id),
                action.detail,
            ));
        }
        result
    }

    pub fn failed_writes(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    pub fn dropped_entries(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }
}

impl ActivityLogWorker {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.await {
            tracing::error!(target: "activity_log", "task de log de atividades terminou com erro: {}", e);
        }
    }
}

async fn run(
    repo: Arc<dyn ActivityLogRepository>,
    mut rx: mpsc::Receiver<ActivityLog>,
    mut shutdown: oneshot::Receiver<()>,
    counters: Arc<Counters>,
) {
    // Uma única task grava em ordem de chegada: a ordem por usuário se mantém.
    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(entry) => write(repo.as_ref(), entry, &counters).await,
                None => break,
            },
            _ = &mut shutdown => {
                rx.close();
                while let Some(entry) = rx.recv().await {
                    write(repo.as_ref(), entry, &counters).await;
                }
                break;
            }
        }
    }
    tracing::info!(target: "activity_log", "task de log de atividades encerrada");
}

async fn write(repo: &dyn ActivityLogRepository, entry: ActivityLog, counters: &Counters) {
    if let Err(e) = repo.append(&entry).await {
        counters.failed.fetch_add(1, Ordering::Relaxed);
        tracing::error!(
            target: "activity_log",
            entry_id = %entry.id,
            user_id = ?entry.user_id,
            log_type = ?entry.log_type,
            entity_type = ?entry.entity_type,
            entity_id = ?entry.entity_id,
            detail = %entry.detail,
            error = ?e,
            "falha ao gravar log de atividade"
        );
    }
}
