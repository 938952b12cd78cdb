//! Client facade: the coordinator as the scheduler and tasks see it
//!
//! The facade owns the dispatcher's lifecycle. Notifications are
//! fire-and-forget; `can_commit` is the one blocking call, routed through the
//! ask transport with retry. Once stopped (or before being started) the
//! facade denies rather than errors: a denial is safe at any time, because a
//! caller that is told "no" simply does not commit.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::CoordinatorConfig;
use crate::coord::dispatcher::{CommitDispatcher, CoordinatorHandle};
use crate::coord::types::{AttemptId, CoordinatorMessage, StageId, TaskEndReason, TaskId};
use crate::error::{CoordError, Result};
use crate::metrics::{CoordinatorMetrics, MetricsSnapshot};
use crate::transport::{ask_with_retry, AskTransport, LocalTransport};

#[derive(Clone)]
struct Attachment {
    handle: CoordinatorHandle,
    transport: Arc<dyn AskTransport>,
}

/// Driver-resident authority deciding which task attempt may commit its
/// output for each (stage, task).
pub struct OutputCommitCoordinator {
    config: CoordinatorConfig,
    metrics: Arc<CoordinatorMetrics>,
    attached: RwLock<Option<Attachment>>,
}

impl std::fmt::Debug for OutputCommitCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputCommitCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OutputCommitCoordinator {
    /// Validate `config`, spawn the dispatcher, and attach the in-memory
    /// transport.
    pub fn start(config: CoordinatorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(CoordError::InvalidConfiguration)?;
        let metrics = Arc::new(CoordinatorMetrics::new());
        let handle = CommitDispatcher::spawn(&config, metrics.clone());
        let transport: Arc<dyn AskTransport> = Arc::new(LocalTransport::new(handle.clone()));
        info!(
            "commit coordinator started (ask timeout {:?}, {} attempt(s))",
            config.ask_timeout, config.max_ask_attempts
        );
        Ok(Self {
            config,
            metrics,
            attached: RwLock::new(Some(Attachment { handle, transport })),
        })
    }

    /// Route future asks through `transport` instead of the in-memory one.
    ///
    /// Returns false when the coordinator is already detached. Notifications
    /// keep using the dispatcher handle directly.
    pub async fn attach_transport(&self, transport: Arc<dyn AskTransport>) -> bool {
        let mut attached = self.attached.write().await;
        match attached.as_mut() {
            Some(attachment) => {
                attachment.transport = transport;
                true
            }
            None => false,
        }
    }

    /// The in-process address of the dispatcher, while attached. This is
    /// what a remote ingress would hand decoded wire traffic to.
    pub async fn handle(&self) -> Option<CoordinatorHandle> {
        self.attached.read().await.as_ref().map(|a| a.handle.clone())
    }

    /// Announce `stage` as live and eligible for commit grants.
    pub async fn stage_start(&self, stage: StageId) {
        self.notify(CoordinatorMessage::StageStarted { stage }).await;
    }

    /// Retire `stage`; every grant under it becomes void.
    pub async fn stage_end(&self, stage: StageId) {
        self.notify(CoordinatorMessage::StageEnded { stage }).await;
    }

    /// Report how an attempt finished so the kernel can release or keep the
    /// commit slot.
    pub async fn task_completed(
        &self,
        stage: StageId,
        task: TaskId,
        attempt: AttemptId,
        reason: TaskEndReason,
    ) {
        self.notify(CoordinatorMessage::TaskCompleted {
            stage,
            task,
            attempt,
            reason,
        })
        .await;
    }

    /// Ask whether `attempt` may commit the output of (`stage`, `task`).
    ///
    /// `Ok(false)` is a definite denial, including the detached/stopped
    /// cases. `Err(Unreachable)` means no verdict was obtained; the caller
    /// must not commit on that either.
    pub async fn can_commit(
        &self,
        stage: StageId,
        task: TaskId,
        attempt: AttemptId,
    ) -> Result<bool> {
        let Some(attachment) = self.attachment().await else {
            debug!(
                "denying commit of stage {} task {} attempt {}: coordinator detached",
                stage, task, attempt
            );
            return Ok(false);
        };
        match ask_with_retry(attachment.transport.as_ref(), stage, task, attempt, &self.config).await
        {
            Ok(decision) => Ok(decision),
            Err(CoordError::Stopped) => {
                debug!(
                    "denying commit of stage {} task {} attempt {}: coordinator stopped",
                    stage, task, attempt
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Detach and shut the dispatcher down, waiting for its acknowledgement.
    /// Idempotent; later notifications are dropped and later asks denied.
    pub async fn stop(&self) -> Result<()> {
        let Some(attachment) = self.attached.write().await.take() else {
            return Ok(());
        };
        info!("stopping commit coordinator");
        match attachment.handle.stop().await {
            Ok(_) => Ok(()),
            // The dispatcher was already gone; stopping twice is fine.
            Err(CoordError::ChannelSend(_)) | Err(CoordError::ChannelClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Point-in-time counters of the decisions made so far.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    async fn attachment(&self) -> Option<Attachment> {
        self.attached.read().await.clone()
    }

    async fn notify(&self, message: CoordinatorMessage) {
        let Some(attachment) = self.attachment().await else {
            self.metrics.record_event_dropped();
            debug!("dropping {:?}: coordinator detached", message);
            return;
        };
        attachment.handle.notify(message).await;
    }
}
