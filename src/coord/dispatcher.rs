//! Message dispatcher: the single-writer mailbox around the kernel
//!
//! One tokio task owns the committers table and drains a bounded mpsc
//! mailbox. Events are handled strictly one at a time with no await points
//! inside a handler, so every decision sees a quiescent table.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::CoordinatorConfig;
use crate::coord::kernel;
use crate::coord::table::CommittersByStage;
use crate::coord::types::{AttemptId, CoordinatorMessage, StageId, TaskId};
use crate::error::Result;
use crate::metrics::CoordinatorMetrics;

/// What travels through the dispatcher mailbox.
///
/// Notifications carry no reply path; asks carry a oneshot for the verdict,
/// and stop carries one for the shutdown acknowledgement.
enum Envelope {
    Event(CoordinatorMessage),
    Ask {
        stage: StageId,
        task: TaskId,
        attempt: AttemptId,
        reply: oneshot::Sender<bool>,
    },
    Stop {
        ack: oneshot::Sender<bool>,
    },
}

/// Single-consumer actor owning the committers table.
pub struct CommitDispatcher {
    mailbox: mpsc::Receiver<Envelope>,
    table: CommittersByStage,
    metrics: Arc<CoordinatorMetrics>,
}

impl CommitDispatcher {
    /// Spawn the dispatcher task and return the handle used to reach it.
    pub fn spawn(config: &CoordinatorConfig, metrics: Arc<CoordinatorMetrics>) -> CoordinatorHandle {
        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let dispatcher = Self {
            mailbox: rx,
            table: CommittersByStage::new(),
            metrics: metrics.clone(),
        };
        tokio::spawn(dispatcher.run());
        CoordinatorHandle { tx, metrics }
    }

    async fn run(mut self) {
        debug!("commit dispatcher running");
        while let Some(envelope) = self.mailbox.recv().await {
            if !self.handle_envelope(envelope) {
                break;
            }
        }
        // Reached on stop or when every sender is gone. Either way the
        // coordinator is done arbitrating.
        self.table.clear();
        info!("commit dispatcher stopped");
    }

    /// Process one envelope. Returns false when the loop should exit.
    fn handle_envelope(&mut self, envelope: Envelope) -> bool {
        match envelope {
            Envelope::Ask {
                stage,
                task,
                attempt,
                reply,
            } => {
                let granted = kernel::handle_ask_permission(&mut self.table, stage, task, attempt);
                self.metrics.record_decision(granted);
                if reply.send(granted).is_err() {
                    // The caller timed out and went away. The table mutation
                    // stands; a retried ask will observe the held slot.
                    debug!(
                        "ask reply for stage {} task {} attempt {} had no listener",
                        stage, task, attempt
                    );
                }
                true
            }
            Envelope::Stop { ack } => {
                let _ = ack.send(true);
                false
            }
            Envelope::Event(message) => self.handle_event(message),
        }
    }

    fn handle_event(&mut self, message: CoordinatorMessage) -> bool {
        match message {
            CoordinatorMessage::StageStarted { stage } => {
                kernel::handle_stage_start(&mut self.table, stage);
                self.metrics.record_stage_started();
            }
            CoordinatorMessage::StageEnded { stage } => {
                kernel::handle_stage_end(&mut self.table, stage);
                self.metrics.record_stage_ended();
            }
            CoordinatorMessage::TaskCompleted {
                stage,
                task,
                attempt,
                reason,
            } => {
                if kernel::handle_task_completion(&mut self.table, stage, task, attempt, &reason) {
                    self.metrics.record_lock_released();
                }
            }
            CoordinatorMessage::AskPermissionToCommit {
                stage,
                task,
                attempt,
            } => {
                // An ask that arrived without a reply path: a duplicate of a
                // request whose caller already gave up. Still run it so the
                // table converges; the verdict has nowhere to go.
                let granted = kernel::handle_ask_permission(&mut self.table, stage, task, attempt);
                self.metrics.record_decision(granted);
                debug!(
                    "replyless ask for stage {} task {} attempt {} decided: {}",
                    stage, task, attempt, granted
                );
            }
            CoordinatorMessage::StopCoordinator => return false,
        }
        true
    }
}

/// Cloneable sender half of the dispatcher mailbox.
///
/// This is the in-process address of the coordinator: the client facade holds
/// one, and a remote ingress feeds decoded wire traffic through one.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Envelope>,
    metrics: Arc<CoordinatorMetrics>,
}

impl CoordinatorHandle {
    /// Fire-and-forget notification. Once the dispatcher has stopped this
    /// becomes a silent drop.
    pub async fn notify(&self, message: CoordinatorMessage) {
        if self.tx.send(Envelope::Event(message)).await.is_err() {
            self.metrics.record_event_dropped();
            debug!("notification dropped: dispatcher no longer running");
        }
    }

    /// One ask round-trip: enqueue the request and await the verdict.
    pub async fn ask(&self, stage: StageId, task: TaskId, attempt: AttemptId) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope::Ask {
                stage,
                task,
                attempt,
                reply: reply_tx,
            })
            .await?;
        Ok(reply_rx.await?)
    }

    /// Ask the dispatcher to stop and await its acknowledgement.
    pub async fn stop(&self) -> Result<bool> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx.send(Envelope::Stop { ack: ack_tx }).await?;
        Ok(ack_rx.await?)
    }

    /// Decode one wire payload, dispatch it, and return the reply for the
    /// message kinds that carry one: the verdict of an
    /// `AskPermissionToCommit`, the acknowledgement of a `StopCoordinator`.
    /// Notifications yield `None`, as does a reply the dispatcher could no
    /// longer produce.
    ///
    /// Malformed payloads are logged at warn and dropped; they never reach
    /// the dispatcher loop.
    pub async fn deliver_encoded(&self, raw: &[u8]) -> Option<bool> {
        let message = match CoordinatorMessage::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                self.metrics.record_event_dropped();
                warn!("dropping {}", e);
                return None;
            }
        };
        match message {
            CoordinatorMessage::AskPermissionToCommit {
                stage,
                task,
                attempt,
            } => self.ask(stage, task, attempt).await.ok(),
            CoordinatorMessage::StopCoordinator => self.stop().await.ok(),
            other => {
                self.notify(other).await;
                None
            }
        }
    }

    /// Whether the dispatcher mailbox is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
