//! Ask transport: how permission requests reach the coordinator
//!
//! `can_commit` is the only blocking call in the protocol, and the only one
//! that crosses a process boundary in a real deployment. The trait below is
//! the narrow seam: one ask round-trip. Retry, spacing, and the per-attempt
//! timeout live in [`ask_with_retry`] so every transport gets the same
//! failure semantics.

use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::config::CoordinatorConfig;
use crate::coord::types::{AttemptId, StageId, TaskId};
use crate::error::{CoordError, Result};

pub mod local;

pub use local::LocalTransport;

/// One send attempt of `AskPermissionToCommit`, awaiting the verdict.
#[async_trait]
pub trait AskTransport: Send + Sync {
    async fn ask(&self, stage: StageId, task: TaskId, attempt: AttemptId) -> Result<bool>;
}

/// Drive up to `max_ask_attempts` asks through `transport`.
///
/// Each attempt is individually bounded by `ask_timeout`; attempts are spaced
/// by `retry_interval`. The first reply wins and is returned verbatim. A
/// `Stopped` transport fails fast: retrying a coordinator that shut down on
/// purpose cannot succeed. On exhaustion the caller gets `Unreachable` and
/// must treat it as a denial.
pub async fn ask_with_retry(
    transport: &dyn AskTransport,
    stage: StageId,
    task: TaskId,
    attempt: AttemptId,
    config: &CoordinatorConfig,
) -> Result<bool> {
    for round in 1..=config.max_ask_attempts {
        if round > 1 {
            sleep(config.retry_interval).await;
        }
        match timeout(config.ask_timeout, transport.ask(stage, task, attempt)).await {
            Ok(Ok(decision)) => return Ok(decision),
            Ok(Err(CoordError::Stopped)) => return Err(CoordError::Stopped),
            Ok(Err(e)) => {
                warn!(
                    "ask {}/{} for stage {} task {} attempt {} failed: {}",
                    round, config.max_ask_attempts, stage, task, attempt, e
                );
            }
            Err(_) => {
                warn!(
                    "ask {}/{} for stage {} task {} attempt {} timed out after {:?}",
                    round, config.max_ask_attempts, stage, task, attempt, config.ask_timeout
                );
            }
        }
    }
    Err(CoordError::Unreachable {
        attempts: config.max_ask_attempts,
    })
}
