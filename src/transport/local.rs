//! In-memory transport over the dispatcher mailbox.

use async_trait::async_trait;

use crate::coord::dispatcher::CoordinatorHandle;
use crate::coord::types::{AttemptId, StageId, TaskId};
use crate::error::{CoordError, Result};
use crate::transport::AskTransport;

/// Transport for tasks running inside the driver process: asks go straight
/// into the dispatcher mailbox.
pub struct LocalTransport {
    handle: CoordinatorHandle,
}

impl LocalTransport {
    pub fn new(handle: CoordinatorHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl AskTransport for LocalTransport {
    async fn ask(&self, stage: StageId, task: TaskId, attempt: AttemptId) -> Result<bool> {
        if self.handle.is_closed() {
            return Err(CoordError::Stopped);
        }
        match self.handle.ask(stage, task, attempt).await {
            Ok(decision) => Ok(decision),
            // A dead mailbox mid-ask means the dispatcher shut down, not a
            // flaky link. Report it as such so retries stop immediately.
            Err(CoordError::ChannelSend(_)) | Err(CoordError::ChannelClosed) => {
                Err(CoordError::Stopped)
            }
            Err(e) => Err(e),
        }
    }
}
