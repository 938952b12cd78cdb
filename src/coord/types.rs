//! Core types for commit arbitration
//!
//! Identifiers, task end reasons, and the wire messages exchanged between
//! tasks, the scheduler, and the coordinator.

use serde::{Deserialize, Serialize};

/// Identifier of a stage within the running job.
pub type StageId = u64;

/// Index of a logical task within its stage.
pub type TaskId = u32;

/// Identifier of one physical attempt, unique within a (stage, task).
pub type AttemptId = u32;

/// Why a task attempt finished.
///
/// The coordinator only ever inspects the variant, never the payload: a
/// `CommitDenied` was produced by this coordinator and must not release the
/// lock held by the real committer, while any `Other` outcome means the
/// attempt genuinely failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TaskEndReason {
    /// The attempt finished its work.
    Success,
    /// The attempt asked to commit and this coordinator said no.
    CommitDenied {
        job: StageId,
        split: TaskId,
        attempt: AttemptId,
    },
    /// Anything else: executor lost, exception, killed.
    Other { description: String },
}

impl TaskEndReason {
    /// Failure descriptor with a free-form description.
    pub fn failure(description: impl Into<String>) -> Self {
        TaskEndReason::Other {
            description: description.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskEndReason::Success)
    }

    pub fn is_commit_denied(&self) -> bool {
        matches!(self, TaskEndReason::CommitDenied { .. })
    }

    /// Whether this outcome frees the commit slot held by the attempt.
    ///
    /// Success keeps the slot pinned (a late duplicate must still be denied)
    /// and a denial never touches a lock it was refused in the first place.
    pub fn releases_lock(&self) -> bool {
        matches!(self, TaskEndReason::Other { .. })
    }
}

/// Wire messages understood by the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CoordinatorMessage {
    /// The scheduler announced a stage as live.
    StageStarted { stage: StageId },
    /// The scheduler retired a stage; all of its grants are void.
    StageEnded { stage: StageId },
    /// A task attempt requests permission to publish its output.
    AskPermissionToCommit {
        stage: StageId,
        task: TaskId,
        attempt: AttemptId,
    },
    /// A task attempt finished, one way or another.
    TaskCompleted {
        stage: StageId,
        task: TaskId,
        attempt: AttemptId,
        reason: TaskEndReason,
    },
    /// Shut the coordinator down.
    StopCoordinator,
}

impl CoordinatorMessage {
    /// Encode for the wire.
    pub fn encode(&self) -> crate::error::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode one wire payload.
    pub fn decode(raw: &[u8]) -> crate::error::Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }
}
