//! Decision kernel: the commit arbitration rules
//!
//! Four handlers, each a plain function over the committers table. They never
//! block, never fail, and run only on the dispatcher task, so the table state
//! they observe is exactly the state their decision is based on.

use tracing::{debug, info};

use crate::coord::table::CommittersByStage;
use crate::coord::types::{AttemptId, StageId, TaskEndReason, TaskId};

/// Open a fresh commit set for `stage`.
///
/// A repeated start for the same stage replaces the existing set: the driver
/// has abandoned the prior stage attempt, and grants issued to it must not
/// survive into the new one.
pub fn handle_stage_start(table: &mut CommittersByStage, stage: StageId) {
    if table.begin_stage(stage) {
        info!("stage {} restarted, discarding previous commit grants", stage);
    } else {
        debug!("stage {} is now accepting commit requests", stage);
    }
}

/// Retire `stage` and every grant under it. Idempotent on a missing stage.
pub fn handle_stage_end(table: &mut CommittersByStage, stage: StageId) {
    if table.end_stage(stage) {
        debug!("stage {} ended, commit set discarded", stage);
    } else {
        debug!("stage {} ended but was not live, ignoring", stage);
    }
}

/// Decide whether `attempt` may commit the output of (`stage`, `task`).
///
/// The first attempt to ask for an empty slot wins it; everyone else is
/// denied, including the holder asking again. Asking does not renew.
pub fn handle_ask_permission(
    table: &mut CommittersByStage,
    stage: StageId,
    task: TaskId,
    attempt: AttemptId,
) -> bool {
    if !table.is_live(stage) {
        debug!(
            "denying commit of stage {} task {} attempt {}: stage not live",
            stage, task, attempt
        );
        return false;
    }
    if table.authorize(stage, task, attempt) {
        info!(
            "authorizing attempt {} to commit stage {} task {}",
            attempt, stage, task
        );
        true
    } else {
        if let Some(existing) = table.authorized(stage, task) {
            debug!(
                "denying commit of stage {} task {} attempt {}: slot held by attempt {}",
                stage, task, attempt, existing
            );
        }
        false
    }
}

/// Apply a task completion to the table. Returns true when the completion
/// released a held commit slot.
///
/// Only a genuine failure of the authorized attempt frees the slot. Success
/// pins it until the stage ends, a denial issued by this coordinator is
/// inert, and a failure of some never-granted attempt leaves the real
/// committer's lock alone.
pub fn handle_task_completion(
    table: &mut CommittersByStage,
    stage: StageId,
    task: TaskId,
    attempt: AttemptId,
    reason: &TaskEndReason,
) -> bool {
    if !table.is_live(stage) {
        debug!(
            "ignoring completion of stage {} task {} attempt {}: stage not live",
            stage, task, attempt
        );
        return false;
    }
    if !reason.releases_lock() {
        debug!(
            "completion of stage {} task {} attempt {} keeps the slot as-is ({})",
            stage,
            task,
            attempt,
            if reason.is_success() { "success" } else { "commit denied" }
        );
        return false;
    }
    if table.release(stage, task, attempt) {
        info!(
            "attempt {} of stage {} task {} failed, commit slot released",
            attempt, stage, task
        );
        true
    } else {
        match table.authorized(stage, task) {
            Some(holder) => debug!(
                "attempt {} of stage {} task {} failed without holding the slot (held by {})",
                attempt, stage, task, holder
            ),
            None => debug!(
                "attempt {} of stage {} task {} failed with no slot held",
                attempt, stage, task
            ),
        }
        false
    }
}
