//! Committers table: stage -> task -> authorized attempt
//!
//! A mechanical two-level mapping. The table knows nothing about the commit
//! protocol; all decisions live in the kernel. It is owned exclusively by the
//! dispatcher task, so no locking is involved.

use std::collections::HashMap;

use crate::coord::types::{AttemptId, StageId, TaskId};

/// Authorized committers for the tasks of one live stage.
#[derive(Debug, Default)]
pub struct StageCommitSet {
    committers: HashMap<TaskId, AttemptId>,
}

impl StageCommitSet {
    /// The attempt currently holding the commit slot for `task`, if any.
    pub fn authorized(&self, task: TaskId) -> Option<AttemptId> {
        self.committers.get(&task).copied()
    }

    /// Record `attempt` as the authorized committer for `task`.
    ///
    /// Callers must check the slot is empty first; the kernel enforces
    /// first-writer-wins on top of this.
    pub fn grant(&mut self, task: TaskId, attempt: AttemptId) {
        self.committers.insert(task, attempt);
    }

    /// Clear the slot for `task`.
    pub fn revoke(&mut self, task: TaskId) {
        self.committers.remove(&task);
    }

    pub fn len(&self) -> usize {
        self.committers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committers.is_empty()
    }
}

/// All live stages and their commit sets.
///
/// Absence of a stage means "not live": permission requests for it are
/// denied and completions are ignored.
#[derive(Debug, Default)]
pub struct CommittersByStage {
    stages: HashMap<StageId, StageCommitSet>,
}

impl CommittersByStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty commit set for `stage`, replacing any existing one.
    /// Returns true when a previous set was discarded.
    pub fn begin_stage(&mut self, stage: StageId) -> bool {
        self.stages.insert(stage, StageCommitSet::default()).is_some()
    }

    /// Retire `stage`, discarding its commit set. Returns true when the
    /// stage was live.
    pub fn end_stage(&mut self, stage: StageId) -> bool {
        self.stages.remove(&stage).is_some()
    }

    pub fn is_live(&self, stage: StageId) -> bool {
        self.stages.contains_key(&stage)
    }

    pub fn stage(&self, stage: StageId) -> Option<&StageCommitSet> {
        self.stages.get(&stage)
    }

    pub fn stage_mut(&mut self, stage: StageId) -> Option<&mut StageCommitSet> {
        self.stages.get_mut(&stage)
    }

    /// Shorthand used by the kernel and tests.
    pub fn authorized(&self, stage: StageId, task: TaskId) -> Option<AttemptId> {
        self.stage(stage).and_then(|set| set.authorized(task))
    }

    /// Record `attempt` as the authorized committer for (`stage`, `task`)
    /// if the slot is empty. First writer wins: returns false when the
    /// stage is not live or the slot is already held, by anyone.
    pub fn authorize(&mut self, stage: StageId, task: TaskId, attempt: AttemptId) -> bool {
        match self.stages.get_mut(&stage) {
            Some(set) if set.authorized(task).is_none() => {
                set.grant(task, attempt);
                true
            }
            _ => false,
        }
    }

    /// Clear the slot for (`stage`, `task`) only when it is held by
    /// `attempt`. Returns true when a slot was actually released.
    pub fn release(&mut self, stage: StageId, task: TaskId, attempt: AttemptId) -> bool {
        match self.stages.get_mut(&stage) {
            Some(set) if set.authorized(task) == Some(attempt) => {
                set.revoke(task);
                true
            }
            _ => false,
        }
    }

    /// Drop every stage. Used on shutdown.
    pub fn clear(&mut self) {
        self.stages.clear();
    }

    pub fn live_stages(&self) -> usize {
        self.stages.len()
    }

    /// Total number of held commit slots across all live stages.
    pub fn held_slots(&self) -> usize {
        self.stages.values().map(StageCommitSet::len).sum()
    }
}
