//! commitgate - output commit arbitration for speculative task execution.
//!
//! In a distributed data-processing job the same logical task may run as
//! several concurrent attempts (speculation, retries after fetch failures).
//! If more than one attempt publishes output to the task's final location,
//! the results are corrupt. This crate provides the driver-resident
//! authority that guarantees at most one successful committer per
//! (stage, task), while still letting a later attempt commit after the
//! authorized one genuinely failed.
//!
//! The moving parts:
//!
//! - [`coord::table`]: the in-memory committers table,
//!   stage -> task -> authorized attempt.
//! - [`coord::kernel`]: the arbitration rules, pure functions over the table.
//! - [`coord::dispatcher`]: a single-consumer mailbox actor; all mutation and
//!   every reply happens on its task, so decisions are serial by
//!   construction.
//! - [`coord::client`]: the [`OutputCommitCoordinator`] facade used in
//!   process by the scheduler and, via a transport, by remote tasks.
//! - [`transport`]: the ask seam with bounded retries and per-attempt
//!   timeouts; exhaustion surfaces as [`CoordError::Unreachable`] and must be
//!   treated as a denial.
//!
//! ```no_run
//! use commitgate::{CoordinatorConfig, OutputCommitCoordinator, TaskEndReason};
//!
//! # async fn demo() -> commitgate::Result<()> {
//! let coordinator = OutputCommitCoordinator::start(CoordinatorConfig::default())?;
//!
//! coordinator.stage_start(5).await;
//! if coordinator.can_commit(5, 9, 100).await? {
//!     // ... publish the output artifact, then:
//!     coordinator.task_completed(5, 9, 100, TaskEndReason::Success).await;
//! }
//! coordinator.stage_end(5).await;
//! coordinator.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coord;
pub mod error;
pub mod metrics;
pub mod transport;

pub use config::{CoordinatorConfig, CoordinatorConfigBuilder};
pub use coord::client::OutputCommitCoordinator;
pub use coord::dispatcher::{CommitDispatcher, CoordinatorHandle};
pub use coord::types::{AttemptId, CoordinatorMessage, StageId, TaskEndReason, TaskId};
pub use error::{CoordError, Result};
pub use metrics::{CoordinatorMetrics, MetricsSnapshot};
pub use transport::{ask_with_retry, AskTransport, LocalTransport};
