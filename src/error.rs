use thiserror::Error;

/// Errors surfaced by the commit coordinator client.
///
/// The decision kernel itself never fails; everything here comes from the
/// plumbing around it (transport, mailbox, configuration).
#[derive(Error, Debug)]
pub enum CoordError {
    /// The transport exhausted its send attempts without a reply.
    /// Callers must treat this exactly like a denial and not commit.
    #[error("commit coordinator unreachable after {attempts} ask attempt(s)")]
    Unreachable { attempts: u32 },

    /// The coordinator has been stopped and its mailbox detached.
    #[error("commit coordinator is stopped")]
    Stopped,

    /// A wire payload failed to decode.
    #[error("malformed coordinator message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    #[error("mailbox send failed: {0}")]
    ChannelSend(String),

    #[error("reply channel closed before a decision arrived")]
    ChannelClosed,

    #[error("invalid coordinator configuration: {0}")]
    InvalidConfiguration(String),
}

impl CoordError {
    /// Whether a caller seeing this error must behave as if the commit was
    /// denied. True for every variant a task can encounter at ask time.
    pub fn denies_commit(&self) -> bool {
        matches!(
            self,
            CoordError::Unreachable { .. }
                | CoordError::Stopped
                | CoordError::ChannelSend(_)
                | CoordError::ChannelClosed
        )
    }
}

/// Result type alias for coordinator operations.
pub type Result<T> = std::result::Result<T, CoordError>;

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for CoordError {
    fn from(e: tokio::sync::mpsc::error::SendError<T>) -> Self {
        CoordError::ChannelSend(e.to_string())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for CoordError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        CoordError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_time_errors_deny_commit() {
        assert!(CoordError::Unreachable { attempts: 3 }.denies_commit());
        assert!(CoordError::Stopped.denies_commit());
        assert!(CoordError::ChannelClosed.denies_commit());
        assert!(!CoordError::InvalidConfiguration("bad".into()).denies_commit());
    }

    #[test]
    fn unreachable_display_names_attempts() {
        let err = CoordError::Unreachable { attempts: 3 };
        assert!(err.to_string().contains("3 ask attempt"));
    }
}
