use humility_core::errors::GatewayError;

/// Errors surfaced by [`crate::Session`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("analysis needs {required} user messages, only {user_turns} so far")]
    AnalysisUnavailable { user_turns: usize, required: usize },

    /// The completion call failed. For a chat turn, `unsent` holds the text that
    /// was not recorded so it can be offered for resubmission.
    #[error("completion failed: {source}")]
    Transport {
        #[source]
        source: GatewayError,
        unsent: Option<String>,
    },
}

impl SessionError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn unsent(&self) -> Option<&str> {
        match self {
            Self::Transport { unsent, .. } => unsent.as_deref(),
            _ => None,
        }
    }
}
