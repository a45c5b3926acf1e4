//! Failures a source adapter reports to the orchestrator

use thiserror::Error;

/// Failure of one source fetch, consumed by the orchestrator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Network failure, non-2xx response or exceeded deadline
    #[error("{provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    /// The response as a whole could not be understood
    #[error("{provider} returned an unexpected response: {reason}")]
    Schema { provider: String, reason: String },

    /// Registered without an implementation (no credentials)
    #[error("{provider} is not implemented (API key registration required)")]
    Unimplemented { provider: String },
}

impl SourceError {
    pub fn unavailable(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::Schema {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error indicates something went wrong, as opposed to an inert source
    #[must_use]
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Unimplemented { .. })
    }
}
