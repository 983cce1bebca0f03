// Error taxonomy shared by every layer
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("could not reach the sheet service: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("the sheet returned no rows")]
    EmptyResult,

    #[error("{0}")]
    AuthenticationFailure(String),

    #[error("{0}")]
    ValidationFailure(String),
}

impl DashboardError {
    /// Failures detected before a usable body arrived.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            DashboardError::Transport(_) | DashboardError::MalformedResponse(_)
        )
    }
}
