use thiserror::Error;

/// Why a submission ended in the Failure slot.
///
/// `Display` is the message shown to the user verbatim; the variant only
/// matters for logging and tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{0}")] LocalValidation(String),
    #[error("{0}")] Transport(String),
    #[error("{0}")] Server(String),
    #[error("{0}")] PayloadShape(String),
}

impl SubmitError {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::LocalValidation(_) => "local_validation",
            SubmitError::Transport(_) => "transport",
            SubmitError::Server(_) => "server",
            SubmitError::PayloadShape(_) => "payload_shape",
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(e: reqwest::Error) -> Self {
        SubmitError::Transport(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")] Missing(&'static str),
    #[error("invalid value for {name}: {reason}")] Invalid { name: &'static str, reason: String },
}
