use std::any::Any;

use http::StatusCode;
use thiserror::Error;
use tokio::task::JoinError;

use crate::core::result::ActionResult;

/// Failure reading a value out of a [`RequestContext`](crate::core::RequestContext).
///
/// This is a programmer error (a step read a key nobody wrote, or read it with
/// the wrong type), not a request-level failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    #[error("No value stored in request context under key '{key}'")]
    MissingKey { key: &'static str },

    #[error("Request context key '{key}' holds a {found}, not a {expected}")]
    TypeMismatch {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Every failure that can surface while an action runs.
///
/// None of these ever reach the caller of [`Action::run`](crate::core::Action::run):
/// the recovery stage turns each one into an error [`ActionResult`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ActionError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Action panicked: {0}")]
    Panicked(String),

    #[error("Action was cancelled before completing")]
    Cancelled,

    #[error("No execution pool available: {0}")]
    NoExecutor(String),

    #[error(transparent)]
    Failed(#[from] eyre::Report),
}

impl ActionError {
    /// Build a failure from a plain message.
    pub fn msg(message: impl std::fmt::Display) -> Self {
        Self::Failed(eyre::eyre!("{message}"))
    }

    /// Wrap any standard error.
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Failed(eyre::Report::new(error))
    }

    /// Status code reported for this failure. Every kind is a server-side fault.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Short machine-readable label, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Context(_) => "context",
            Self::Panicked(_) => "panic",
            Self::Cancelled => "cancelled",
            Self::NoExecutor(_) => "executor",
            Self::Failed(_) => "failed",
        }
    }

    /// Translate the failure into the error result handed back to the collaborator.
    pub fn into_result(self) -> ActionResult {
        let body = serde_json::json!({ "error": self.to_string() });
        ActionResult::new(self.status()).json(body)
    }
}

impl From<JoinError> for ActionError {
    fn from(err: JoinError) -> Self {
        if err.is_panic() {
            Self::Panicked(panic_message(err.into_panic()))
        } else {
            Self::Cancelled
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send + 'static>) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
