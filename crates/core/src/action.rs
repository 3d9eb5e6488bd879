//! The user action seam.
//!
//! A user action is the task being audited. Only [`UserAction::train`] is
//! required; the remaining capabilities return `None` when the action has
//! nothing to report, and the orchestrator omits the matching record key.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt::{self, Write as _};

use serde_json::Value;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

pub trait UserAction {
    /// Run the task. Any error is recorded in the run log, not propagated.
    fn train(&mut self) -> Result<(), ActionError>;

    /// Application name recorded as `app_name`; empty means "not recorded".
    fn app_name(&self) -> String {
        String::new()
    }

    fn input_files(&self) -> Option<Vec<String>> {
        None
    }

    fn output_files(&self) -> Option<Vec<String>> {
        None
    }

    fn parameters(&self) -> Option<Value> {
        None
    }
}

/// A failure raised by user code, with the backtrace captured where it was
/// created.
#[derive(Debug)]
pub struct ActionError {
    message: String,
    source: Option<BoxError>,
    location: Option<String>,
    backtrace: Backtrace,
}

impl ActionError {
    pub fn msg(message: impl Into<String>) -> Self {
        ActionError {
            message: message.into(),
            source: None,
            location: None,
            backtrace: Backtrace::force_capture(),
        }
    }

    /// Wrap an underlying error; its display text becomes the message.
    pub fn from_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        ActionError {
            message: error.to_string(),
            source: Some(Box::new(error)),
            location: None,
            backtrace: Backtrace::force_capture(),
        }
    }

    /// Wrap an underlying error under a message of the caller's choosing.
    pub fn context<E>(message: impl Into<String>, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        ActionError {
            message: message.into(),
            source: Some(Box::new(error)),
            location: None,
            backtrace: Backtrace::force_capture(),
        }
    }

    /// `backtrace` must be taken inside the panic hook, while the
    /// panicking frames are still on the stack.
    pub(crate) fn from_panic(
        message: String,
        location: Option<String>,
        backtrace: Backtrace,
    ) -> Self {
        ActionError {
            message,
            source: None,
            location,
            backtrace,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source chain followed by the captured backtrace.
    pub fn stack_trace(&self) -> String {
        let mut out = format!("Error: {}\n", self.message);
        let mut previous = self.message.clone();
        let mut cause = StdError::source(self);
        while let Some(err) = cause {
            let text = err.to_string();
            // from_error reuses the source's text as the message
            if text != previous {
                let _ = writeln!(out, "Caused by: {}", text);
            }
            previous = text;
            cause = err.source();
        }
        if let Some(location) = &self.location {
            let _ = writeln!(out, "Location: {}", location);
        }
        let _ = write!(out, "Backtrace:\n{}", self.backtrace);
        out
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ActionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<std::io::Error> for ActionError {
    fn from(error: std::io::Error) -> Self {
        ActionError::from_error(error)
    }
}
