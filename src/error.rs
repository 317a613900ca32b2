//! Unified error type.

use std::error::Error as StdError;

/// The error type returned by kiroku's fallible operations.
///
/// Application-level outcomes (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// everything else: infrastructure failures, logging misconfiguration, and
/// failures raised by downstream handlers.
///
/// The two logging variants are startup-ordering errors. They are meant for
/// startup-time supervision, not for request-handling code to catch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding a port or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Logger initialization was handed an unusable configuration.
    #[error("invalid logger configuration: {0}")]
    Configuration(String),

    /// A logger was requested from a registry that has not been initialized.
    #[error("logger has not been initialized yet; call initialize() first")]
    Uninitialized,

    /// A failure raised by a downstream handler.
    ///
    /// Middleware passes this through untouched — no translation, no
    /// suppression. The server maps it to `500 Internal Server Error` at
    /// the edge, after the middleware stack has unwound.
    #[error("{0}")]
    Handler(Box<dyn StdError + Send + Sync + 'static>),
}

impl Error {
    /// Wraps an application failure so a handler can surface it with `?`
    /// or an early `return Err(...)`.
    pub fn handler(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Handler(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_message_names_the_precondition() {
        let msg = Error::Uninitialized.to_string();
        assert!(msg.contains("has not been initialized"));
        assert!(msg.contains("initialize()"));
    }

    #[test]
    fn handler_errors_preserve_the_message() {
        let err = Error::handler("database exploded");
        assert_eq!(err.to_string(), "database exploded");
    }
}
