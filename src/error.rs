//! Error taxonomy shared by every client in the crate.
//!
//! Nothing is recovered internally: each failure is returned to the caller
//! tagged with the stage that produced it, so retry logic can live outside
//! the crate.

use std::fmt;

use thiserror::Error;

/// Result type for all client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single input rule that did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the offending parameter or config field.
    pub field: String,
    /// Human-readable description of the rule.
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Where a rejected request was headed.
///
/// Diagnostic detail only. Authorization material is never recorded here,
/// so the context is safe to log but should still not be shown verbatim to
/// end users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Short label of the operation that issued the request.
    pub operation: &'static str,
    /// Full endpoint URL the request was sent to.
    pub endpoint: String,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied parameters failed the declared format or presence
    /// rules. Every violated field is listed; no network call was made.
    #[error("invalid parameters: {}", join_violations(.violations))]
    Validation { violations: Vec<Violation> },

    /// The request never completed: connection, DNS, TLS or timeout
    /// failure in the underlying transport.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The provider answered with a non-success HTTP status.
    #[error("{} failed with HTTP {status}: {body}", .context.operation)]
    Backend {
        status: u16,
        /// Raw response text as returned by the provider.
        body: String,
        context: RequestContext,
    },

    /// The response body was not valid JSON or was missing expected fields.
    #[error("failed to decode response: {message}")]
    Decode { message: String },
}

impl Error {
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation { violations }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn backend(
        operation: &'static str,
        endpoint: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::Backend {
            status,
            body: body.into(),
            context: RequestContext {
                operation,
                endpoint: endpoint.into(),
            },
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// The violation list when this is a [`Error::Validation`].
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            Self::Validation { violations } => Some(violations),
            _ => None,
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
