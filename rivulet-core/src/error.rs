// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for rivulet sequences.
//!
//! A sequence terminates with at most one error signal, carried by
//! [`RivuletError`]. The variants map onto the three failure classes the
//! protocol distinguishes: contract violations raised by a misbehaving peer,
//! failures raised by user code (closures handed to operators), and explicit
//! resource caps being exceeded.

/// Root error type carried by terminal `on_error` signals.
#[derive(Debug, thiserror::Error)]
pub enum RivuletError {
    /// The backpressure contract was violated (e.g. a non-positive request
    /// amount, or a second subscriber on a single-subscriber stage).
    ///
    /// Violations fail the affected subscription, never the process.
    #[error("protocol violation: {context}")]
    ProtocolViolation {
        /// Which rule was broken and by whom.
        context: String,
    },

    /// A producer failed while generating or relaying values.
    #[error("source error: {context}")]
    SourceError {
        /// Description of the failure.
        context: String,
    },

    /// An error raised by user code (a transformation or factory closure).
    ///
    /// The error is delivered as the terminal signal of the subscription that
    /// triggered the closure; values delivered before it stand.
    #[error("user error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An explicitly configured buffer cap was exceeded.
    ///
    /// Emitted instead of silently dropping, unless an eviction policy is
    /// configured on the stage (e.g. replay history eviction).
    #[error("overflow: {context}")]
    Overflow {
        /// Which cap was exceeded.
        context: String,
    },
}

impl RivuletError {
    /// Create a protocol violation error with the given context.
    pub fn violation(context: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            context: context.into(),
        }
    }

    /// Create a general source error with the given context.
    pub fn source_error(context: impl Into<String>) -> Self {
        Self::SourceError {
            context: context.into(),
        }
    }

    /// Wrap an error raised by user code.
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Create an overflow error with the given context.
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::Overflow {
            context: context.into(),
        }
    }

    /// `true` if this error reports a backpressure-contract violation.
    #[must_use]
    pub const fn is_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }
}

/// Specialized `Result` for rivulet operations.
pub type Result<T> = std::result::Result<T, RivuletError>;

impl Clone for RivuletError {
    fn clone(&self) -> Self {
        match self {
            Self::ProtocolViolation { context } => Self::ProtocolViolation {
                context: context.clone(),
            },
            Self::SourceError { context } => Self::SourceError {
                context: context.clone(),
            },
            // The boxed error is not Clone; degrade to its rendered form.
            Self::UserError(e) => Self::SourceError {
                context: format!("user error: {e}"),
            },
            Self::Overflow { context } => Self::Overflow {
                context: context.clone(),
            },
        }
    }
}
