//! Error taxonomy of the extraction pipeline.
//!
//! Every failure aborts the whole extraction; the orchestrator in `lib.rs`
//! translates each kind into its user-visible string. The two bug-kinds
//! (`Unsupported`, `UnexpectedDependency`) capture a backtrace at
//! construction so the translated message can surface it.

use std::backtrace::Backtrace as Trace;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The entry point does not exist in the project.
    #[error("entry point not found")]
    NotFound,

    /// The request is not a function name or a `Class::method` pair.
    #[error("invalid entry point request")]
    InvalidInput,

    /// A reachable dependency could not be resolved against the provider.
    #[error("Dependency not found: {0}")]
    DependencyNotFound(String),

    /// A type or construct the synthesizer does not know how to emit.
    #[error("unsupported construct: {message}")]
    Unsupported {
        message: String,
        backtrace: Trace,
    },

    /// A closure-time invariant violation. Always a bug.
    #[error("unexpected dependency: {message}")]
    UnexpectedDependency {
        message: String,
        backtrace: Trace,
    },
}

impl Error {
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported {
            message: message.into(),
            backtrace: Trace::force_capture(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Error::UnexpectedDependency {
            message: message.into(),
            backtrace: Trace::force_capture(),
        }
    }

    /// The backtrace of a bug-kind error, if this is one.
    pub fn backtrace(&self) -> Option<&Trace> {
        match self {
            Error::Unsupported { backtrace, .. }
            | Error::UnexpectedDependency { backtrace, .. } => Some(backtrace),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bug_kinds_carry_backtraces() {
        assert!(Error::unsupported("record types").backtrace().is_some());
        assert!(Error::unexpected("global name of a member").backtrace().is_some());
        assert!(Error::NotFound.backtrace().is_none());
    }

    #[test]
    fn dependency_not_found_display() {
        let e = Error::DependencyNotFound("\\Missing".to_string());
        assert_eq!(e.to_string(), "Dependency not found: \\Missing");
    }
}
