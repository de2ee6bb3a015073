//! Internal-consistency errors
//!
//! These are never user mistakes. A `CompilerError` means a pass received a tree that
//! broke an invariant another pass was supposed to establish, and the run must stop.

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Fatal compiler error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilerError {
    #[error("attempt to check unresolved {node} `{identity}` at {span}; it should have already been resolved")]
    UnresolvedInChecker {
        node: &'static str,
        identity: String,
        span: Span,
    },

    #[error("overload set `{identity}` holds a {found}, only function properties can be overloaded")]
    MalformedOverloadSet { identity: String, found: &'static str },
}

impl CompilerError {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnresolvedInChecker { span, .. } => Some(*span),
            Self::MalformedOverloadSet { .. } => None,
        }
    }
}
