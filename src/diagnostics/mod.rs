//! Diagnostics
//!
//! User-facing problems found by the resolver and the checker. Diagnostics are values:
//! this module classifies and records them with a span, it does not decide how they are
//! displayed.

use serde::Serialize;
use crate::utils::Span;

// ==================== Diagnostic ====================

/// What kind of problem a diagnostic reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    // ========== Resolution ==========
    /// A name is not bound in any enclosing scope
    UnresolvedIdentity,
    /// A name in pattern position does not denote a pattern
    NotAPattern,
    /// A name in value position does not denote a value
    NotAValue,
    /// A callee does not denote a function property
    NotCallable,
    /// A bare name matches several enum values
    AmbiguousIdentity,
    /// A property index names something that is not a property
    UnknownProperty,
    /// No overload accepts the supplied instance list
    NoMatchingOverload,
    /// A name was declared twice in the same scope
    Redeclaration,

    // ========== Checking ==========
    /// A value's pattern is not a subset of the expected pattern
    IncorrectType,
    /// A condition is neither boolean nor optional
    InvalidCondition,
    /// A match rule can never match its subject
    UnreachableRule,
    /// Rule results of a match produce patterns that cannot be unified
    InconsistentRules,
}

impl DiagnosticKind {
    /// Stable code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnresolvedIdentity => "E0001",
            Self::NotAPattern => "E0002",
            Self::NotAValue => "E0003",
            Self::NotCallable => "E0004",
            Self::AmbiguousIdentity => "E0005",
            Self::UnknownProperty => "E0006",
            Self::NoMatchingOverload => "E0007",
            Self::Redeclaration => "E0008",
            Self::IncorrectType => "E0101",
            Self::InvalidCondition => "E0102",
            Self::UnreachableRule => "E0103",
            Self::InconsistentRules => "E0104",
        }
    }
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[{}] {}: {}", self.kind.code(), self.span, self.message)
    }
}

// ==================== Sink ====================

/// Append-only diagnostics sink shared by the resolver and the checker
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    pub fn log(&mut self, diagnostic: Diagnostic) {
        log::debug!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    /// Record an error at a span
    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Span) {
        self.log(Diagnostic::error(kind, message, span));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }
}
