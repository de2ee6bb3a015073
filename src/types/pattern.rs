//! Patterns: the language's notion of a type

use crate::apm::{EntityId, EnumId, Intrinsic, NativeId, UnresolvedIdentity};
use crate::utils::Span;

/// A pattern is nominal (enum, entity, native), optional, or one of the two
/// placeholders: unresolved (before resolution) and invalid (after an error).
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Unresolved(UnresolvedIdentity),
    /// A value of the inner pattern, or none
    Optional(Box<Pattern>),
    /// A type error was already reported here; compatible with everything
    Invalid,
    Enum(EnumId),
    Entity(EntityId),
    Native(NativeId),
}

impl Pattern {
    pub fn unresolved(identity: impl Into<String>, span: Span) -> Self {
        Self::Unresolved(UnresolvedIdentity::new(identity, span))
    }

    /// Wrap in an optional. An optional of an optional is the same optional.
    pub fn optional(inner: Pattern) -> Self {
        match inner {
            optional @ Self::Optional(_) => optional,
            inner => Self::Optional(Box::new(inner)),
        }
    }

    pub const BOOL: Self = Self::Native(Intrinsic::BOOL);
    pub const INT: Self = Self::Native(Intrinsic::INT);
    pub const NUMBER: Self = Self::Native(Intrinsic::NUMBER);
    pub const STRING: Self = Self::Native(Intrinsic::STRING);
    pub const NONE: Self = Self::Native(Intrinsic::NONE);

    /// The pattern with every optional layer removed
    pub fn core(&self) -> &Pattern {
        match self {
            Self::Optional(inner) => inner.core(),
            other => other,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.core(), Self::Invalid)
    }

    /// True if an unresolved identity remains anywhere in the pattern
    pub fn is_unresolved(&self) -> bool {
        matches!(self.core(), Self::Unresolved(_))
    }

    /// The first unresolved identity inside the pattern
    pub fn unresolved_identity(&self) -> Option<&UnresolvedIdentity> {
        match self.core() {
            Self::Unresolved(unresolved) => Some(unresolved),
            _ => None,
        }
    }

    /// The enum this pattern denotes, looking through optionals
    pub fn as_enum(&self) -> Option<EnumId> {
        match self.core() {
            Self::Enum(id) => Some(*id),
            _ => None,
        }
    }
}
