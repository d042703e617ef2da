use std::fmt;

use crate::error::WorkshopError;

/// Why an operation answered with its fallback value instead of the primary
/// result.
#[derive(Debug)]
pub enum FallbackReason {
    /// The primary path needs credentials that are not configured.
    Unconfigured,
    /// The primary path was attempted and failed.
    Failed(WorkshopError),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Unconfigured => write!(f, "not configured"),
            FallbackReason::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// Result of an operation that always produces a value.
///
/// Callers that only need the value use [`Outcome::into_value`]; tests and
/// logs can still tell a designed fallback apart from a primary result.
#[derive(Debug)]
pub enum Outcome<T> {
    Primary(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Outcome<T> {
    pub fn fallback(value: T, reason: FallbackReason) -> Self {
        Outcome::Fallback { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Primary(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Primary(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&FallbackReason> {
        match self {
            Outcome::Primary(_) => None,
            Outcome::Fallback { reason, .. } => Some(reason),
        }
    }
}
