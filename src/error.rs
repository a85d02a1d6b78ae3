use std::fmt;

use crate::sanitizer::SanitizationError;
use crate::store::{StoreError, StoreErrorKind};

/// Errors returned by board operations.
///
/// Expected denials travel as [`Error::Denied`]; anything the persistence
/// collaborator could not do travels as [`Error::Store`] so the transport
/// layer can answer with a generic failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The access decision or input validation denied the operation
    Denied(Denial),
    /// The store failed for a reason unrelated to policy
    Store(StoreError),
}

impl Error {
    /// Returns the denial, if this error is one.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Error::Denied(d) => Some(d),
            Error::Store(_) => None,
        }
    }

    /// Returns the denial kind, if this error is a denial.
    pub fn denial_kind(&self) -> Option<&DenialKind> {
        self.denial().map(|d| &d.kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Denied(d) => write!(f, "Denied: {}", d),
            Error::Store(e) => write!(f, "Store failure: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<Denial> for Error {
    fn from(d: Denial) -> Self {
        Error::Denied(d)
    }
}

impl From<SanitizationError> for Error {
    fn from(e: SanitizationError) -> Self {
        Error::Denied(e.into())
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        // A row vanishing between lookup and write means a concurrent delete won.
        if e.kind() == StoreErrorKind::NotFound {
            return Error::Denied(Denial::new(DenialKind::NotFound, e.to_string()));
        }
        Error::Store(e)
    }
}

/// A denied operation with details about why.
#[derive(Debug, Clone, PartialEq)]
pub struct Denial {
    /// The kind of denial
    pub kind: DenialKind,
    /// Human-readable message explaining the denial
    pub message: String,
}

impl Denial {
    /// Creates a new denial.
    pub fn new(kind: DenialKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Denial for a caller without a verified principal.
    pub fn unauthenticated() -> Self {
        Self::new(DenialKind::Unauthenticated, "Authentication required")
    }

    /// Denial for a principal lacking rights to `operation`.
    pub fn forbidden(operation: &'static str) -> Self {
        Self::new(
            DenialKind::Forbidden { operation },
            format!("Principal may not {}", operation),
        )
    }

    /// Denial for an absent feature request.
    pub fn not_found(id: &str) -> Self {
        Self::new(
            DenialKind::NotFound,
            format!("Feature request '{}' not found", id),
        )
    }

    /// Denial for a malformed body, query or path value.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(DenialKind::InvalidInput, message)
    }

    /// Denial for a write that collided with another principal's row.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(DenialKind::Conflict, message)
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Denial {}

impl From<SanitizationError> for Denial {
    fn from(e: SanitizationError) -> Self {
        Denial::invalid_input(e.to_string())
    }
}

/// The kind of denial.
///
/// Each kind maps to exactly one transport status; see
/// [`web::status_code`](crate::web::status_code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// No verified principal
    Unauthenticated,
    /// A verified principal lacks rights for an operation
    Forbidden {
        /// The operation that was refused
        operation: &'static str,
    },
    /// The target feature request does not exist
    NotFound,
    /// The request body, query or path was malformed
    InvalidInput,
    /// A uniqueness violation the idempotency check could not absorb
    Conflict,
}

impl DenialKind {
    /// Stable machine-readable tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialKind::Unauthenticated => "unauthenticated",
            DenialKind::Forbidden { .. } => "forbidden",
            DenialKind::NotFound => "not_found",
            DenialKind::InvalidInput => "invalid_input",
            DenialKind::Conflict => "conflict",
        }
    }
}

impl fmt::Display for DenialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialKind::Unauthenticated => write!(f, "Unauthenticated"),
            DenialKind::Forbidden { operation } => write!(f, "Forbidden for '{}'", operation),
            DenialKind::NotFound => write!(f, "NotFound"),
            DenialKind::InvalidInput => write!(f, "InvalidInput"),
            DenialKind::Conflict => write!(f, "Conflict"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitizer::SanitizationErrorKind;

    #[test]
    fn denial_display_includes_kind_and_message() {
        let denial = Denial::forbidden("delete");
        let out = denial.to_string();

        assert!(out.contains("Forbidden for 'delete'"));
        assert!(out.contains("may not delete"));
    }

    #[test]
    fn sanitization_error_becomes_invalid_input() {
        let err = SanitizationError::new(SanitizationErrorKind::TooLong, "title too long");
        let denial: Denial = err.into();

        assert_eq!(denial.kind, DenialKind::InvalidInput);
        assert!(denial.message.contains("title too long"));
    }

    #[test]
    fn store_not_found_maps_to_not_found_denial() {
        let err: Error = StoreError::new(StoreErrorKind::NotFound, "gone").into();
        assert_eq!(err.denial_kind(), Some(&DenialKind::NotFound));
    }

    #[test]
    fn store_unavailable_stays_a_store_error() {
        let err: Error = StoreError::new(StoreErrorKind::Unavailable, "down").into();
        assert!(err.denial().is_none());
        assert!(err.to_string().contains("Store failure"));
    }

    #[test]
    fn kind_tags_are_distinct() {
        let tags = [
            DenialKind::Unauthenticated.as_str(),
            DenialKind::Forbidden { operation: "x" }.as_str(),
            DenialKind::NotFound.as_str(),
            DenialKind::InvalidInput.as_str(),
            DenialKind::Conflict.as_str(),
        ];
        for (i, a) in tags.iter().enumerate() {
            for b in &tags[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
