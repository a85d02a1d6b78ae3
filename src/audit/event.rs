//! Audit event schema.

use std::fmt;

use crate::error::DenialKind;
use crate::policy::Operation;

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Operation succeeded
    Success,
    /// Operation was denied
    Denied(DenialKind),
    /// Operation failed in the store
    Error,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied(kind) => write!(f, "denied({})", kind.as_str()),
            AuditOutcome::Error => write!(f, "error"),
        }
    }
}

/// A structured audit event containing only safe metadata.
///
/// # Example
///
/// ```
/// use featureboard_policy::audit::{AuditEvent, AuditOutcome};
/// use featureboard_policy::Operation;
///
/// let event = AuditEvent::new("req-123", Some("root"), Operation::ChangeStatus, AuditOutcome::Success)
///     .with_resource_id("fr-1")
///     .with_detail("planned");
///
/// assert_eq!(event.request_id(), "req-123");
/// assert_eq!(event.principal(), Some("root"));
/// assert_eq!(event.detail(), Some("planned"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    request_id: String,
    /// None for anonymous callers
    principal: Option<String>,
    operation: Operation,
    outcome: AuditOutcome,
    resource_id: Option<String>,
    /// Short, non-sensitive qualifier such as the new status
    detail: Option<String>,
}

impl AuditEvent {
    /// Creates a new audit event with required fields.
    pub fn new(
        request_id: impl Into<String>,
        principal: Option<impl Into<String>>,
        operation: Operation,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            principal: principal.map(Into::into),
            operation,
            outcome,
            resource_id: None,
            detail: None,
        }
    }

    /// Sets the feature request id.
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Sets a short qualifier.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the request identifier.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the principal id, if authenticated.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Returns the audited operation.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns the operation outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the feature request id, if set.
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// Returns the qualifier, if set.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[operation={}, outcome={}, request_id={}, principal={}",
            self.operation,
            self.outcome,
            self.request_id,
            self.principal.as_deref().unwrap_or("<none>")
        )?;

        if let Some(resource_id) = &self.resource_id {
            write!(f, ", resource_id={}", resource_id)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ", detail={}", detail)?;
        }

        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_outcome_display() {
        assert_eq!(AuditOutcome::Success.to_string(), "success");
        assert_eq!(
            AuditOutcome::Denied(DenialKind::Unauthenticated).to_string(),
            "denied(unauthenticated)"
        );
        assert_eq!(AuditOutcome::Error.to_string(), "error");
    }

    #[test]
    fn audit_event_minimal() {
        let event = AuditEvent::new("req-1", Some("bob"), Operation::Upvote, AuditOutcome::Success);

        assert_eq!(event.operation(), Operation::Upvote);
        assert_eq!(event.outcome(), AuditOutcome::Success);
        assert!(event.resource_id().is_none());
        assert!(event.detail().is_none());
    }

    #[test]
    fn anonymous_event_displays_none() {
        let event = AuditEvent::new(
            "req-anon",
            None::<String>,
            Operation::Create,
            AuditOutcome::Denied(DenialKind::Unauthenticated),
        );

        assert!(event.principal().is_none());
        let display = event.to_string();
        assert!(display.contains("<none>"));
        assert!(display.contains("operation=create"));
    }

    #[test]
    fn display_includes_optional_fields() {
        let event = AuditEvent::new("req-2", Some("root"), Operation::Delete, AuditOutcome::Success)
            .with_resource_id("fr-9");

        assert!(event.to_string().contains("resource_id=fr-9"));
    }
}
