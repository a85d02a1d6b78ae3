use std::marker::PhantomData;

use crate::capability::{DeleteCap, ModerateCap};
use crate::error::{Denial, DenialKind};
use crate::logging::PolicyLog;
use crate::policy::Operation;
use crate::request::{Principal, RequestMeta};
use crate::state::{Authorized, State, Viewer};

/// Execution context for one request.
///
/// `Ctx<S>` is generic over its authorization state:
/// - `Ctx<Viewer>`: principal optional, no capabilities; enough to read
/// - `Ctx<Authorized>`: principal guaranteed, capabilities for one operation
///
/// # Construction
///
/// Anyone may open a viewing context with [`Ctx::viewer`]. An authorized
/// context can only come out of [`PolicyGate::build`](crate::PolicyGate::build).
///
/// # Examples
///
/// ```
/// use featureboard_policy::{Ctx, PolicyGate, Operation, Principal, RequestMeta};
///
/// let viewer = Ctx::viewer(RequestMeta::anonymous("req-1"));
/// assert!(viewer.principal().is_none());
///
/// let meta = RequestMeta::authenticated("req-2", Principal::user("alice"));
/// let ctx = PolicyGate::new(meta)
///     .for_operation(Operation::Create, "", None)
///     .build()
///     .expect("authenticated callers may create");
/// assert_eq!(ctx.actor().id, "alice");
/// ```
#[derive(Debug, Clone)]
pub struct Ctx<S: State = Authorized> {
    request_id: String,
    principal: S::Principal,
    operation: Option<Operation>,
    moderate_cap: Option<ModerateCap>,
    delete_cap: Option<DeleteCap>,
    _state: PhantomData<S>,
}

// ============================================================================
// Shared methods (available on all states)
// ============================================================================

impl<S: State> Ctx<S> {
    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the principal if present.
    ///
    /// Always `Some` for `Ctx<Authorized>`.
    pub fn principal(&self) -> Option<&Principal> {
        S::principal(&self.principal)
    }

    /// Returns a request-scoped logger.
    pub fn log(&self) -> PolicyLog<'_> {
        PolicyLog::new(&self.request_id, self.principal().map(|p| p.id.as_str()))
    }
}

// ============================================================================
// Ctx<Viewer>
// ============================================================================

impl Ctx<Viewer> {
    /// Opens a viewing context for `meta`.
    ///
    /// Reading is always allowed, so no policy needs to be checked here.
    pub fn viewer(meta: RequestMeta) -> Self {
        Self {
            request_id: meta.request_id,
            principal: meta.principal,
            operation: None,
            moderate_cap: None,
            delete_cap: None,
            _state: PhantomData,
        }
    }
}

// ============================================================================
// Ctx<Authorized>
// ============================================================================

impl Ctx<Authorized> {
    pub(crate) fn new_authorized(
        request_id: String,
        principal: Principal,
        operation: Option<Operation>,
        moderate_cap: Option<ModerateCap>,
        delete_cap: Option<DeleteCap>,
    ) -> Self {
        Self {
            request_id,
            principal,
            operation,
            moderate_cap,
            delete_cap,
            _state: PhantomData,
        }
    }

    /// Returns the principal the context was authorized for.
    pub fn actor(&self) -> &Principal {
        &self.principal
    }

    /// Returns the operation the context was authorized for.
    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    /// Returns the moderation capability if present.
    pub fn moderate_cap(&self) -> Option<ModerateCap> {
        self.moderate_cap
    }

    /// Returns the delete capability, if one was granted.
    ///
    /// # Errors
    ///
    /// Returns a `Forbidden` denial if the gate did not grant deletion.
    pub fn delete_cap(&self) -> Result<&DeleteCap, Denial> {
        self.delete_cap.as_ref().ok_or_else(|| {
            Denial::new(
                DenialKind::Forbidden {
                    operation: Operation::Delete.as_str(),
                },
                "Delete capability not granted",
            )
        })
    }

    /// Returns the moderation capability, if one was granted.
    ///
    /// # Errors
    ///
    /// Returns a `Forbidden` denial if the gate did not grant moderation.
    pub fn require_moderate(&self) -> Result<ModerateCap, Denial> {
        self.moderate_cap
            .ok_or_else(|| Denial::forbidden(Operation::ChangeStatus.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_context_keeps_optional_principal() {
        let anon = Ctx::viewer(RequestMeta::anonymous("req-1"));
        assert_eq!(anon.request_id(), "req-1");
        assert!(anon.principal().is_none());

        let alice = Ctx::viewer(RequestMeta::authenticated("req-2", Principal::user("alice")));
        assert_eq!(alice.principal().map(|p| p.id.as_str()), Some("alice"));
    }

    #[test]
    fn authorized_context_without_caps_refuses_privileged_use() {
        let ctx = Ctx::new_authorized(
            "req-3".to_string(),
            Principal::user("bob"),
            Some(Operation::Upvote),
            None,
            None,
        );

        assert_eq!(ctx.actor().id, "bob");
        assert_eq!(ctx.principal().map(|p| p.id.as_str()), Some("bob"));
        assert!(ctx.delete_cap().is_err());
        assert!(ctx.require_moderate().is_err());
    }

    #[test]
    fn authorized_context_exposes_granted_caps() {
        let ctx = Ctx::new_authorized(
            "req-4".to_string(),
            Principal::admin("root"),
            Some(Operation::Delete),
            None,
            Some(DeleteCap::new("fr-1".to_string())),
        );

        assert_eq!(ctx.delete_cap().unwrap().request_id(), "fr-1");
        assert_eq!(ctx.operation(), Some(Operation::Delete));
    }

    #[test]
    fn log_is_available_in_every_state() {
        let viewer = Ctx::viewer(RequestMeta::anonymous("req-5"));
        assert_eq!(viewer.log().request_id(), "req-5");
    }

    #[test]
    fn ctx_cannot_be_forged() {
        // This test documents that Ctx<Authorized> cannot be created from outside the crate.
        // Uncommenting this in another crate would fail to compile:
        // let ctx = Ctx::new_authorized("fake".into(), Principal::admin("x"), None, None, None);
    }
}
