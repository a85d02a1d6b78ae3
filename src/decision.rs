//! The access decision: who may do what to which feature request.
//!
//! Everything here is pure. Callers resolve the principal and load the
//! resource snapshot; [`decide`] answers allow or deny, and [`project`]
//! computes the viewer-relative fields attached to every read.
//!
//! Checks run in one fixed order for every operation:
//!
//! ```text
//! authentication -> (input validation, done by sanitizers) -> existence -> rights
//! ```
//!
//! Reads are public, so answering `NotFound` before a rights check reveals
//! nothing a `Read` would not.

use crate::error::Denial;
use crate::model::{FeatureRequest, FeatureRequestView};
use crate::policy::{Operation, PolicyReq};
use crate::request::Principal;

/// Outcome of an access decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The operation may proceed
    Allow,
    /// The operation is refused for the given reason
    Deny(Denial),
}

impl Decision {
    /// Returns `true` for [`Decision::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts into a `Result` for `?` propagation.
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

/// Decides whether `principal` may perform `operation`.
///
/// `resource` is the snapshot of the target feature request, or `None` if
/// the store has no such row. For operations that do not target an existing
/// request (list, create, remove upvote) it is ignored. `target_id` names the
/// requested id for the `NotFound` message.
///
/// # Examples
///
/// ```
/// use featureboard_policy::{decide, Decision, DenialKind, Operation, Principal};
///
/// let decision = decide(Some(&Principal::user("bob")), Operation::Create, "", None);
/// assert!(decision.is_allowed());
///
/// let Decision::Deny(denial) = decide(None, Operation::Upvote, "fr-1", None) else {
///     panic!("anonymous upvote must be denied");
/// };
/// assert_eq!(denial.kind, DenialKind::Unauthenticated);
/// ```
pub fn decide(
    principal: Option<&Principal>,
    operation: Operation,
    target_id: &str,
    resource: Option<&FeatureRequest>,
) -> Decision {
    let reqs = operation.requirements(resource);

    if reqs.contains(&PolicyReq::Authenticated) && principal.is_none() {
        return Decision::Deny(Denial::unauthenticated());
    }

    if operation.targets_existing() && resource.is_none() {
        return Decision::Deny(Denial::not_found(target_id));
    }

    for req in &reqs {
        if let Err(denial) = req.evaluate(principal, operation.as_str()) {
            return Decision::Deny(denial);
        }
    }

    Decision::Allow
}

/// Projects `resource` for `viewer`.
///
/// `upvote_count` is the stored total; `viewer_upvoted` is whether the store
/// holds an upvote for the viewer. Anonymous viewers always see
/// `has_upvoted == false` and `is_owner == false`.
pub fn project(
    viewer: Option<&Principal>,
    resource: &FeatureRequest,
    upvote_count: u64,
    viewer_upvoted: bool,
) -> FeatureRequestView {
    let is_owner = viewer.is_some_and(|p| p.id == resource.owner_id);
    let has_upvoted = viewer.is_some() && viewer_upvoted;

    FeatureRequestView {
        id: resource.id.clone(),
        title: resource.title.clone(),
        description: resource.description.clone(),
        status: resource.status,
        owner_id: resource.owner_id.clone(),
        created_at: resource.created_at,
        updated_at: resource.updated_at,
        upvote_count,
        has_upvoted,
        is_owner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DenialKind;
    use crate::test_utils::feature_request;

    fn kind(decision: Decision) -> Option<DenialKind> {
        match decision {
            Decision::Allow => None,
            Decision::Deny(d) => Some(d.kind),
        }
    }

    #[test]
    fn anonymous_may_list_and_read() {
        let r = feature_request("fr-1", "alice");
        assert!(decide(None, Operation::List, "", None).is_allowed());
        assert!(decide(None, Operation::Read, "fr-1", Some(&r)).is_allowed());
    }

    #[test]
    fn read_of_missing_resource_is_not_found() {
        assert_eq!(
            kind(decide(None, Operation::Read, "nope", None)),
            Some(DenialKind::NotFound)
        );
    }

    #[test]
    fn authentication_is_checked_before_existence() {
        for op in [Operation::Upvote, Operation::Delete, Operation::ChangeStatus] {
            assert_eq!(
                kind(decide(None, op, "missing", None)),
                Some(DenialKind::Unauthenticated),
                "{op}"
            );
        }
    }

    #[test]
    fn existence_is_checked_before_rights() {
        let bob = Principal::user("bob");
        assert_eq!(
            kind(decide(Some(&bob), Operation::ChangeStatus, "missing", None)),
            Some(DenialKind::NotFound)
        );
        assert_eq!(
            kind(decide(Some(&bob), Operation::Delete, "missing", None)),
            Some(DenialKind::NotFound)
        );
    }

    #[test]
    fn remove_upvote_does_not_require_the_resource() {
        let bob = Principal::user("bob");
        assert!(decide(Some(&bob), Operation::RemoveUpvote, "gone", None).is_allowed());
    }

    #[test]
    fn owner_may_delete_but_not_change_status() {
        let alice = Principal::user("alice");
        let r = feature_request("fr-1", "alice");

        assert!(decide(Some(&alice), Operation::Delete, "fr-1", Some(&r)).is_allowed());
        assert_eq!(
            kind(decide(Some(&alice), Operation::ChangeStatus, "fr-1", Some(&r))),
            Some(DenialKind::Forbidden {
                operation: "change_status"
            })
        );
    }

    #[test]
    fn admin_may_moderate_regardless_of_ownership() {
        let root = Principal::admin("root");
        let r = feature_request("fr-1", "alice");

        assert!(decide(Some(&root), Operation::Delete, "fr-1", Some(&r)).is_allowed());
        assert!(decide(Some(&root), Operation::ChangeStatus, "fr-1", Some(&r)).is_allowed());
    }

    #[test]
    fn projection_for_anonymous_hides_viewer_fields() {
        let r = feature_request("fr-1", "alice");
        let view = project(None, &r, 4, true);

        assert_eq!(view.upvote_count, 4);
        assert!(!view.has_upvoted);
        assert!(!view.is_owner);
    }

    #[test]
    fn projection_marks_owner_and_upvote() {
        let r = feature_request("fr-1", "alice");
        let alice = Principal::user("alice");
        let bob = Principal::user("bob");

        let for_alice = project(Some(&alice), &r, 1, false);
        let for_bob = project(Some(&bob), &r, 1, true);

        assert!(for_alice.is_owner);
        assert!(!for_alice.has_upvoted);
        assert!(!for_bob.is_owner);
        assert!(for_bob.has_upvoted);
    }
}
