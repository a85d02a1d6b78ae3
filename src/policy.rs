use std::fmt;

use crate::error::Denial;
use crate::model::FeatureRequest;
use crate::request::Principal;

/// A policy requirement that must be satisfied.
///
/// Requirements are evaluated in the order they were added, and the first
/// failure is the denial returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyReq {
    /// Requires a verified principal
    Authenticated,
    /// Requires the admin role
    Admin,
    /// Requires the principal to own `request_id` or to be an admin
    OwnerOrAdmin {
        /// Resource the requirement was built for
        request_id: String,
        /// Owner of that resource
        owner_id: String,
    },
}

impl PolicyReq {
    /// Evaluates this requirement for `principal`.
    ///
    /// `operation` names what is being attempted and ends up in the
    /// `Forbidden` denial.
    pub fn evaluate(
        &self,
        principal: Option<&Principal>,
        operation: &'static str,
    ) -> Result<(), Denial> {
        let Some(principal) = principal else {
            return Err(Denial::unauthenticated());
        };

        match self {
            PolicyReq::Authenticated => Ok(()),
            PolicyReq::Admin => {
                if principal.is_admin() {
                    Ok(())
                } else {
                    Err(Denial::forbidden(operation))
                }
            }
            PolicyReq::OwnerOrAdmin { owner_id, .. } => {
                if principal.is_admin() || principal.id == *owner_id {
                    Ok(())
                } else {
                    Err(Denial::forbidden(operation))
                }
            }
        }
    }
}

/// Policy requiring authentication.
pub struct Authenticated;

/// Policy requiring the admin role.
pub struct Admin;

/// Policy requiring ownership of a specific feature request, or the admin role.
pub struct OwnerOrAdmin {
    request_id: String,
    owner_id: String,
}

impl OwnerOrAdmin {
    /// Builds the requirement for `resource`.
    pub fn of(resource: &FeatureRequest) -> Self {
        Self {
            request_id: resource.id.clone(),
            owner_id: resource.owner_id.clone(),
        }
    }
}

impl From<Authenticated> for PolicyReq {
    fn from(_: Authenticated) -> Self {
        PolicyReq::Authenticated
    }
}

impl From<Admin> for PolicyReq {
    fn from(_: Admin) -> Self {
        PolicyReq::Admin
    }
}

impl From<OwnerOrAdmin> for PolicyReq {
    fn from(req: OwnerOrAdmin) -> Self {
        PolicyReq::OwnerOrAdmin {
            request_id: req.request_id,
            owner_id: req.owner_id,
        }
    }
}

/// Operations a caller may attempt on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Browse feature requests
    List,
    /// Fetch one feature request
    Read,
    /// Submit a new feature request
    Create,
    /// Add the caller's upvote
    Upvote,
    /// Withdraw the caller's upvote
    RemoveUpvote,
    /// Delete a feature request and its upvotes
    Delete,
    /// Set a feature request's status
    ChangeStatus,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 7] = [
        Operation::List,
        Operation::Read,
        Operation::Create,
        Operation::Upvote,
        Operation::RemoveUpvote,
        Operation::Delete,
        Operation::ChangeStatus,
    ];

    /// Returns the operation name used in denials, logs and audit events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Upvote => "upvote",
            Operation::RemoveUpvote => "remove_upvote",
            Operation::Delete => "delete",
            Operation::ChangeStatus => "change_status",
        }
    }

    /// Returns `true` if the operation targets an existing feature request.
    ///
    /// Removing an upvote does not: withdrawing from a request that is gone
    /// is the same no-op as withdrawing a vote that was never cast.
    pub fn targets_existing(&self) -> bool {
        matches!(
            self,
            Operation::Read | Operation::Upvote | Operation::Delete | Operation::ChangeStatus
        )
    }

    /// Requirements a principal must meet to perform this operation on
    /// `resource`.
    ///
    /// Resource-dependent requirements are only produced when `resource` is
    /// present; callers check existence first.
    pub fn requirements(&self, resource: Option<&FeatureRequest>) -> Vec<PolicyReq> {
        match self {
            Operation::List | Operation::Read => Vec::new(),
            Operation::Create | Operation::Upvote | Operation::RemoveUpvote => {
                vec![PolicyReq::Authenticated]
            }
            Operation::Delete => {
                let mut reqs = vec![PolicyReq::Authenticated];
                if let Some(resource) = resource {
                    reqs.push(OwnerOrAdmin::of(resource).into());
                }
                reqs
            }
            Operation::ChangeStatus => vec![PolicyReq::Authenticated, PolicyReq::Admin],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
