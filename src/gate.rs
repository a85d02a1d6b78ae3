use crate::{
    capability::{DeleteCap, ModerateCap},
    context::Ctx,
    decision::decide,
    error::Denial,
    model::FeatureRequest,
    policy::{Operation, PolicyReq},
    request::RequestMeta,
};

/// The policy enforcement gate.
///
/// `PolicyGate` is the only way to construct a `Ctx<Authorized>`. It runs the
/// access decision for an operation, checks any extra requirements, and grants
/// the capabilities those requirements imply.
///
/// # Examples
///
/// ```
/// use featureboard_policy::{DenialKind, Operation, PolicyGate, Principal, RequestMeta};
/// # use chrono::Utc;
/// # use featureboard_policy::{FeatureRequest, Status};
/// # let resource = FeatureRequest {
/// #     id: "fr-1".into(), title: "t".into(), description: "d".into(),
/// #     status: Status::Pending, owner_id: "alice".into(),
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
///
/// let meta = RequestMeta::authenticated("req-1", Principal::user("alice"));
/// let ctx = PolicyGate::new(meta)
///     .for_operation(Operation::Delete, "fr-1", Some(&resource))
///     .build()
///     .expect("owners may delete");
/// assert_eq!(ctx.delete_cap().unwrap().request_id(), "fr-1");
///
/// let meta = RequestMeta::authenticated("req-2", Principal::user("bob"));
/// let denial = PolicyGate::new(meta)
///     .for_operation(Operation::Delete, "fr-1", Some(&resource))
///     .build()
///     .unwrap_err();
/// assert_eq!(denial.kind, DenialKind::Forbidden { operation: "delete" });
/// ```
pub struct PolicyGate {
    meta: RequestMeta,
    target: Option<Target>,
    requirements: Vec<PolicyReq>,
}

struct Target {
    operation: Operation,
    id: String,
    resource: Option<FeatureRequest>,
}

impl PolicyGate {
    /// Creates a new policy gate with the given request metadata.
    pub fn new(meta: RequestMeta) -> Self {
        Self {
            meta,
            target: None,
            requirements: Vec::new(),
        }
    }

    /// Sets the operation being attempted and its target.
    ///
    /// `resource` is the store's snapshot of `target_id`, or `None` if absent.
    /// The operation's own requirements are derived at build time.
    pub fn for_operation(
        mut self,
        operation: Operation,
        target_id: impl Into<String>,
        resource: Option<&FeatureRequest>,
    ) -> Self {
        self.target = Some(Target {
            operation,
            id: target_id.into(),
            resource: resource.cloned(),
        });
        self
    }

    /// Adds an extra policy requirement, deduplicating identical requirements.
    ///
    /// # Examples
    ///
    /// ```
    /// use featureboard_policy::{Admin, Authenticated, PolicyGate, Principal, RequestMeta};
    ///
    /// let meta = RequestMeta::authenticated("req-1", Principal::admin("root"));
    /// let ctx = PolicyGate::new(meta)
    ///     .require(Authenticated)
    ///     .require(Admin)
    ///     .require(Admin) // deduplicated
    ///     .build()
    ///     .unwrap();
    /// assert!(ctx.moderate_cap().is_some());
    /// ```
    pub fn require(mut self, policy: impl Into<PolicyReq>) -> Self {
        let req = policy.into();

        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }

        self
    }

    /// Builds a `Ctx<Authorized>` after validating the operation and every
    /// extra requirement.
    ///
    /// # Errors
    ///
    /// Returns the first `Denial` produced. A caller without a principal is
    /// always denied as `Unauthenticated`, even for operations anonymous
    /// callers may perform; those go through [`Ctx::viewer`] instead.
    pub fn build(self) -> Result<Ctx, Denial> {
        let result = self.validate_all();

        if let Err(denial) = &result {
            tracing::warn!(
                request_id = %self.meta.request_id,
                principal = self.meta.principal.as_ref().map(|p| p.id.as_str()).unwrap_or("<anonymous>"),
                operation = self.target.as_ref().map(|t| t.operation.as_str()).unwrap_or("<none>"),
                denial = %denial.kind,
                "policy gate denied request"
            );
        }
        result?;

        let all_reqs = self.all_requirements();
        let moderate_cap = all_reqs
            .contains(&PolicyReq::Admin)
            .then(ModerateCap::new);
        let delete_cap = all_reqs.iter().find_map(|req| match req {
            PolicyReq::OwnerOrAdmin { request_id, .. } => Some(DeleteCap::new(request_id.clone())),
            _ => None,
        });

        let operation = self.target.as_ref().map(|t| t.operation);
        let RequestMeta {
            request_id,
            principal,
        } = self.meta;
        let principal = principal.ok_or_else(Denial::unauthenticated)?;

        let ctx = Ctx::new_authorized(request_id, principal, operation, moderate_cap, delete_cap);
        Ok(ctx)
    }

    /// Runs the access decision for the target, then every extra requirement.
    fn validate_all(&self) -> Result<(), Denial> {
        let principal = self.meta.principal.as_ref();

        if let Some(target) = &self.target {
            decide(
                principal,
                target.operation,
                &target.id,
                target.resource.as_ref(),
            )
            .into_result()?;
        }

        let operation = self
            .target
            .as_ref()
            .map(|t| t.operation.as_str())
            .unwrap_or("proceed");
        for req in &self.requirements {
            req.evaluate(principal, operation)?;
        }

        if principal.is_none() {
            return Err(Denial::unauthenticated());
        }
        Ok(())
    }

    fn all_requirements(&self) -> Vec<PolicyReq> {
        let mut reqs = self
            .target
            .as_ref()
            .map(|t| t.operation.requirements(t.resource.as_ref()))
            .unwrap_or_default();
        for req in &self.requirements {
            if !reqs.contains(req) {
                reqs.push(req.clone());
            }
        }
        reqs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DenialKind;
    use crate::policy::{Admin, Authenticated, OwnerOrAdmin};
    use crate::request::Principal;
    use crate::test_utils::feature_request;

    fn meta(principal: Option<Principal>) -> RequestMeta {
        RequestMeta {
            request_id: "req-gate".to_string(),
            principal,
        }
    }

    #[test]
    fn anonymous_is_denied_even_without_requirements() {
        let denial = PolicyGate::new(meta(None)).build().unwrap_err();
        assert_eq!(denial.kind, DenialKind::Unauthenticated);
    }

    #[test]
    fn upvote_grants_no_capabilities() {
        let r = feature_request("fr-1", "alice");
        let ctx = PolicyGate::new(meta(Some(Principal::user("bob"))))
            .for_operation(Operation::Upvote, "fr-1", Some(&r))
            .build()
            .unwrap();

        assert!(ctx.moderate_cap().is_none());
        assert!(ctx.delete_cap().is_err());
        assert_eq!(ctx.operation(), Some(Operation::Upvote));
    }

    #[test]
    fn admin_change_status_grants_moderate_cap() {
        let r = feature_request("fr-1", "alice");
        let ctx = PolicyGate::new(meta(Some(Principal::admin("root"))))
            .for_operation(Operation::ChangeStatus, "fr-1", Some(&r))
            .build()
            .unwrap();

        assert!(ctx.moderate_cap().is_some());
    }

    #[test]
    fn delete_cap_is_bound_to_the_target() {
        let r = feature_request("fr-7", "alice");
        let ctx = PolicyGate::new(meta(Some(Principal::admin("root"))))
            .for_operation(Operation::Delete, "fr-7", Some(&r))
            .build()
            .unwrap();

        assert_eq!(ctx.delete_cap().unwrap().request_id(), "fr-7");
    }

    #[test]
    fn missing_target_is_not_found() {
        let denial = PolicyGate::new(meta(Some(Principal::admin("root"))))
            .for_operation(Operation::Delete, "ghost", None)
            .build()
            .unwrap_err();

        assert_eq!(denial.kind, DenialKind::NotFound);
        assert!(denial.message.contains("ghost"));
    }

    #[test]
    fn extra_requirements_are_enforced() {
        let r = feature_request("fr-1", "alice");
        let denial = PolicyGate::new(meta(Some(Principal::user("alice"))))
            .for_operation(Operation::Upvote, "fr-1", Some(&r))
            .require(Admin)
            .build()
            .unwrap_err();

        assert_eq!(denial.kind, DenialKind::Forbidden { operation: "upvote" });
    }

    #[test]
    fn requirements_are_deduplicated() {
        let r = feature_request("fr-1", "alice");
        let gate = PolicyGate::new(meta(Some(Principal::user("alice"))))
            .require(Authenticated)
            .require(Authenticated)
            .require(OwnerOrAdmin::of(&r))
            .require(OwnerOrAdmin::of(&r));

        assert_eq!(gate.requirements.len(), 2);
    }
}
