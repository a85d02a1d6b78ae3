//! The feature board service.
//!
//! [`FeatureBoard`] runs each board operation end to end: it authenticates
//! the caller, sanitizes input, loads the target, passes the access decision
//! through [`PolicyGate`], and only then touches the [`Store`]. Every mutation
//! and every refusal lands in the [`AuditTrail`].

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::audit::{AuditEvent, AuditOutcome, AuditTrail};
use crate::capability::{DeleteCap, ModerateCap};
use crate::config::{BoardConfig, ConfigError};
use crate::context::Ctx;
use crate::decision::{decide, project};
use crate::error::{Denial, Error};
use crate::gate::PolicyGate;
use crate::model::{FeatureRequest, FeatureRequestView, NewRequestBody, Status, StatusBody};
use crate::policy::Operation;
use crate::query::{sort_views, ListPage, RawListQuery};
use crate::request::{Principal, RequestMeta};
use crate::sanitizer::{
    IdSanitizer, ListQuerySanitizer, NewRequestSanitizer, Sanitizer, StatusSanitizer,
};
use crate::store::{Store, StoreError, StoreErrorKind};
use crate::tainted::Tainted;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock stopped at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Who asked for what, captured before the request metadata is consumed.
struct Trace {
    request_id: String,
    principal_id: Option<String>,
    operation: Operation,
}

impl Trace {
    fn of(meta: &RequestMeta, operation: Operation) -> Self {
        Self {
            request_id: meta.request_id.clone(),
            principal_id: meta.principal.as_ref().map(|p| p.id.clone()),
            operation,
        }
    }

    fn event(&self, outcome: AuditOutcome) -> AuditEvent {
        AuditEvent::new(
            self.request_id.clone(),
            self.principal_id.clone(),
            self.operation,
            outcome,
        )
    }
}

/// The feature board: listing, reading, creating, upvoting, deleting and
/// moderating feature requests.
///
/// # Examples
///
/// ```
/// use featureboard_policy::{
///     BoardConfig, DenialKind, FeatureBoard, MemoryStore, NewRequestBody, Principal,
///     RequestMeta, Tainted,
/// };
///
/// let board = FeatureBoard::new(MemoryStore::new(), BoardConfig::default()).unwrap();
///
/// let alice = RequestMeta::authenticated("req-1", Principal::user("alice"));
/// let body = NewRequestBody {
///     title: Some("Dark mode".into()),
///     description: Some("Please add a dark theme".into()),
/// };
/// let created = board.create(alice, Tainted::new(body)).unwrap();
/// assert!(created.is_owner);
///
/// let anonymous = RequestMeta::anonymous("req-2");
/// let err = board.upvote(anonymous, Tainted::new(created.id.clone())).unwrap_err();
/// assert_eq!(err.denial_kind(), Some(&DenialKind::Unauthenticated));
/// ```
pub struct FeatureBoard<S: Store> {
    store: S,
    config: BoardConfig,
    new_request: NewRequestSanitizer,
    clock: Box<dyn Clock>,
    audit: AuditTrail,
}

impl<S: Store> FeatureBoard<S> {
    /// Creates a board over `store`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `config` fails validation.
    pub fn new(store: S, config: BoardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            new_request: NewRequestSanitizer::new(&config),
            clock: Box::new(SystemClock),
            audit: AuditTrail::with_capacity(config.audit_capacity),
            store,
            config,
        })
    }

    /// Replaces the clock used for timestamps and timeframe filters.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the board configuration.
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Returns the audit trail.
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Lists one page of feature requests matching `query`, projected for
    /// the caller.
    ///
    /// Anyone may list. `filter=mine` needs an authenticated caller.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unusable query, `Unauthenticated` for an
    /// anonymous `mine` filter.
    pub fn list(
        &self,
        meta: RequestMeta,
        query: Tainted<RawListQuery>,
    ) -> Result<ListPage, Error> {
        let trace = Trace::of(&meta, Operation::List);
        let result = self.list_inner(meta, query);
        self.audit_failure(&trace, result)
    }

    fn list_inner(
        &self,
        meta: RequestMeta,
        query: Tainted<RawListQuery>,
    ) -> Result<ListPage, Error> {
        let query = ListQuerySanitizer.sanitize(query)?.into_inner();
        let ctx = Ctx::viewer(meta);
        let viewer = ctx.principal();

        if query.mine && viewer.is_none() {
            return Err(Denial::unauthenticated().into());
        }
        decide(viewer, Operation::List, "", None).into_result()?;

        let now = self.clock.now();
        let viewer_id = viewer.map(|p| p.id.as_str());
        let mut views = Vec::new();
        for resource in self.store.list_resources()? {
            if query.matches(&resource, viewer_id, now) {
                views.push(self.view(viewer, &resource)?);
            }
        }
        sort_views(&mut views);

        let page = ListPage::paginate(views, query.page, self.config.page_size);
        ctx.log().debug(format_args!(
            "listed page {} of {} ({} matching)",
            page.current_page, page.total_pages, page.total
        ));
        Ok(page)
    }

    /// Reads one feature request, projected for the caller.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank id, `NotFound` if no such request exists.
    pub fn get(&self, meta: RequestMeta, id: Tainted<String>) -> Result<FeatureRequestView, Error> {
        let trace = Trace::of(&meta, Operation::Read);
        let result = self.get_inner(meta, id);
        self.audit_failure(&trace, result)
    }

    fn get_inner(&self, meta: RequestMeta, id: Tainted<String>) -> Result<FeatureRequestView, Error> {
        let id = IdSanitizer.sanitize(id)?.into_inner();
        let ctx = Ctx::viewer(meta);

        let resource = self.store.find_resource(&id)?;
        decide(ctx.principal(), Operation::Read, &id, resource.as_ref()).into_result()?;
        let resource = resource.ok_or_else(|| Denial::not_found(&id))?;

        let view = self.view(ctx.principal(), &resource)?;
        ctx.log().debug(format_args!(
            "read {} ({} upvotes)",
            view.id, view.upvote_count
        ));
        Ok(view)
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Creates a feature request owned by the caller, status `pending`.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for anonymous callers, `InvalidInput` for a title or
    /// description that fails validation.
    pub fn create(
        &self,
        meta: RequestMeta,
        body: Tainted<NewRequestBody>,
    ) -> Result<FeatureRequestView, Error> {
        let trace = Trace::of(&meta, Operation::Create);
        let result = self.create_inner(meta, body);
        if let Ok(view) = &result {
            self.audit
                .record(trace.event(AuditOutcome::Success).with_resource_id(&view.id));
        }
        self.audit_failure(&trace, result)
    }

    fn create_inner(
        &self,
        meta: RequestMeta,
        body: Tainted<NewRequestBody>,
    ) -> Result<FeatureRequestView, Error> {
        let ctx = PolicyGate::new(meta)
            .for_operation(Operation::Create, "", None)
            .build()?;
        let input = self.new_request.sanitize(body)?;

        let created = self
            .store
            .insert_resource(&ctx.actor().id, &input, self.clock.now())?;
        ctx.log().info(format_args!("created feature request {}", created.id));

        Ok(project(Some(ctx.actor()), &created, 0, false))
    }

    /// Upvotes a feature request.
    ///
    /// Idempotent: upvoting twice leaves one upvote and succeeds both times.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `InvalidInput` for a blank id, `NotFound`, or
    /// `Conflict` if the store reports a collision it cannot explain.
    pub fn upvote(&self, meta: RequestMeta, id: Tainted<String>) -> Result<FeatureRequestView, Error> {
        let trace = Trace::of(&meta, Operation::Upvote);
        let result = self.upvote_inner(meta, id);
        if let Ok((view, added)) = &result {
            let detail = if *added { "added" } else { "unchanged" };
            self.audit.record(
                trace
                    .event(AuditOutcome::Success)
                    .with_resource_id(&view.id)
                    .with_detail(detail),
            );
        }
        self.audit_failure(&trace, result).map(|(view, _)| view)
    }

    fn upvote_inner(
        &self,
        meta: RequestMeta,
        id: Tainted<String>,
    ) -> Result<(FeatureRequestView, bool), Error> {
        authenticate(&meta)?;
        let id = IdSanitizer.sanitize(id)?.into_inner();
        let resource = self.store.find_resource(&id)?;

        let ctx = PolicyGate::new(meta)
            .for_operation(Operation::Upvote, id.as_str(), resource.as_ref())
            .build()?;
        let resource = resource.ok_or_else(|| Denial::not_found(&id))?;
        let user_id = ctx.actor().id.as_str();

        let added = if self.store.find_upvote(user_id, &id)?.is_some() {
            ctx.log().debug(format_args!("upvote on {} already present", id));
            false
        } else {
            match self.store.create_upvote(user_id, &id, self.clock.now()) {
                Ok(_) => {
                    ctx.log().info(format_args!("upvoted {}", id));
                    true
                }
                Err(e) if e.kind() == StoreErrorKind::UniqueViolation => {
                    // Lost a race; fine if the winning row is ours.
                    if self.store.find_upvote(user_id, &id)?.is_none() {
                        return Err(Denial::conflict(format!(
                            "Upvote on '{}' collided with another write",
                            id
                        ))
                        .into());
                    }
                    ctx.log().debug(format_args!("concurrent upvote on {} already landed", id));
                    false
                }
                Err(e) => return Err(e.into()),
            }
        };

        Ok((self.view(Some(ctx.actor()), &resource)?, added))
    }

    /// Removes the caller's upvote from a feature request.
    ///
    /// Idempotent, and succeeds even if the feature request is gone. Returns
    /// the refreshed view when the request still exists.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` or `InvalidInput` for a blank id.
    pub fn remove_upvote(
        &self,
        meta: RequestMeta,
        id: Tainted<String>,
    ) -> Result<Option<FeatureRequestView>, Error> {
        let trace = Trace::of(&meta, Operation::RemoveUpvote);
        let result = self.remove_upvote_inner(meta, id);
        if let Ok((id, _)) = &result {
            self.audit
                .record(trace.event(AuditOutcome::Success).with_resource_id(id));
        }
        self.audit_failure(&trace, result).map(|(_, view)| view)
    }

    fn remove_upvote_inner(
        &self,
        meta: RequestMeta,
        id: Tainted<String>,
    ) -> Result<(String, Option<FeatureRequestView>), Error> {
        authenticate(&meta)?;
        let id = IdSanitizer.sanitize(id)?.into_inner();

        let ctx = PolicyGate::new(meta)
            .for_operation(Operation::RemoveUpvote, id.as_str(), None)
            .build()?;
        self.store.delete_upvote(&ctx.actor().id, &id)?;
        ctx.log().info(format_args!("removed upvote on {}", id));

        let view = match self.store.find_resource(&id)? {
            Some(resource) => Some(self.view(Some(ctx.actor()), &resource)?),
            None => None,
        };
        Ok((id, view))
    }

    /// Deletes a feature request together with all of its upvotes.
    ///
    /// Allowed for the owner and for admins.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `InvalidInput` for a blank id, `NotFound`, or
    /// `Forbidden` for anyone else.
    pub fn delete(&self, meta: RequestMeta, id: Tainted<String>) -> Result<(), Error> {
        let trace = Trace::of(&meta, Operation::Delete);
        let result = self.delete_inner(meta, id);
        if let Ok(id) = &result {
            self.audit
                .record(trace.event(AuditOutcome::Success).with_resource_id(id));
        }
        self.audit_failure(&trace, result).map(|_| ())
    }

    fn delete_inner(&self, meta: RequestMeta, id: Tainted<String>) -> Result<String, Error> {
        authenticate(&meta)?;
        let id = IdSanitizer.sanitize(id)?.into_inner();
        let resource = self.store.find_resource(&id)?;

        let ctx = PolicyGate::new(meta)
            .for_operation(Operation::Delete, id.as_str(), resource.as_ref())
            .build()?;
        let cap = ctx.delete_cap()?;
        self.remove(cap)?;

        ctx.log().info(format_args!("deleted feature request {}", cap.request_id()));
        Ok(cap.request_id().to_string())
    }

    /// Sets the status of a feature request. Admins only.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `InvalidInput` for a blank id or a status outside
    /// the known set, `NotFound`, or `Forbidden` for non-admins (owners
    /// included).
    pub fn change_status(
        &self,
        meta: RequestMeta,
        id: Tainted<String>,
        body: Tainted<StatusBody>,
    ) -> Result<FeatureRequestView, Error> {
        let trace = Trace::of(&meta, Operation::ChangeStatus);
        let result = self.change_status_inner(meta, id, body);
        if let Ok(view) = &result {
            self.audit.record(
                trace
                    .event(AuditOutcome::Success)
                    .with_resource_id(&view.id)
                    .with_detail(view.status.as_str()),
            );
        }
        self.audit_failure(&trace, result)
    }

    fn change_status_inner(
        &self,
        meta: RequestMeta,
        id: Tainted<String>,
        body: Tainted<StatusBody>,
    ) -> Result<FeatureRequestView, Error> {
        authenticate(&meta)?;
        let id = IdSanitizer.sanitize(id)?.into_inner();
        let status = StatusSanitizer.sanitize(body)?.into_inner();
        let resource = self.store.find_resource(&id)?;

        let ctx = PolicyGate::new(meta)
            .for_operation(Operation::ChangeStatus, id.as_str(), resource.as_ref())
            .build()?;
        let cap = ctx.require_moderate()?;
        let updated = self.set_status(cap, &id, status)?;

        ctx.log().info(format_args!("set status of {} to {}", updated.id, status));
        Ok(self.view(Some(ctx.actor()), &updated)?)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Removes exactly the request the capability was granted for.
    fn remove(&self, cap: &DeleteCap) -> Result<(), StoreError> {
        self.store.delete_resource_and_upvotes(cap.request_id())
    }

    fn set_status(
        &self,
        _cap: ModerateCap,
        id: &str,
        status: Status,
    ) -> Result<FeatureRequest, StoreError> {
        self.store.update_status(id, status, self.clock.now())
    }

    fn view(
        &self,
        viewer: Option<&Principal>,
        resource: &FeatureRequest,
    ) -> Result<FeatureRequestView, StoreError> {
        let count = self.store.count_upvotes(&resource.id)?;
        let upvoted = match viewer {
            Some(p) => self.store.find_upvote(&p.id, &resource.id)?.is_some(),
            None => false,
        };
        Ok(project(viewer, resource, count, upvoted))
    }

    fn audit_failure<T>(&self, trace: &Trace, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &result {
            let outcome = match err {
                Error::Denied(denial) => AuditOutcome::Denied(denial.kind),
                Error::Store(e) => {
                    tracing::error!(
                        request_id = %trace.request_id,
                        operation = %trace.operation,
                        error = %e,
                        "store failure"
                    );
                    AuditOutcome::Error
                }
            };
            self.audit.record(trace.event(outcome));
        }
        result
    }
}

impl<S: Store> std::fmt::Debug for FeatureBoard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureBoard")
            .field("config", &self.config)
            .field("audit_events", &self.audit.len())
            .finish_non_exhaustive()
    }
}

/// First check of every mutating operation.
fn authenticate(meta: &RequestMeta) -> Result<(), Denial> {
    match meta.principal {
        Some(_) => Ok(()),
        None => Err(Denial::unauthenticated()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DenialKind;
    use crate::store::MemoryStore;
    use crate::test_utils::feature_request;
    use crate::verified::Verified;
    use crate::model::{NewFeatureRequest, Upvote};

    fn board() -> FeatureBoard<MemoryStore> {
        let store = MemoryStore::new();
        store.seed(feature_request("fr-1", "alice"));
        FeatureBoard::new(store, BoardConfig::default()).unwrap()
    }

    fn alice() -> RequestMeta {
        RequestMeta::authenticated("req-alice", Principal::user("alice"))
    }

    fn bob() -> RequestMeta {
        RequestMeta::authenticated("req-bob", Principal::user("bob"))
    }

    fn root() -> RequestMeta {
        RequestMeta::authenticated("req-root", Principal::admin("root"))
    }

    fn id(value: &str) -> Tainted<String> {
        Tainted::new(value.to_string())
    }

    fn status(value: &str) -> Tainted<StatusBody> {
        Tainted::new(StatusBody {
            status: Some(value.to_string()),
        })
    }

    fn kind<T: std::fmt::Debug>(result: Result<T, Error>) -> DenialKind {
        *result.unwrap_err().denial_kind().expect("expected a denial")
    }

    #[test]
    fn config_is_validated_on_construction() {
        let config = BoardConfig {
            page_size: 0,
            ..BoardConfig::default()
        };
        let err = FeatureBoard::new(MemoryStore::new(), config).unwrap_err();
        assert_eq!(err.field(), "page_size");
    }

    #[test]
    fn anonymous_read_sees_count_but_no_viewer_flags() {
        let board = board();
        board.upvote(bob(), id("fr-1")).unwrap();

        let view = board.get(RequestMeta::anonymous("req-anon"), id("fr-1")).unwrap();

        assert_eq!(view.upvote_count, 1);
        assert!(!view.has_upvoted);
        assert!(!view.is_owner);
    }

    #[test]
    fn get_missing_is_not_found() {
        let board = board();
        assert_eq!(kind(board.get(alice(), id("nope"))), DenialKind::NotFound);
    }

    #[test]
    fn create_makes_caller_owner_of_pending_request() {
        let board = board();
        let body = NewRequestBody {
            title: Some("  Export to CSV ".into()),
            description: Some("Download the board".into()),
        };

        let view = board.create(bob(), Tainted::new(body)).unwrap();

        assert_eq!(view.owner_id, "bob");
        assert_eq!(view.title, "Export to CSV");
        assert_eq!(view.status, Status::Pending);
        assert!(view.is_owner);
        assert_eq!(view.upvote_count, 0);
    }

    #[test]
    fn anonymous_create_is_unauthenticated_before_validation() {
        let board = board();
        let result = board.create(
            RequestMeta::anonymous("req-anon"),
            Tainted::new(NewRequestBody::default()),
        );
        assert_eq!(kind(result), DenialKind::Unauthenticated);
    }

    #[test]
    fn create_with_blank_title_is_invalid_input() {
        let board = board();
        let body = NewRequestBody {
            title: Some("   ".into()),
            description: Some("d".into()),
        };
        assert_eq!(
            kind(board.create(alice(), Tainted::new(body))),
            DenialKind::InvalidInput
        );
    }

    #[test]
    fn upvote_twice_counts_once() {
        let board = board();

        let first = board.upvote(bob(), id("fr-1")).unwrap();
        let second = board.upvote(bob(), id("fr-1")).unwrap();

        assert_eq!(first.upvote_count, 1);
        assert_eq!(second.upvote_count, 1);
        assert!(second.has_upvoted);
        assert_eq!(board.store().upvote_rows(), 1);
    }

    #[test]
    fn upvote_missing_is_not_found() {
        let board = board();
        assert_eq!(kind(board.upvote(bob(), id("nope"))), DenialKind::NotFound);
    }

    #[test]
    fn remove_upvote_twice_is_quiet() {
        let board = board();
        board.upvote(bob(), id("fr-1")).unwrap();

        let first = board.remove_upvote(bob(), id("fr-1")).unwrap().unwrap();
        let second = board.remove_upvote(bob(), id("fr-1")).unwrap().unwrap();

        assert!(!first.has_upvoted);
        assert!(!second.has_upvoted);
        assert_eq!(second.upvote_count, 0);
    }

    #[test]
    fn remove_upvote_on_missing_request_succeeds() {
        let board = board();
        assert_eq!(board.remove_upvote(bob(), id("gone")).unwrap(), None);
    }

    #[test]
    fn delete_rules() {
        let board = board();
        assert_eq!(
            kind(board.delete(bob(), id("fr-1"))),
            DenialKind::Forbidden { operation: "delete" }
        );
        board.delete(alice(), id("fr-1")).unwrap();
        assert_eq!(kind(board.delete(alice(), id("fr-1"))), DenialKind::NotFound);
    }

    #[test]
    fn delete_takes_upvotes_with_it() {
        let board = board();
        board.upvote(bob(), id("fr-1")).unwrap();
        board.upvote(alice(), id("fr-1")).unwrap();

        board.delete(root(), id("fr-1")).unwrap();

        assert!(board.store().find_upvote("bob", "fr-1").unwrap().is_none());
        assert_eq!(board.store().upvote_rows(), 0);
    }

    #[test]
    fn change_status_is_admin_only() {
        let board = board();
        assert_eq!(
            kind(board.change_status(alice(), id("fr-1"), status("planned"))),
            DenialKind::Forbidden {
                operation: "change_status"
            }
        );

        let view = board.change_status(root(), id("fr-1"), status("planned")).unwrap();
        assert_eq!(view.status, Status::Planned);
        assert!(!view.is_owner);
    }

    #[test]
    fn invalid_status_is_rejected_even_for_admin() {
        let board = board();
        assert_eq!(
            kind(board.change_status(root(), id("fr-1"), status("shipped"))),
            DenialKind::InvalidInput
        );
    }

    #[test]
    fn invalid_status_on_missing_request_is_invalid_input() {
        let board = board();
        assert_eq!(
            kind(board.change_status(root(), id("nope"), status("bogus"))),
            DenialKind::InvalidInput
        );
    }

    #[test]
    fn mine_filter_requires_authentication() {
        let board = board();
        let query = RawListQuery {
            filter: Some("mine".into()),
            ..RawListQuery::default()
        };
        assert_eq!(
            kind(board.list(RequestMeta::anonymous("req-anon"), Tainted::new(query))),
            DenialKind::Unauthenticated
        );
    }

    #[test]
    fn list_sorts_by_upvotes_then_recency() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let board = FeatureBoard::new(MemoryStore::new(), BoardConfig::default())
            .unwrap()
            .with_clock(clock);

        let mut ids = Vec::new();
        for title in ["first", "second", "third"] {
            let body = NewRequestBody {
                title: Some(title.into()),
                description: Some("d".into()),
            };
            ids.push(board.create(alice(), Tainted::new(body)).unwrap().id);
        }
        board.upvote(bob(), Tainted::new(ids[0].clone())).unwrap();

        let page = board
            .list(RequestMeta::anonymous("req-list"), Tainted::new(RawListQuery::default()))
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.requests[0].id, ids[0]);
        assert_eq!(page.requests[0].upvote_count, 1);
    }

    #[test]
    fn manual_clock_drives_timestamps() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), start + Duration::days(2));
    }

    #[test]
    fn audit_records_mutations_and_denials() {
        let board = board();
        board.upvote(bob(), id("fr-1")).unwrap();
        let _ = board.delete(bob(), id("fr-1"));

        let events = board.audit().events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].outcome(), AuditOutcome::Success);
        assert_eq!(events[0].detail(), Some("added"));
        assert_eq!(
            events[1].outcome(),
            AuditOutcome::Denied(DenialKind::Forbidden { operation: "delete" })
        );
    }

    /// A store whose first upvote insert always reports a collision.
    struct RacingStore {
        inner: MemoryStore,
        winner: &'static str,
    }

    impl Store for RacingStore {
        fn find_resource(&self, id: &str) -> Result<Option<FeatureRequest>, StoreError> {
            self.inner.find_resource(id)
        }

        fn list_resources(&self) -> Result<Vec<FeatureRequest>, StoreError> {
            self.inner.list_resources()
        }

        fn insert_resource(
            &self,
            owner_id: &str,
            input: &Verified<NewFeatureRequest>,
            created_at: DateTime<Utc>,
        ) -> Result<FeatureRequest, StoreError> {
            self.inner.insert_resource(owner_id, input, created_at)
        }

        fn count_upvotes(&self, request_id: &str) -> Result<u64, StoreError> {
            self.inner.count_upvotes(request_id)
        }

        fn find_upvote(&self, user_id: &str, request_id: &str) -> Result<Option<Upvote>, StoreError> {
            self.inner.find_upvote(user_id, request_id)
        }

        fn create_upvote(
            &self,
            _user_id: &str,
            request_id: &str,
            created_at: DateTime<Utc>,
        ) -> Result<Upvote, StoreError> {
            // The competing write lands first.
            let _ = self.inner.create_upvote(self.winner, request_id, created_at);
            Err(StoreError::new(StoreErrorKind::UniqueViolation, "duplicate upvote"))
        }

        fn delete_upvote(&self, user_id: &str, request_id: &str) -> Result<(), StoreError> {
            self.inner.delete_upvote(user_id, request_id)
        }

        fn delete_resource_and_upvotes(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete_resource_and_upvotes(id)
        }

        fn update_status(
            &self,
            id: &str,
            status: Status,
            updated_at: DateTime<Utc>,
        ) -> Result<FeatureRequest, StoreError> {
            self.inner.update_status(id, status, updated_at)
        }
    }

    fn racing_board(winner: &'static str) -> FeatureBoard<RacingStore> {
        let inner = MemoryStore::new();
        inner.seed(feature_request("fr-1", "alice"));
        FeatureBoard::new(RacingStore { inner, winner }, BoardConfig::default()).unwrap()
    }

    #[test]
    fn lost_upvote_race_to_self_is_success() {
        let board = racing_board("bob");
        let view = board.upvote(bob(), id("fr-1")).unwrap();
        assert!(view.has_upvoted);
        assert_eq!(view.upvote_count, 1);
    }

    #[test]
    fn unexplained_collision_is_conflict() {
        let board = racing_board("mallory");
        assert_eq!(kind(board.upvote(bob(), id("fr-1"))), DenialKind::Conflict);
    }

    /// A store whose backend is unreachable.
    struct DownStore;

    fn unavailable<T>() -> Result<T, StoreError> {
        Err(StoreError::new(StoreErrorKind::Unavailable, "connection refused to db-1"))
    }

    impl Store for DownStore {
        fn find_resource(&self, _id: &str) -> Result<Option<FeatureRequest>, StoreError> {
            unavailable()
        }

        fn list_resources(&self) -> Result<Vec<FeatureRequest>, StoreError> {
            unavailable()
        }

        fn insert_resource(
            &self,
            _owner_id: &str,
            _input: &Verified<NewFeatureRequest>,
            _created_at: DateTime<Utc>,
        ) -> Result<FeatureRequest, StoreError> {
            unavailable()
        }

        fn count_upvotes(&self, _request_id: &str) -> Result<u64, StoreError> {
            unavailable()
        }

        fn find_upvote(&self, _user_id: &str, _request_id: &str) -> Result<Option<Upvote>, StoreError> {
            unavailable()
        }

        fn create_upvote(
            &self,
            _user_id: &str,
            _request_id: &str,
            _created_at: DateTime<Utc>,
        ) -> Result<Upvote, StoreError> {
            unavailable()
        }

        fn delete_upvote(&self, _user_id: &str, _request_id: &str) -> Result<(), StoreError> {
            unavailable()
        }

        fn delete_resource_and_upvotes(&self, _id: &str) -> Result<(), StoreError> {
            unavailable()
        }

        fn update_status(
            &self,
            _id: &str,
            _status: Status,
            _updated_at: DateTime<Utc>,
        ) -> Result<FeatureRequest, StoreError> {
            unavailable()
        }
    }

    #[test]
    fn store_failure_is_audited_as_error_and_answers_500() {
        let board = FeatureBoard::new(DownStore, BoardConfig::default()).unwrap();

        let err = board.upvote(bob(), id("fr-1")).unwrap_err();
        match &err {
            Error::Store(e) => assert_eq!(e.kind(), StoreErrorKind::Unavailable),
            Error::Denied(d) => panic!("expected a store failure, got {:?}", d),
        }

        let events = board.audit().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation(), Operation::Upvote);
        assert_eq!(events[0].outcome(), AuditOutcome::Error);

        let response = crate::web::Response::from_error(&err);
        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], "internal");
        assert!(!response.body.to_string().contains("db-1"));
    }

    #[test]
    fn audit_retention_is_capped_by_config() {
        let config = BoardConfig {
            audit_capacity: 16,
            ..BoardConfig::default()
        };
        let board = FeatureBoard::new(MemoryStore::new(), config).unwrap();

        for _ in 0..1_000 {
            let _ = board.get(RequestMeta::anonymous("req-anon"), id("missing"));
        }

        assert_eq!(board.audit().len(), 16);
        assert_eq!(board.audit().dropped(), 984);
    }
}
