//! The persistence seam.
//!
//! [`Store`] is the narrow interface the board consumes; the database behind
//! it is somebody else's concern. Implementations must enforce two things the
//! access decision relies on:
//!
//! - `(user_id, request_id)` uniqueness for upvotes, reported as
//!   [`StoreErrorKind::UniqueViolation`] so a lost race is distinguishable.
//! - Atomic removal of a feature request together with its upvotes.
//!
//! [`MemoryStore`] keeps every table behind one lock, which gives both.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::model::{FeatureRequest, NewFeatureRequest, Status, Upvote};
use crate::Verified;

/// Error reported by a [`Store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
}

impl StoreError {
    /// Creates a new store error.
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for StoreError {}

/// Kind of store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// A uniqueness constraint rejected the write
    UniqueViolation,
    /// The row to modify does not exist
    NotFound,
    /// The store could not be reached or failed internally
    Unavailable,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UniqueViolation => write!(f, "unique violation"),
            Self::NotFound => write!(f, "not found"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Persistence operations the board needs.
pub trait Store: Send + Sync {
    /// Loads one feature request.
    fn find_resource(&self, id: &str) -> Result<Option<FeatureRequest>, StoreError>;

    /// Loads every feature request, in no particular order.
    fn list_resources(&self) -> Result<Vec<FeatureRequest>, StoreError>;

    /// Inserts a new feature request owned by `owner_id`, status `pending`.
    ///
    /// Only validated input is accepted.
    fn insert_resource(
        &self,
        owner_id: &str,
        input: &Verified<NewFeatureRequest>,
        created_at: DateTime<Utc>,
    ) -> Result<FeatureRequest, StoreError>;

    /// Counts upvotes on `request_id`.
    fn count_upvotes(&self, request_id: &str) -> Result<u64, StoreError>;

    /// Loads `user_id`'s upvote on `request_id`.
    fn find_upvote(&self, user_id: &str, request_id: &str) -> Result<Option<Upvote>, StoreError>;

    /// Records an upvote.
    ///
    /// # Errors
    ///
    /// `UniqueViolation` if the pair already exists; `NotFound` if the feature
    /// request does not.
    fn create_upvote(
        &self,
        user_id: &str,
        request_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Upvote, StoreError>;

    /// Removes an upvote. Absent upvotes are a no-op.
    fn delete_upvote(&self, user_id: &str, request_id: &str) -> Result<(), StoreError>;

    /// Removes a feature request and all its upvotes as one unit.
    ///
    /// # Errors
    ///
    /// `NotFound` if the feature request does not exist; nothing is removed.
    fn delete_resource_and_upvotes(&self, id: &str) -> Result<(), StoreError>;

    /// Sets the status of a feature request and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the feature request does not exist.
    fn update_status(
        &self,
        id: &str,
        status: Status,
        updated_at: DateTime<Utc>,
    ) -> Result<FeatureRequest, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    requests: BTreeMap<String, FeatureRequest>,
    // Keyed by (request_id, user_id) so one request's upvotes are contiguous.
    upvotes: BTreeMap<(String, String), Upvote>,
}

impl Tables {
    fn upvotes_for<'a>(&'a self, request_id: &'a str) -> impl Iterator<Item = &'a Upvote> + 'a {
        self.upvotes
            .range((request_id.to_string(), String::new())..)
            .take_while(move |((rid, _), _)| rid == request_id)
            .map(|(_, upvote)| upvote)
    }
}

/// In-memory [`Store`].
///
/// Every call takes a single lock over all tables, so each call is atomic.
///
/// # Examples
///
/// ```
/// use featureboard_policy::{MemoryStore, Store};
///
/// let store = MemoryStore::new();
/// assert!(store.find_resource("missing").unwrap().is_none());
/// assert_eq!(store.count_upvotes("missing").unwrap(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed record, replacing any with the same id.
    ///
    /// Meant for seeding fixtures; goes around input validation.
    pub fn seed(&self, request: FeatureRequest) {
        self.tables
            .lock()
            .requests
            .insert(request.id.clone(), request);
    }

    /// Returns the number of upvote rows across all requests.
    pub fn upvote_rows(&self) -> usize {
        self.tables.lock().upvotes.len()
    }
}

impl Store for MemoryStore {
    fn find_resource(&self, id: &str) -> Result<Option<FeatureRequest>, StoreError> {
        Ok(self.tables.lock().requests.get(id).cloned())
    }

    fn list_resources(&self) -> Result<Vec<FeatureRequest>, StoreError> {
        Ok(self.tables.lock().requests.values().cloned().collect())
    }

    fn insert_resource(
        &self,
        owner_id: &str,
        input: &Verified<NewFeatureRequest>,
        created_at: DateTime<Utc>,
    ) -> Result<FeatureRequest, StoreError> {
        let input = input.as_ref();
        let request = FeatureRequest {
            id: Uuid::new_v4().to_string(),
            title: input.title.clone(),
            description: input.description.clone(),
            status: Status::Pending,
            owner_id: owner_id.to_string(),
            created_at,
            updated_at: created_at,
        };

        self.tables
            .lock()
            .requests
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn count_upvotes(&self, request_id: &str) -> Result<u64, StoreError> {
        Ok(self.tables.lock().upvotes_for(request_id).count() as u64)
    }

    fn find_upvote(&self, user_id: &str, request_id: &str) -> Result<Option<Upvote>, StoreError> {
        let key = (request_id.to_string(), user_id.to_string());
        Ok(self.tables.lock().upvotes.get(&key).cloned())
    }

    fn create_upvote(
        &self,
        user_id: &str,
        request_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Upvote, StoreError> {
        let mut tables = self.tables.lock();

        if !tables.requests.contains_key(request_id) {
            return Err(StoreError::new(
                StoreErrorKind::NotFound,
                format!("feature request '{}' does not exist", request_id),
            ));
        }

        let key = (request_id.to_string(), user_id.to_string());
        if tables.upvotes.contains_key(&key) {
            return Err(StoreError::new(
                StoreErrorKind::UniqueViolation,
                "upvote (user_id, request_id) already exists",
            ));
        }

        let upvote = Upvote {
            user_id: user_id.to_string(),
            request_id: request_id.to_string(),
            created_at,
        };
        tables.upvotes.insert(key, upvote.clone());
        Ok(upvote)
    }

    fn delete_upvote(&self, user_id: &str, request_id: &str) -> Result<(), StoreError> {
        let key = (request_id.to_string(), user_id.to_string());
        self.tables.lock().upvotes.remove(&key);
        Ok(())
    }

    fn delete_resource_and_upvotes(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();

        if !tables.requests.contains_key(id) {
            return Err(StoreError::new(
                StoreErrorKind::NotFound,
                format!("feature request '{}' does not exist", id),
            ));
        }

        tables.upvotes.retain(|(rid, _), _| rid != id);
        tables.requests.remove(id);
        Ok(())
    }

    fn update_status(
        &self,
        id: &str,
        status: Status,
        updated_at: DateTime<Utc>,
    ) -> Result<FeatureRequest, StoreError> {
        let mut tables = self.tables.lock();
        let request = tables.requests.get_mut(id).ok_or_else(|| {
            StoreError::new(
                StoreErrorKind::NotFound,
                format!("feature request '{}' does not exist", id),
            )
        })?;

        request.status = status;
        request.updated_at = updated_at;
        Ok(request.clone())
    }
}
