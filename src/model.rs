//! Domain records as consumed by the access decision.
//!
//! Persistence details belong to the [`Store`](crate::Store); these types only
//! carry what the decision and the projection need.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a feature request.
///
/// Transitions are unordered: any status is reachable from any other, gated
/// only by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Newly submitted
    Pending,
    /// Accepted onto the roadmap
    Planned,
    /// Shipped
    Completed,
    /// Declined
    Rejected,
}

impl Status {
    /// Every valid status, in display order.
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::Planned,
        Status::Completed,
        Status::Rejected,
    ];

    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Planned => "planned",
            Status::Completed => "completed",
            Status::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status name is outside the enumerated set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus;

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status must be one of pending, planned, completed, rejected")
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(UnknownStatus)
    }
}

/// A stored feature request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequest {
    /// Stable identifier
    pub id: String,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Current status
    pub status: Status,
    /// Principal id of the creator; immutable after creation
    pub owner_id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last status change, or creation time
    pub updated_at: DateTime<Utc>,
}

/// One principal's upvote on one feature request.
///
/// At most one exists per `(user_id, request_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upvote {
    /// Upvoting principal
    pub user_id: String,
    /// Target feature request
    pub request_id: String,
    /// When the upvote was recorded
    pub created_at: DateTime<Utc>,
}

/// Fields of a feature request to be created.
///
/// Only ever handed to the store wrapped in [`Verified`](crate::Verified);
/// see [`NewRequestSanitizer`](crate::NewRequestSanitizer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeatureRequest {
    /// Trimmed, validated title
    pub title: String,
    /// Trimmed, validated description
    pub description: String,
}

/// Body of a create request, as sent by the client.
///
/// Fields are optional so that a missing field surfaces as `InvalidInput`
/// from the sanitizer rather than as a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewRequestBody {
    /// Requested title
    pub title: Option<String>,
    /// Requested description
    pub description: Option<String>,
}

/// Body of a status change, as sent by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusBody {
    /// Requested status name
    pub status: Option<String>,
}

/// A feature request as seen by one viewer.
///
/// `upvote_count`, `has_upvoted` and `is_owner` are derived on every read and
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequestView {
    /// Stable identifier
    pub id: String,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Current status
    pub status: Status,
    /// Principal id of the creator
    pub owner_id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last status change, or creation time
    pub updated_at: DateTime<Utc>,
    /// Total upvotes, independent of viewer
    pub upvote_count: u64,
    /// Whether the viewer has upvoted; always false for anonymous viewers
    pub has_upvoted: bool,
    /// Whether the viewer owns the request; always false for anonymous viewers
    pub is_owner: bool,
}
