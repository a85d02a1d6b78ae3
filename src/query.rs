//! Listing: filters, ordering and pagination for browsing feature requests.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{FeatureRequest, FeatureRequestView, Status};

/// How far back a listing reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// The past 24 hours
    Day,
    /// The past 7 days
    Week,
    /// The past 30 days
    Month,
}

impl Timeframe {
    /// Length of the window.
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::Day => Duration::hours(24),
            Timeframe::Week => Duration::days(7),
            Timeframe::Month => Duration::days(30),
        }
    }

    /// Earliest creation time inside the window ending at `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

/// Error returned for an unrecognised timeframe name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTimeframe;

impl fmt::Display for UnknownTimeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timeframe must be one of 24h, day, week, month")
    }
}

impl std::error::Error for UnknownTimeframe {}

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" | "day" => Ok(Timeframe::Day),
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            _ => Err(UnknownTimeframe),
        }
    }
}

/// Listing parameters as they arrive on the query string.
///
/// Every field is optional and untrusted; see
/// [`ListQuerySanitizer`](crate::ListQuerySanitizer).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawListQuery {
    /// `pending`, `planned`, `completed`, `rejected`, or `all`
    pub status: Option<String>,
    /// `24h`/`day`, `week`, `month`, or `all`
    pub timeframe: Option<String>,
    /// Free-text search over title and description
    pub search: Option<String>,
    /// `mine` to restrict to the viewer's own requests
    pub filter: Option<String>,
    /// Zero-based page number
    pub page: Option<String>,
}

/// Validated listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only requests in this status
    pub status: Option<Status>,
    /// Only requests created inside this window
    pub timeframe: Option<Timeframe>,
    /// Lowercased search needle
    pub search: Option<String>,
    /// Only requests owned by the viewer
    pub mine: bool,
    /// Zero-based page number
    pub page: usize,
}

impl ListQuery {
    /// Returns `true` if `resource` passes every filter for `viewer_id` at `now`.
    ///
    /// `mine` with no viewer matches nothing; the board rejects that
    /// combination before getting here.
    pub fn matches(
        &self,
        resource: &FeatureRequest,
        viewer_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        if let Some(status) = self.status {
            if resource.status != status {
                return false;
            }
        }

        if let Some(timeframe) = self.timeframe {
            if resource.created_at < timeframe.since(now) {
                return false;
            }
        }

        if self.mine && viewer_id != Some(resource.owner_id.as_str()) {
            return false;
        }

        match &self.search {
            Some(needle) => {
                resource.title.to_lowercase().contains(needle)
                    || resource.description.to_lowercase().contains(needle)
            }
            None => true,
        }
    }
}

/// Orders views most upvoted first, then newest first, then by id.
pub fn sort_views(views: &mut [FeatureRequestView]) {
    views.sort_by(|a, b| {
        b.upvote_count
            .cmp(&a.upvote_count)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// One page of projected feature requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    /// Projected requests on this page
    pub requests: Vec<FeatureRequestView>,
    /// Number of requests matching the filters, across all pages
    pub total: usize,
    /// Whether a later page exists
    pub has_more: bool,
    /// Zero-based page number
    pub current_page: usize,
    /// Number of pages; at least 1
    pub total_pages: usize,
}

impl ListPage {
    /// Cuts page `page` of `page_size` out of `sorted`.
    pub fn paginate(sorted: Vec<FeatureRequestView>, page: usize, page_size: usize) -> Self {
        let total = sorted.len();
        let page_size = page_size.max(1);
        let total_pages = total.div_ceil(page_size).max(1);
        let start = page.saturating_mul(page_size).min(total);
        let requests: Vec<_> = sorted.into_iter().skip(start).take(page_size).collect();
        let has_more = start + requests.len() < total;

        Self {
            requests,
            total,
            has_more,
            current_page: page,
            total_pages,
        }
    }
}
