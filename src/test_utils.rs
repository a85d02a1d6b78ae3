//! Shared fixtures and proptest strategies for unit tests.

use chrono::Utc;
use proptest::prelude::*;

use crate::model::{FeatureRequest, Status};

/// A pending feature request owned by `owner`, created now.
pub(crate) fn feature_request(id: &str, owner: &str) -> FeatureRequest {
    let now = Utc::now();
    FeatureRequest {
        id: id.to_string(),
        title: format!("Request {}", id),
        description: "Something worth building".to_string(),
        status: Status::Pending,
        owner_id: owner.to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Titles a single-line sanitizer with a 100 character limit accepts as-is.
pub(crate) fn arb_title() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]([A-Za-z0-9 ]{0,60}[A-Za-z0-9])?"
}
