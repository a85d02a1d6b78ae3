//! Access decisions and ownership rules for a feature-request board.
//!
//! Users submit feature requests, browse and search them, and upvote them;
//! administrators moderate their status. This crate decides who may do which
//! of those things, and enforces the decision with types:
//! - **Access decision**: [`decide`] and [`project`] are pure functions over a
//!   principal, an operation and a resource snapshot
//! - **Capabilities**: [`ModerateCap`] and [`DeleteCap`] can only come out of
//!   a [`PolicyGate`], and the privileged store writes require them
//! - **Taint tracking**: request input arrives as [`Tainted<T>`] and only a
//!   [`Sanitizer`] turns it into [`Verified<T>`]
//! - **Explicit context**: every call carries its [`RequestMeta`]; there is no
//!   ambient session
//!
//! [`FeatureBoard`] puts these together over a [`Store`], and [`web`] maps
//! the outcomes onto HTTP.
//!
//! # Examples
//!
//! ```
//! use featureboard_policy::{
//!     BoardConfig, DenialKind, FeatureBoard, MemoryStore, NewRequestBody, Principal,
//!     RequestMeta, StatusBody, Tainted,
//! };
//!
//! let board = FeatureBoard::new(MemoryStore::new(), BoardConfig::default()).unwrap();
//! let alice = || RequestMeta::authenticated("req-a", Principal::user("alice"));
//! let root = || RequestMeta::authenticated("req-r", Principal::admin("root"));
//!
//! let body = NewRequestBody {
//!     title: Some("Dark mode".into()),
//!     description: Some("Easier on the eyes".into()),
//! };
//! let created = board.create(alice(), Tainted::new(body)).unwrap();
//!
//! // Owners cannot moderate their own requests.
//! let planned = || Tainted::new(StatusBody { status: Some("planned".into()) });
//! let err = board
//!     .change_status(alice(), Tainted::new(created.id.clone()), planned())
//!     .unwrap_err();
//! assert_eq!(err.denial_kind(), Some(&DenialKind::Forbidden { operation: "change_status" }));
//!
//! // Admins can.
//! let view = board
//!     .change_status(root(), Tainted::new(created.id.clone()), planned())
//!     .unwrap();
//! assert_eq!(view.status.as_str(), "planned");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod board;
mod capability;
mod config;
mod context;
mod decision;
mod error;
mod gate;
mod logging;
mod model;
mod policy;
mod query;
mod request;
mod sanitizer;
mod secret;
mod state;
mod store;
mod tainted;
mod verified;
pub mod web;

#[cfg(test)]
mod test_utils;

pub use board::{Clock, FeatureBoard, ManualClock, SystemClock};
pub use capability::{DeleteCap, ModerateCap};
pub use config::{BoardConfig, ConfigError};
pub use context::Ctx;
pub use decision::{decide, project, Decision};
pub use error::{Denial, DenialKind, Error};
pub use gate::PolicyGate;
pub use logging::PolicyLog;
pub use model::{
    FeatureRequest, FeatureRequestView, NewFeatureRequest, NewRequestBody, Status, StatusBody,
    UnknownStatus, Upvote,
};
pub use policy::{Admin, Authenticated, Operation, OwnerOrAdmin, PolicyReq};
pub use query::{sort_views, ListPage, ListQuery, RawListQuery, Timeframe, UnknownTimeframe};
pub use request::{Principal, RequestMeta, Role, UnknownRole};
pub use sanitizer::{
    IdSanitizer, ListQuerySanitizer, NewRequestSanitizer, SanitizationError,
    SanitizationErrorKind, Sanitizer, StatusSanitizer, TextSanitizer,
};
pub use secret::Secret;
pub use state::{Authorized, State, Viewer};
pub use store::{MemoryStore, Store, StoreError, StoreErrorKind};
pub use tainted::Tainted;
pub use verified::Verified;
