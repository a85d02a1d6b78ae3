//! Web framework integration surface.
//!
//! This module is the boundary between an HTTP framework and the board. It
//! handles:
//! - Resolving the caller from a session token through an [`IdentityProvider`]
//! - Introducing taint at the boundary (untrusted inputs become `Tainted<T>`)
//! - Mapping board outcomes to status codes and JSON bodies, in one place
//!
//! It contains no framework-specific code and grants no capabilities.
//! Authorization happens inside the board via `PolicyGate`.
//!
//! # Integration Flow
//!
//! ```text
//! HTTP request
//!   -> framework code builds a RequestAdapter
//!   -> BoardApi handler resolves RequestMeta and TaintedInputs
//!   -> FeatureBoard operation (gate, sanitizers, store)
//!   -> Response { status, body }
//! ```

mod adapter;
mod extract;
mod handlers;
mod identity;
mod response;

pub use adapter::{RequestAdapter, TaintedInputs};
pub use extract::{ExtractMetadata, ExtractTaintedInputs};
pub use handlers::BoardApi;
pub use identity::{IdentityProvider, StaticIdentityProvider};
pub use response::{status_code, Response};
