//! Audit trail for board mutations and denials.
//!
//! This module provides:
//! - `AuditEvent`: structured audit event schema
//! - `AuditTrail`: in-memory recorder that also emits every event to `tracing`
//!
//! Events carry identifiers and outcomes only. Titles, descriptions and raw
//! request input are never recorded.

mod event;
mod trail;

pub use event::{AuditEvent, AuditOutcome};
pub use trail::AuditTrail;
