//! Type-state markers for context progression.
//!
//! These zero-sized markers encode at compile time whether a context has
//! passed the policy gate, and with it whether a principal is guaranteed.

use std::fmt;

use crate::request::Principal;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Viewer {}
    impl Sealed for super::Authorized {}
}

/// A context state. Sealed; the only states are [`Viewer`] and [`Authorized`].
pub trait State: sealed::Sealed {
    /// How the state holds its principal.
    type Principal: fmt::Debug + Clone;

    /// Borrows the principal, if the state holds one.
    fn principal(held: &Self::Principal) -> Option<&Principal>;
}

/// Marker for a viewing context.
///
/// `Ctx<Viewer>` may or may not carry a principal and grants no capability.
/// It is all a read or list needs.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    _private: (),
}

impl State for Viewer {
    type Principal = Option<Principal>;

    fn principal(held: &Self::Principal) -> Option<&Principal> {
        held.as_ref()
    }
}

/// Marker for an authorized context.
///
/// `Ctx<Authorized>` always carries a principal and whatever capabilities the
/// gate granted for one operation.
#[derive(Debug, Clone, Copy)]
pub struct Authorized {
    _private: (),
}

impl State for Authorized {
    type Principal = Principal;

    fn principal(held: &Self::Principal) -> Option<&Principal> {
        Some(held)
    }
}
