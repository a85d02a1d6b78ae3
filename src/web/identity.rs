//! Identity provider seam.

use std::collections::HashMap;

use crate::request::Principal;
use crate::secret::Secret;

/// Resolves a session token to a principal.
///
/// Tokens are verified upstream (signature, expiry); implementations only
/// look up who the token belongs to. `None` means the caller is anonymous.
///
/// # Examples
///
/// ```
/// use featureboard_policy::web::IdentityProvider;
/// use featureboard_policy::{Principal, Secret};
///
/// struct EveryoneIsAlice;
///
/// impl IdentityProvider for EveryoneIsAlice {
///     fn resolve(&self, _token: &Secret<String>) -> Option<Principal> {
///         Some(Principal::user("alice"))
///     }
/// }
///
/// let token = Secret::new("anything".to_string());
/// assert_eq!(EveryoneIsAlice.resolve(&token).unwrap().id, "alice");
/// ```
pub trait IdentityProvider: Send + Sync {
    /// Returns the principal `token` belongs to, if any.
    fn resolve(&self, token: &Secret<String>) -> Option<Principal>;
}

/// Maps a fixed set of tokens to principals.
#[derive(Default)]
pub struct StaticIdentityProvider {
    sessions: HashMap<String, Principal>,
}

impl StaticIdentityProvider {
    /// Creates a provider that knows no tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` for `principal`.
    pub fn with_session(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.sessions.insert(token.into(), principal);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve(&self, token: &Secret<String>) -> Option<Principal> {
        self.sessions.get(token.expose_secret()).cloned()
    }
}

impl std::fmt::Debug for StaticIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keys are live tokens.
        f.debug_struct("StaticIdentityProvider")
            .field("sessions", &self.sessions.len())
            .finish()
    }
}
