use std::fmt;

/// A wrapper that keeps session tokens out of logs and error output.
///
/// Session tokens reach the board only on their way to an
/// [`IdentityProvider`](crate::web::IdentityProvider). `Secret<T>` makes sure
/// they are never printed along the way; the value is only reachable through
/// [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use featureboard_policy::Secret;
///
/// let token = Secret::new("sess-1234567890".to_string());
///
/// assert_eq!(format!("{:?}", token), "[REDACTED]");
/// assert_eq!(format!("{}", token), "[REDACTED]");
///
/// assert_eq!(token.expose_secret(), "sess-1234567890");
/// ```
// Do NOT add Clone, Copy or Default derives: tokens must not be duplicated
// carelessly.
pub struct Secret<T> {
    // Must remain private.
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// Only identity providers should need this. Never log the result.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

// Do NOT implement Deref, AsRef, Borrow, or a Debug/Display that shows the
// value.

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
