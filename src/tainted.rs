use std::fmt;

/// Untrusted input that must pass a [`Sanitizer`](crate::Sanitizer) before use.
///
/// Request bodies, query strings and path segments enter the board as
/// `Tainted<T>`. The inner value is only reachable from sanitizers inside
/// this crate, so a handler cannot forward a raw title or status to the store.
///
/// # Examples
///
/// ```
/// use featureboard_policy::{Tainted, Sanitizer, StatusSanitizer, Status};
///
/// let raw = Tainted::new(" planned ".to_string());
/// let status = StatusSanitizer.sanitize(raw).expect("known status");
/// assert_eq!(*status.as_ref(), Status::Planned);
/// ```
// Do NOT add Deref, AsRef, Borrow, From<T> or Into<T>: any of them lets raw
// input skip validation.
#[derive(Clone)]
pub struct Tainted<T> {
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the inner value for sanitization.
    ///
    /// Only sanitizer implementations may call this, and only to validate the
    /// value before wrapping it in `Verified<T>`.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
