/// Input that has passed a [`Sanitizer`](crate::Sanitizer).
///
/// `Verified<T>` has no public constructor and no `From<T>`, so holding one
/// proves the value went through validation. The store only accepts new
/// feature requests in this form.
///
/// ```compile_fail
/// use featureboard_policy::Verified;
///
/// let verified = Verified::new("data".to_string()); // no public constructor
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps an already validated value.
    ///
    /// Callers are responsible for having validated it; only sanitizers in
    /// this crate do so.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the validated value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
