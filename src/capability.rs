/// Capability granting permission to change feature-request statuses.
///
/// This is a zero-sized proof that the admin policy was satisfied.
/// It cannot be constructed outside this crate; only
/// [`PolicyGate`](crate::PolicyGate) hands it out.
///
/// ```compile_fail
/// # use featureboard_policy::ModerateCap;
/// let cap = ModerateCap { _private: () }; // Error: _private is private
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ModerateCap {
    // Private field prevents construction outside the crate
    _private: (),
}

impl ModerateCap {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Capability granting permission to delete one feature request.
///
/// Bound to the id it was granted for, so a capability obtained for one
/// request can never be spent on another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCap {
    request_id: String,
}

impl DeleteCap {
    pub(crate) fn new(request_id: String) -> Self {
        Self { request_id }
    }

    /// Returns the id of the feature request this capability may delete.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}
