//! Extraction boundary traits for web integration.

use crate::request::RequestMeta;

use super::{IdentityProvider, TaintedInputs};

/// Extracts request metadata from a framework-specific request.
///
/// Implementations map the framework's request id and session token into a
/// `RequestMeta`. They do not authorize anything; that is
/// [`PolicyGate`](crate::PolicyGate)'s job.
///
/// # Examples
///
/// ```
/// use featureboard_policy::web::{ExtractMetadata, IdentityProvider, StaticIdentityProvider};
/// use featureboard_policy::{Principal, RequestMeta, Secret};
///
/// struct MyFrameworkRequest {
///     request_id: String,
///     cookie: Option<String>,
/// }
///
/// impl ExtractMetadata for MyFrameworkRequest {
///     fn extract_metadata(&self, identity: &dyn IdentityProvider) -> RequestMeta {
///         RequestMeta {
///             request_id: self.request_id.clone(),
///             principal: self
///                 .cookie
///                 .as_ref()
///                 .and_then(|c| identity.resolve(&Secret::new(c.clone()))),
///         }
///     }
/// }
///
/// let identity = StaticIdentityProvider::new().with_session("c1", Principal::user("alice"));
/// let req = MyFrameworkRequest { request_id: "req-1".into(), cookie: Some("c1".into()) };
/// assert!(req.extract_metadata(&identity).principal.is_some());
/// ```
pub trait ExtractMetadata {
    /// Builds the request metadata, resolving the caller through `identity`.
    fn extract_metadata(&self, identity: &dyn IdentityProvider) -> RequestMeta;
}

/// Collects the untrusted inputs of a framework-specific request.
///
/// Every value crossing the HTTP boundary comes out wrapped in
/// [`Tainted`](crate::Tainted).
pub trait ExtractTaintedInputs {
    /// Collects the request's inputs.
    fn extract_tainted_inputs(&self) -> TaintedInputs;
}
