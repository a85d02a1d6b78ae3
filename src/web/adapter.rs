//! Request adapter for mapping HTTP requests to board inputs.

use std::collections::HashMap;

use crate::query::RawListQuery;
use crate::request::RequestMeta;
use crate::secret::Secret;
use crate::Tainted;

use super::{ExtractMetadata, ExtractTaintedInputs, IdentityProvider};

/// Framework-agnostic view of one HTTP request.
///
/// Framework integrations copy the parts the board cares about into a
/// `RequestAdapter`: a request id, the session token, path and query
/// parameters, and the parsed JSON body.
///
/// # Examples
///
/// ```
/// use featureboard_policy::web::{ExtractMetadata, ExtractTaintedInputs, RequestAdapter, StaticIdentityProvider};
/// use featureboard_policy::Principal;
///
/// let identity = StaticIdentityProvider::new().with_session("tok-a", Principal::user("alice"));
///
/// let mut adapter = RequestAdapter::new("req-12345");
/// adapter.set_session_token("tok-a");
/// adapter.add_query_param("search", "dark mode");
///
/// let meta = adapter.extract_metadata(&identity);
/// assert_eq!(meta.request_id, "req-12345");
/// assert_eq!(meta.principal.unwrap().id, "alice");
///
/// let inputs = adapter.extract_tainted_inputs();
/// assert!(inputs.path_param("id").is_none());
/// ```
#[derive(Debug)]
pub struct RequestAdapter {
    request_id: String,
    session_token: Option<Secret<String>>,
    query_params: HashMap<String, String>,
    path_params: HashMap<String, String>,
    body: serde_json::Value,
}

impl RequestAdapter {
    /// Creates an adapter for request `request_id` with nothing else set.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            session_token: None,
            query_params: HashMap::new(),
            path_params: HashMap::new(),
            body: serde_json::Value::Null,
        }
    }

    /// Sets the session token taken from the cookie or `Authorization` header.
    pub fn set_session_token(&mut self, token: impl Into<String>) {
        self.session_token = Some(Secret::new(token.into()));
    }

    /// Adds a query string parameter.
    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query_params.insert(key.into(), value.into());
    }

    /// Adds a routed path parameter such as `id`.
    pub fn add_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.path_params.insert(key.into(), value.into());
    }

    /// Sets the parsed JSON body.
    pub fn set_body(&mut self, body: serde_json::Value) {
        self.body = body;
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns `true` if a session token was supplied.
    pub fn has_session_token(&self) -> bool {
        self.session_token.is_some()
    }
}

impl ExtractMetadata for RequestAdapter {
    fn extract_metadata(&self, identity: &dyn IdentityProvider) -> RequestMeta {
        let principal = self
            .session_token
            .as_ref()
            .and_then(|token| identity.resolve(token));

        if principal.is_none() && self.session_token.is_some() {
            tracing::debug!(
                request_id = %self.request_id,
                "session token did not resolve; treating caller as anonymous"
            );
        }

        RequestMeta {
            request_id: self.request_id.clone(),
            principal,
        }
    }
}

impl ExtractTaintedInputs for RequestAdapter {
    fn extract_tainted_inputs(&self) -> TaintedInputs {
        let query_param = |key: &str| self.query_params.get(key).cloned();

        TaintedInputs {
            query: Tainted::new(RawListQuery {
                status: query_param("status"),
                timeframe: query_param("timeframe"),
                search: query_param("search"),
                filter: query_param("filter"),
                page: query_param("page"),
            }),
            path_params: self
                .path_params
                .iter()
                .map(|(k, v)| (k.clone(), Tainted::new(v.clone())))
                .collect(),
            body: Tainted::new(self.body.clone()),
        }
    }
}

/// Untrusted inputs of one request.
///
/// Everything in here is still tainted; sanitizers inside the board decide
/// what is usable.
#[derive(Debug, Clone)]
pub struct TaintedInputs {
    query: Tainted<RawListQuery>,
    path_params: HashMap<String, Tainted<String>>,
    body: Tainted<serde_json::Value>,
}

impl TaintedInputs {
    /// Returns the listing parameters.
    pub fn list_query(&self) -> Tainted<RawListQuery> {
        self.query.clone()
    }

    /// Returns the named path parameter.
    pub fn path_param(&self, key: &str) -> Option<Tainted<String>> {
        self.path_params.get(key).cloned()
    }

    /// Parses the body into `T`, keeping the result tainted.
    ///
    /// A missing body parses as `T::default()`, so absent fields surface from
    /// the sanitizer as missing rather than as a parse failure.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the body does not have `T`'s shape.
    pub fn body<T>(&self) -> Result<Tainted<T>, serde_json::Error>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let value = self.body.clone().into_inner();
        if value.is_null() {
            return Ok(Tainted::new(T::default()));
        }
        serde_json::from_value(value).map(Tainted::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewRequestBody;
    use crate::request::Principal;
    use crate::web::StaticIdentityProvider;

    fn identity() -> StaticIdentityProvider {
        StaticIdentityProvider::new().with_session("tok-bob", Principal::user("bob"))
    }

    #[test]
    fn request_adapter_new() {
        let adapter = RequestAdapter::new("req-test");
        assert_eq!(adapter.request_id(), "req-test");
        assert!(!adapter.has_session_token());
    }

    #[test]
    fn missing_token_is_anonymous() {
        let adapter = RequestAdapter::new("req-1");
        assert!(adapter.extract_metadata(&identity()).principal.is_none());
    }

    #[test]
    fn unknown_token_is_anonymous() {
        let mut adapter = RequestAdapter::new("req-1");
        adapter.set_session_token("tok-forged");
        assert!(adapter.extract_metadata(&identity()).principal.is_none());
    }

    #[test]
    fn known_token_resolves_principal() {
        let mut adapter = RequestAdapter::new("req-1");
        adapter.set_session_token("tok-bob");

        let meta = adapter.extract_metadata(&identity());
        assert_eq!(meta.principal.map(|p| p.id), Some("bob".to_string()));
    }

    #[test]
    fn debug_redacts_session_token() {
        let mut adapter = RequestAdapter::new("req-1");
        adapter.set_session_token("tok-bob");
        assert!(!format!("{:?}", adapter).contains("tok-bob"));
    }

    #[test]
    fn path_params_are_tainted() {
        let mut adapter = RequestAdapter::new("req-1");
        adapter.add_path_param("id", "fr-1");

        let inputs = adapter.extract_tainted_inputs();
        assert!(inputs.path_param("id").is_some());
        assert!(inputs.path_param("other").is_none());
    }

    #[test]
    fn body_parses_into_tainted_struct() {
        let mut adapter = RequestAdapter::new("req-1");
        adapter.set_body(serde_json::json!({ "title": "T", "description": "D" }));

        let body = adapter
            .extract_tainted_inputs()
            .body::<NewRequestBody>()
            .unwrap()
            .into_inner();
        assert_eq!(body.title.as_deref(), Some("T"));
    }

    #[test]
    fn missing_body_parses_as_default() {
        let adapter = RequestAdapter::new("req-1");
        let body = adapter
            .extract_tainted_inputs()
            .body::<NewRequestBody>()
            .unwrap()
            .into_inner();
        assert_eq!(body, NewRequestBody::default());
    }

    #[test]
    fn wrongly_shaped_body_is_an_error() {
        let mut adapter = RequestAdapter::new("req-1");
        adapter.set_body(serde_json::json!({ "title": 42 }));
        assert!(adapter
            .extract_tainted_inputs()
            .body::<NewRequestBody>()
            .is_err());
    }
}
