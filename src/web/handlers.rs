//! Route handlers for the board's HTTP surface.

use crate::board::FeatureBoard;
use crate::error::{Denial, Error};
use crate::model::{NewRequestBody, StatusBody};
use crate::request::RequestMeta;
use crate::store::Store;
use crate::Tainted;

use super::{ExtractMetadata, ExtractTaintedInputs, IdentityProvider, RequestAdapter, Response};

/// The board's routes, independent of any HTTP framework.
///
/// | Method | Path | Handler |
/// |---|---|---|
/// | GET | `/api/requests` | [`list_requests`](Self::list_requests) |
/// | POST | `/api/requests` | [`create_request`](Self::create_request) |
/// | GET | `/api/requests/{id}` | [`get_request`](Self::get_request) |
/// | DELETE | `/api/requests/{id}` | [`delete_request`](Self::delete_request) |
/// | PATCH | `/api/requests/{id}/status` | [`update_status`](Self::update_status) |
/// | POST | `/api/upvote/{id}` | [`upvote`](Self::upvote) |
/// | DELETE | `/api/upvote/{id}` | [`remove_upvote`](Self::remove_upvote) |
///
/// # Examples
///
/// ```
/// use featureboard_policy::web::{BoardApi, RequestAdapter, StaticIdentityProvider};
/// use featureboard_policy::{BoardConfig, FeatureBoard, MemoryStore, Principal};
///
/// let board = FeatureBoard::new(MemoryStore::new(), BoardConfig::default()).unwrap();
/// let identity = StaticIdentityProvider::new().with_session("tok-a", Principal::user("alice"));
/// let api = BoardApi::new(board, identity);
///
/// let mut req = RequestAdapter::new("req-1");
/// req.set_body(serde_json::json!({ "title": "Dark mode", "description": "Please" }));
/// assert_eq!(api.create_request(&req).status, 401);
///
/// req.set_session_token("tok-a");
/// let response = api.create_request(&req);
/// assert_eq!(response.status, 201);
/// assert_eq!(response.body["ownerId"], "alice");
/// ```
#[derive(Debug)]
pub struct BoardApi<S: Store, I: IdentityProvider> {
    board: FeatureBoard<S>,
    identity: I,
}

impl<S: Store, I: IdentityProvider> BoardApi<S, I> {
    /// Serves `board`, resolving callers through `identity`.
    pub fn new(board: FeatureBoard<S>, identity: I) -> Self {
        Self { board, identity }
    }

    /// Returns the underlying board.
    pub fn board(&self) -> &FeatureBoard<S> {
        &self.board
    }

    /// `GET /api/requests`
    pub fn list_requests(&self, req: &RequestAdapter) -> Response {
        let meta = req.extract_metadata(&self.identity);
        let query = req.extract_tainted_inputs().list_query();
        respond(self.board.list(meta, query), |page| Response::ok(&page))
    }

    /// `GET /api/requests/{id}`
    pub fn get_request(&self, req: &RequestAdapter) -> Response {
        let meta = req.extract_metadata(&self.identity);
        let id = path_id(req);
        respond(self.board.get(meta, id), |view| Response::ok(&view))
    }

    /// `POST /api/requests`
    pub fn create_request(&self, req: &RequestAdapter) -> Response {
        let meta = req.extract_metadata(&self.identity);
        let result =
            parse_body::<NewRequestBody>(&meta, req).and_then(|body| self.board.create(meta, body));
        respond(result, |view| Response::created(&view))
    }

    /// `DELETE /api/requests/{id}`
    pub fn delete_request(&self, req: &RequestAdapter) -> Response {
        let meta = req.extract_metadata(&self.identity);
        let id = path_id(req);
        respond(self.board.delete(meta, id), |()| Response::success())
    }

    /// `PATCH /api/requests/{id}/status`
    pub fn update_status(&self, req: &RequestAdapter) -> Response {
        let meta = req.extract_metadata(&self.identity);
        let id = path_id(req);
        let result = parse_body::<StatusBody>(&meta, req)
            .and_then(|body| self.board.change_status(meta, id, body));
        respond(result, |view| Response::ok(&view))
    }

    /// `POST /api/upvote/{id}`
    pub fn upvote(&self, req: &RequestAdapter) -> Response {
        let meta = req.extract_metadata(&self.identity);
        let id = path_id(req);
        respond(self.board.upvote(meta, id), |view| Response::ok(&view))
    }

    /// `DELETE /api/upvote/{id}`
    ///
    /// Answers with the refreshed request, or `{"success": true}` when the
    /// request no longer exists.
    pub fn remove_upvote(&self, req: &RequestAdapter) -> Response {
        let meta = req.extract_metadata(&self.identity);
        let id = path_id(req);
        respond(self.board.remove_upvote(meta, id), |view| match view {
            Some(view) => Response::ok(&view),
            None => Response::success(),
        })
    }
}

/// A missing `id` segment reaches the sanitizer as an empty string.
fn path_id(req: &RequestAdapter) -> Tainted<String> {
    req.extract_tainted_inputs()
        .path_param("id")
        .unwrap_or_else(|| Tainted::new(String::new()))
}

fn parse_body<T>(meta: &RequestMeta, req: &RequestAdapter) -> Result<Tainted<T>, Error>
where
    T: serde::de::DeserializeOwned + Default,
{
    match req.extract_tainted_inputs().body::<T>() {
        Ok(body) => Ok(body),
        // Authentication is checked before input.
        Err(_) if meta.principal.is_none() => Err(Denial::unauthenticated().into()),
        Err(e) => {
            tracing::debug!(request_id = %req.request_id(), error = %e, "malformed request body");
            Err(Denial::invalid_input("Malformed request body").into())
        }
    }
}

fn respond<T>(result: Result<T, Error>, on_success: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => on_success(value),
        Err(err) => Response::from_error(&err),
    }
}
