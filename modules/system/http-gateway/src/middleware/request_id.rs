//! Request-id generation: every inbound request gets an `x-request-id`
//! header (generated if the caller didn't supply one) that is propagated
//! onto the response and recorded into the tracing span.

use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

pub const HEADER_NAME: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone, Copy, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!(21);
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Copies the request-id header value into the current tracing span, so log
/// lines emitted while handling the request carry it without every call
/// site needing to thread it through by hand.
pub async fn push_req_id_to_extensions(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    if let Some(value) = req.headers().get(HEADER_NAME).and_then(|v| v.to_str().ok()) {
        tracing::Span::current().record("request_id", value);
    }
    next.run(req).await
}
