use std::sync::Arc;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Response, StatusCode};
use tracing::warn;

use crate::handlers::json_response;
use crate::AppContext;

/// `GET /api/solutions`: the registered agents, sorted by display name.
pub async fn list_solutions(context: Arc<AppContext>) -> Response<BoxBody<Bytes, hyper::Error>> {
    let summaries = context.registry.list();

    match serde_json::to_string(&summaries) {
        Ok(json) => json_response(StatusCode::OK, json),
        Err(err) => {
            warn!(error = %err, "failed to serialize agent listing");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"error":"failed to serialize agent listing"}"#.to_string(),
            )
        }
    }
}
