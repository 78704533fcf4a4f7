use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{Error as HyperError, Response, StatusCode};
use langflow::LangflowError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One field-level validation complaint, carried in the 422 response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub why: String,
}

/// Boundary error taxonomy. Every failure a chat request can hit is caught
/// and classified into one of these before it reaches the wire; nothing
/// propagates past the handler unclassified.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request validation failed")]
    Validation(Vec<ValidationIssue>),

    #[error("no agent registered for route '{0}'")]
    UnknownRoute(String),

    #[error("upstream request failed: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream returned a body that is not valid JSON")]
    UpstreamMalformed(String),

    #[error("upstream returned no content")]
    UpstreamEmpty,

    #[error("upstream response carried no output text")]
    NoOutputText,

    #[error("internal server error")]
    Internal(String),
}

impl From<LangflowError> for GatewayError {
    fn from(err: LangflowError) -> Self {
        match err {
            // Upstream's own error text is carried verbatim; it contains no
            // credentials.
            LangflowError::HttpStatus { status, body } => {
                GatewayError::UpstreamUnavailable(format!("upstream error {status}: {body}"))
            }
            LangflowError::Transport(err) => GatewayError::UpstreamUnavailable(err.to_string()),
            LangflowError::InvalidJson(err) => GatewayError::UpstreamMalformed(err.to_string()),
            // Construction-time invariants; hitting these on a live request
            // means the process wiring is wrong.
            LangflowError::EmptyUrl | LangflowError::MissingApiKey => {
                GatewayError::Internal(err.to_string())
            }
        }
    }
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            GatewayError::UpstreamUnavailable(_)
            | GatewayError::UpstreamMalformed(_)
            | GatewayError::UpstreamEmpty
            | GatewayError::NoOutputText => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<BoxBody<Bytes, HyperError>> {
        let status = self.status_code();
        let (code, details) = match &self {
            GatewayError::Validation(issues) => ("ValidationError", json!({ "issues": issues })),

            GatewayError::UnknownRoute(route) => ("UnknownRoute", json!({ "route": route })),

            GatewayError::UpstreamUnavailable(reason) => {
                ("UpstreamUnavailable", json!({ "reason": reason }))
            }

            GatewayError::UpstreamMalformed(reason) => {
                ("UpstreamMalformed", json!({ "reason": reason }))
            }

            GatewayError::UpstreamEmpty => ("UpstreamEmpty", json!({})),

            GatewayError::NoOutputText => ("NoOutputText", json!({})),

            // The wrapped detail is logged at the handler; the caller only
            // sees the generic message.
            GatewayError::Internal(_) => ("InternalServerError", json!({})),
        };

        let body_json = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
                "details": details
            }
        });

        let boxed_body = Full::new(Bytes::from(body_json.to_string()))
            .map_err(|never| match never {})
            .boxed();

        Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(boxed_body)
            .unwrap_or_else(|_| {
                Response::new(
                    Full::new(Bytes::from("Internal Error"))
                        .map_err(|never| match never {})
                        .boxed(),
                )
            })
    }
}
