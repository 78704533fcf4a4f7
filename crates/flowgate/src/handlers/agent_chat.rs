use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt};
use hyper::{body::Incoming, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use langflow::{extract_last_text, RunRequest};

use crate::errors::{GatewayError, ValidationIssue};
use crate::handlers::json_response;
use crate::AppContext;

pub const MAX_MESSAGE_CHARS: usize = 10_000;
pub const MAX_SESSION_ID_CHARS: usize = 255;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inbound chat request. Validation only checks length bounds; the content
/// is otherwise opaque and forwarded as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub data: String,
}

impl ChatRequest {
    fn validate(&self) -> Result<(), GatewayError> {
        let mut issues = Vec::new();

        let message_chars = self.message.chars().count();
        if message_chars == 0 {
            issues.push(ValidationIssue {
                field: "message",
                why: "must not be empty".to_string(),
            });
        } else if message_chars > MAX_MESSAGE_CHARS {
            issues.push(ValidationIssue {
                field: "message",
                why: format!("must be at most {MAX_MESSAGE_CHARS} characters, got {message_chars}"),
            });
        }

        let session_chars = self.session_id.chars().count();
        if session_chars == 0 {
            issues.push(ValidationIssue {
                field: "session_id",
                why: "must not be empty".to_string(),
            });
        } else if session_chars > MAX_SESSION_ID_CHARS {
            issues.push(ValidationIssue {
                field: "session_id",
                why: format!(
                    "must be at most {MAX_SESSION_ID_CHARS} characters, got {session_chars}"
                ),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::Validation(issues))
        }
    }
}

/// Hyper-facing chat handler for `POST /api/{route}`. Collects the body,
/// hands off to `handle_chat`, and renders its outcome; every failure path
/// is a classified `GatewayError`, never an escaped error.
pub async fn agent_chat(
    request: Request<Incoming>,
    context: Arc<AppContext>,
    route: String,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, hyper::Error> {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let body = request.collect().await?.to_bytes();

    match handle_chat(&context, &route, &body).await {
        Ok(chat_response) => {
            info!(request_id = %request_id, route = %route, "chat request served");
            match serde_json::to_string(&chat_response) {
                Ok(json) => Ok(json_response(StatusCode::OK, json)),
                Err(err) => {
                    warn!(request_id = %request_id, error = %err, "failed to serialize chat response");
                    Ok(GatewayError::Internal(err.to_string()).into_response())
                }
            }
        }
        Err(err) => {
            warn!(request_id = %request_id, route = %route, error = %err, "chat request failed");
            Ok(err.into_response())
        }
    }
}

/// Orchestrates one chat request: validate, look up the agent, forward,
/// extract. One upstream call per inbound request, no retries.
pub async fn handle_chat(
    context: &AppContext,
    route: &str,
    body: &[u8],
) -> Result<ChatResponse, GatewayError> {
    let chat_request: ChatRequest = serde_json::from_slice(body).map_err(|err| {
        GatewayError::Validation(vec![ValidationIssue {
            field: "body",
            why: format!("invalid request body: {err}"),
        }])
    })?;
    chat_request.validate()?;

    let agent = context
        .registry
        .lookup(route)
        .ok_or_else(|| GatewayError::UnknownRoute(route.to_string()))?;

    info!(
        route = %agent.route,
        session_id = %chat_request.session_id,
        "forwarding chat request to {}",
        agent.name
    );

    let envelope = RunRequest::chat(chat_request.message, chat_request.session_id);
    let result = context
        .client
        .run(&agent.url, &envelope, agent.timeout)
        .await?;

    if is_empty_result(&result) {
        return Err(GatewayError::UpstreamEmpty);
    }

    match extract_last_text(&result) {
        Some(text) if !text.is_empty() => Ok(ChatResponse {
            data: text.to_string(),
        }),
        // an empty extracted string counts as no output at this layer
        _ => Err(GatewayError::NoOutputText),
    }
}

fn is_empty_result(result: &Value) -> bool {
    match result {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AgentRegistry, RouteConfig};
    use langflow::LangflowClient;
    use mockito::Server;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn context_with(agents: Vec<(&str, &str, String)>) -> AppContext {
        let mut registry = AgentRegistry::new();
        for (route, name, url) in agents {
            registry
                .register(RouteConfig {
                    route: route.to_string(),
                    name: name.to_string(),
                    url,
                    timeout: Duration::from_secs(5),
                })
                .unwrap();
        }
        AppContext {
            registry,
            client: LangflowClient::new("test-key").unwrap(),
        }
    }

    fn chat_body(message: &str, session_id: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({ "message": message, "session_id": session_id })).unwrap()
    }

    fn nested_payload(text: &str) -> String {
        json!({"outputs": [{"outputs": [{"results": {"message": {"text": text}}}]}]}).to_string()
    }

    #[tokio::test]
    async fn test_chat_happy_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/run/flow-1")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_body(nested_payload("The weather today is sunny."))
            .expect(1)
            .create_async()
            .await;

        let context = context_with(vec![(
            "weather-agent",
            "Weather Agent",
            format!("{}/run/flow-1", server.url()),
        )]);

        let response = handle_chat(&context, "weather-agent", &chat_body("Hello", "s1"))
            .await
            .unwrap();

        assert_eq!(response.data, "The weather today is sunny.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_message_length_boundary() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/run/flow-1")
            .with_status(200)
            .with_body(nested_payload("ok"))
            .expect(1)
            .create_async()
            .await;

        let context = context_with(vec![(
            "agent",
            "Agent",
            format!("{}/run/flow-1", server.url()),
        )]);

        // 10000 characters is accepted and forwarded
        let at_limit = "a".repeat(MAX_MESSAGE_CHARS);
        handle_chat(&context, "agent", &chat_body(&at_limit, "s1"))
            .await
            .unwrap();
        mock.assert_async().await;

        // 10001 is rejected before any upstream call
        let over_limit = "a".repeat(MAX_MESSAGE_CHARS + 1);
        let err = handle_chat(&context, "agent", &chat_body(&over_limit, "s1"))
            .await
            .unwrap_err();
        match err {
            GatewayError::Validation(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field, "message");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_session_id_length_boundary() {
        let context = context_with(vec![(
            "agent",
            "Agent",
            "http://127.0.0.1:1/run".to_string(),
        )]);

        let over_limit = "s".repeat(MAX_SESSION_ID_CHARS + 1);
        let err = handle_chat(&context, "agent", &chat_body("hi", &over_limit))
            .await
            .unwrap_err();
        match err {
            GatewayError::Validation(issues) => {
                assert_eq!(issues[0].field, "session_id");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_fields_collect_all_issues() {
        let context = context_with(vec![]);
        let err = handle_chat(&context, "agent", &chat_body("", ""))
            .await
            .unwrap_err();
        match err {
            GatewayError::Validation(issues) => {
                let fields: Vec<&str> = issues.iter().map(|issue| issue.field).collect();
                assert_eq!(fields, vec!["message", "session_id"]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let context = context_with(vec![]);
        let err = handle_chat(&context, "agent", b"{not json")
            .await
            .unwrap_err();
        match err {
            GatewayError::Validation(issues) => assert_eq!(issues[0].field, "body"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_route_makes_no_upstream_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let context = context_with(vec![(
            "known-agent",
            "Known",
            format!("{}/run", server.url()),
        )]);

        let err = handle_chat(&context, "unknown-route", &chat_body("Hello", "s1"))
            .await
            .unwrap_err();

        match err {
            GatewayError::UnknownRoute(route) => assert_eq!(route, "unknown-route"),
            other => panic!("expected UnknownRoute, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_500_single_shot() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/run")
            .with_status(500)
            .with_body("internal error")
            .expect(1)
            .create_async()
            .await;

        let context = context_with(vec![("agent", "Agent", format!("{}/run", server.url()))]);

        let err = handle_chat(&context, "agent", &chat_body("Hello", "s1"))
            .await
            .unwrap_err();

        match err {
            GatewayError::UpstreamUnavailable(reason) => {
                assert!(reason.contains("500"), "reason was: {reason}");
                assert!(reason.contains("internal error"), "reason was: {reason}");
            }
            other => panic!("expected UpstreamUnavailable, got {other:?}"),
        }
        // exactly one call, no retry
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_connection_failure() {
        let context = context_with(vec![(
            "agent",
            "Agent",
            "http://127.0.0.1:1/run".to_string(),
        )]);

        let err = handle_chat(&context, "agent", &chat_body("Hello", "s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_upstream_invalid_json() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/run")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let context = context_with(vec![("agent", "Agent", format!("{}/run", server.url()))]);

        let err = handle_chat(&context, "agent", &chat_body("Hello", "s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamMalformed(_)));
    }

    #[tokio::test]
    async fn test_upstream_empty_results() {
        for body in ["null", "{}", "[]"] {
            let mut server = Server::new_async().await;
            let _m = server
                .mock("POST", "/run")
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;

            let context = context_with(vec![("agent", "Agent", format!("{}/run", server.url()))]);

            let err = handle_chat(&context, "agent", &chat_body("Hello", "s1"))
                .await
                .unwrap_err();
            assert!(
                matches!(err, GatewayError::UpstreamEmpty),
                "body {body} should be UpstreamEmpty, got {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_no_output_text_distinct_from_empty() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/run")
            .with_status(200)
            .with_body(r#"{"outputs": []}"#)
            .create_async()
            .await;

        let context = context_with(vec![("agent", "Agent", format!("{}/run", server.url()))]);

        let err = handle_chat(&context, "agent", &chat_body("Hello", "s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NoOutputText));
    }

    #[tokio::test]
    async fn test_empty_extracted_string_is_no_output() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/run")
            .with_status(200)
            .with_body(nested_payload(""))
            .create_async()
            .await;

        let context = context_with(vec![("agent", "Agent", format!("{}/run", server.url()))]);

        let err = handle_chat(&context, "agent", &chat_body("Hello", "s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NoOutputText));
    }

    #[tokio::test]
    async fn test_concurrent_requests_fail_independently() {
        let mut ok_server = Server::new_async().await;
        let _ok = ok_server
            .mock("POST", "/run")
            .with_status(200)
            .with_body(nested_payload("fine"))
            .create_async()
            .await;

        let mut broken_server = Server::new_async().await;
        let _broken = broken_server
            .mock("POST", "/run")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let context = context_with(vec![
            ("ok-agent", "Ok Agent", format!("{}/run", ok_server.url())),
            (
                "broken-agent",
                "Broken Agent",
                format!("{}/run", broken_server.url()),
            ),
        ]);

        let ok_body = chat_body("Hello", "s1");
        let broken_body = chat_body("Hello", "s2");
        let (ok_result, broken_result) = tokio::join!(
            handle_chat(&context, "ok-agent", &ok_body),
            handle_chat(&context, "broken-agent", &broken_body),
        );

        assert_eq!(ok_result.unwrap().data, "fine");
        assert!(matches!(
            broken_result.unwrap_err(),
            GatewayError::UpstreamUnavailable(_)
        ));
    }
}
