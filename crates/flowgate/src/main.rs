use std::sync::Arc;
use std::{env, fs};

use bytes::Bytes;
use flowgate::configuration::{Configuration, Settings};
use flowgate::handlers::agent_chat::agent_chat;
use flowgate::handlers::empty;
use flowgate::handlers::solutions::list_solutions;
use flowgate::registry::{AgentRegistry, RouteConfig};
use flowgate::utils::tracing::init_tracing;
use flowgate::AppContext;
use http_body_util::combinators::BoxBody;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use langflow::LangflowClient;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

const BIND_ADDRESS: &str = "0.0.0.0:8000";
const DOCS_PATH: &str = "/docs";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::from_env().expect("failed to load settings from environment");
    init_tracing(&settings.log_level);

    if settings.is_development() {
        debug!("LANGFLOW_API_KEY loaded: {}", settings.masked_api_key());
    }

    let config_path =
        env::var("FLOWGATE_CONFIG_PATH").unwrap_or_else(|_| "./flowgate.yaml".to_string());
    let config_contents =
        fs::read_to_string(&config_path).expect("failed to read agent configuration file");
    let config: Configuration =
        serde_yaml::from_str(&config_contents).expect("failed to parse agent configuration file");
    info!(path = %config_path, agents = config.agents.len(), "loaded agent configuration");

    let mut registry = AgentRegistry::new();
    for agent in &config.agents {
        registry
            .register(RouteConfig {
                route: agent.route.clone(),
                name: agent.name.clone(),
                url: agent.url.clone(),
                timeout: agent.timeout(settings.default_timeout),
            })
            .expect("invalid agent configuration");
        info!(route = %agent.route, name = %agent.name, "registered agent");
    }

    let client =
        LangflowClient::new(settings.api_key.clone()).expect("failed to construct langflow client");
    let context = Arc::new(AppContext { registry, client });

    let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| BIND_ADDRESS.to_string());
    let listener = TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "flowgate listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let peer_addr = stream.peer_addr()?;
        let io = TokioIo::new(stream);
        let context = Arc::clone(&context);

        let service = service_fn(move |req| {
            let context = Arc::clone(&context);
            async move { route_request(req, context).await }
        });

        tokio::task::spawn(async move {
            debug!(peer = ?peer_addr, "accepted connection");
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(error = ?err, "error serving connection");
            }
        });
    }
}

async fn route_request(
    req: Request<hyper::body::Incoming>,
    context: Arc<AppContext>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, hyper::Error> {
    let path = req.uri().path().to_string();

    match (req.method(), path.as_str()) {
        (&Method::GET, "/") => {
            let mut redirect = Response::new(empty());
            *redirect.status_mut() = StatusCode::FOUND;
            redirect
                .headers_mut()
                .insert(hyper::header::LOCATION, DOCS_PATH.parse().unwrap());
            Ok(redirect)
        }
        (&Method::GET, "/api/solutions") => Ok(list_solutions(context).await),
        (&Method::OPTIONS, p) if p.starts_with("/api/") => Ok(cors_preflight()),
        (&Method::POST, p) if p.starts_with("/api/") => {
            let route = p.strip_prefix("/api/").unwrap().to_string();
            agent_chat(req, context, route).await
        }
        _ => {
            debug!(method = %req.method(), path = %path, "no route found");
            let mut not_found = Response::new(empty());
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            Ok(not_found)
        }
    }
}

// Permissive preflight answer for browser demo clients; tighten per
// deployment.
fn cors_preflight() -> Response<BoxBody<Bytes, hyper::Error>> {
    let mut response = Response::new(empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
        .headers_mut()
        .insert("Allow", "GET, POST, OPTIONS".parse().unwrap());
    response
        .headers_mut()
        .insert("Access-Control-Allow-Origin", "*".parse().unwrap());
    response.headers_mut().insert(
        "Access-Control-Allow-Headers",
        "Content-Type, X-Request-Id".parse().unwrap(),
    );
    response.headers_mut().insert(
        "Access-Control-Allow-Methods",
        "GET, POST, OPTIONS".parse().unwrap(),
    );
    response
}
