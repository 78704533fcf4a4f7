//! flowgate: an HTTP gateway in front of hosted Langflow agents.
//!
//! Each configured agent is mounted at `POST /api/{route}`; the gateway
//! validates the inbound chat request, forwards it to the agent's run
//! endpoint, and flattens the nested run output into `{"data": "..."}`.
//! `GET /api/solutions` lists the configured agents.

pub mod configuration;
pub mod errors;
pub mod handlers;
pub mod registry;
pub mod utils;

use langflow::LangflowClient;
use registry::AgentRegistry;

/// Process-scoped services, built once at startup and shared by every
/// request handler. Both members are read-only after construction, so the
/// context needs no locking.
pub struct AppContext {
    pub registry: AgentRegistry,
    pub client: LangflowClient,
}
