use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

/// One registered agent, resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub route: String,
    pub name: String,
    pub url: String,
    pub timeout: Duration,
}

/// Listing entry: `url` is the route the agent is mounted under, `solution`
/// its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSummary {
    pub url: String,
    pub solution: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("agent route must not be empty")]
    EmptyRoute,
    #[error("agent '{0}' has an empty url")]
    EmptyUrl(String),
    #[error("agent '{0}' has an empty display name")]
    EmptyName(String),
    #[error("route '{0}' is already registered")]
    DuplicateRoute(String),
}

/// Static mapping from route name to agent configuration.
///
/// Populated once at startup and read-only thereafter; registration order
/// is kept so the listing sort is stable on display-name ties.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<RouteConfig>,
    by_route: HashMap<String, usize>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Routes are normalized (surrounding `/` stripped)
    /// so `/my-agent` in configuration and `POST /api/my-agent` agree.
    pub fn register(&mut self, config: RouteConfig) -> Result<(), RegistryError> {
        let route = normalize_route(&config.route);
        if route.is_empty() {
            return Err(RegistryError::EmptyRoute);
        }
        if config.url.is_empty() {
            return Err(RegistryError::EmptyUrl(route));
        }
        if config.name.is_empty() {
            return Err(RegistryError::EmptyName(route));
        }
        if self.by_route.contains_key(&route) {
            return Err(RegistryError::DuplicateRoute(route));
        }

        self.by_route.insert(route.clone(), self.agents.len());
        self.agents.push(RouteConfig { route, ..config });
        Ok(())
    }

    pub fn lookup(&self, route: &str) -> Option<&RouteConfig> {
        self.by_route
            .get(&normalize_route(route))
            .map(|&index| &self.agents[index])
    }

    /// All agents, sorted ascending by display name; ties keep registration
    /// order (`sort_by` is stable).
    pub fn list(&self) -> Vec<AgentSummary> {
        let mut summaries: Vec<AgentSummary> = self
            .agents
            .iter()
            .map(|agent| AgentSummary {
                url: agent.route.clone(),
                solution: agent.name.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.solution.cmp(&b.solution));
        summaries
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn normalize_route(route: &str) -> String {
    route.trim_matches('/').to_string()
}
