//! Rotating pool of user agent strings

use crate::config::UserAgentConfig;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Browser user agents used when the configuration does not name any
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Round-robin user agent source shared by all workers
#[derive(Debug)]
pub struct UserAgentPool {
    agents: Vec<String>,
    position: AtomicUsize,
}

impl UserAgentPool {
    /// Creates a pool from explicit agents, falling back to the built-in list
    pub fn new(agents: Vec<String>) -> Self {
        let agents = if agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|a| a.to_string()).collect()
        } else {
            agents
        };

        Self {
            agents,
            position: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &UserAgentConfig) -> Self {
        Self::new(config.agents.clone())
    }

    /// Returns the next agent in rotation
    pub fn next_agent(&self) -> &str {
        let index = self.position.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        &self.agents[index]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
