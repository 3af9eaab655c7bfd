use std::time::Duration;

use ureq::Agent;

use crate::error::EnrichmentError;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; awol/0.1; +https://ancientworldonline.blogspot.com)";

/// What the fetcher needs to know about a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

/// A read-only network fetch.
///
/// Unsuccessful statuses are returned as responses; only transport failures are errors.
pub trait HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse, EnrichmentError>;
}

/// [`HttpClient`] over a `ureq` agent with bounded timeouts.
pub struct UreqClient {
    agent: Agent,
}

impl Default for UreqClient {
    fn default() -> Self {
        let cfg = Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(5)))
            .timeout_global(Some(Duration::from_secs(15)))
            .http_status_as_error(false)
            .build();
        Self {
            agent: Agent::new_with_config(cfg),
        }
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> Result<HttpResponse, EnrichmentError> {
        let transport = |e: ureq::Error| EnrichmentError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };
        let mut res = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(transport)?;
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = res.body_mut().read_to_string().map_err(transport)?;
        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
