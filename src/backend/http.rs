//! HTTP implementation of the margin backend using reqwest.

use super::{BackendError, MarginBackend};
use crate::domain::{AlertCard, AlertCardDetail, AlertCardsResponse, RequestKind, ThreadId};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Backend client for the alert service and the margin-check agent.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    alert_base_url: String,
    agent_base_url: String,
}

impl HttpBackend {
    /// Create a new backend client against the given service base URLs.
    pub fn new(alert_base_url: String, agent_base_url: String) -> Self {
        Self {
            client: Client::new(),
            alert_base_url,
            agent_base_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MarginBackend for HttpBackend {
    async fn fetch_cards(&self) -> Result<Vec<AlertCard>, BackendError> {
        let url = format!("{}/alert/cards", self.alert_base_url);
        debug!("Fetching alert cards from {}", url);
        let response: AlertCardsResponse = self.get_json(&url).await?;
        Ok(response.cards)
    }

    async fn fetch_card_detail(&self, id: &str) -> Result<AlertCardDetail, BackendError> {
        let url = format!("{}/alert/cards/{}", self.alert_base_url, id);
        debug!("Fetching card detail from {}", url);
        self.get_json(&url).await
    }

    async fn margin_check(
        &self,
        kind: RequestKind,
        thread_id: &ThreadId,
    ) -> Result<serde_json::Value, BackendError> {
        let url = check_url(&self.agent_base_url, kind);
        debug!("Posting {} for thread {} to {}", kind, thread_id, url);

        let payload = serde_json::json!({ "thread_id": thread_id.as_str() });
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}

/// Endpoint layout of the margin-check agent: quick check posts to the root
/// route, follow-up kinds to a sub-route of the same name.
fn check_url(agent_base_url: &str, kind: RequestKind) -> String {
    match kind {
        RequestKind::QuickCheck => format!("{}/agent/margin-check", agent_base_url),
        RequestKind::Recheck => format!("{}/agent/margin-check/recheck", agent_base_url),
        RequestKind::Simulate => format!("{}/agent/margin-check/simulate", agent_base_url),
        RequestKind::Execute => format!("{}/agent/margin-check/execute", agent_base_url),
    }
}

/// Map a reqwest error into the backend taxonomy.
///
/// reqwest does not expose a dedicated DNS variant, so resolution failures
/// are recognized from the error chain text.
fn classify_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout;
    }
    if err.is_connect() {
        let chain = error_chain_text(&err);
        if chain.contains("dns") || chain.contains("resolve") {
            let host = err
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or("unknown host")
                .to_string();
            return BackendError::Dns(host);
        }
        return BackendError::ConnectionRefused;
    }
    if err.is_decode() {
        return BackendError::Parse(err.to_string());
    }
    BackendError::Other(err.to_string())
}

fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string().to_lowercase();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push(' ');
        text.push_str(&cause.to_string().to_lowercase());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_url_per_kind() {
        let base = "http://agent.local:8001";
        assert_eq!(
            check_url(base, RequestKind::QuickCheck),
            "http://agent.local:8001/agent/margin-check"
        );
        assert_eq!(
            check_url(base, RequestKind::Recheck),
            "http://agent.local:8001/agent/margin-check/recheck"
        );
        assert_eq!(
            check_url(base, RequestKind::Simulate),
            "http://agent.local:8001/agent/margin-check/simulate"
        );
        assert_eq!(
            check_url(base, RequestKind::Execute),
            "http://agent.local:8001/agent/margin-check/execute"
        );
    }
}
