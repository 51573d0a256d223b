//! JSON-over-HTTP oracle client.
//!
//! The wire contract is deliberately small: POST `{images, questions}` to the
//! configured endpoint and read back `{answer}`. The blocking HTTP agent runs
//! on the runtime's blocking pool so a slow oracle delays only its own rule.

use super::{OracleError, VisualOracle};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OracleRequest<'a> {
    images: &'a [String],
    questions: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OracleResponse {
    answer: String,
}

/// Oracle implementation backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpVisualOracle {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpVisualOracle {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: ureq::Agent::new(),
        }
    }
}

#[async_trait]
impl VisualOracle for HttpVisualOracle {
    async fn ask(&self, images: &[String], questions: &[String]) -> Result<String, OracleError> {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let payload = serde_json::to_value(OracleRequest { images, questions })
            .map_err(|err| OracleError::Malformed(err.to_string()))?;

        let response = tokio::task::spawn_blocking(move || {
            agent
                .post(&endpoint)
                .send_json(payload)
                .map_err(|err| OracleError::Transport(err.to_string()))?
                .into_json::<OracleResponse>()
                .map_err(|err| OracleError::Malformed(err.to_string()))
        })
        .await
        .map_err(|err| OracleError::Transport(format!("oracle task aborted: {err}")))??;

        Ok(response.answer)
    }
}
