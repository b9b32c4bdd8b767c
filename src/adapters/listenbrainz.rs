use crate::config::DestinationConfig;
use crate::domain::model::{Batch, FailureReason, ListenRecord};
use crate::domain::ports::ListenSink;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct SubmitPayload<'a> {
    listens: &'a [ListenRecord],
}

/// Posts batches to a ListenBrainz-compatible submission endpoint.
#[derive(Debug, Clone)]
pub struct ListenBrainzSubmitter {
    client: Client,
    endpoint: String,
    token: String,
    timeout: Duration,
}

impl ListenBrainzSubmitter {
    pub fn new(client: Client, config: &DestinationConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl ListenSink for ListenBrainzSubmitter {
    async fn submit_batch(&self, batch: &Batch) -> Result<usize, FailureReason> {
        let payload = SubmitPayload {
            listens: &batch.records,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::warn!("Failed to submit batch {}: {}", batch.index, e);
                FailureReason::Transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                "Successfully submitted {} scrobbles (batch {}).",
                batch.len(),
                batch.index
            );
            Ok(batch.len())
        } else {
            tracing::warn!("Failed to submit batch {}: {}", batch.index, status);
            Err(FailureReason::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn destination_config(endpoint: String) -> DestinationConfig {
        DestinationConfig {
            endpoint,
            token: "lb-token".to_string(),
            ..DestinationConfig::default()
        }
    }

    fn batch_of(names: &[&str]) -> Batch {
        Batch::new(
            0,
            names
                .iter()
                .map(|n| ListenRecord::new(json!({ "name": n })))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_submit_batch_posts_listens_with_token() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/1/submit-listens")
                .header("Authorization", "Token lb-token")
                .json_body(json!({
                    "listens": [{"name": "Airbag"}, {"name": "Lucky"}]
                }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"status": "ok"}));
        });

        let submitter =
            ListenBrainzSubmitter::new(Client::new(), &destination_config(server.url("/1/submit-listens")));
        let submitted = submitter
            .submit_batch(&batch_of(&["Airbag", "Lucky"]))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(submitted, 2);
    }

    #[tokio::test]
    async fn test_submit_batch_reports_status_without_retry() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/1/submit-listens");
            then.status(429);
        });

        let submitter =
            ListenBrainzSubmitter::new(Client::new(), &destination_config(server.url("/1/submit-listens")));
        let result = submitter.submit_batch(&batch_of(&["Airbag"])).await;

        api_mock.assert_hits(1);
        assert_eq!(result.unwrap_err(), FailureReason::Status(429));
    }

    #[tokio::test]
    async fn test_submit_batch_reports_transport_failure() {
        let submitter = ListenBrainzSubmitter::new(
            Client::new(),
            &destination_config("http://127.0.0.1:9/1/submit-listens".to_string()),
        );
        let result = submitter.submit_batch(&batch_of(&["Airbag"])).await;

        assert!(matches!(result, Err(FailureReason::Transport(_))));
    }
}
