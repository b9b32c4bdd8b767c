use crate::config::SourceConfig;
use crate::domain::model::{FailureReason, ListenRecord, Page};
use crate::domain::ports::ListenSource;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Reads `user.getRecentTracks` pages from a Last.fm-compatible endpoint.
#[derive(Debug, Clone)]
pub struct LastfmFetcher {
    client: Client,
    endpoint: String,
    api_key: String,
    page_size: u32,
    timeout: Duration,
}

impl LastfmFetcher {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            page_size: config.page_size,
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl ListenSource for LastfmFetcher {
    async fn fetch_page(&self, user: &str, page: u32) -> Result<Page, FailureReason> {
        let limit = self.page_size.to_string();
        let page_param = page.to_string();

        // 構建請求
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("method", "user.getRecentTracks"),
                ("user", user),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("page", page_param.as_str()),
            ])
            .timeout(self.timeout);

        tracing::debug!("📡 Fetching page {} for {}", page, user);

        // The request URL carries the api key, so errors are reported without it.
        let response = request.send().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!("Failed to fetch page {}: {}", page, e);
            FailureReason::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Failed to fetch page {}: {}", page, status);
            return Err(FailureReason::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!("Failed to decode page {}: {}", page, e);
            FailureReason::Malformed(e.to_string())
        })?;

        let parsed = parse_page(page, body);
        match &parsed {
            Ok(p) => tracing::debug!("Page {} returned {} scrobbles", page, p.len()),
            Err(reason) => tracing::warn!("Failed to fetch page {}: {}", page, reason),
        }
        parsed
    }
}

/// Pull the track list out of a `recenttracks` response body.
///
/// Missing containers mean an empty page. A single track is sent as a bare
/// object rather than a one-element array.
pub fn parse_page(page: u32, body: serde_json::Value) -> Result<Page, FailureReason> {
    // The source reports some failures in a 200 body.
    if let Some(code) = body.get("error").and_then(|c| c.as_i64()) {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        return Err(FailureReason::Rejected { code, message });
    }

    let serde_json::Value::Object(mut root) = body else {
        return Err(FailureReason::Malformed(
            "expected a JSON object".to_string(),
        ));
    };

    let tracks = match root.remove("recenttracks") {
        Some(serde_json::Value::Object(mut recent)) => recent.remove("track"),
        _ => None,
    };

    let records = match tracks {
        Some(serde_json::Value::Array(items)) => items.into_iter().map(ListenRecord::new).collect(),
        Some(item @ serde_json::Value::Object(_)) => vec![ListenRecord::new(item)],
        _ => Vec::new(),
    };

    Ok(Page::new(page, records))
}
