use crate::adapters::{LastfmFetcher, ListenBrainzSubmitter};
use crate::config::{MigrationConfig, MigrationRequest, PipelineSettings};
use crate::core::batching::{flatten, partition};
use crate::core::listen_format::{undated_count, RecordFormat};
use crate::core::{
    Batch, BatchOutcome, BatchStatus, Extraction, FailureReason, ListenSink, ListenSource, Page,
    PageOutcome, Pipeline,
};
use crate::utils::error::{MigrateError, Result};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Fetches every history page, then replays the records batch by batch.
pub struct MigrationPipeline<S: ListenSource, K: ListenSink> {
    source: Arc<S>,
    sink: K,
    request: MigrationRequest,
    settings: PipelineSettings,
    record_format: RecordFormat,
    cancel: CancellationToken,
}

impl<S: ListenSource, K: ListenSink> MigrationPipeline<S, K> {
    pub fn new(source: S, sink: K, request: MigrationRequest, settings: PipelineSettings) -> Self {
        Self {
            source: Arc::new(source),
            sink,
            request,
            settings,
            record_format: RecordFormat::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_record_format(mut self, record_format: RecordFormat) -> Self {
        self.record_format = record_format;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

pub type HttpMigrationPipeline = MigrationPipeline<LastfmFetcher, ListenBrainzSubmitter>;

impl HttpMigrationPipeline {
    /// Wire the HTTP adapters to one shared client.
    pub fn from_config(config: &MigrationConfig, request: MigrationRequest) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let source = LastfmFetcher::new(client.clone(), &config.source);
        let sink = ListenBrainzSubmitter::new(client, &config.destination);

        Ok(Self::new(source, sink, request, config.pipeline.clone())
            .with_record_format(config.destination.record_format))
    }
}

#[async_trait::async_trait]
impl<S, K> Pipeline for MigrationPipeline<S, K>
where
    S: ListenSource + 'static,
    K: ListenSink,
{
    async fn extract(&self) -> Result<Extraction> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_fetches.max(1)));
        let mut tasks = Vec::with_capacity(self.request.total_pages as usize);

        for page in 1..=self.request.total_pages {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let cancel = self.cancel.clone();
            let user = self.request.user.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return (page, Err(FailureReason::Cancelled)),
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return (page, Err(FailureReason::Cancelled)),
                    },
                };

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(FailureReason::Cancelled),
                    result = source.fetch_page(&user, page) => result,
                };
                (page, result)
            }));
        }

        tracing::debug!(
            "Spawned {} page fetches (at most {} in flight)",
            tasks.len(),
            self.settings.max_concurrent_fetches
        );

        // join_all keeps spawn order, so pages come back ascending.
        let mut extraction = Extraction::default();
        for joined in futures::future::join_all(tasks).await {
            let (page, result) = joined.map_err(|e| MigrateError::ProcessingError {
                message: format!("page fetch task failed: {}", e),
            })?;

            match result {
                Ok(fetched) => {
                    extraction.outcomes.push(PageOutcome::fetched(&fetched));
                    extraction.pages.push(fetched);
                }
                Err(reason) => {
                    if reason == FailureReason::Cancelled {
                        tracing::warn!("Page {} not fetched: run cancelled", page);
                    }
                    extraction.outcomes.push(PageOutcome::failed(page, reason));
                }
            }
        }

        Ok(extraction)
    }

    async fn transform(&self, pages: Vec<Page>) -> Result<Vec<Batch>> {
        let records: Vec<_> = flatten(pages)
            .into_iter()
            .map(|record| self.record_format.apply(record))
            .collect();

        if self.record_format == RecordFormat::ListenBrainz {
            let undated = undated_count(&records);
            if undated > 0 {
                tracing::warn!(
                    "{} now-playing listens have no timestamp; their batches may be rejected",
                    undated
                );
            }
        }

        Ok(partition(records, self.settings.batch_size))
    }

    async fn load(&self, batches: Vec<Batch>) -> Result<Vec<BatchOutcome>> {
        let total = batches.len();
        let delay = self.settings.batch_delay();
        let mut outcomes = Vec::with_capacity(total);

        for batch in batches {
            if self.cancel.is_cancelled() {
                outcomes.push(BatchOutcome::new(&batch, BatchStatus::Skipped));
                continue;
            }

            let status = match self.sink.submit_batch(&batch).await {
                Ok(_) => BatchStatus::Submitted,
                Err(reason) => BatchStatus::Failed(reason),
            };
            outcomes.push(BatchOutcome::new(&batch, status));

            // No pause after the final batch.
            if batch.index + 1 < total {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        tracing::warn!("Submission cancelled after batch {}", batch.index);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Ok(outcomes)
    }
}
