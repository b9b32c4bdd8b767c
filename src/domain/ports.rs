use crate::domain::model::{Batch, BatchOutcome, Extraction, FailureReason, Page};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read side: the paginated history of the source service.
#[async_trait]
pub trait ListenSource: Send + Sync {
    /// Fetch one 1-based page of `user`'s history. A failure is reported,
    /// never retried.
    async fn fetch_page(&self, user: &str, page: u32) -> std::result::Result<Page, FailureReason>;
}

/// Write side: the destination's submission endpoint.
#[async_trait]
pub trait ListenSink: Send + Sync {
    /// Submit one batch and return how many records were accepted.
    async fn submit_batch(&self, batch: &Batch) -> std::result::Result<usize, FailureReason>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Extraction>;
    async fn transform(&self, pages: Vec<Page>) -> Result<Vec<Batch>>;
    async fn load(&self, batches: Vec<Batch>) -> Result<Vec<BatchOutcome>>;
}
