use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One play event as handed over by the source service.
///
/// The payload is kept as raw JSON and passed through without inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenRecord {
    pub data: serde_json::Value,
}

impl ListenRecord {
    pub fn new(data: serde_json::Value) -> Self {
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}

/// A single page of history, numbered from 1.
#[derive(Debug, Clone)]
pub struct Page {
    pub number: u32,
    pub records: Vec<ListenRecord>,
}

impl Page {
    pub fn new(number: u32, records: Vec<ListenRecord>) -> Self {
        Self { number, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A contiguous slice of the flattened history, submitted in one request.
#[derive(Debug, Clone)]
pub struct Batch {
    pub index: usize,
    pub records: Vec<ListenRecord>,
}

impl Batch {
    pub fn new(index: usize, records: Vec<ListenRecord>) -> Self {
        Self { index, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Why a page fetch or batch submission produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("source rejected the request (error {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Fetched { records: usize },
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub page: u32,
    pub status: PageStatus,
}

impl PageOutcome {
    pub fn fetched(page: &Page) -> Self {
        Self {
            page: page.number,
            status: PageStatus::Fetched {
                records: page.len(),
            },
        }
    }

    pub fn failed(page: u32, reason: FailureReason) -> Self {
        Self {
            page,
            status: PageStatus::Failed(reason),
        }
    }

    pub fn records(&self) -> usize {
        match self.status {
            PageStatus::Fetched { records } => records,
            PageStatus::Failed(_) => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, PageStatus::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Submitted,
    Failed(FailureReason),
    /// Never attempted because the run was cancelled first.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub index: usize,
    pub records: usize,
    pub status: BatchStatus,
}

impl BatchOutcome {
    pub fn new(batch: &Batch, status: BatchStatus) -> Self {
        Self {
            index: batch.index,
            records: batch.len(),
            status,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.status == BatchStatus::Submitted
    }
}

/// Result of the fetch phase: the pages that arrived, in page order, plus
/// one outcome per attempted page.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub pages: Vec<Page>,
    pub outcomes: Vec<PageOutcome>,
}

impl Extraction {
    pub fn record_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }
}

/// Delivery table for a whole run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub pages: Vec<PageOutcome>,
    pub batches: Vec<BatchOutcome>,
    pub elapsed: Duration,
}

impl MigrationReport {
    pub fn new(pages: Vec<PageOutcome>, batches: Vec<BatchOutcome>, elapsed: Duration) -> Self {
        Self {
            pages,
            batches,
            elapsed,
        }
    }

    pub fn records_fetched(&self) -> usize {
        self.pages.iter().map(PageOutcome::records).sum()
    }

    pub fn records_submitted(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.is_submitted())
            .map(|b| b.records)
            .sum()
    }

    /// Records that were fetched but never accepted by the destination.
    pub fn records_lost(&self) -> usize {
        self.records_fetched()
            .saturating_sub(self.records_submitted())
    }

    pub fn failed_pages(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|p| p.is_failed())
            .map(|p| p.page)
            .collect()
    }

    pub fn failed_batches(&self) -> Vec<usize> {
        self.batches
            .iter()
            .filter(|b| matches!(b.status, BatchStatus::Failed(_)))
            .map(|b| b.index)
            .collect()
    }

    pub fn skipped_batches(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.status == BatchStatus::Skipped)
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_pages().is_empty() && self.batches.iter().all(BatchOutcome::is_submitted)
    }
}
