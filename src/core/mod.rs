pub mod batching;
pub mod engine;
pub mod listen_format;
pub mod pipeline;

pub use crate::domain::model::{
    Batch, BatchOutcome, BatchStatus, Extraction, FailureReason, ListenRecord, MigrationReport,
    Page, PageOutcome, PageStatus,
};
pub use crate::domain::ports::{ListenSink, ListenSource, Pipeline};
pub use crate::utils::error::Result;
