pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{LastfmFetcher, ListenBrainzSubmitter};
pub use config::{MigrationConfig, MigrationRequest};
pub use core::listen_format::RecordFormat;
pub use core::{
    engine::MigrationEngine,
    pipeline::{HttpMigrationPipeline, MigrationPipeline},
};
pub use domain::model::{Batch, ListenRecord, MigrationReport, Page};
pub use utils::error::{MigrateError, Result};
