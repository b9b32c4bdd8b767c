use crate::core::{MigrationReport, Pipeline};
use crate::utils::error::Result;
use std::time::Instant;

pub struct MigrationEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> MigrationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<MigrationReport> {
        let started = Instant::now();
        tracing::info!("Starting scrobble migration...");

        // Extract
        let extraction = self.pipeline.extract().await?;
        let failed_pages = extraction.outcomes.iter().filter(|o| o.is_failed()).count();
        tracing::info!(
            "Fetched {} scrobbles from {} pages ({} failed)",
            extraction.record_count(),
            extraction.outcomes.len(),
            failed_pages
        );
        let page_outcomes = extraction.outcomes;

        // Transform
        let batches = self.pipeline.transform(extraction.pages).await?;
        tracing::info!("Prepared {} batches", batches.len());

        // Load
        let batch_outcomes = self.pipeline.load(batches).await?;

        let report = MigrationReport::new(page_outcomes, batch_outcomes, started.elapsed());
        tracing::info!(
            "Submitted {} of {} scrobbles in {:?}",
            report.records_submitted(),
            report.records_fetched(),
            report.elapsed
        );
        if !report.is_complete() {
            tracing::warn!(
                "Incomplete migration: failed pages {:?}, failed batches {:?}, {} batches skipped",
                report.failed_pages(),
                report.failed_batches(),
                report.skipped_batches()
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        Batch, BatchOutcome, BatchStatus, Extraction, FailureReason, ListenRecord, Page,
        PageOutcome,
    };
    use crate::utils::error::MigrateError;
    use serde_json::json;

    struct StubPipeline {
        fail_extract: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<Extraction> {
            if self.fail_extract {
                return Err(MigrateError::ProcessingError {
                    message: "boom".to_string(),
                });
            }
            let page = Page::new(1, vec![ListenRecord::new(json!({})); 3]);
            Ok(Extraction {
                outcomes: vec![
                    PageOutcome::fetched(&page),
                    PageOutcome::failed(2, FailureReason::Status(500)),
                ],
                pages: vec![page],
            })
        }

        async fn transform(&self, pages: Vec<Page>) -> Result<Vec<Batch>> {
            Ok(pages
                .into_iter()
                .map(|p| Batch::new(p.number as usize - 1, p.records))
                .collect())
        }

        async fn load(&self, batches: Vec<Batch>) -> Result<Vec<BatchOutcome>> {
            Ok(batches
                .iter()
                .map(|b| BatchOutcome::new(b, BatchStatus::Submitted))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_engine_builds_report() {
        let engine = MigrationEngine::new(StubPipeline { fail_extract: false });

        let report = engine.run().await.unwrap();

        assert_eq!(report.records_fetched(), 3);
        assert_eq!(report.records_submitted(), 3);
        assert_eq!(report.failed_pages(), vec![2]);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_engine_propagates_fatal_errors() {
        let engine = MigrationEngine::new(StubPipeline { fail_extract: true });
        assert!(engine.run().await.is_err());
    }
}
