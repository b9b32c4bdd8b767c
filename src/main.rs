use clap::Parser;
use scrobble_migrate::utils::{logger, validation::Validate};
use scrobble_migrate::{CliArgs, HttpMigrationPipeline, MigrateError, MigrationConfig, MigrationEngine};
use tokio_util::sync::CancellationToken;

fn exit_with(e: &MigrateError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting scrobble-migrate");
    tracing::debug!("CLI args: {:?}", args);

    let config = MigrationConfig::load(&args.config).unwrap_or_else(|e| exit_with(&e));
    let request = args.request();

    if let Err(e) = config.validate().and_then(|_| request.validate()) {
        exit_with(&e);
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current request");
                cancel.cancel();
            }
        });
    }

    let pipeline = HttpMigrationPipeline::from_config(&config, request)
        .unwrap_or_else(|e| exit_with(&e))
        .with_cancellation(cancel.clone());
    let engine = MigrationEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            println!(
                "✅ Submitted {} of {} scrobbles ({} pages, {} batches) in {:?}",
                report.records_submitted(),
                report.records_fetched(),
                report.pages.len(),
                report.batches.len(),
                report.elapsed
            );
            if !report.is_complete() {
                println!(
                    "⚠️  Failed pages: {:?}; failed batches: {:?}; skipped batches: {}",
                    report.failed_pages(),
                    report.failed_batches(),
                    report.skipped_batches()
                );
            }
            if cancel.is_cancelled() {
                std::process::exit(130);
            }
        }
        Err(e) => exit_with(&e),
    }
}
