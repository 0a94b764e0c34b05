use clap::Parser;
use employee_etl::core::ConfigProvider;
use employee_etl::utils::{logger, validation::Validate};
use employee_etl::{CliArgs, EmployeePipeline, EtlEngine, JobConfig, LocalStorage, RunOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting employee-etl");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let job = match args.resolve_job() {
        Ok(Some(job)) => job,
        Ok(None) => {
            tracing::warn!("⚠️ No enabled scraper found in configuration, nothing to do");
            println!("No enabled scraper configured; nothing to do.");
            return Ok(());
        }
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = job.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if args.dry_run {
        display_job_summary(&job);
        return Ok(());
    }

    let monitor_enabled = job.monitoring;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(job.output_path());
    let pipeline = EmployeePipeline::new(storage, job);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        RunOutcome::Completed(report) => {
            println!(
                "✅ Employee data pipeline completed successfully! - {}",
                report.scraper_name
            );
            println!(
                "📊 {} raw records, {} processed, {} skipped",
                report.raw_records,
                report.processed_records,
                report.skipped.len()
            );
            for path in report.raw_output.written.iter().chain(&report.processed_output.written) {
                println!("📁 {}", path);
            }
            for failure in report
                .raw_output
                .failures
                .iter()
                .chain(&report.processed_output.failures)
            {
                eprintln!("⚠️ {} output not written: {}", failure.format, failure.message);
            }
        }
        RunOutcome::NoData {
            scraper_name,
            reason,
        } => {
            println!("No data fetched for {}: {}", scraper_name, reason);
        }
    }

    Ok(())
}

fn display_job_summary(job: &JobConfig) {
    println!("📋 Job Summary:");
    println!("  Scraper: {}", job.scraper_name());
    println!("  Source: {}", job.api_endpoint());
    println!(
        "  Retries: {} (delay {:?}, timeout {:?})",
        job.retry_attempts(),
        job.retry_delay(),
        job.timeout()
    );
    println!("  Envelope key: {}", job.envelope_key());
    println!("  Output: {}", job.output_path());
    let formats: Vec<String> = job.output_formats().iter().map(|f| f.to_string()).collect();
    println!("  Formats: {}", formats.join(", "));
    println!("  Numeric policy: {:?}", job.numeric_policy());
    println!("  🔍 DRY RUN - nothing fetched or written");
}
