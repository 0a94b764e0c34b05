use crate::config::toml_config::{JobConfig, RunConfig, ScraperConfig};
use crate::utils::error::Result;
use clap::Parser;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "run_scraper.toml";

#[derive(Debug, Clone, Parser)]
#[command(name = "employee-etl")]
#[command(about = "Fetch employee records, normalize them and save JSON/XML/Parquet outputs")]
pub struct CliArgs {
    /// Run file (TOML, or a JSON list of scrapers)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Fetch this URL instead of the configured one
    #[arg(long)]
    pub api_url: Option<String>,

    /// Override the output directory
    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long)]
    pub retry_attempts: Option<u32>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON log lines")]
    pub log_json: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    pub monitor: Option<bool>,

    /// Show the resolved job without fetching anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// 決定這次要跑的工作：
    /// 指定 `--config` 就讀檔；只給 `--api-url` 且預設檔不存在時直接用參數組成單一 scraper。
    /// 沒有任何啟用的 scraper 時回傳 `Ok(None)`。
    pub fn resolve_job(&self) -> Result<Option<JobConfig>> {
        let run_config = match (&self.config, &self.api_url) {
            (Some(path), _) => RunConfig::from_file(path)?,
            (None, Some(url)) if !Path::new(DEFAULT_CONFIG_FILE).exists() => {
                RunConfig::single(ScraperConfig::new("cli", url.clone()))
            }
            (None, _) => RunConfig::from_file(DEFAULT_CONFIG_FILE)?,
        };

        Ok(run_config.job().map(|job| self.apply_overrides(job)))
    }

    pub fn apply_overrides(&self, mut job: JobConfig) -> JobConfig {
        if let Some(url) = &self.api_url {
            job.scraper.api_url = url.clone();
        }
        if let Some(path) = &self.output_path {
            job.output.path = path.clone();
        }
        if let Some(attempts) = self.retry_attempts {
            job.scraper.retry_attempts = attempts;
        }
        if let Some(timeout) = self.timeout {
            job.scraper.timeout = timeout;
        }
        if let Some(monitor) = self.monitor {
            job.monitoring = monitor;
        }
        job
    }
}
