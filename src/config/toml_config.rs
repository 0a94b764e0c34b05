use crate::adapters::http::DEFAULT_ENVELOPE_KEY;
use crate::domain::model::OutputFormat;
use crate::domain::ports::ConfigProvider;
use crate::domain::services::NumericPolicy;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_retry_attempts() -> u32 {
    3
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_delay() -> u64 {
    3
}

fn default_envelope_key() -> String {
    DEFAULT_ENVELOPE_KEY.to_string()
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_formats() -> Vec<OutputFormat> {
    OutputFormat::ALL.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub scraper_name: String,
    pub api_url: String,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// 單次請求逾時（秒）
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    pub enabled: bool,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    #[serde(default = "default_envelope_key")]
    pub envelope_key: String,
}

impl ScraperConfig {
    pub fn new(scraper_name: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            scraper_name: scraper_name.into(),
            api_url: api_url.into(),
            retry_attempts: default_retry_attempts(),
            timeout: default_timeout(),
            enabled: true,
            retry_delay_seconds: default_retry_delay(),
            envelope_key: default_envelope_key(),
        }
    }
}

impl Validate for ScraperConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("scraper_name", &self.scraper_name)?;
        validation::validate_url("api_url", &self.api_url)?;
        validation::validate_positive_number("retry_attempts", u64::from(self.retry_attempts), 1)?;
        validation::validate_positive_number("timeout", self.timeout, 1)?;
        validation::validate_non_empty_string("envelope_key", &self.envelope_key)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            formats: default_formats(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// false = 無法轉換的數值改為 0，不丟棄記錄
    pub strict_numbers: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub scrapers: Vec<ScraperConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    pub normalization: Option<NormalizationConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

/// `run_scraper.json` 可以是純清單，也可以是完整設定
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRunFile {
    List(Vec<ScraperConfig>),
    Full(RunConfig),
}

impl RunConfig {
    pub fn single(scraper: ScraperConfig) -> Self {
        Self {
            scrapers: vec![scraper],
            output: OutputConfig::default(),
            normalization: None,
            monitoring: None,
        }
    }

    /// 從檔案載入配置，`.json` 以外都當成 TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(EtlError::IoError)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        let parsed: JsonRunFile =
            serde_json::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
                field: "json_parsing".to_string(),
                message: format!("JSON parsing error: {}", e),
            })?;

        Ok(match parsed {
            JsonRunFile::List(scrapers) => Self {
                scrapers,
                output: OutputConfig::default(),
                normalization: None,
                monitoring: None,
            },
            JsonRunFile::Full(config) => config,
        })
    }

    pub fn first_enabled(&self) -> Option<&ScraperConfig> {
        self.scrapers.iter().find(|s| s.enabled)
    }

    pub fn numeric_policy(&self) -> NumericPolicy {
        match self.normalization.as_ref().and_then(|n| n.strict_numbers) {
            Some(false) => NumericPolicy::Lenient,
            _ => NumericPolicy::Strict,
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// 第一個啟用的 scraper 加上共用的輸出設定；沒有啟用者時回傳 None
    pub fn job(&self) -> Option<JobConfig> {
        self.first_enabled().map(|scraper| JobConfig {
            scraper: scraper.clone(),
            output: self.output.clone(),
            numeric_policy: self.numeric_policy(),
            monitoring: self.monitoring_enabled(),
        })
    }
}

fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    // ${VAR_NAME}；未設定的變數保持原樣
    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

/// Everything one run needs: the selected scraper plus shared settings.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub scraper: ScraperConfig,
    pub output: OutputConfig,
    pub numeric_policy: NumericPolicy,
    pub monitoring: bool,
}

impl JobConfig {
    pub fn new(scraper: ScraperConfig) -> Self {
        Self {
            scraper,
            output: OutputConfig::default(),
            numeric_policy: NumericPolicy::default(),
            monitoring: false,
        }
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        self.scraper.validate()?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_non_empty_list("output.formats", &self.output.formats)?;
        Ok(())
    }
}

impl ConfigProvider for JobConfig {
    fn scraper_name(&self) -> &str {
        &self.scraper.scraper_name
    }

    fn api_endpoint(&self) -> &str {
        &self.scraper.api_url
    }

    fn retry_attempts(&self) -> u32 {
        self.scraper.retry_attempts
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.scraper.timeout)
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.scraper.retry_delay_seconds)
    }

    fn envelope_key(&self) -> &str {
        &self.scraper.envelope_key
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.output.formats
    }

    fn numeric_policy(&self) -> NumericPolicy {
        self.numeric_policy
    }
}
