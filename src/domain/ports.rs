use crate::domain::model::{OutputFormat, TransformResult, WriteReport};
use crate::domain::services::NumericPolicy;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Human-readable location of `path`, used in logs and reports.
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn scraper_name(&self) -> &str;
    fn api_endpoint(&self) -> &str;
    fn retry_attempts(&self) -> u32;
    fn timeout(&self) -> Duration;
    fn retry_delay(&self) -> Duration;
    fn envelope_key(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[OutputFormat];
    fn numeric_policy(&self) -> NumericPolicy;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Vec<Value>>;
    async fn persist_raw(&self, raw: &[Value]) -> WriteReport;
    async fn transform(&self, data: Vec<Value>) -> Result<TransformResult>;
    async fn load(&self, result: &TransformResult) -> WriteReport;
}
