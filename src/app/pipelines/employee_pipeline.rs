use crate::adapters::http::{HttpFetcher, RetryPolicy};
use crate::core::writer::MultiFormatWriter;
use crate::core::{ConfigProvider, Pipeline, RecordSet, Storage, TransformResult, WriteReport};
use crate::domain::model::{OutputFormat, SinkFailure};
use crate::domain::services::Normalizer;
use crate::utils::error::Result;
use serde_json::Value;

pub const RAW_LOGICAL_NAME: &str = "raw_employees";
pub const PROCESSED_LOGICAL_NAME: &str = "processed_employees";

/// 員工資料管道：抓取、保存原始資料、正規化、保存結果
pub struct EmployeePipeline<S: Storage, C: ConfigProvider> {
    config: C,
    fetcher: HttpFetcher,
    normalizer: Normalizer,
    writer: MultiFormatWriter<S>,
}

impl<S: Storage, C: ConfigProvider> EmployeePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let fetcher = HttpFetcher::new(RetryPolicy::from_config(&config), config.envelope_key());
        let normalizer = Normalizer::new(config.numeric_policy());
        let writer = MultiFormatWriter::new(storage, config.output_formats());

        Self {
            config,
            fetcher,
            normalizer,
            writer,
        }
    }
}

/// 無法建立 RecordSet 時，每個格式都記為失敗
fn unbuildable_batch(logical_name: &str, records: usize, formats: &[OutputFormat], message: String) -> WriteReport {
    WriteReport {
        logical_name: logical_name.to_string(),
        records,
        failures: formats
            .iter()
            .map(|format| SinkFailure {
                format: *format,
                message: message.clone(),
            })
            .collect(),
        ..WriteReport::default()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for EmployeePipeline<S, C> {
    fn name(&self) -> &str {
        self.config.scraper_name()
    }

    async fn extract(&self) -> Result<Vec<Value>> {
        tracing::info!("📡 Fetching employee data from: {}", self.config.api_endpoint());
        self.fetcher.fetch(self.config.api_endpoint()).await
    }

    async fn persist_raw(&self, raw: &[Value]) -> WriteReport {
        let batch = RecordSet::from_raw(raw);
        self.writer.write_all(&batch, RAW_LOGICAL_NAME).await
    }

    async fn transform(&self, data: Vec<Value>) -> Result<TransformResult> {
        let result = self.normalizer.normalize_batch(data);
        tracing::info!(
            "✅ Normalized {} records ({} skipped)",
            result.records.len(),
            result.skipped.len()
        );
        Ok(result)
    }

    async fn load(&self, result: &TransformResult) -> WriteReport {
        match RecordSet::from_canonical(&result.records) {
            Ok(batch) => self.writer.write_all(&batch, PROCESSED_LOGICAL_NAME).await,
            Err(e) => {
                tracing::error!("❌ Saving error: {}", e);
                unbuildable_batch(
                    PROCESSED_LOGICAL_NAME,
                    result.records.len(),
                    self.config.output_formats(),
                    e.to_string(),
                )
            }
        }
    }
}
