use crate::domain::model::{SkippedRecord, WriteReport};
use crate::domain::ports::Pipeline;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub scraper_name: String,
    pub raw_records: usize,
    pub processed_records: usize,
    pub skipped: Vec<SkippedRecord>,
    pub raw_output: WriteReport,
    pub processed_output: WriteReport,
}

/// What a run produced. Neither variant is an error: a failed fetch is an
/// expected outcome and ends the run without output.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunReport),
    NoData { scraper_name: String, reason: String },
}

impl RunOutcome {
    pub fn processed_records(&self) -> usize {
        match self {
            RunOutcome::Completed(report) => report.processed_records,
            RunOutcome::NoData { .. } => 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// fetch → 存原始資料 → 正規化 → 存處理結果
    pub async fn run(&self) -> RunOutcome {
        let scraper_name = self.pipeline.name().to_string();
        tracing::info!("🚀 Starting scraper: {}", scraper_name);

        // Extract
        let raw = match self.pipeline.extract().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("❌ No data fetched for {}: {}", scraper_name, e);
                tracing::error!("💡 {}", e.recovery_suggestion());
                return RunOutcome::NoData {
                    scraper_name,
                    reason: e.to_string(),
                };
            }
        };
        self.monitor.log_phase("Extract");

        let raw_records = raw.len();
        let raw_output = self.pipeline.persist_raw(&raw).await;

        // Transform
        tracing::info!("🔧 Processing {} employee records", raw_records);
        let transformed = match self.pipeline.transform(raw).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("❌ Processing failed for {}: {}", scraper_name, e);
                return RunOutcome::NoData {
                    scraper_name,
                    reason: e.to_string(),
                };
            }
        };
        self.monitor.log_phase("Transform");

        // Load
        let processed_output = self.pipeline.load(&transformed).await;
        self.monitor.log_phase("Load");
        self.monitor.log_final_stats();

        if !transformed.skipped.is_empty() {
            tracing::warn!(
                "⚠️ {} of {} records were skipped",
                transformed.skipped.len(),
                raw_records
            );
        }
        tracing::info!(
            "✅ Employee data pipeline completed successfully! - {} ({} records)",
            scraper_name,
            transformed.records.len()
        );

        RunOutcome::Completed(RunReport {
            scraper_name,
            raw_records,
            processed_records: transformed.records.len(),
            skipped: transformed.skipped,
            raw_output,
            processed_output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CanonicalRecord, Designation, TransformResult};
    use crate::utils::error::{EtlError, Result};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct StubPipeline {
        fail_fetch: bool,
        writes: Arc<AtomicUsize>,
    }

    fn report(name: &str, records: usize) -> WriteReport {
        WriteReport {
            logical_name: name.to_string(),
            records,
            ..WriteReport::default()
        }
    }

    #[async_trait]
    impl Pipeline for StubPipeline {
        fn name(&self) -> &str {
            "stub"
        }

        async fn extract(&self) -> Result<Vec<Value>> {
            if self.fail_fetch {
                return Err(EtlError::FetchExhausted {
                    attempts: 3,
                    last_error: "HTTP 503".to_string(),
                });
            }
            Ok(vec![json!({"first_name": "A"}), json!({"first_name": "B"})])
        }

        async fn persist_raw(&self, raw: &[Value]) -> WriteReport {
            self.writes.fetch_add(1, Ordering::SeqCst);
            report("raw_employees", raw.len())
        }

        async fn transform(&self, data: Vec<Value>) -> Result<TransformResult> {
            let records = data
                .iter()
                .map(|_| CanonicalRecord {
                    full_name: "X".to_string(),
                    email: String::new(),
                    phone: String::new(),
                    gender: String::new(),
                    age: 0,
                    job_title: String::new(),
                    years_of_experience: 0,
                    salary: 0,
                    department: String::new(),
                    designation: Designation::SystemEngineer,
                })
                .collect();
            Ok(TransformResult {
                records,
                skipped: Vec::new(),
            })
        }

        async fn load(&self, result: &TransformResult) -> WriteReport {
            self.writes.fetch_add(1, Ordering::SeqCst);
            report("processed_employees", result.records.len())
        }
    }

    #[tokio::test]
    async fn test_run_completes_with_counts() {
        let writes = Arc::new(AtomicUsize::new(0));
        let engine = EtlEngine::new(StubPipeline {
            fail_fetch: false,
            writes: writes.clone(),
        });

        match engine.run().await {
            RunOutcome::Completed(report) => {
                assert_eq!(report.scraper_name, "stub");
                assert_eq!(report.raw_records, 2);
                assert_eq!(report.processed_records, 2);
                assert_eq!(report.raw_output.logical_name, "raw_employees");
                assert_eq!(report.processed_output.logical_name, "processed_employees");
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let writes = Arc::new(AtomicUsize::new(0));
        let engine = EtlEngine::new(StubPipeline {
            fail_fetch: true,
            writes: writes.clone(),
        });

        let outcome = engine.run().await;

        assert!(!outcome.is_completed());
        assert_eq!(outcome.processed_records(), 0);
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }
}
