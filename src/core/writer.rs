use crate::adapters::sinks::{sink_for, Sink};
use crate::domain::model::{OutputFormat, RecordSet, SinkFailure, WriteReport};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use chrono::Local;

/// 檔名中的執行時間戳，精確到秒
pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn run_id() -> String {
    Local::now().format(RUN_ID_FORMAT).to_string()
}

pub fn file_name(logical_name: &str, run_id: &str, format: OutputFormat) -> String {
    format!("{}_{}.{}", logical_name, run_id, format.extension())
}

/// Writes one batch to every configured sink. A failing sink is logged and
/// recorded in the report; the remaining sinks are still written.
pub struct MultiFormatWriter<S: Storage> {
    storage: S,
    sinks: Vec<Box<dyn Sink>>,
}

impl<S: Storage> MultiFormatWriter<S> {
    pub fn new(storage: S, formats: &[OutputFormat]) -> Self {
        Self::with_sinks(storage, formats.iter().copied().map(sink_for).collect())
    }

    pub fn with_sinks(storage: S, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { storage, sinks }
    }

    pub async fn write_all(&self, batch: &RecordSet, logical_name: &str) -> WriteReport {
        self.write_all_with_run_id(batch, logical_name, &run_id())
            .await
    }

    pub async fn write_all_with_run_id(
        &self,
        batch: &RecordSet,
        logical_name: &str,
        run_id: &str,
    ) -> WriteReport {
        let mut report = WriteReport {
            logical_name: logical_name.to_string(),
            run_id: run_id.to_string(),
            records: batch.len(),
            ..WriteReport::default()
        };

        for sink in &self.sinks {
            let format = sink.format();
            let path = file_name(logical_name, run_id, format);

            match self.write_one(sink.as_ref(), batch, &path).await {
                Ok(()) => {
                    let location = self.storage.location(&path);
                    tracing::info!("💾 Data saved to {} ({} records)", location, batch.len());
                    report.written.push(location);
                }
                Err(e) => {
                    tracing::error!("❌ Saving error ({}): {}", format, e);
                    report.failures.push(SinkFailure {
                        format,
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn write_one(&self, sink: &dyn Sink, batch: &RecordSet, path: &str) -> Result<()> {
        let bytes = sink.encode(batch)?;
        self.storage
            .write_file(path, &bytes)
            .await
            .map_err(|e| EtlError::PersistenceError {
                sink: sink.format().to_string(),
                path: self.storage.location(path),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sinks::fixtures;
    use crate::adapters::storage::LocalStorage;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_extension: Option<&'static str>,
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            if let Some(ext) = self.fail_extension {
                if path.ends_with(ext) {
                    return Err(EtlError::IoError(std::io::Error::new(
                        std::io::ErrorKind::PermissionDenied,
                        "read-only volume",
                    )));
                }
            }
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn location(&self, path: &str) -> String {
            format!("mock://{}", path)
        }
    }

    struct BrokenSink;

    impl Sink for BrokenSink {
        fn format(&self) -> OutputFormat {
            OutputFormat::Xml
        }

        fn encode(&self, _batch: &RecordSet) -> Result<Vec<u8>> {
            Err(EtlError::XmlError {
                message: "encoder exploded".to_string(),
            })
        }
    }

    #[test]
    fn test_file_name_layout() {
        assert_eq!(
            file_name("processed_employees", "20240102_030405", OutputFormat::Parquet),
            "processed_employees_20240102_030405.parquet"
        );
        assert_eq!(run_id().len(), "20240102_030405".len());
    }

    #[tokio::test]
    async fn test_writes_all_three_formats() {
        let storage = MockStorage::default();
        let writer = MultiFormatWriter::new(storage.clone(), &OutputFormat::ALL);

        let report = writer
            .write_all_with_run_id(&fixtures::canonical_set(), "processed_employees", "20240102_030405")
            .await;

        assert!(report.is_complete());
        assert_eq!(report.records, 2);
        assert_eq!(
            report.written,
            vec![
                "mock://processed_employees_20240102_030405.json",
                "mock://processed_employees_20240102_030405.xml",
                "mock://processed_employees_20240102_030405.parquet",
            ]
        );
        assert_eq!(storage.files.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_sink_does_not_stop_the_others() {
        let storage = MockStorage {
            fail_extension: Some(".json"),
            ..MockStorage::default()
        };
        let writer = MultiFormatWriter::new(storage.clone(), &OutputFormat::ALL);

        let report = writer
            .write_all_with_run_id(&fixtures::canonical_set(), "raw_employees", "20240102_030405")
            .await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].format, OutputFormat::Json);
        assert!(report.failures[0].message.contains("read-only volume"));
        assert_eq!(report.written.len(), 2);

        let files = storage.files.lock().await;
        assert!(files.contains_key("raw_employees_20240102_030405.xml"));
        assert!(files.contains_key("raw_employees_20240102_030405.parquet"));
    }

    #[tokio::test]
    async fn test_encoding_failure_is_reported() {
        let storage = MockStorage::default();
        let writer = MultiFormatWriter::with_sinks(
            storage.clone(),
            vec![Box::new(BrokenSink), sink_for(OutputFormat::Json)],
        );

        let report = writer
            .write_all_with_run_id(&fixtures::canonical_set(), "processed_employees", "x")
            .await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.written, vec!["mock://processed_employees_x.json"]);
    }

    #[tokio::test]
    async fn test_local_output_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("output");
        let writer = MultiFormatWriter::new(
            LocalStorage::new(output_dir.to_str().unwrap()),
            &[OutputFormat::Json],
        );

        let report = writer
            .write_all(&fixtures::canonical_set(), "processed_employees")
            .await;

        assert!(report.is_complete());
        let expected = output_dir.join(format!("processed_employees_{}.json", report.run_id));
        assert!(expected.exists());
    }
}
