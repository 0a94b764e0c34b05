use super::Sink;
use crate::domain::model::{OutputFormat, RecordSet};
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Pretty-printed JSON array, four-space indent.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink;

impl Sink for JsonSink {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn encode(&self, batch: &RecordSet) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        batch.rows().serialize(&mut serializer)?;
        Ok(buffer)
    }
}
