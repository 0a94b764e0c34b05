use super::Sink;
use crate::domain::model::{value_to_text, Column, ColumnKind, OutputFormat, RecordSet};
use crate::utils::error::{EtlError, Result};
use parquet::basic::{Compression, LogicalType, Repetition, Type as PhysicalType};
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::{Type, TypePtr};
use std::borrow::Cow;
use std::sync::Arc;

/// 沒有任何物件欄位的批次（例如 `[{}, {}]`）仍需一個欄位來保存列數
const PLACEHOLDER_COLUMN: &str = "record";

/// Parquet table with one optional column per [`Column`], no index column.
#[derive(Debug, Clone, Copy)]
pub struct ParquetSink {
    compression: Compression,
}

impl Default for ParquetSink {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
        }
    }
}

impl ParquetSink {
    pub fn with_compression(compression: Compression) -> Self {
        Self { compression }
    }
}

fn build_schema(columns: &[Column]) -> Result<TypePtr> {
    let fields = columns
        .iter()
        .map(|column| {
            let builder = match column.kind {
                ColumnKind::Integer => Type::primitive_type_builder(&column.name, PhysicalType::INT64),
                ColumnKind::Float => Type::primitive_type_builder(&column.name, PhysicalType::DOUBLE),
                ColumnKind::Boolean => {
                    Type::primitive_type_builder(&column.name, PhysicalType::BOOLEAN)
                }
                ColumnKind::Text => {
                    Type::primitive_type_builder(&column.name, PhysicalType::BYTE_ARRAY)
                        .with_logical_type(Some(LogicalType::String))
                }
            };
            builder
                .with_repetition(Repetition::OPTIONAL)
                .build()
                .map(Arc::new)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let schema = Type::group_type_builder("schema").with_fields(fields).build()?;
    Ok(Arc::new(schema))
}

enum ColumnValues {
    Integer(Vec<i64>),
    Float(Vec<f64>),
    Boolean(Vec<bool>),
    Text(Vec<ByteArray>),
}

/// Columns to write. A batch without any inferred column gets one all-null
/// text column, since a Parquet schema with no leaf cannot carry a row count.
fn output_columns(batch: &RecordSet) -> Cow<'_, [Column]> {
    if batch.columns().is_empty() {
        Cow::Owned(vec![Column {
            name: PLACEHOLDER_COLUMN.to_string(),
            kind: ColumnKind::Text,
        }])
    } else {
        Cow::Borrowed(batch.columns())
    }
}

/// 非 null 值與對應的 definition level（0 = null，1 = 有值）
fn column_values(batch: &RecordSet, column: &Column) -> (ColumnValues, Vec<i16>) {
    let mut def_levels = Vec::with_capacity(batch.len());
    let mut values = match column.kind {
        ColumnKind::Integer => ColumnValues::Integer(Vec::new()),
        ColumnKind::Float => ColumnValues::Float(Vec::new()),
        ColumnKind::Boolean => ColumnValues::Boolean(Vec::new()),
        ColumnKind::Text => ColumnValues::Text(Vec::new()),
    };

    for row in 0..batch.len() {
        let cell = batch.cell(row, &column.name);
        let pushed = match (&mut values, cell) {
            (_, None) => false,
            (ColumnValues::Integer(out), Some(v)) => v.as_i64().map(|n| out.push(n)).is_some(),
            (ColumnValues::Float(out), Some(v)) => v.as_f64().map(|n| out.push(n)).is_some(),
            (ColumnValues::Boolean(out), Some(v)) => v.as_bool().map(|b| out.push(b)).is_some(),
            (ColumnValues::Text(out), Some(v)) => value_to_text(v)
                .map(|s| out.push(ByteArray::from(s.as_str())))
                .is_some(),
        };
        def_levels.push(if pushed { 1 } else { 0 });
    }

    (values, def_levels)
}

impl Sink for ParquetSink {
    fn format(&self) -> OutputFormat {
        OutputFormat::Parquet
    }

    fn encode(&self, batch: &RecordSet) -> Result<Vec<u8>> {
        let columns = output_columns(batch);
        let schema = build_schema(&columns)?;
        let props = Arc::new(
            WriterProperties::builder()
                .set_compression(self.compression)
                .build(),
        );

        let mut buffer = Vec::new();
        let mut writer = SerializedFileWriter::new(&mut buffer, schema, props)?;

        // 空批次只寫 schema，不產生 row group
        if !batch.is_empty() {
            let mut row_group = writer.next_row_group()?;
            let mut index = 0;
            while let Some(mut column_writer) = row_group.next_column()? {
                let column = columns.get(index).ok_or_else(|| {
                    EtlError::ParquetError(ParquetError::General(format!(
                        "schema has more columns than the batch ({})",
                        columns.len()
                    )))
                })?;
                let (values, def_levels) = column_values(batch, column);
                match values {
                    ColumnValues::Integer(v) => {
                        column_writer
                            .typed::<Int64Type>()
                            .write_batch(&v, Some(def_levels.as_slice()), None)?;
                    }
                    ColumnValues::Float(v) => {
                        column_writer
                            .typed::<DoubleType>()
                            .write_batch(&v, Some(def_levels.as_slice()), None)?;
                    }
                    ColumnValues::Boolean(v) => {
                        column_writer
                            .typed::<BoolType>()
                            .write_batch(&v, Some(def_levels.as_slice()), None)?;
                    }
                    ColumnValues::Text(v) => {
                        column_writer
                            .typed::<ByteArrayType>()
                            .write_batch(&v, Some(def_levels.as_slice()), None)?;
                    }
                }
                column_writer.close()?;
                index += 1;
            }
            row_group.close()?;
        }

        writer.close()?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sinks::fixtures;
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn read_back(bytes: &[u8]) -> SerializedFileReader<std::fs::File> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        SerializedFileReader::new(file.reopen().unwrap()).unwrap()
    }

    fn column_names(reader: &SerializedFileReader<std::fs::File>) -> Vec<String> {
        reader
            .metadata()
            .file_metadata()
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    #[test]
    fn test_parquet_canonical_columns_and_rows() {
        let bytes = ParquetSink::default().encode(&fixtures::canonical_set()).unwrap();
        assert_eq!(&bytes[..4], b"PAR1");

        let reader = read_back(&bytes);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 2);
        assert_eq!(
            column_names(&reader),
            vec![
                "Full Name",
                "email",
                "phone",
                "gender",
                "age",
                "job_title",
                "years_of_experience",
                "salary",
                "department",
                "designation"
            ]
        );
    }

    #[test]
    fn test_parquet_raw_rows_with_missing_fields() {
        let items = vec![
            json!({"id": 1, "first_name": "Ann", "rating": 4.5}),
            json!({"id": 2, "last_name": "Lee", "remote": true}),
            json!({"id": 3, "rating": 3}),
        ];
        let bytes = ParquetSink::with_compression(Compression::UNCOMPRESSED)
            .encode(&RecordSet::from_raw(&items))
            .unwrap();

        let reader = read_back(&bytes);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 3);
        assert_eq!(
            column_names(&reader),
            vec!["id", "first_name", "rating", "last_name", "remote"]
        );
    }

    #[test]
    fn test_parquet_batch_without_fields_keeps_row_count() {
        let items = vec![json!({}), json!({}), json!(7)];
        let batch = RecordSet::from_raw(&items);
        assert!(batch.columns().is_empty());

        let bytes = ParquetSink::default().encode(&batch).unwrap();

        let reader = read_back(&bytes);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 3);
        assert_eq!(column_names(&reader), vec![PLACEHOLDER_COLUMN]);

        let rows: Vec<_> = reader.get_row_iter(None).unwrap().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.is_ok()));
    }

    #[test]
    fn test_parquet_empty_raw_batch_is_readable() {
        let bytes = ParquetSink::default()
            .encode(&RecordSet::from_raw(&[]))
            .unwrap();

        let reader = read_back(&bytes);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 0);
        assert_eq!(column_names(&reader), vec![PLACEHOLDER_COLUMN]);
    }

    #[test]
    fn test_parquet_empty_canonical_batch_keeps_schema() {
        let bytes = ParquetSink::default()
            .encode(&fixtures::canonical_set_empty())
            .unwrap();

        let reader = read_back(&bytes);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 0);
        assert_eq!(reader.metadata().num_row_groups(), 0);
        assert_eq!(column_names(&reader).len(), 10);
    }
}
