use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One employee object exactly as the API sent it.
///
/// All field access goes through [`RawRecord::text`] and [`RawRecord::integer`],
/// which own the default and coercion rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    pub data: Map<String, Value>,
}

impl TryFrom<Value> for RawRecord {
    type Error = EtlError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(EtlError::RecordCoercionError {
                field: "<record>".to_string(),
                value: truncate(&other.to_string()),
                reason: "record is not a JSON object".to_string(),
            }),
        }
    }
}

impl RawRecord {
    /// 字串欄位：缺漏或 null 一律視為空字串
    pub fn text(&self, key: &str) -> String {
        self.data
            .get(key)
            .and_then(value_to_text)
            .unwrap_or_default()
    }

    /// 整數欄位：缺漏或 null 為 0，無法轉換時回傳錯誤
    pub fn integer(&self, key: &str) -> Result<i64> {
        let value = match self.data.get(key) {
            None | Some(Value::Null) => return Ok(0),
            Some(value) => value,
        };

        coerce_integer(value).ok_or_else(|| EtlError::RecordCoercionError {
            field: key.to_string(),
            value: truncate(&value.to_string()),
            reason: "value cannot be interpreted as an integer".to_string(),
        })
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .and_then(float_to_i64)
            })
        }
        _ => None,
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

fn truncate(s: &str) -> String {
    const LIMIT: usize = 80;
    match s.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// String form of a JSON value as written to text outputs. `Null` has none.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Designation {
    #[serde(rename = "System Engineer")]
    SystemEngineer,
    #[serde(rename = "Data Engineer")]
    DataEngineer,
    #[serde(rename = "Senior Data Engineer")]
    SeniorDataEngineer,
    #[serde(rename = "Lead")]
    Lead,
}

impl Designation {
    /// 依年資決定職稱，負數落在 System Engineer
    pub fn from_years(years_exp: i64) -> Self {
        match years_exp {
            i64::MIN..=2 => Designation::SystemEngineer,
            3..=5 => Designation::DataEngineer,
            6..=10 => Designation::SeniorDataEngineer,
            _ => Designation::Lead,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Designation::SystemEngineer => "System Engineer",
            Designation::DataEngineer => "Data Engineer",
            Designation::SeniorDataEngineer => "Senior Data Engineer",
            Designation::Lead => "Lead",
        }
    }
}

impl fmt::Display for Designation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const INVALID_PHONE: &str = "Invalid Number";

/// Fixed-schema output record. Field order here is the column order of every output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "Full Name")]
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub age: i64,
    pub job_title: String,
    pub years_of_experience: i64,
    pub salary: i64,
    pub department: String,
    pub designation: Designation,
}

impl CanonicalRecord {
    pub const COLUMNS: [(&'static str, ColumnKind); 10] = [
        ("Full Name", ColumnKind::Text),
        ("email", ColumnKind::Text),
        ("phone", ColumnKind::Text),
        ("gender", ColumnKind::Text),
        ("age", ColumnKind::Integer),
        ("job_title", ColumnKind::Text),
        ("years_of_experience", ColumnKind::Integer),
        ("salary", ColumnKind::Integer),
        ("department", ColumnKind::Text),
        ("designation", ColumnKind::Text),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnKind::Boolean),
            Value::Number(n) if n.is_i64() => Some(ColumnKind::Integer),
            Value::Number(_) => Some(ColumnKind::Float),
            _ => Some(ColumnKind::Text),
        }
    }

    fn widen(self, other: Self) -> Self {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A batch ready for the sinks: ordered rows plus the column layout every
/// tabular format shares.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    columns: Vec<Column>,
    rows: Vec<Value>,
}

impl RecordSet {
    /// 原始資料：欄位取所有物件鍵的聯集（依首次出現順序），型別由值推斷
    pub fn from_raw(items: &[Value]) -> Self {
        let mut columns: Vec<Column> = Vec::new();
        let mut kinds: Vec<Option<ColumnKind>> = Vec::new();

        for object in items.iter().filter_map(Value::as_object) {
            for (key, value) in object {
                let idx = match columns.iter().position(|c| &c.name == key) {
                    Some(idx) => idx,
                    None => {
                        columns.push(Column {
                            name: key.clone(),
                            kind: ColumnKind::Text,
                        });
                        kinds.push(None);
                        columns.len() - 1
                    }
                };
                if let Some(kind) = ColumnKind::of(value) {
                    kinds[idx] = Some(kinds[idx].map_or(kind, |k| k.widen(kind)));
                }
            }
        }

        for (column, kind) in columns.iter_mut().zip(kinds) {
            column.kind = kind.unwrap_or(ColumnKind::Text);
        }

        Self {
            columns,
            rows: items.to_vec(),
        }
    }

    pub fn from_canonical(records: &[CanonicalRecord]) -> Result<Self> {
        let rows = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let columns = CanonicalRecord::COLUMNS
            .iter()
            .map(|(name, kind)| Column {
                name: (*name).to_string(),
                kind: *kind,
            })
            .collect();
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Non-null cell at `row`/`column`, if any.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows
            .get(row)?
            .get(column)
            .filter(|value| !value.is_null())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Xml,
    Parquet,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Json, OutputFormat::Xml, OutputFormat::Parquet];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(EtlError::InvalidConfigValueError {
                field: "output.formats".to_string(),
                value: other.to_string(),
                reason: "Unsupported format. Valid formats: json, xml, parquet".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub records: Vec<CanonicalRecord>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
    pub format: OutputFormat,
    pub message: String,
}

/// Outcome of one best-effort multi-format write.
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    pub logical_name: String,
    pub run_id: String,
    pub records: usize,
    pub written: Vec<String>,
    pub failures: Vec<SinkFailure>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        RawRecord::try_from(value).unwrap()
    }

    #[test]
    fn test_designation_boundaries() {
        let cases = [
            (-4, Designation::SystemEngineer),
            (0, Designation::SystemEngineer),
            (2, Designation::SystemEngineer),
            (3, Designation::DataEngineer),
            (5, Designation::DataEngineer),
            (6, Designation::SeniorDataEngineer),
            (10, Designation::SeniorDataEngineer),
            (11, Designation::Lead),
            (40, Designation::Lead),
        ];
        for (years, expected) in cases {
            assert_eq!(Designation::from_years(years), expected, "years = {}", years);
        }
    }

    #[test]
    fn test_designation_serializes_as_label() {
        let value = serde_json::to_value(Designation::SeniorDataEngineer).unwrap();
        assert_eq!(value, json!("Senior Data Engineer"));
        assert_eq!(Designation::Lead.to_string(), "Lead");
    }

    #[test]
    fn test_text_defaults_and_string_forms() {
        let record = raw(json!({"email": "a@b.c", "phone": 5551234, "gender": null}));
        assert_eq!(record.text("email"), "a@b.c");
        assert_eq!(record.text("phone"), "5551234");
        assert_eq!(record.text("gender"), "");
        assert_eq!(record.text("department"), "");
    }

    #[test]
    fn test_integer_coercion() {
        let record = raw(json!({
            "a": 7, "b": "12", "c": 4.9, "d": " 8 ", "e": "3.0", "f": true, "g": null
        }));
        assert_eq!(record.integer("a").unwrap(), 7);
        assert_eq!(record.integer("b").unwrap(), 12);
        assert_eq!(record.integer("c").unwrap(), 4);
        assert_eq!(record.integer("d").unwrap(), 8);
        assert_eq!(record.integer("e").unwrap(), 3);
        assert_eq!(record.integer("f").unwrap(), 1);
        assert_eq!(record.integer("g").unwrap(), 0);
        assert_eq!(record.integer("missing").unwrap(), 0);
    }

    #[test]
    fn test_integer_coercion_failures() {
        let record = raw(json!({"a": "ten", "b": [1], "c": {"x": 1}, "d": "", "e": "4.5"}));
        for key in ["a", "b", "c", "d", "e"] {
            match record.integer(key) {
                Err(EtlError::RecordCoercionError { field, .. }) => assert_eq!(field, key),
                other => panic!("expected coercion error for {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_integer_out_of_range_is_rejected() {
        let record = raw(json!({
            "salary": 9223372036854775808u64,
            "age": "9223372036854775808",
            "years_of_experience": 1e300,
            "bonus": i64::MIN
        }));
        assert!(record.integer("salary").is_err());
        assert!(record.integer("age").is_err());
        assert!(record.integer("years_of_experience").is_err());
        assert_eq!(record.integer("bonus").unwrap(), i64::MIN);
    }

    #[test]
    fn test_non_object_is_not_a_raw_record() {
        assert!(RawRecord::try_from(json!("just a string")).is_err());
        assert!(RawRecord::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_raw_record_set_columns_follow_first_appearance() {
        let items = vec![
            json!({"id": 1, "first_name": "Ann", "score": 1}),
            json!({"id": 2, "last_name": "Lee", "score": 2.5, "active": true}),
            json!("not an object"),
        ];
        let set = RecordSet::from_raw(&items);

        let names: Vec<&str> = set.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "first_name", "score", "last_name", "active"]);

        let kinds: Vec<ColumnKind> = set.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Integer,
                ColumnKind::Text,
                ColumnKind::Float,
                ColumnKind::Text,
                ColumnKind::Boolean
            ]
        );
        assert_eq!(set.len(), 3);
        assert!(set.cell(2, "id").is_none());
    }

    #[test]
    fn test_canonical_record_set_uses_fixed_columns() {
        let set = RecordSet::from_canonical(&[]).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.columns().len(), 10);
        assert_eq!(set.columns()[0].name, "Full Name");
        assert_eq!(set.columns()[9].name, "designation");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("parquet".parse::<OutputFormat>().unwrap(), OutputFormat::Parquet);
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
