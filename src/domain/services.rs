use crate::domain::model::{
    CanonicalRecord, Designation, RawRecord, SkippedRecord, TransformResult, INVALID_PHONE,
};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 數值欄位無法轉換時的處理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericPolicy {
    /// The record is rejected and dropped from the batch.
    #[default]
    Strict,
    /// The field falls back to 0 and a warning is logged.
    Lenient,
}

pub fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last).trim().to_string()
}

pub fn sanitize_phone(phone: String) -> String {
    if phone.contains('x') {
        INVALID_PHONE.to_string()
    } else {
        phone
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    policy: NumericPolicy,
}

impl Normalizer {
    pub fn new(policy: NumericPolicy) -> Self {
        Self { policy }
    }

    pub fn normalize(&self, raw: &RawRecord) -> Result<CanonicalRecord> {
        let years_of_experience = self.integer(raw, "years_of_experience")?;

        Ok(CanonicalRecord {
            full_name: full_name(&raw.text("first_name"), &raw.text("last_name")),
            email: raw.text("email"),
            phone: sanitize_phone(raw.text("phone")),
            gender: raw.text("gender"),
            age: self.integer(raw, "age")?,
            job_title: raw.text("job_title"),
            years_of_experience,
            salary: self.integer(raw, "salary")?,
            department: raw.text("department"),
            designation: Designation::from_years(years_of_experience),
        })
    }

    /// Normalizes every item in order. Items that fail are logged and left
    /// out; they never stop the rest of the batch.
    pub fn normalize_batch(&self, items: Vec<Value>) -> TransformResult {
        let mut result = TransformResult {
            records: Vec::with_capacity(items.len()),
            skipped: Vec::new(),
        };

        for (index, item) in items.into_iter().enumerate() {
            match RawRecord::try_from(item).and_then(|raw| self.normalize(&raw)) {
                Ok(record) => result.records.push(record),
                Err(e) => {
                    tracing::error!("❌ Skipping record #{}: {}", index, e);
                    result.skipped.push(SkippedRecord {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        result
    }

    fn integer(&self, raw: &RawRecord, key: &str) -> Result<i64> {
        match (raw.integer(key), self.policy) {
            (Ok(value), _) => Ok(value),
            (Err(e), NumericPolicy::Lenient) => {
                tracing::warn!("⚠️ {}; using 0", e);
                Ok(0)
            }
            (Err(e), NumericPolicy::Strict) => Err(e),
        }
    }
}
