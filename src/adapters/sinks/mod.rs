//! Output format encoders. Each sink turns a [`RecordSet`] into the bytes of
//! one file; writing those bytes is the writer's job.

pub mod json;
pub mod columnar;
pub mod xml;

use crate::domain::model::{OutputFormat, RecordSet};
use crate::utils::error::Result;

pub use self::json::JsonSink;
pub use self::columnar::ParquetSink;
pub use self::xml::XmlSink;

pub trait Sink: Send + Sync {
    fn format(&self) -> OutputFormat;
    fn encode(&self, batch: &RecordSet) -> Result<Vec<u8>>;
}

pub fn sink_for(format: OutputFormat) -> Box<dyn Sink> {
    match format {
        OutputFormat::Json => Box::new(JsonSink),
        OutputFormat::Xml => Box::new(XmlSink),
        OutputFormat::Parquet => Box::new(ParquetSink::default()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::model::{CanonicalRecord, Designation, RecordSet};

    pub fn canonical_records() -> Vec<CanonicalRecord> {
        vec![
            CanonicalRecord {
                full_name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
                phone: "1234567890".to_string(),
                gender: "male".to_string(),
                age: 34,
                job_title: "Engineer".to_string(),
                years_of_experience: 4,
                salary: 85000,
                department: "Data".to_string(),
                designation: Designation::DataEngineer,
            },
            CanonicalRecord {
                full_name: "Jane <Roe> & Co".to_string(),
                email: String::new(),
                phone: "Invalid Number".to_string(),
                gender: "female".to_string(),
                age: 41,
                job_title: "Architect".to_string(),
                years_of_experience: 12,
                salary: 120000,
                department: "Platform".to_string(),
                designation: Designation::Lead,
            },
        ]
    }

    pub fn canonical_set() -> RecordSet {
        RecordSet::from_canonical(&canonical_records()).unwrap()
    }

    pub fn canonical_set_empty() -> RecordSet {
        RecordSet::from_canonical(&[]).unwrap()
    }
}
