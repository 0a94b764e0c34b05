pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::{JobConfig, RunConfig, ScraperConfig};

pub use adapters::storage::LocalStorage;
pub use app::pipelines::employee_pipeline::EmployeePipeline;
pub use core::{
    etl::{EtlEngine, RunOutcome, RunReport},
    writer::MultiFormatWriter,
};
pub use domain::model::{CanonicalRecord, Designation, OutputFormat, RawRecord};
pub use domain::services::{Normalizer, NumericPolicy};
pub use utils::error::{EtlError, Result};
