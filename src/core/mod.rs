pub mod etl;
pub mod writer;

pub use crate::domain::model::{CanonicalRecord, RawRecord, RecordSet, TransformResult, WriteReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
