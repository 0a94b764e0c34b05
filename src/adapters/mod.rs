// Adapters layer: concrete implementations for external systems (http, storage, output formats).

pub mod http;
pub mod sinks;
pub mod storage;
