//! Application use cases / business logic

pub mod ingest;

pub use ingest::{IngestConfig, IngestError, IngestUseCase, prepare_record};
