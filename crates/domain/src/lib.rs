//! fleet-inspect domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `fingerprint`, `fatigue`, `observations`, `checklist`, `metrics`: pure rule engines
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Application use cases / business logic

pub mod checklist;
pub mod fatigue;
pub mod fingerprint;
pub mod metrics;
pub mod model;
pub mod observations;
pub mod ports;
pub mod usecases;

pub use checklist::summarize_checklist;
pub use fatigue::score_fatigue;
pub use fingerprint::{compute_fingerprint, compute_fingerprint_with, partition_duplicates};
pub use metrics::{activity_state, month_label};
pub use model::*;
pub use observations::categorize_observations;
pub use ports::*;
