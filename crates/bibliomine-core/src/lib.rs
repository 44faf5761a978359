//! Bibliomine core: record schema, cleaning, deduplication, audits.

pub mod audit;
pub mod clean;
pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod formats;
pub mod models;
pub mod pipeline;
pub mod score;
pub mod tagging;
pub mod validate;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use models::{
    CanonicalRecord, CleanedRecord, Collision, DedupReason, MappingRow, RawRecord, SourceDb,
};
