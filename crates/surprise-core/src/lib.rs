#![doc(issue_tracker_base_url = "https://github.com/factordynamics/surprise/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Shared building blocks for the surprise pipeline.
//!
//! The pipeline runs in three stages that only talk to each other through
//! files on disk: ingest (historical prices to lagged returns), merge (returns
//! joined onto the economic-event tables) and model (gradient-boosted
//! classifier plus report). This crate holds what every stage needs: the
//! error type, the per-asset [`ReturnTable`], the [`RejectionLog`] and the
//! declarative [`PipelineConfig`].

/// The version of the surprise-core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the join key column shared by main tables and return tables.
pub const DATE_KEY: &str = "Data";

/// Prefix of every lagged-return column added by the merge stage.
pub const RETURN_PREFIX: &str = "lagged_return_";

pub mod config;
pub mod error;
pub mod reader;
pub mod rejection;
pub mod types;

pub use config::{
    BoosterParams, ColumnRef, DecimalConvention, ImportanceConfig, IngestConfig, MainTableConfig,
    MergeConfig, ModelConfig, PipelineConfig, SourceConfig, SourceSchema,
};
pub use error::{Result, SurpriseError};
pub use reader::{RawTable, decode_text};
pub use rejection::{Field, Rejection, RejectionLog};
pub use types::{Date, ReturnTable};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
