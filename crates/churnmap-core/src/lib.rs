//! Core types, configuration, and error handling for churnmap.
//!
//! This crate provides the shared foundation used by all other churnmap crates:
//! - [`ChurnmapError`]: unified error type built with `thiserror`
//! - [`ChurnmapConfig`]: configuration loaded from `.churnmap.toml`
//! - Shared types: [`Commit`], [`FileChange`], [`ComplexityRecord`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{
    ChurnmapConfig, CouplingConfig, FilterConfig, HistoryConfig, RiskConfig, RollupConfig,
};
pub use error::ChurnmapError;
pub use types::{Commit, ComplexityRecord, FileChange, OutputFormat, UNKNOWN_AUTHOR};
