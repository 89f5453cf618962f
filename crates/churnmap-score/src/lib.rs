//! Scoring and orchestration for churnmap.
//!
//! - [`normalize`] min-max scales a series into `[0, 1]`
//! - [`risk`] blends churn, complexity and ownership dispersion into one score
//! - [`pipeline`] runs every analysis over a commit stream into a [`MetricsReport`]

pub mod normalize;
pub mod pipeline;
pub mod risk;

pub use pipeline::{run_pipeline, MetricsReport};
pub use risk::{score_risk, RiskRow, RiskWeights};
