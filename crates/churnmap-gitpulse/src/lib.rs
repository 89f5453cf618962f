//! Git history analysis: hotspots, ownership, temporal coupling, staleness.
//!
//! Mines git history using git2 into a normalized commit stream, then derives
//! per-file churn hotspots, per-author ownership shares, co-change coupling
//! between the hottest files, file staleness, knowledge loss, and
//! directory-level rollups. Every analysis is a pure function of its inputs.

pub mod coupling;
pub mod dates;
pub mod filter;
pub mod hotspots;
pub mod knowledge;
pub mod mining;
pub mod ownership;
pub mod pairs;
pub mod rollup;
pub mod staleness;
