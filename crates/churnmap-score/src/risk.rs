//! Composite risk score per file.
//!
//! Three raw signals are computed for every hotspot path, min-max
//! normalized across the run, and blended with fixed weights:
//!
//! - churn: `2 * change_count + 0.001 * churn_lines`
//! - complexity: sum of function complexity in the file
//! - ownership dispersion: `1 - top owner share`

use std::collections::HashMap;

use churnmap_core::{ComplexityRecord, RiskConfig};
use churnmap_gitpulse::hotspots::Hotspot;
use churnmap_gitpulse::ownership::{top_share_by_path, OwnershipRow};
use serde::{Deserialize, Serialize};

use crate::normalize::min_max;

const CHANGE_WEIGHT: f64 = 2.0;
const LINE_WEIGHT: f64 = 0.001;

/// Blend weights for the three normalized signals.
///
/// Expected, not required, to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub churn: f64,
    pub cc: f64,
    pub ownership: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        RiskConfig::default().into()
    }
}

impl From<RiskConfig> for RiskWeights {
    fn from(config: RiskConfig) -> Self {
        Self::from(&config)
    }
}

impl From<&RiskConfig> for RiskWeights {
    fn from(config: &RiskConfig) -> Self {
        Self {
            churn: config.w_churn,
            cc: config.w_cc,
            ownership: config.w_ownership,
        }
    }
}

/// Risk score for one file, with the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRow {
    /// File path relative to repo root.
    pub path: String,
    /// Commits touching the file.
    pub change_count: u32,
    /// Total churn of the file.
    pub churn_lines: u64,
    /// Sum of function complexity in the file.
    pub cc_sum: u64,
    /// Largest ownership share, `1.0` when unknown.
    pub top1_pct: f64,
    pub churn_raw: f64,
    pub cc_raw: f64,
    pub owner_raw: f64,
    /// Normalized churn signal in `[0, 1]`.
    pub churn_score: f64,
    /// Normalized complexity signal in `[0, 1]`.
    pub cc_score: f64,
    /// Normalized ownership dispersion in `[0, 1]`.
    pub ownership_score: f64,
    /// Weighted blend of the three normalized signals.
    pub risk_score: f64,
}

/// Score every hotspot path.
///
/// Sorted by `risk_score` descending, ties by path ascending.
///
/// # Examples
///
/// ```
/// use churnmap_core::ComplexityRecord;
/// use churnmap_gitpulse::hotspots::Hotspot;
/// use churnmap_score::risk::{score_risk, RiskWeights};
///
/// let h = |path: &str, changes| Hotspot {
///     path: path.into(),
///     change_count: changes,
///     churn_lines: 100,
///     last_touched_at: "2024-01-01".into(),
/// };
/// let complexity = vec![ComplexityRecord {
///     path: "a.clj".into(),
///     function_name: "f".into(),
///     complexity: 7,
/// }];
/// let rows = score_risk(&[h("a.clj", 9), h("b.clj", 1)], &complexity, &[], &RiskWeights::default());
/// assert_eq!(rows[0].path, "a.clj");
/// assert!((rows[0].risk_score - 0.80).abs() < 1e-9);
/// assert_eq!(rows[1].risk_score, 0.0);
/// ```
pub fn score_risk(
    hotspots: &[Hotspot],
    complexity: &[ComplexityRecord],
    ownership: &[OwnershipRow],
    weights: &RiskWeights,
) -> Vec<RiskRow> {
    let mut cc_by_path: HashMap<&str, u64> = HashMap::new();
    for record in complexity {
        *cc_by_path.entry(record.path.as_str()).or_insert(0) += u64::from(record.complexity);
    }
    let top_share = top_share_by_path(ownership);

    let mut rows: Vec<RiskRow> = hotspots
        .iter()
        .map(|h| {
            let cc_sum = cc_by_path.get(h.path.as_str()).copied().unwrap_or(0);
            let top1_pct = top_share.get(h.path.as_str()).copied().unwrap_or(1.0);
            RiskRow {
                path: h.path.clone(),
                change_count: h.change_count,
                churn_lines: h.churn_lines,
                cc_sum,
                top1_pct,
                churn_raw: CHANGE_WEIGHT * f64::from(h.change_count)
                    + LINE_WEIGHT * h.churn_lines as f64,
                cc_raw: cc_sum as f64,
                owner_raw: 1.0 - top1_pct,
                churn_score: 0.0,
                cc_score: 0.0,
                ownership_score: 0.0,
                risk_score: 0.0,
            }
        })
        .collect();

    let churn_n = min_max(&rows.iter().map(|r| r.churn_raw).collect::<Vec<_>>());
    let cc_n = min_max(&rows.iter().map(|r| r.cc_raw).collect::<Vec<_>>());
    let owner_n = min_max(&rows.iter().map(|r| r.owner_raw).collect::<Vec<_>>());

    for (i, row) in rows.iter_mut().enumerate() {
        row.churn_score = churn_n[i];
        row.cc_score = cc_n[i];
        row.ownership_score = owner_n[i];
        row.risk_score = weights.churn * row.churn_score
            + weights.cc * row.cc_score
            + weights.ownership * row.ownership_score;
    }

    rows.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| a.path.cmp(&b.path))
    });

    tracing::debug!(rows = rows.len(), "scored risk");
    rows
}
