//! File staleness: days since any touch, relative to a reference day.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::dates::days_between;
use crate::hotspots::Hotspot;

/// How long a file has gone untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessRow {
    /// File path relative to repo root.
    pub path: String,
    /// Latest day any commit touched the file.
    pub last_touched_at: String,
    /// `until_day - last_touched_at` in whole days, `None` if either is unusable.
    pub age_days: Option<i64>,
    /// Number of commits touching the file.
    pub change_count: u32,
    /// Lines added + deleted across all touches.
    pub churn_lines: u64,
}

/// Compute staleness for every hotspot against `until_day`.
///
/// Sorted by `age_days` descending with unknown ages last, then
/// `change_count` descending, then `path` ascending.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::hotspots::Hotspot;
/// use churnmap_gitpulse::staleness::compute_staleness;
///
/// let hotspots = vec![Hotspot {
///     path: "old.clj".into(),
///     change_count: 2,
///     churn_lines: 10,
///     last_touched_at: "2024-01-01".into(),
/// }];
/// let rows = compute_staleness(&hotspots, "2024-01-31");
/// assert_eq!(rows[0].age_days, Some(30));
/// ```
pub fn compute_staleness(hotspots: &[Hotspot], until_day: &str) -> Vec<StalenessRow> {
    let mut rows: Vec<StalenessRow> = hotspots
        .iter()
        .map(|h| StalenessRow {
            path: h.path.clone(),
            last_touched_at: h.last_touched_at.clone(),
            age_days: days_between(&h.last_touched_at, until_day),
            change_count: h.change_count,
            churn_lines: h.churn_lines,
        })
        .collect();

    rows.sort_by(|a, b| {
        compare_age_desc(a.age_days, b.age_days)
            .then_with(|| b.change_count.cmp(&a.change_count))
            .then_with(|| a.path.cmp(&b.path))
    });
    rows
}

/// Descending order on optional day counts, unknown treated as `-1`.
pub(crate) fn compare_age_desc(a: Option<i64>, b: Option<i64>) -> Ordering {
    b.unwrap_or(-1).cmp(&a.unwrap_or(-1))
}
