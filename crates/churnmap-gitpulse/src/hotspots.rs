//! Per-file churn hotspots.
//!
//! Ranks every touched file by how often and how much it changes. The
//! resulting order is the "hotness" order that coupling, staleness and
//! rollup selections depend on, so ties are broken down to the path.

use std::collections::{HashMap, HashSet};

use churnmap_core::Commit;
use serde::{Deserialize, Serialize};

/// A file ranked by change frequency and churn.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::hotspots::Hotspot;
///
/// let h = Hotspot {
///     path: "src/app/core.clj".into(),
///     change_count: 10,
///     churn_lines: 500,
///     last_touched_at: "2024-04-02".into(),
/// };
/// assert!(h.change_count > 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotspot {
    /// File path relative to repo root.
    pub path: String,
    /// Number of commits touching this file.
    pub change_count: u32,
    /// Lines added + deleted across all touches.
    pub churn_lines: u64,
    /// Latest `date_day` of any touch.
    pub last_touched_at: String,
}

#[derive(Default)]
struct Accumulator {
    change_count: u32,
    churn_lines: u64,
    last_touched_at: String,
}

/// Aggregate the commit stream into one [`Hotspot`] per touched path.
///
/// Sorted by `change_count` descending, then `churn_lines` descending,
/// then `path` ascending. A path listed twice in one commit counts as one
/// change but both churn figures are summed.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use churnmap_core::{Commit, FileChange};
/// use churnmap_gitpulse::hotspots::compute_hotspots;
///
/// let date = DateTime::parse_from_rfc3339("2024-01-05T10:00:00Z").unwrap();
/// let commits = vec![Commit::new("abc", "alice", "a@e.com", date, vec![
///     FileChange::new("a.clj", 5, 1),
///     FileChange::new("b.clj", 2, 0),
/// ])];
/// let hotspots = compute_hotspots(&commits);
/// assert_eq!(hotspots.len(), 2);
/// assert_eq!(hotspots[0].path, "a.clj");
/// assert_eq!(hotspots[0].churn_lines, 6);
/// ```
pub fn compute_hotspots(commits: &[Commit]) -> Vec<Hotspot> {
    let mut stats: HashMap<&str, Accumulator> = HashMap::new();

    for commit in commits {
        let mut seen: HashSet<&str> = HashSet::new();
        for file in &commit.files {
            let acc = stats.entry(file.path.as_str()).or_default();
            if seen.insert(file.path.as_str()) {
                acc.change_count += 1;
            }
            acc.churn_lines += file.churn();
            if commit.date_day > acc.last_touched_at {
                acc.last_touched_at.clone_from(&commit.date_day);
            }
        }
    }

    let mut hotspots: Vec<Hotspot> = stats
        .into_iter()
        .map(|(path, acc)| Hotspot {
            path: path.to_string(),
            change_count: acc.change_count,
            churn_lines: acc.churn_lines,
            last_touched_at: acc.last_touched_at,
        })
        .collect();

    hotspots.sort_by(|a, b| {
        b.change_count
            .cmp(&a.change_count)
            .then_with(|| b.churn_lines.cmp(&a.churn_lines))
            .then_with(|| a.path.cmp(&b.path))
    });

    tracing::debug!(files = hotspots.len(), "computed hotspots");
    hotspots
}

/// Touch counts keyed by path, for support and scoring lookups.
pub fn touch_counts(hotspots: &[Hotspot]) -> HashMap<&str, u32> {
    hotspots
        .iter()
        .map(|h| (h.path.as_str(), h.change_count))
        .collect()
}
