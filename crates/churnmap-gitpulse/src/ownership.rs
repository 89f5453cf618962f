//! Churn-weighted code ownership.
//!
//! Splits each file's churn across the authors who produced it. The share of
//! the top author drives the ownership-dispersion risk signal and the
//! knowledge-loss view.

use std::collections::HashMap;

use churnmap_core::Commit;
use serde::{Deserialize, Serialize};

/// One author's share of one file's churn.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::ownership::OwnershipRow;
///
/// let row = OwnershipRow {
///     path: "src/app/core.clj".into(),
///     author: "alice".into(),
///     churn_lines: 80,
///     churn_pct: 0.8,
///     last_touched_at: "2024-02-10".into(),
/// };
/// assert!(row.churn_pct > 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipRow {
    /// File path relative to repo root.
    pub path: String,
    /// Author name.
    pub author: String,
    /// Lines added + deleted by this author in this file.
    pub churn_lines: u64,
    /// `churn_lines / total file churn`, in `[0, 1]`.
    pub churn_pct: f64,
    /// Latest day this author touched this file.
    pub last_touched_at: String,
}

/// Aggregate the commit stream into one [`OwnershipRow`] per (path, author).
///
/// The file total is floored to 1, so a file with zero churn yields
/// `churn_pct == 0.0` for every author instead of NaN. Sorted by `path`
/// ascending, then `churn_lines` descending, then `author` ascending.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use churnmap_core::{Commit, FileChange};
/// use churnmap_gitpulse::ownership::compute_ownership;
///
/// let date = DateTime::parse_from_rfc3339("2024-01-05T10:00:00Z").unwrap();
/// let commits = vec![
///     Commit::new("a1", "alice", "a@e.com", date, vec![FileChange::new("m.clj", 30, 0)]),
///     Commit::new("b1", "bob", "b@e.com", date, vec![FileChange::new("m.clj", 10, 0)]),
/// ];
/// let rows = compute_ownership(&commits);
/// assert_eq!(rows[0].author, "alice");
/// assert!((rows[0].churn_pct - 0.75).abs() < 1e-9);
/// ```
pub fn compute_ownership(commits: &[Commit]) -> Vec<OwnershipRow> {
    // Key: (path, author) -> (churn, last day)
    let mut groups: HashMap<(&str, &str), (u64, &str)> = HashMap::new();
    let mut file_totals: HashMap<&str, u64> = HashMap::new();

    for commit in commits {
        let author = commit.author_or_unknown();
        for file in &commit.files {
            let churn = file.churn();
            let entry = groups
                .entry((file.path.as_str(), author))
                .or_insert((0, ""));
            entry.0 += churn;
            if commit.date_day.as_str() > entry.1 {
                entry.1 = commit.date_day.as_str();
            }
            *file_totals.entry(file.path.as_str()).or_default() += churn;
        }
    }

    let mut rows: Vec<OwnershipRow> = groups
        .into_iter()
        .map(|((path, author), (churn_lines, last_day))| {
            let total = file_totals.get(path).copied().unwrap_or(0).max(1);
            OwnershipRow {
                path: path.to_string(),
                author: author.to_string(),
                churn_lines,
                churn_pct: churn_lines as f64 / total as f64,
                last_touched_at: last_day.to_string(),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then_with(|| b.churn_lines.cmp(&a.churn_lines))
            .then_with(|| a.author.cmp(&b.author))
    });

    tracing::debug!(rows = rows.len(), "computed ownership");
    rows
}

/// Highest `churn_pct` per path.
///
/// Paths without ownership rows are absent; callers decide the default.
pub fn top_share_by_path(rows: &[OwnershipRow]) -> HashMap<&str, f64> {
    let mut top: HashMap<&str, f64> = HashMap::new();
    for row in rows {
        let entry = top.entry(row.path.as_str()).or_insert(0.0);
        if row.churn_pct > *entry {
            *entry = row.churn_pct;
        }
    }
    top
}
