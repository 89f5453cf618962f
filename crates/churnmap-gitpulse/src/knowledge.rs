//! Knowledge loss: how long since a file's primary owner last touched it.
//!
//! A file whose top author has been away for months is harder to change
//! safely than its raw staleness suggests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dates::days_between;
use crate::hotspots::Hotspot;
use crate::ownership::OwnershipRow;
use crate::staleness::compare_age_desc;

/// Primary-owner absence for one file.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::knowledge::KnowledgeLossRow;
///
/// let row = KnowledgeLossRow {
///     path: "src/billing.clj".into(),
///     top_author: "alice".into(),
///     top1_pct: 0.9,
///     last_seen: "2023-11-02".into(),
///     loss_days: Some(210),
///     change_count: 14,
///     churn_lines: 900,
/// };
/// assert!(row.top1_pct > 0.8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeLossRow {
    /// File path relative to repo root.
    pub path: String,
    /// Author owning the largest churn share.
    pub top_author: String,
    /// That author's churn share.
    pub top1_pct: f64,
    /// Latest day the top author touched the file.
    pub last_seen: String,
    /// `until_day - last_seen` in whole days, `None` if either is unusable.
    pub loss_days: Option<i64>,
    /// Number of commits touching the file.
    pub change_count: u32,
    /// Lines added + deleted across all touches.
    pub churn_lines: u64,
}

/// Select the top owner per path: highest `churn_pct`, then highest
/// `churn_lines`, then the lexicographically smaller author.
pub fn top_owners(rows: &[OwnershipRow]) -> HashMap<&str, &OwnershipRow> {
    let mut top: HashMap<&str, &OwnershipRow> = HashMap::new();
    for row in rows {
        top.entry(row.path.as_str())
            .and_modify(|best| {
                if outranks(row, *best) {
                    *best = row;
                }
            })
            .or_insert(row);
    }
    top
}

fn outranks(candidate: &OwnershipRow, best: &OwnershipRow) -> bool {
    candidate
        .churn_pct
        .total_cmp(&best.churn_pct)
        .then_with(|| candidate.churn_lines.cmp(&best.churn_lines))
        .then_with(|| best.author.cmp(&candidate.author))
        .is_gt()
}

/// Compute knowledge loss for every hotspot that has ownership rows.
///
/// Sorted by `loss_days` descending with unknown values last, then
/// `change_count` descending, then `path` ascending.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::hotspots::Hotspot;
/// use churnmap_gitpulse::knowledge::compute_knowledge_loss;
/// use churnmap_gitpulse::ownership::OwnershipRow;
///
/// let hotspots = vec![Hotspot {
///     path: "f.clj".into(),
///     change_count: 3,
///     churn_lines: 100,
///     last_touched_at: "2024-03-01".into(),
/// }];
/// let ownership = vec![
///     OwnershipRow { path: "f.clj".into(), author: "X".into(), churn_lines: 80,
///                    churn_pct: 0.8, last_touched_at: "2024-01-01".into() },
///     OwnershipRow { path: "f.clj".into(), author: "Y".into(), churn_lines: 20,
///                    churn_pct: 0.2, last_touched_at: "2024-03-01".into() },
/// ];
/// let rows = compute_knowledge_loss(&hotspots, &ownership, "2024-03-01");
/// assert_eq!(rows[0].top_author, "X");
/// assert_eq!(rows[0].loss_days, Some(60));
/// ```
pub fn compute_knowledge_loss(
    hotspots: &[Hotspot],
    ownership: &[OwnershipRow],
    until_day: &str,
) -> Vec<KnowledgeLossRow> {
    let owners = top_owners(ownership);

    let mut rows: Vec<KnowledgeLossRow> = hotspots
        .iter()
        .filter_map(|h| {
            let owner = owners.get(h.path.as_str())?;
            Some(KnowledgeLossRow {
                path: h.path.clone(),
                top_author: owner.author.clone(),
                top1_pct: owner.churn_pct,
                last_seen: owner.last_touched_at.clone(),
                loss_days: days_between(&owner.last_touched_at, until_day),
                change_count: h.change_count,
                churn_lines: h.churn_lines,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        compare_age_desc(a.loss_days, b.loss_days)
            .then_with(|| b.change_count.cmp(&a.change_count))
            .then_with(|| a.path.cmp(&b.path))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotspots::compute_hotspots;
    use crate::ownership::compute_ownership;
    use crate::testutil::make_commit;

    fn row(author: &str, churn: u64, pct: f64) -> OwnershipRow {
        OwnershipRow {
            path: "f.clj".into(),
            author: author.into(),
            churn_lines: churn,
            churn_pct: pct,
            last_touched_at: "2024-01-01".into(),
        }
    }

    #[test]
    fn top_owner_is_x_for_eighty_twenty() {
        let commits = vec![
            make_commit("X", "2024-01-10", vec![("f.clj", 80, 0)]),
            make_commit("Y", "2024-02-20", vec![("f.clj", 20, 0)]),
        ];
        let hotspots = compute_hotspots(&commits);
        let ownership = compute_ownership(&commits);

        let rows = compute_knowledge_loss(&hotspots, &ownership, "2024-03-01");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].top_author, "X");
        assert!((rows[0].top1_pct - 0.8).abs() < 1e-9);
        assert_eq!(rows[0].last_seen, "2024-01-10");
        assert_eq!(rows[0].loss_days, Some(51));
        assert_eq!(rows[0].change_count, 2);
    }

    #[test]
    fn pct_tie_goes_to_more_churn() {
        let rows = vec![row("a", 10, 0.5), row("b", 12, 0.5)];
        let top = top_owners(&rows);
        assert_eq!(top["f.clj"].author, "b");
    }

    #[test]
    fn full_tie_goes_to_smaller_author() {
        let rows = vec![row("zoe", 10, 0.5), row("adam", 10, 0.5)];
        let top = top_owners(&rows);
        assert_eq!(top["f.clj"].author, "adam");
    }

    #[test]
    fn paths_without_owners_are_skipped() {
        let hotspots = vec![Hotspot {
            path: "orphan.clj".into(),
            change_count: 1,
            churn_lines: 1,
            last_touched_at: "2024-01-01".into(),
        }];
        assert!(compute_knowledge_loss(&hotspots, &[], "2024-02-01").is_empty());
    }

    #[test]
    fn sorted_by_loss_then_changes_then_path() {
        let commits = vec![
            make_commit("a", "2024-01-01", vec![("old.clj", 1, 0)]),
            make_commit("b", "2024-05-01", vec![("new.clj", 1, 0), ("new2.clj", 1, 0)]),
            make_commit("b", "2024-05-01", vec![("new2.clj", 1, 0)]),
        ];
        let hotspots = compute_hotspots(&commits);
        let ownership = compute_ownership(&commits);

        let rows = compute_knowledge_loss(&hotspots, &ownership, "2024-06-01");
        let order: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(order, vec!["old.clj", "new2.clj", "new.clj"]);
    }

    #[test]
    fn unparseable_reference_day_gives_none() {
        let commits = vec![make_commit("a", "2024-01-01", vec![("f.clj", 1, 0)])];
        let hotspots = compute_hotspots(&commits);
        let ownership = compute_ownership(&commits);
        let rows = compute_knowledge_loss(&hotspots, &ownership, "");
        assert_eq!(rows[0].loss_days, None);
    }
}
