//! Temporal coupling detection.
//!
//! Identifies pairs of files that frequently change in the same commit,
//! which may indicate hidden dependencies or architectural coupling.
//! Pairing is restricted to the `top_k` hottest files so the work stays
//! bounded at `O(commits × top_k²)`.

use std::collections::{BTreeSet, HashMap, HashSet};

use churnmap_core::{Commit, CouplingConfig};
use serde::{Deserialize, Serialize};

use crate::hotspots::{touch_counts, Hotspot};
use crate::pairs::{canonical, index_pairs};

/// Parameters for [`analyze_coupling`].
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::coupling::CouplingOptions;
///
/// let opts = CouplingOptions::default();
/// assert_eq!(opts.min_cochange, 3);
/// assert_eq!(opts.top_k, 25);
/// assert_eq!(opts.top_n, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouplingOptions {
    /// Pairs with fewer shared commits are dropped from the ranked list.
    pub min_cochange: u32,
    /// Size of the file universe considered for pairing.
    pub top_k: usize,
    /// Length of the ranked pair list.
    pub top_n: usize,
}

impl Default for CouplingOptions {
    fn default() -> Self {
        CouplingConfig::default().into()
    }
}

impl From<CouplingConfig> for CouplingOptions {
    fn from(config: CouplingConfig) -> Self {
        Self {
            min_cochange: config.min_cochange,
            top_k: config.top_k,
            top_n: config.top_n,
        }
    }
}

impl From<&CouplingConfig> for CouplingOptions {
    fn from(config: &CouplingConfig) -> Self {
        config.clone().into()
    }
}

/// A pair of files that change together, stored once with `a < b`.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::coupling::CouplingPair;
///
/// let pair = CouplingPair {
///     a: "src/auth.clj".into(),
///     b: "src/session.clj".into(),
///     co_change_count: 15,
///     support_pct: 0.75,
/// };
/// assert!(pair.a < pair.b);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingPair {
    /// Lexicographically smaller path.
    pub a: String,
    /// Lexicographically larger path.
    pub b: String,
    /// Number of commits touching both files.
    pub co_change_count: u32,
    /// `co_change_count / min(touch(a), touch(b))`.
    pub support_pct: f64,
}

/// One direction of a ranked pair, for per-file lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingEdge {
    /// File being looked up.
    pub path: String,
    /// File it is coupled to.
    pub other: String,
    /// Number of commits touching both files.
    pub co_change_count: u32,
    /// Support of the underlying pair.
    pub support_pct: f64,
}

/// One cell of the symmetric co-change heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCell {
    /// Row file.
    pub row: String,
    /// Column file.
    pub col: String,
    /// Number of commits touching both files.
    pub co_change_count: u32,
}

/// Everything the coupling engine produces for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouplingAnalysis {
    /// The `top_k` hottest paths, in hotness order.
    pub universe: Vec<String>,
    /// Ranked pairs passing `min_cochange`, truncated to `top_n`.
    pub pairs: Vec<CouplingPair>,
    /// Each ranked pair in both directions, `(a, b)` then `(b, a)`.
    pub edges: Vec<CouplingEdge>,
    /// Every co-changing pair inside the universe in both directions,
    /// unfiltered by `min_cochange` and `top_n`, sorted by row then column.
    pub matrix: Vec<MatrixCell>,
}

/// Detect temporal coupling between the hottest files.
///
/// `hotspots` must be in the order produced by
/// [`compute_hotspots`](crate::hotspots::compute_hotspots); its first
/// `top_k` paths form the universe. Files outside the universe never appear
/// in any output, however often they co-change.
///
/// Ranked pairs are sorted by `co_change_count` descending, then
/// `support_pct` descending, then `a` and `b` ascending.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use churnmap_core::{Commit, FileChange};
/// use churnmap_gitpulse::coupling::{analyze_coupling, CouplingOptions};
/// use churnmap_gitpulse::hotspots::compute_hotspots;
///
/// let date = DateTime::parse_from_rfc3339("2024-01-05T10:00:00Z").unwrap();
/// let commit = Commit::new("abc", "alice", "a@e.com", date, vec![
///     FileChange::new("a.clj", 5, 0),
///     FileChange::new("b.clj", 3, 0),
/// ]);
/// let commits = vec![commit.clone(), commit];
/// let hotspots = compute_hotspots(&commits);
/// let opts = CouplingOptions { min_cochange: 2, ..CouplingOptions::default() };
/// let analysis = analyze_coupling(&commits, &hotspots, &opts);
/// assert_eq!(analysis.pairs.len(), 1);
/// assert_eq!(analysis.pairs[0].co_change_count, 2);
/// ```
pub fn analyze_coupling(
    commits: &[Commit],
    hotspots: &[Hotspot],
    options: &CouplingOptions,
) -> CouplingAnalysis {
    let universe: Vec<&str> = hotspots
        .iter()
        .take(options.top_k)
        .map(|h| h.path.as_str())
        .collect();
    if universe.is_empty() {
        return CouplingAnalysis::default();
    }
    let members: HashSet<&str> = universe.iter().copied().collect();
    let touches = touch_counts(hotspots);

    // Counters are created on first co-occurrence, so zero-count pairs never exist.
    let mut co_changes: HashMap<(&str, &str), u32> = HashMap::new();
    for commit in commits {
        let files: Vec<&str> = commit
            .files
            .iter()
            .map(|f| f.path.as_str())
            .filter(|p| members.contains(p))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for (i, j) in index_pairs(files.len()) {
            *co_changes.entry(canonical(files[i], files[j])).or_default() += 1;
        }
    }

    let support = |a: &str, b: &str, count: u32| -> f64 {
        let touch_a = touches.get(a).copied().unwrap_or(0).max(1);
        let touch_b = touches.get(b).copied().unwrap_or(0).max(1);
        count as f64 / touch_a.min(touch_b) as f64
    };

    let mut pairs: Vec<CouplingPair> = co_changes
        .iter()
        .filter(|(_, count)| **count >= options.min_cochange)
        .map(|(&(a, b), &count)| CouplingPair {
            a: a.to_string(),
            b: b.to_string(),
            co_change_count: count,
            support_pct: support(a, b, count),
        })
        .collect();

    pairs.sort_by(|x, y| {
        y.co_change_count
            .cmp(&x.co_change_count)
            .then_with(|| y.support_pct.total_cmp(&x.support_pct))
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });
    pairs.truncate(options.top_n);

    let edges = pairs
        .iter()
        .flat_map(|p| {
            [
                CouplingEdge {
                    path: p.a.clone(),
                    other: p.b.clone(),
                    co_change_count: p.co_change_count,
                    support_pct: p.support_pct,
                },
                CouplingEdge {
                    path: p.b.clone(),
                    other: p.a.clone(),
                    co_change_count: p.co_change_count,
                    support_pct: p.support_pct,
                },
            ]
        })
        .collect();

    let mut matrix: Vec<MatrixCell> = co_changes
        .iter()
        .filter(|((a, b), _)| members.contains(a) && members.contains(b))
        .flat_map(|(&(a, b), &count)| {
            [
                MatrixCell {
                    row: a.to_string(),
                    col: b.to_string(),
                    co_change_count: count,
                },
                MatrixCell {
                    row: b.to_string(),
                    col: a.to_string(),
                    co_change_count: count,
                },
            ]
        })
        .collect();
    matrix.sort_by(|x, y| x.row.cmp(&y.row).then_with(|| x.col.cmp(&y.col)));

    tracing::debug!(
        universe = universe.len(),
        counted = co_changes.len(),
        ranked = pairs.len(),
        "computed temporal coupling"
    );

    CouplingAnalysis {
        universe: universe.into_iter().map(str::to_string).collect(),
        pairs,
        edges,
        matrix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotspots::compute_hotspots;
    use crate::testutil::touch;

    fn run(commits: &[Commit], options: CouplingOptions) -> CouplingAnalysis {
        let hotspots = compute_hotspots(commits);
        analyze_coupling(commits, &hotspots, &options)
    }

    fn opts(min_cochange: u32, top_k: usize, top_n: usize) -> CouplingOptions {
        CouplingOptions {
            min_cochange,
            top_k,
            top_n,
        }
    }

    #[test]
    fn three_file_scenario_keeps_only_ab() {
        let commits = vec![
            touch(&["A", "B"]),
            touch(&["A", "B"]),
            touch(&["A", "C"]),
            touch(&["B", "C"]),
        ];

        let analysis = run(&commits, opts(2, 3, 100));
        assert_eq!(analysis.pairs.len(), 1);
        assert_eq!(analysis.pairs[0].a, "A");
        assert_eq!(analysis.pairs[0].b, "B");
        assert_eq!(analysis.pairs[0].co_change_count, 2);
        // touch(A) = 3, touch(B) = 3
        assert!((analysis.pairs[0].support_pct - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn matrix_ignores_min_cochange() {
        let commits = vec![
            touch(&["A", "B"]),
            touch(&["A", "B"]),
            touch(&["A", "C"]),
            touch(&["B", "C"]),
        ];

        let analysis = run(&commits, opts(2, 3, 100));
        // AB, AC, BC in both directions.
        assert_eq!(analysis.matrix.len(), 6);
        let ac = analysis
            .matrix
            .iter()
            .find(|c| c.row == "C" && c.col == "A")
            .unwrap();
        assert_eq!(ac.co_change_count, 1);
    }

    #[test]
    fn matrix_ignores_top_n() {
        let commits = vec![
            touch(&["a", "b"]),
            touch(&["a", "b"]),
            touch(&["a", "b"]),
            touch(&["c", "d"]),
            touch(&["c", "d"]),
            touch(&["a", "c"]),
        ];

        let analysis = run(&commits, opts(1, 10, 1));
        assert_eq!(analysis.pairs.len(), 1);
        assert_eq!(analysis.edges.len(), 2);

        let cells: Vec<(&str, &str, u32)> = analysis
            .matrix
            .iter()
            .map(|c| (c.row.as_str(), c.col.as_str(), c.co_change_count))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("a", "b", 3),
                ("a", "c", 1),
                ("b", "a", 3),
                ("c", "a", 1),
                ("c", "d", 2),
                ("d", "c", 2),
            ]
        );
    }

    #[test]
    fn matrix_is_symmetric() {
        let commits = vec![
            touch(&["x.clj", "y.clj", "z.clj"]),
            touch(&["y.clj", "z.clj"]),
            touch(&["x.clj", "w.clj"]),
        ];

        let analysis = run(&commits, opts(1, 10, 100));
        for cell in &analysis.matrix {
            let mirror = analysis
                .matrix
                .iter()
                .find(|c| c.row == cell.col && c.col == cell.row)
                .expect("mirror cell");
            assert_eq!(mirror.co_change_count, cell.co_change_count);
        }
    }

    #[test]
    fn pairs_are_canonical_and_unique() {
        let commits = vec![
            touch(&["z.clj", "a.clj"]),
            touch(&["a.clj", "z.clj"]),
            touch(&["m.clj", "a.clj", "z.clj"]),
        ];

        let analysis = run(&commits, opts(1, 10, 100));
        for p in &analysis.pairs {
            assert!(p.a < p.b);
            assert!(!analysis
                .pairs
                .iter()
                .any(|q| q.a == p.b && q.b == p.a));
        }
        let az = analysis
            .pairs
            .iter()
            .find(|p| p.a == "a.clj" && p.b == "z.clj")
            .unwrap();
        assert_eq!(az.co_change_count, 3);
    }

    #[test]
    fn files_outside_universe_never_pair() {
        // cold.clj co-changes with hot.clj but is not among the top 2.
        let commits = vec![
            touch(&["hot.clj", "warm.clj"]),
            touch(&["hot.clj", "warm.clj"]),
            touch(&["hot.clj", "warm.clj", "cold.clj"]),
        ];

        let analysis = run(&commits, opts(1, 2, 100));
        assert_eq!(analysis.universe, vec!["hot.clj", "warm.clj"]);
        assert!(analysis
            .pairs
            .iter()
            .all(|p| p.a != "cold.clj" && p.b != "cold.clj"));
        assert!(analysis
            .matrix
            .iter()
            .all(|c| c.row != "cold.clj" && c.col != "cold.clj"));
    }

    #[test]
    fn never_co_changed_files_do_not_appear() {
        let commits = vec![touch(&["a.clj"]), touch(&["b.clj"])];
        let analysis = run(&commits, opts(1, 10, 100));
        assert!(analysis.pairs.is_empty());
        assert!(analysis.matrix.is_empty());
        assert_eq!(analysis.universe.len(), 2);
    }

    #[test]
    fn ranking_and_truncation() {
        let commits = vec![
            touch(&["a", "b"]),
            touch(&["a", "b"]),
            touch(&["a", "b"]),
            touch(&["c", "d"]),
            touch(&["c", "d"]),
            touch(&["e", "f"]),
            touch(&["e", "f"]),
            touch(&["e"]),
        ];

        let analysis = run(&commits, opts(1, 10, 2));
        assert_eq!(analysis.pairs.len(), 2);
        assert_eq!((analysis.pairs[0].a.as_str(), analysis.pairs[0].b.as_str()), ("a", "b"));
        // c-d and e-f both co-change twice with support 1.0; `a` ascending decides.
        assert_eq!(analysis.pairs[1].a, "c");
    }

    #[test]
    fn support_uses_smaller_touch_count() {
        let commits = vec![
            touch(&["a", "b"]),
            touch(&["a", "b"]),
            touch(&["a"]),
            touch(&["a"]),
        ];

        let analysis = run(&commits, opts(1, 10, 10));
        // touch(a) = 4, touch(b) = 2
        assert!((analysis.pairs[0].support_pct - 1.0).abs() < 1e-9);
    }

    #[test]
    fn edges_expand_each_pair_both_ways() {
        let commits = vec![touch(&["a", "b"]), touch(&["a", "b"])];
        let analysis = run(&commits, opts(1, 10, 10));
        assert_eq!(analysis.edges.len(), 2);
        assert_eq!(analysis.edges[0].path, "a");
        assert_eq!(analysis.edges[0].other, "b");
        assert_eq!(analysis.edges[1].path, "b");
        assert_eq!(analysis.edges[1].other, "a");
    }

    #[test]
    fn duplicate_path_in_commit_does_not_self_pair() {
        let mut commit = touch(&["a", "b"]);
        commit.files.push(churnmap_core::FileChange::new("a", 1, 1));
        let analysis = run(&[commit], opts(1, 10, 10));
        assert_eq!(analysis.pairs.len(), 1);
        assert_eq!(analysis.pairs[0].co_change_count, 1);
    }

    #[test]
    fn zero_top_k_yields_empty_analysis() {
        let commits = vec![touch(&["a", "b"])];
        assert_eq!(run(&commits, opts(1, 0, 10)), CouplingAnalysis::default());
    }
}
