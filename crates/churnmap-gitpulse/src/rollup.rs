//! Directory-level rollup of hotspot statistics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::hotspots::Hotspot;

/// Key used for files that live at the repository root.
pub const ROOT_DIRECTORY: &str = ".";

/// Aggregated hotspot statistics for one directory prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRow {
    /// Directory prefix, or `"."` for root-level files.
    pub directory: String,
    /// Number of distinct files under the prefix.
    pub file_count: u32,
    /// Sum of `change_count` over those files.
    pub change_count: u64,
    /// Sum of `churn_lines` over those files.
    pub churn_lines: u64,
}

/// Directory key for `path`: its first `depth` directory segments.
///
/// The file name never counts as a segment. Paths with fewer directories
/// keep what they have; paths with none map to [`ROOT_DIRECTORY`].
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::rollup::directory_key;
///
/// assert_eq!(directory_key("src/app/web/routes.clj", 2), "src/app");
/// assert_eq!(directory_key("src/core.clj", 2), "src");
/// assert_eq!(directory_key("project.clj", 2), ".");
/// ```
pub fn directory_key(path: &str, depth: usize) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let dirs = &segments[..segments.len().saturating_sub(1)];
    let keep = dirs.len().min(depth);
    if keep == 0 {
        ROOT_DIRECTORY.to_string()
    } else {
        dirs[..keep].join("/")
    }
}

/// Roll hotspots up to `depth`-segment directory prefixes.
///
/// Sorted by `change_count` descending, then `churn_lines` descending,
/// then `directory` ascending.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::hotspots::Hotspot;
/// use churnmap_gitpulse::rollup::rollup_directories;
///
/// let h = |path: &str, changes| Hotspot {
///     path: path.into(),
///     change_count: changes,
///     churn_lines: 10,
///     last_touched_at: "2024-01-01".into(),
/// };
/// let rows = rollup_directories(&[h("src/a/x.clj", 3), h("src/a/y.clj", 2), h("README.md", 1)], 2);
/// assert_eq!(rows[0].directory, "src/a");
/// assert_eq!(rows[0].file_count, 2);
/// assert_eq!(rows[0].change_count, 5);
/// ```
pub fn rollup_directories(hotspots: &[Hotspot], depth: usize) -> Vec<DirectoryRow> {
    let mut groups: HashMap<String, DirectoryRow> = HashMap::new();

    for h in hotspots {
        let key = directory_key(&h.path, depth);
        let row = groups.entry(key.clone()).or_insert_with(|| DirectoryRow {
            directory: key,
            file_count: 0,
            change_count: 0,
            churn_lines: 0,
        });
        row.file_count += 1;
        row.change_count += u64::from(h.change_count);
        row.churn_lines += h.churn_lines;
    }

    let mut rows: Vec<DirectoryRow> = groups.into_values().collect();
    rows.sort_by(|a, b| {
        b.change_count
            .cmp(&a.change_count)
            .then_with(|| b.churn_lines.cmp(&a.churn_lines))
            .then_with(|| a.directory.cmp(&b.directory))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotspot(path: &str, changes: u32, churn: u64) -> Hotspot {
        Hotspot {
            path: path.into(),
            change_count: changes,
            churn_lines: churn,
            last_touched_at: "2024-01-01".into(),
        }
    }

    #[test]
    fn key_respects_depth() {
        assert_eq!(directory_key("a/b/c/d.clj", 1), "a");
        assert_eq!(directory_key("a/b/c/d.clj", 3), "a/b/c");
        assert_eq!(directory_key("a/b/c/d.clj", 10), "a/b/c");
        assert_eq!(directory_key("a/b/c/d.clj", 0), ".");
    }

    #[test]
    fn root_files_collapse_to_dot() {
        let rows = rollup_directories(
            &[hotspot("project.clj", 2, 5), hotspot("README.md", 1, 7)],
            2,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].directory, ".");
        assert_eq!(rows[0].file_count, 2);
        assert_eq!(rows[0].change_count, 3);
        assert_eq!(rows[0].churn_lines, 12);
    }

    #[test]
    fn sorted_by_changes_then_churn_then_name() {
        let rows = rollup_directories(
            &[
                hotspot("b/x.clj", 2, 10),
                hotspot("a/x.clj", 2, 10),
                hotspot("c/x.clj", 2, 50),
                hotspot("d/x.clj", 9, 1),
            ],
            1,
        );
        let order: Vec<&str> = rows.iter().map(|r| r.directory.as_str()).collect();
        assert_eq!(order, vec!["d", "c", "a", "b"]);
    }

    #[test]
    fn totals_are_preserved() {
        let hotspots = vec![
            hotspot("src/a/x.clj", 4, 40),
            hotspot("src/b/y.clj", 3, 30),
            hotspot("test/a/z.clj", 2, 20),
            hotspot("top.clj", 1, 10),
        ];
        let rows = rollup_directories(&hotspots, 2);
        let changes: u64 = rows.iter().map(|r| r.change_count).sum();
        let churn: u64 = rows.iter().map(|r| r.churn_lines).sum();
        let files: u32 = rows.iter().map(|r| r.file_count).sum();
        assert_eq!(changes, 10);
        assert_eq!(churn, 100);
        assert_eq!(files, 4);
    }
}
