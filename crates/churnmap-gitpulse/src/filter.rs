//! Commit-stream pre-processing: author aliases and exclusions.
//!
//! Applied once between mining and analysis, so every metric sees the same
//! canonical authors and the same set of paths.

use std::collections::HashMap;

use churnmap_core::{Commit, FilterConfig};

/// Alias and exclusion rules compiled from [`FilterConfig`].
///
/// # Examples
///
/// ```
/// use churnmap_core::FilterConfig;
/// use churnmap_gitpulse::filter::CommitFilter;
///
/// let config = FilterConfig {
///     exclude_paths: vec!["vendor/**".into()],
///     ..FilterConfig::default()
/// };
/// let filter = CommitFilter::from_config(&config);
/// assert!(filter.is_excluded_path("vendor/lib/x.clj"));
/// assert!(!filter.is_excluded_path("src/x.clj"));
/// ```
#[derive(Debug, Default)]
pub struct CommitFilter {
    exclude_paths: Vec<glob::Pattern>,
    exclude_commits: Vec<String>,
    author_aliases: HashMap<String, String>,
}

/// Counts of what [`CommitFilter::apply`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Commits dropped by sha.
    pub excluded_commits: usize,
    /// File changes dropped by path pattern.
    pub excluded_files: usize,
    /// Commits dropped because no files remained.
    pub emptied_commits: usize,
    /// Commits whose author was rewritten.
    pub aliased_authors: usize,
}

impl CommitFilter {
    /// Compile a filter from configuration.
    ///
    /// Invalid glob patterns are skipped with a warning.
    pub fn from_config(config: &FilterConfig) -> Self {
        let mut exclude_paths = Vec::new();
        for pat in &config.exclude_paths {
            match glob::Pattern::new(pat) {
                Ok(p) => exclude_paths.push(p),
                Err(e) => tracing::warn!(pattern = %pat, error = %e, "ignoring invalid exclude pattern"),
            }
        }

        Self {
            exclude_paths,
            exclude_commits: config
                .exclude_commits
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            author_aliases: config.author_aliases.clone(),
        }
    }

    /// Check whether a file path matches any exclusion pattern.
    pub fn is_excluded_path(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|p| p.matches(path))
    }

    /// Check whether a commit sha starts with any excluded prefix.
    pub fn is_excluded_commit(&self, sha: &str) -> bool {
        let sha = sha.to_lowercase();
        self.exclude_commits
            .iter()
            .any(|prefix| sha.starts_with(prefix.as_str()))
    }

    /// Canonical author for a name/email pair. Name aliases win over email aliases.
    pub fn resolve_author(&self, name: &str, email: &str) -> Option<&str> {
        self.author_aliases
            .get(name)
            .or_else(|| self.author_aliases.get(email))
            .map(String::as_str)
    }

    /// Apply every rule to `commits`, preserving order.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use chrono::DateTime;
    /// use churnmap_core::{Commit, FileChange, FilterConfig};
    /// use churnmap_gitpulse::filter::CommitFilter;
    ///
    /// let date = DateTime::parse_from_rfc3339("2024-01-05T10:00:00Z").unwrap();
    /// let commits = vec![Commit::new("abc", "al", "al@e.com", date, vec![
    ///     FileChange::new("src/a.clj", 1, 0),
    ///     FileChange::new("Cargo.lock", 90, 90),
    /// ])];
    /// let config = FilterConfig {
    ///     exclude_paths: vec!["*.lock".into()],
    ///     author_aliases: HashMap::from([("al".to_string(), "Alice".to_string())]),
    ///     ..FilterConfig::default()
    /// };
    /// let (kept, stats) = CommitFilter::from_config(&config).apply(commits);
    /// assert_eq!(kept[0].author, "Alice");
    /// assert_eq!(kept[0].files.len(), 1);
    /// assert_eq!(stats.excluded_files, 1);
    /// ```
    pub fn apply(&self, commits: Vec<Commit>) -> (Vec<Commit>, FilterStats) {
        let mut stats = FilterStats::default();
        let mut kept = Vec::with_capacity(commits.len());

        for mut commit in commits {
            if self.is_excluded_commit(&commit.sha) {
                stats.excluded_commits += 1;
                continue;
            }

            if let Some(alias) = self.resolve_author(&commit.author, &commit.email) {
                if alias != commit.author {
                    commit.author = alias.to_string();
                    stats.aliased_authors += 1;
                }
            }

            let before = commit.files.len();
            commit.files.retain(|f| !self.is_excluded_path(&f.path));
            stats.excluded_files += before - commit.files.len();

            if commit.files.is_empty() {
                stats.emptied_commits += 1;
                continue;
            }
            kept.push(commit);
        }

        tracing::debug!(
            kept = kept.len(),
            excluded_commits = stats.excluded_commits,
            excluded_files = stats.excluded_files,
            emptied_commits = stats.emptied_commits,
            "filtered commit stream"
        );
        (kept, stats)
    }
}
