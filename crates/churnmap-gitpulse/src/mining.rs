//! Git history extraction via git2.
//!
//! Mines commit history from a repository into the normalized [`Commit`]
//! stream: per-file added/deleted line counts, author identity, and a
//! day bucket. Binary changes are dropped because their line counts are
//! meaningless.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use churnmap_core::{ChurnmapError, Commit, FileChange, HistoryConfig};
use git2::{DiffFindOptions, DiffOptions, Patch, Repository, Sort};

/// Options for history mining.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::mining::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert!(opts.since.is_none());
/// assert!(!opts.include_merges);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// First calendar day (UTC) to include.
    pub since: Option<NaiveDate>,
    /// Last calendar day (UTC) to include.
    pub until: Option<NaiveDate>,
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
    /// Include merge commits, diffed against their first parent.
    pub include_merges: bool,
}

impl MiningOptions {
    /// Build mining options from the `[history]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnmapError::Config`] if `since` or `until` is not a
    /// `YYYY-MM-DD` date.
    pub fn from_config(config: &HistoryConfig) -> Result<Self, ChurnmapError> {
        Ok(Self {
            since: parse_bound("since", config.since.as_deref())?,
            until: parse_bound("until", config.until.as_deref())?,
            branch: config.branch.clone(),
            include_merges: config.include_merges,
        })
    }

    fn admits(&self, day: &str) -> bool {
        let Ok(day) = NaiveDate::parse_from_str(day, "%Y-%m-%d") else {
            return false;
        };
        self.since.map_or(true, |s| day >= s) && self.until.map_or(true, |u| day <= u)
    }
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ChurnmapError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|e| {
                ChurnmapError::Config(format!("history.{name} {v:?} is not a YYYY-MM-DD date: {e}"))
            })
        })
        .transpose()
}

/// Working-tree root of the repository containing `path`.
///
/// Mined paths are relative to this directory, so source files are read
/// from here.
///
/// # Errors
///
/// Returns [`ChurnmapError::Git`] if `path` is not inside a repository, or
/// the repository is bare.
pub fn discover_workdir(path: &Path) -> Result<PathBuf, ChurnmapError> {
    let repo = Repository::discover(path)
        .map_err(|e| ChurnmapError::Git(format!("not a git repository: {e}")))?;
    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| ChurnmapError::Git("bare repositories have no working tree".into()))
}

/// Mine commit history from a git repository.
///
/// Returns commits in reverse chronological order (newest first).
///
/// # Errors
///
/// Returns [`ChurnmapError::Git`] if the repository cannot be opened or walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::{Path, PathBuf};
/// use churnmap_gitpulse::mining::{mine_history, MiningOptions};
///
/// let commits = mine_history(Path::new("."), &MiningOptions::default()).unwrap();
/// for c in &commits {
///     println!("{} {} ({} files)", c.date_day, c.author, c.files.len());
/// }
/// ```
pub fn mine_history(
    repo_path: &Path,
    options: &MiningOptions,
) -> Result<Vec<Commit>, ChurnmapError> {
    let repo = Repository::discover(repo_path)
        .map_err(|e| ChurnmapError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| ChurnmapError::Git(format!("failed to create revwalk: {e}")))?;

    revwalk
        .set_sorting(Sort::TIME)
        .map_err(|e| ChurnmapError::Git(format!("failed to sort revwalk: {e}")))?;

    if let Some(ref branch) = options.branch {
        let reference = repo
            .resolve_reference_from_short_name(branch)
            .map_err(|e| ChurnmapError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
        let oid = reference
            .target()
            .ok_or_else(|| ChurnmapError::Git("branch has no target".into()))?;
        revwalk
            .push(oid)
            .map_err(|e| ChurnmapError::Git(format!("failed to push oid: {e}")))?;
    } else {
        revwalk
            .push_head()
            .map_err(|e| ChurnmapError::Git(format!("failed to push HEAD: {e}")))?;
    }

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| ChurnmapError::Git(format!("revwalk error: {e}")))?;

        let commit = repo
            .find_commit(oid)
            .map_err(|e| ChurnmapError::Git(format!("failed to find commit: {e}")))?;

        if commit.parent_count() > 1 && !options.include_merges {
            continue;
        }

        let Some(date) = commit_date(&commit) else {
            tracing::warn!(sha = %oid, "skipping commit with out-of-range timestamp");
            continue;
        };

        let author = commit.author();
        let record = Commit::new(
            oid.to_string(),
            author.name().unwrap_or_default(),
            author.email().unwrap_or_default(),
            date,
            Vec::new(),
        );
        if !options.admits(&record.date_day) {
            continue;
        }

        let files = extract_file_changes(&repo, &commit)?;
        if files.is_empty() {
            continue;
        }

        commits.push(Commit { files, ..record });
    }

    tracing::debug!(commits = commits.len(), "mined history");
    Ok(commits)
}

fn commit_date(commit: &git2::Commit) -> Option<DateTime<FixedOffset>> {
    let time = commit.time();
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)?;
    offset.timestamp_opt(time.seconds(), 0).single()
}

fn extract_file_changes(
    repo: &Repository,
    commit: &git2::Commit,
) -> Result<Vec<FileChange>, ChurnmapError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| ChurnmapError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| ChurnmapError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| ChurnmapError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| ChurnmapError::Git(format!("failed to compute diff: {e}")))?;

    // Renames are attributed to the new path.
    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| ChurnmapError::Git(format!("failed to find renames: {e}")))?;

    let mut changes = Vec::new();
    for idx in 0..diff.deltas().len() {
        let Some(patch) = Patch::from_diff(&diff, idx)
            .map_err(|e| ChurnmapError::Git(format!("failed to build patch: {e}")))?
        else {
            continue;
        };

        let delta = patch.delta();
        if delta.flags().is_binary() {
            continue;
        }

        let Some(path) = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
        else {
            continue;
        };
        if path.is_empty() {
            continue;
        }

        let (_, added, deleted) = patch
            .line_stats()
            .map_err(|e| ChurnmapError::Git(format!("failed to count lines: {e}")))?;

        changes.push(FileChange::new(path, added as u64, deleted as u64));
    }

    Ok(changes)
}
