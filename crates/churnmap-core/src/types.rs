use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Author name used when a commit carries no usable author.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// A single file change within a commit.
///
/// Binary changes have no measurable line counts and never appear here;
/// the history miner drops them.
///
/// # Examples
///
/// ```
/// use churnmap_core::FileChange;
///
/// let change = FileChange::new("src/core.clj", 10, 3);
/// assert_eq!(change.churn(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// File path relative to repo root.
    pub path: String,
    /// Lines added.
    pub added: u64,
    /// Lines deleted.
    pub deleted: u64,
}

impl FileChange {
    /// Create a file change record.
    pub fn new(path: impl Into<String>, added: u64, deleted: u64) -> Self {
        Self {
            path: path.into(),
            added,
            deleted,
        }
    }

    /// Lines added plus lines deleted.
    pub fn churn(&self) -> u64 {
        self.added + self.deleted
    }
}

/// A normalized commit record: the input of every metrics component.
///
/// `date_day` is the UTC calendar date of `date` in `YYYY-MM-DD` form, so
/// string comparison orders days chronologically.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use churnmap_core::{Commit, FileChange};
///
/// let date = DateTime::parse_from_rfc3339("2024-03-01T23:30:00-05:00").unwrap();
/// let commit = Commit::new("abc123", "alice", "alice@example.com", date, vec![
///     FileChange::new("src/app.clj", 4, 1),
/// ]);
/// assert_eq!(commit.date_day, "2024-03-02");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash.
    pub sha: String,
    /// Author name, after alias resolution.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Commit timestamp with its original offset.
    pub date: DateTime<FixedOffset>,
    /// Calendar day used for all day-bucketed aggregation.
    pub date_day: String,
    /// Files modified in this commit.
    pub files: Vec<FileChange>,
}

impl Commit {
    /// Build a commit, deriving `date_day` from `date`.
    ///
    /// A blank author becomes [`UNKNOWN_AUTHOR`].
    pub fn new(
        sha: impl Into<String>,
        author: impl Into<String>,
        email: impl Into<String>,
        date: DateTime<FixedOffset>,
        files: Vec<FileChange>,
    ) -> Self {
        let author = author.into();
        let author = if author.trim().is_empty() {
            UNKNOWN_AUTHOR.to_string()
        } else {
            author
        };

        Self {
            sha: sha.into(),
            author,
            email: email.into(),
            date,
            date_day: day_of(&date),
            files,
        }
    }

    /// Author name, falling back to [`UNKNOWN_AUTHOR`] when blank.
    pub fn author_or_unknown(&self) -> &str {
        if self.author.trim().is_empty() {
            UNKNOWN_AUTHOR
        } else {
            &self.author
        }
    }
}

fn day_of(date: &DateTime<FixedOffset>) -> String {
    date.with_timezone(&Utc).format("%Y-%m-%d").to_string()
}

/// Structural complexity of one named top-level definition.
///
/// # Examples
///
/// ```
/// use churnmap_core::ComplexityRecord;
///
/// let rec = ComplexityRecord {
///     path: "src/app/core.clj".into(),
///     function_name: "handler".into(),
///     complexity: 4,
/// };
/// assert!(rec.complexity >= 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityRecord {
    /// File path relative to repo root.
    pub path: String,
    /// Name of the definition.
    pub function_name: String,
    /// `1 +` number of decision points in the definition.
    pub complexity: u32,
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use churnmap_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with the record field names.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
