//! End-to-end metrics run over one commit stream.
//!
//! Stages run in dependency order: hotspots and ownership, then coupling
//! and complexity, then risk, then staleness, knowledge loss and the
//! directory rollup. Every stage is a pure function of earlier outputs.

use std::path::Path;

use churnmap_complexity::{analyze_paths, FileFailure};
use churnmap_core::{ChurnmapConfig, Commit, ComplexityRecord};
use churnmap_gitpulse::coupling::{analyze_coupling, CouplingAnalysis, CouplingOptions};
use churnmap_gitpulse::dates::reference_day;
use churnmap_gitpulse::hotspots::{compute_hotspots, Hotspot};
use churnmap_gitpulse::knowledge::{compute_knowledge_loss, KnowledgeLossRow};
use churnmap_gitpulse::ownership::{compute_ownership, OwnershipRow};
use churnmap_gitpulse::rollup::{rollup_directories, DirectoryRow};
use churnmap_gitpulse::staleness::{compute_staleness, StalenessRow};
use serde::{Deserialize, Serialize};

use crate::risk::{score_risk, RiskRow, RiskWeights};

/// Every table produced by one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Commits in the (already filtered) input stream.
    pub commits_analyzed: usize,
    /// Day ages are measured against, `YYYY-MM-DD` or empty.
    pub reference_day: String,
    pub hotspots: Vec<Hotspot>,
    pub ownership: Vec<OwnershipRow>,
    pub coupling: CouplingAnalysis,
    pub complexity: Vec<ComplexityRecord>,
    /// Files whose complexity could not be computed.
    pub complexity_failures: Vec<FileFailure>,
    pub risk: Vec<RiskRow>,
    pub staleness: Vec<StalenessRow>,
    pub knowledge_loss: Vec<KnowledgeLossRow>,
    pub directories: Vec<DirectoryRow>,
}

/// Run every analysis over `commits`.
///
/// Complexity is computed for the hotspot paths as they exist under
/// `repo_root`. `until` overrides the reference day used for ages; without
/// it the newest commit day is used.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use chrono::DateTime;
/// use churnmap_core::{ChurnmapConfig, Commit, FileChange};
/// use churnmap_score::run_pipeline;
///
/// let date = DateTime::parse_from_rfc3339("2024-01-05T10:00:00Z").unwrap();
/// let commits = vec![Commit::new("abc", "alice", "a@e.com", date, vec![
///     FileChange::new("src/a.clj", 5, 1),
/// ])];
/// let report = run_pipeline(&commits, Path::new("."), &ChurnmapConfig::default(), Some("2024-01-15"));
/// assert_eq!(report.commits_analyzed, 1);
/// assert_eq!(report.hotspots[0].path, "src/a.clj");
/// assert_eq!(report.staleness[0].age_days, Some(10));
/// ```
pub fn run_pipeline(
    commits: &[Commit],
    repo_root: &Path,
    config: &ChurnmapConfig,
    until: Option<&str>,
) -> MetricsReport {
    let hotspots = compute_hotspots(commits);
    let ownership = compute_ownership(commits);

    let coupling = analyze_coupling(
        commits,
        &hotspots,
        &CouplingOptions::from(&config.coupling),
    );

    let candidates: Vec<String> = hotspots.iter().map(|h| h.path.clone()).collect();
    let complexity = analyze_paths(repo_root, &candidates);

    let risk = score_risk(
        &hotspots,
        &complexity.records,
        &ownership,
        &RiskWeights::from(&config.risk),
    );

    let day = reference_day(commits, until);
    let staleness = compute_staleness(&hotspots, &day);
    let knowledge_loss = compute_knowledge_loss(&hotspots, &ownership, &day);
    let directories = rollup_directories(&hotspots, config.rollup.depth);

    tracing::debug!(
        commits = commits.len(),
        hotspots = hotspots.len(),
        coupling_pairs = coupling.pairs.len(),
        functions = complexity.records.len(),
        reference_day = %day,
        "pipeline finished"
    );

    MetricsReport {
        commits_analyzed: commits.len(),
        reference_day: day,
        hotspots,
        ownership,
        coupling,
        complexity: complexity.records,
        complexity_failures: complexity.failures,
        risk,
        staleness,
        knowledge_loss,
        directories,
    }
}
