use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ChurnmapError;

/// Top-level configuration loaded from `.churnmap.toml`.
///
/// Every field has a default, so a partial file only overrides what it names.
/// Resolution order is CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use churnmap_core::ChurnmapConfig;
///
/// let config = ChurnmapConfig::default();
/// assert_eq!(config.coupling.min_cochange, 3);
/// assert_eq!(config.rollup.depth, 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChurnmapConfig {
    /// History mining settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Temporal coupling parameters.
    #[serde(default)]
    pub coupling: CouplingConfig,
    /// Risk score weights.
    #[serde(default)]
    pub risk: RiskConfig,
    /// Directory rollup settings.
    #[serde(default)]
    pub rollup: RollupConfig,
    /// Author alias and exclusion rules applied before analysis.
    #[serde(default)]
    pub filters: FilterConfig,
}

impl ChurnmapConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnmapError::Io`] if the file cannot be read,
    /// [`ChurnmapError::Toml`] if the content is not valid TOML, or
    /// [`ChurnmapError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use churnmap_core::ChurnmapConfig;
    /// use std::path::Path;
    ///
    /// let config = ChurnmapConfig::from_file(Path::new(".churnmap.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, ChurnmapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnmapError::Toml`] if parsing fails, or
    /// [`ChurnmapError::Config`] if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use churnmap_core::ChurnmapConfig;
    ///
    /// let toml = r#"
    /// [coupling]
    /// top_k = 40
    /// "#;
    /// let config = ChurnmapConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.coupling.top_k, 40);
    /// assert_eq!(config.coupling.top_n, 100);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ChurnmapError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnmapError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), ChurnmapError> {
        for (name, weight) in [
            ("w_churn", self.risk.w_churn),
            ("w_cc", self.risk.w_cc),
            ("w_ownership", self.risk.w_ownership),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ChurnmapError::Config(format!(
                    "risk.{name} must be a non-negative number, got {weight}"
                )));
            }
        }

        for (name, value) in [
            ("since", self.history.since.as_deref()),
            ("until", self.history.until.as_deref()),
        ] {
            if let Some(day) = value {
                if NaiveDate::parse_from_str(day, "%Y-%m-%d").is_err() {
                    return Err(ChurnmapError::Config(format!(
                        "history.{name} must be a YYYY-MM-DD date, got {day:?}"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// History mining configuration.
///
/// # Examples
///
/// ```
/// use churnmap_core::HistoryConfig;
///
/// let config = HistoryConfig::default();
/// assert!(config.since.is_none());
/// assert!(!config.include_merges);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// First calendar day to include (`YYYY-MM-DD`, inclusive).
    #[serde(default)]
    pub since: Option<String>,
    /// Last calendar day to include, also the staleness reference date.
    #[serde(default)]
    pub until: Option<String>,
    /// Branch to walk (default: HEAD).
    #[serde(default)]
    pub branch: Option<String>,
    /// Include merge commits, diffed against their first parent.
    #[serde(default)]
    pub include_merges: bool,
}

/// Temporal coupling parameters.
///
/// # Examples
///
/// ```
/// use churnmap_core::CouplingConfig;
///
/// let config = CouplingConfig::default();
/// assert_eq!(config.min_cochange, 3);
/// assert_eq!(config.top_k, 25);
/// assert_eq!(config.top_n, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingConfig {
    /// Minimum shared commits for a pair to be ranked (default: 3).
    #[serde(default = "default_min_cochange")]
    pub min_cochange: u32,
    /// Number of hottest files forming the coupling universe (default: 25).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Length of the ranked pair list (default: 100).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_min_cochange() -> u32 {
    3
}

fn default_top_k() -> usize {
    25
}

fn default_top_n() -> usize {
    100
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            min_cochange: default_min_cochange(),
            top_k: default_top_k(),
            top_n: default_top_n(),
        }
    }
}

/// Risk score weights. Expected, but not required, to sum to 1.
///
/// # Examples
///
/// ```
/// use churnmap_core::RiskConfig;
///
/// let config = RiskConfig::default();
/// let total = config.w_churn + config.w_cc + config.w_ownership;
/// assert!((total - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Weight of the normalized churn signal (default: 0.45).
    #[serde(default = "default_w_churn")]
    pub w_churn: f64,
    /// Weight of the normalized complexity signal (default: 0.35).
    #[serde(default = "default_w_cc")]
    pub w_cc: f64,
    /// Weight of the normalized ownership dispersion signal (default: 0.20).
    #[serde(default = "default_w_ownership")]
    pub w_ownership: f64,
}

fn default_w_churn() -> f64 {
    0.45
}

fn default_w_cc() -> f64 {
    0.35
}

fn default_w_ownership() -> f64 {
    0.20
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            w_churn: default_w_churn(),
            w_cc: default_w_cc(),
            w_ownership: default_w_ownership(),
        }
    }
}

/// Directory rollup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Leading directory segments kept as the rollup key (default: 2).
    #[serde(default = "default_depth")]
    pub depth: usize,
}

fn default_depth() -> usize {
    2
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
        }
    }
}

/// Author alias and exclusion rules.
///
/// # Examples
///
/// ```
/// use churnmap_core::FilterConfig;
///
/// let config = FilterConfig::default();
/// assert!(config.exclude_paths.is_empty());
/// assert!(config.author_aliases.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Glob patterns; matching file changes are dropped.
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    /// Commit sha prefixes to drop entirely.
    #[serde(default)]
    pub exclude_commits: Vec<String>,
    /// Maps an author name or email to the canonical author name.
    #[serde(default)]
    pub author_aliases: HashMap<String, String>,
}
