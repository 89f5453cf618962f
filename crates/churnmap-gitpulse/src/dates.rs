//! Calendar-day helpers shared by the staleness and knowledge-loss views.
//!
//! Days travel through the pipeline as `YYYY-MM-DD` strings. Parsing only
//! happens when an elapsed-day count is needed, and a bad string degrades to
//! `None` instead of failing the run.

use chrono::NaiveDate;
use churnmap_core::Commit;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` day string.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::dates::parse_day;
///
/// assert!(parse_day("2024-02-29").is_some());
/// assert!(parse_day("2023-02-29").is_none());
/// assert!(parse_day("").is_none());
/// ```
pub fn parse_day(day: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(day.trim(), DAY_FORMAT).ok()
}

/// Whole days from `earlier` to `later`.
///
/// Returns `None` if either day is empty or unparseable.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::dates::days_between;
///
/// assert_eq!(days_between("2024-01-01", "2024-03-01"), Some(60));
/// assert_eq!(days_between("2024-01-01", ""), None);
/// ```
pub fn days_between(earlier: &str, later: &str) -> Option<i64> {
    let earlier = parse_day(earlier)?;
    let later = parse_day(later)?;
    Some((later - earlier).num_days())
}

/// Resolve the reference day for elapsed-time views.
///
/// An explicit, non-blank `until` wins; otherwise the latest `date_day`
/// across `commits`; otherwise the empty string.
///
/// # Examples
///
/// ```
/// use churnmap_gitpulse::dates::reference_day;
///
/// assert_eq!(reference_day(&[], Some("2024-06-01")), "2024-06-01");
/// assert_eq!(reference_day(&[], None), "");
/// ```
pub fn reference_day(commits: &[Commit], until: Option<&str>) -> String {
    if let Some(day) = until.map(str::trim).filter(|d| !d.is_empty()) {
        return day.to_string();
    }
    commits
        .iter()
        .map(|c| c.date_day.as_str())
        .max()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::make_commit;

    #[test]
    fn days_between_counts_whole_days() {
        assert_eq!(days_between("2024-03-10", "2024-03-10"), Some(0));
        assert_eq!(days_between("2023-12-31", "2024-01-01"), Some(1));
        assert_eq!(days_between("2024-03-10", "2024-03-01"), Some(-9));
    }

    #[test]
    fn days_between_rejects_garbage() {
        assert_eq!(days_between("yesterday", "2024-01-01"), None);
        assert_eq!(days_between("2024-01-01", "2024-13-01"), None);
    }

    #[test]
    fn reference_day_defaults_to_latest_commit_day() {
        let commits = vec![
            make_commit("alice", "2024-02-01", vec![("a.clj", 1, 0)]),
            make_commit("bob", "2024-05-17", vec![("a.clj", 1, 0)]),
            make_commit("carol", "2024-03-09", vec![("b.clj", 1, 0)]),
        ];
        assert_eq!(reference_day(&commits, None), "2024-05-17");
        assert_eq!(reference_day(&commits, Some("  ")), "2024-05-17");
        assert_eq!(reference_day(&commits, Some("2025-01-01")), "2025-01-01");
    }
}
