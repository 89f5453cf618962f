//! Report rendering for the `analyze` subcommand.

use std::io::{self, Write};

use churnmap_score::MetricsReport;
use clap::ValueEnum;

/// Report tables selectable with `--section`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    /// Most frequently changed files
    Hotspots,
    /// Per-author churn share of each file
    Ownership,
    /// Files that change together
    Coupling,
    /// Per-function structural complexity
    Complexity,
    /// Composite risk ranking
    Risk,
    /// Days since each file was touched
    Staleness,
    /// Days since each file's primary owner touched it
    KnowledgeLoss,
    /// Hotspots rolled up by directory
    Directories,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Hotspots,
        Section::Ownership,
        Section::Coupling,
        Section::Complexity,
        Section::Risk,
        Section::Staleness,
        Section::KnowledgeLoss,
        Section::Directories,
    ];

    fn json_keys(self) -> &'static [&'static str] {
        match self {
            Section::Hotspots => &["hotspots"],
            Section::Ownership => &["ownership"],
            Section::Coupling => &["coupling"],
            Section::Complexity => &["complexity", "complexity_failures"],
            Section::Risk => &["risk"],
            Section::Staleness => &["staleness"],
            Section::KnowledgeLoss => &["knowledge_loss"],
            Section::Directories => &["directories"],
        }
    }
}

/// Sections to print: the requested ones in canonical order, or all.
pub fn selected(requested: &[Section]) -> Vec<Section> {
    if requested.is_empty() {
        return Section::ALL.to_vec();
    }
    Section::ALL
        .into_iter()
        .filter(|s| requested.contains(s))
        .collect()
}

fn days(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |d| d.to_string())
}

fn pct(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

/// JSON document with every row of the selected tables.
///
/// # Errors
///
/// Returns the serializer error if a value cannot be encoded.
pub fn render_json(report: &MetricsReport, sections: &[Section]) -> serde_json::Result<String> {
    let serde_json::Value::Object(full) = serde_json::to_value(report)? else {
        return serde_json::to_string_pretty(report);
    };

    let mut keep = vec!["commits_analyzed", "reference_day"];
    for section in sections {
        keep.extend_from_slice(section.json_keys());
    }
    let trimmed: serde_json::Map<String, serde_json::Value> = full
        .into_iter()
        .filter(|(k, _)| keep.contains(&k.as_str()))
        .collect();
    serde_json::to_string_pretty(&serde_json::Value::Object(trimmed))
}

/// Plain-text tables, each truncated to `limit` rows.
pub fn render_text(
    out: &mut impl Write,
    report: &MetricsReport,
    sections: &[Section],
    limit: usize,
) -> io::Result<()> {
    writeln!(
        out,
        "Commits analyzed: {}  (reference day: {})\n",
        report.commits_analyzed,
        if report.reference_day.is_empty() {
            "-"
        } else {
            report.reference_day.as_str()
        }
    )?;

    for section in sections {
        match section {
            Section::Hotspots => {
                writeln!(out, "Hotspots (top {limit}):")?;
                writeln!(out, "{:-<72}", "")?;
                for (i, h) in report.hotspots.iter().take(limit).enumerate() {
                    writeln!(
                        out,
                        "{:>2}. {:<40} changes={}  churn={}  last={}",
                        i + 1,
                        h.path,
                        h.change_count,
                        h.churn_lines,
                        h.last_touched_at,
                    )?;
                }
            }
            Section::Ownership => {
                writeln!(out, "Ownership:")?;
                writeln!(out, "{:-<72}", "")?;
                for row in report.ownership.iter().take(limit) {
                    writeln!(
                        out,
                        "  {:<40} {:<20} {:>5}  churn={}",
                        row.path,
                        row.author,
                        pct(row.churn_pct),
                        row.churn_lines,
                    )?;
                }
            }
            Section::Coupling => {
                writeln!(
                    out,
                    "Temporal Coupling ({} files in scope):",
                    report.coupling.universe.len()
                )?;
                writeln!(out, "{:-<72}", "")?;
                if report.coupling.pairs.is_empty() {
                    writeln!(out, "  No significant coupling detected.")?;
                }
                for pair in report.coupling.pairs.iter().take(limit) {
                    writeln!(
                        out,
                        "  {} <-> {} (co-changes={}, support={})",
                        pair.a,
                        pair.b,
                        pair.co_change_count,
                        pct(pair.support_pct),
                    )?;
                }
            }
            Section::Complexity => {
                writeln!(out, "Complexity:")?;
                writeln!(out, "{:-<72}", "")?;
                let mut ranked: Vec<_> = report.complexity.iter().collect();
                ranked.sort_by(|a, b| b.complexity.cmp(&a.complexity));
                for record in ranked.into_iter().take(limit) {
                    writeln!(
                        out,
                        "  {:>3}  {}  {}",
                        record.complexity, record.path, record.function_name
                    )?;
                }
                if !report.complexity_failures.is_empty() {
                    writeln!(
                        out,
                        "  ({} file(s) could not be analyzed)",
                        report.complexity_failures.len()
                    )?;
                }
            }
            Section::Risk => {
                writeln!(out, "Risk (top {limit}):")?;
                writeln!(out, "{:-<72}", "")?;
                for (i, row) in report.risk.iter().take(limit).enumerate() {
                    writeln!(
                        out,
                        "{:>2}. {:<40} risk={:.3}  churn={:.2}  cc={:.2}  own={:.2}",
                        i + 1,
                        row.path,
                        row.risk_score,
                        row.churn_score,
                        row.cc_score,
                        row.ownership_score,
                    )?;
                }
            }
            Section::Staleness => {
                writeln!(out, "Staleness:")?;
                writeln!(out, "{:-<72}", "")?;
                for row in report.staleness.iter().take(limit) {
                    writeln!(
                        out,
                        "  {:<40} age={}d  last={}  changes={}",
                        row.path,
                        days(row.age_days),
                        row.last_touched_at,
                        row.change_count,
                    )?;
                }
            }
            Section::KnowledgeLoss => {
                writeln!(out, "Knowledge Loss:")?;
                writeln!(out, "{:-<72}", "")?;
                for row in report.knowledge_loss.iter().take(limit) {
                    writeln!(
                        out,
                        "  {:<40} owner={} ({})  absent={}d",
                        row.path,
                        row.top_author,
                        pct(row.top1_pct),
                        days(row.loss_days),
                    )?;
                }
            }
            Section::Directories => {
                writeln!(out, "Directories:")?;
                writeln!(out, "{:-<72}", "")?;
                for row in report.directories.iter().take(limit) {
                    writeln!(
                        out,
                        "  {:<40} files={}  changes={}  churn={}",
                        row.directory, row.file_count, row.change_count, row.churn_lines,
                    )?;
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// GitHub-flavored Markdown, each table truncated to `limit` rows.
pub fn render_markdown(
    out: &mut impl Write,
    report: &MetricsReport,
    sections: &[Section],
    limit: usize,
) -> io::Result<()> {
    writeln!(out, "# Churn Report\n")?;
    writeln!(out, "**Commits analyzed:** {}", report.commits_analyzed)?;
    writeln!(out, "**Reference day:** {}\n", report.reference_day)?;

    for section in sections {
        match section {
            Section::Hotspots => {
                writeln!(out, "## Hotspots\n")?;
                writeln!(out, "| Rank | File | Changes | Churn | Last touched |")?;
                writeln!(out, "|------|------|---------|-------|--------------|")?;
                for (i, h) in report.hotspots.iter().take(limit).enumerate() {
                    writeln!(
                        out,
                        "| {} | `{}` | {} | {} | {} |",
                        i + 1,
                        h.path,
                        h.change_count,
                        h.churn_lines,
                        h.last_touched_at
                    )?;
                }
            }
            Section::Ownership => {
                writeln!(out, "## Ownership\n")?;
                writeln!(out, "| File | Author | Share | Churn |")?;
                writeln!(out, "|------|--------|-------|-------|")?;
                for row in report.ownership.iter().take(limit) {
                    writeln!(
                        out,
                        "| `{}` | {} | {} | {} |",
                        row.path,
                        row.author,
                        pct(row.churn_pct),
                        row.churn_lines
                    )?;
                }
            }
            Section::Coupling => {
                writeln!(out, "## Temporal Coupling\n")?;
                if report.coupling.pairs.is_empty() {
                    writeln!(out, "No significant coupling detected.")?;
                } else {
                    writeln!(out, "| File A | File B | Co-changes | Support |")?;
                    writeln!(out, "|--------|--------|------------|---------|")?;
                    for pair in report.coupling.pairs.iter().take(limit) {
                        writeln!(
                            out,
                            "| `{}` | `{}` | {} | {} |",
                            pair.a,
                            pair.b,
                            pair.co_change_count,
                            pct(pair.support_pct)
                        )?;
                    }
                }
            }
            Section::Complexity => {
                writeln!(out, "## Complexity\n")?;
                writeln!(out, "| File | Function | Complexity |")?;
                writeln!(out, "|------|----------|------------|")?;
                let mut ranked: Vec<_> = report.complexity.iter().collect();
                ranked.sort_by(|a, b| b.complexity.cmp(&a.complexity));
                for record in ranked.into_iter().take(limit) {
                    writeln!(
                        out,
                        "| `{}` | `{}` | {} |",
                        record.path, record.function_name, record.complexity
                    )?;
                }
                if !report.complexity_failures.is_empty() {
                    writeln!(out, "\n**Not analyzed:**\n")?;
                    for failure in &report.complexity_failures {
                        writeln!(out, "- `{}`: {}", failure.path, failure.reason)?;
                    }
                }
            }
            Section::Risk => {
                writeln!(out, "## Risk\n")?;
                writeln!(out, "| Rank | File | Risk | Churn | Complexity | Ownership |")?;
                writeln!(out, "|------|------|------|-------|------------|-----------|")?;
                for (i, row) in report.risk.iter().take(limit).enumerate() {
                    writeln!(
                        out,
                        "| {} | `{}` | {:.3} | {:.2} | {:.2} | {:.2} |",
                        i + 1,
                        row.path,
                        row.risk_score,
                        row.churn_score,
                        row.cc_score,
                        row.ownership_score
                    )?;
                }
            }
            Section::Staleness => {
                writeln!(out, "## Staleness\n")?;
                writeln!(out, "| File | Age (days) | Last touched | Changes |")?;
                writeln!(out, "|------|------------|--------------|---------|")?;
                for row in report.staleness.iter().take(limit) {
                    writeln!(
                        out,
                        "| `{}` | {} | {} | {} |",
                        row.path,
                        days(row.age_days),
                        row.last_touched_at,
                        row.change_count
                    )?;
                }
            }
            Section::KnowledgeLoss => {
                writeln!(out, "## Knowledge Loss\n")?;
                writeln!(out, "| File | Top owner | Share | Last seen | Absent (days) |")?;
                writeln!(out, "|------|-----------|-------|-----------|---------------|")?;
                for row in report.knowledge_loss.iter().take(limit) {
                    writeln!(
                        out,
                        "| `{}` | {} | {} | {} | {} |",
                        row.path,
                        row.top_author,
                        pct(row.top1_pct),
                        row.last_seen,
                        days(row.loss_days)
                    )?;
                }
            }
            Section::Directories => {
                writeln!(out, "## Directories\n")?;
                writeln!(out, "| Directory | Files | Changes | Churn |")?;
                writeln!(out, "|-----------|-------|---------|-------|")?;
                for row in report.directories.iter().take(limit) {
                    writeln!(
                        out,
                        "| `{}` | {} | {} | {} |",
                        row.directory, row.file_count, row.change_count, row.churn_lines
                    )?;
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use churnmap_gitpulse::hotspots::Hotspot;
    use churnmap_gitpulse::staleness::StalenessRow;

    fn report() -> MetricsReport {
        let hotspots: Vec<Hotspot> = (0..5)
            .map(|i| Hotspot {
                path: format!("src/f{i}.clj"),
                change_count: 10 - i,
                churn_lines: 100,
                last_touched_at: "2024-01-01".into(),
            })
            .collect();
        MetricsReport {
            commits_analyzed: 12,
            reference_day: "2024-02-01".into(),
            staleness: vec![StalenessRow {
                path: "src/f0.clj".into(),
                last_touched_at: "bad".into(),
                age_days: None,
                change_count: 10,
                churn_lines: 100,
            }],
            hotspots,
            ..MetricsReport::default()
        }
    }

    fn text(sections: &[Section], limit: usize) -> String {
        let mut buf = Vec::new();
        render_text(&mut buf, &report(), sections, limit).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn selected_defaults_to_all_in_order() {
        assert_eq!(selected(&[]), Section::ALL.to_vec());
        assert_eq!(
            selected(&[Section::Risk, Section::Hotspots]),
            vec![Section::Hotspots, Section::Risk]
        );
    }

    #[test]
    fn text_truncates_to_limit() {
        let out = text(&[Section::Hotspots], 2);
        assert!(out.contains("src/f0.clj"));
        assert!(out.contains("src/f1.clj"));
        assert!(!out.contains("src/f2.clj"));
        assert!(out.contains("Commits analyzed: 12"));
    }

    #[test]
    fn unknown_age_prints_dash() {
        let out = text(&[Section::Staleness], 10);
        assert!(out.contains("age=-d"), "{out}");
    }

    #[test]
    fn json_keeps_every_row_of_selected_sections() {
        let json = render_json(&report(), &[Section::Hotspots]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["hotspots"].as_array().unwrap().len(), 5);
        assert_eq!(value["commits_analyzed"], 12);
        assert!(value.get("risk").is_none());
    }

    #[test]
    fn json_complexity_includes_failures() {
        let json = render_json(&report(), &[Section::Complexity]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("complexity").is_some());
        assert!(value.get("complexity_failures").is_some());
    }

    #[test]
    fn markdown_has_tables() {
        let mut buf = Vec::new();
        render_markdown(&mut buf, &report(), &[Section::Hotspots, Section::Coupling], 3).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("# Churn Report"));
        assert!(out.contains("| 3 | `src/f2.clj` | 8 | 100 | 2024-01-01 |"));
        assert!(!out.contains("src/f3.clj"));
        assert!(out.contains("No significant coupling detected."));
    }
}
