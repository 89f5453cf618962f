//! Per-definition structural complexity.

use std::path::Path;

use churnmap_core::{ChurnmapError, ComplexityRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::reader::{read_forms, Form};

/// File extensions analyzed for complexity.
pub const SOURCE_EXTENSIONS: &[&str] = &["clj", "cljs", "cljc"];

/// Top-level heads that introduce a named definition.
pub const DEFINITION_HEADS: &[&str] = &["defn", "defn-", "defmacro", "defmethod"];

/// Heads that add one decision point each.
pub const DECISION_HEADS: &[&str] = &[
    "if", "if-not", "when", "when-not", "cond", "condp", "case", "if-let", "when-let", "if-some",
    "when-some",
];

/// A file that produced no records, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Repo-relative path.
    pub path: String,
    /// Read or parse error message.
    pub reason: String,
}

/// Outcome of analyzing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAnalysis {
    Analyzed {
        path: String,
        records: Vec<ComplexityRecord>,
    },
    Failed(FileFailure),
}

/// Merged result of a batch of files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityReport {
    /// Records sorted by path, source order within a path.
    pub records: Vec<ComplexityRecord>,
    /// Files that could not be read or parsed, sorted by path.
    pub failures: Vec<FileFailure>,
}

/// Whether `path` belongs to the analyzable source family.
///
/// # Examples
///
/// ```
/// use churnmap_complexity::analyzer::is_analyzable;
///
/// assert!(is_analyzable("src/app/core.cljc"));
/// assert!(!is_analyzable("resources/config.edn"));
/// assert!(!is_analyzable("Makefile"));
/// ```
pub fn is_analyzable(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Score every top-level named definition in `source`.
///
/// Definitions directly inside a top-level reader conditional (`#?` or a
/// spliced `#?@` vector) count as top level. Definitions whose name cannot
/// be found are skipped.
///
/// # Errors
///
/// Returns [`ChurnmapError::Parse`] if the source cannot be read as forms.
///
/// # Examples
///
/// ```
/// use churnmap_complexity::analyze_source;
///
/// let src = "(defn plain [x] x)\n(defn branchy [x] (if x (when x 1) 2))";
/// let records = analyze_source("src/demo.clj", src).unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0].complexity, 1);
/// assert_eq!(records[1].function_name, "branchy");
/// assert_eq!(records[1].complexity, 3);
/// ```
pub fn analyze_source(path: &str, source: &str) -> Result<Vec<ComplexityRecord>, ChurnmapError> {
    let forms = read_forms(source)?;
    let records = forms
        .iter()
        .flat_map(top_level_candidates)
        .filter_map(|form| {
            let Form::List(items) = form else {
                return None;
            };
            let head = items.first()?.as_symbol()?;
            if !DEFINITION_HEADS.contains(&head) {
                return None;
            }
            let Some(name) = items.get(1).and_then(Form::as_symbol) else {
                tracing::debug!(path, head, "skipping definition without a symbol name");
                return None;
            };
            Some(ComplexityRecord {
                path: path.to_string(),
                function_name: name.to_string(),
                complexity: 1 + decision_points(form),
            })
        })
        .collect();
    Ok(records)
}

fn top_level_candidates(form: &Form) -> Vec<&Form> {
    match form {
        Form::ReaderConditional(branches) => branches
            .iter()
            .flat_map(|branch| match branch {
                Form::Vector(spliced) => spliced.iter().collect(),
                other => vec![other],
            })
            .collect(),
        other => vec![other],
    }
}

/// Number of decision forms anywhere in `form`, including itself.
///
/// `#(...)` is a call form like a list, so its head counts too.
pub fn decision_points(form: &Form) -> u32 {
    let own = match form {
        Form::List(items) | Form::AnonFn(items) => u32::from(
            items
                .first()
                .and_then(Form::as_symbol)
                .is_some_and(is_decision_head),
        ),
        _ => 0,
    };
    own + form.children().iter().map(decision_points).sum::<u32>()
}

fn is_decision_head(symbol: &str) -> bool {
    // `clojure.core/if` counts as `if`; a bare `/` is the division symbol.
    let name = match symbol.rsplit_once('/') {
        Some((ns, name)) if !ns.is_empty() && !name.is_empty() => name,
        _ => symbol,
    };
    DECISION_HEADS.contains(&name)
}

/// Read and score one file under `root`.
pub fn analyze_file(root: &Path, path: &str) -> FileAnalysis {
    let result = std::fs::read_to_string(root.join(path))
        .map_err(ChurnmapError::from)
        .and_then(|text| analyze_source(path, &text));

    match result {
        Ok(records) => FileAnalysis::Analyzed {
            path: path.to_string(),
            records,
        },
        Err(e) => FileAnalysis::Failed(FileFailure {
            path: path.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Analyze every analyzable path in `paths` relative to `root`.
///
/// Files are processed in parallel. A file that fails contributes a
/// [`FileFailure`] and no records; the rest are unaffected.
///
/// # Examples
///
/// ```
/// use churnmap_complexity::analyze_paths;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("a.clj"), "(defn a [x] (case x 1 :one :many))").unwrap();
///
/// let paths = vec!["a.clj".to_string(), "README.md".to_string(), "gone.clj".to_string()];
/// let report = analyze_paths(dir.path(), &paths);
/// assert_eq!(report.records.len(), 1);
/// assert_eq!(report.records[0].complexity, 2);
/// assert_eq!(report.failures.len(), 1);
/// assert_eq!(report.failures[0].path, "gone.clj");
/// ```
pub fn analyze_paths(root: &Path, paths: &[String]) -> ComplexityReport {
    let outcomes: Vec<FileAnalysis> = paths
        .par_iter()
        .filter(|p| is_analyzable(p))
        .map(|p| analyze_file(root, p))
        .collect();

    let mut report = ComplexityReport::default();
    for outcome in outcomes {
        match outcome {
            FileAnalysis::Analyzed { records, .. } => report.records.extend(records),
            FileAnalysis::Failed(failure) => {
                tracing::warn!(path = %failure.path, reason = %failure.reason, "complexity analysis failed");
                report.failures.push(failure);
            }
        }
    }

    // Stable: keeps source order within each file.
    report.records.sort_by(|a, b| a.path.cmp(&b.path));
    report.failures.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        records = report.records.len(),
        failures = report.failures.len(),
        "complexity analysis finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(src: &str) -> Vec<(String, u32)> {
        analyze_source("x.clj", src)
            .unwrap()
            .into_iter()
            .map(|r| (r.function_name, r.complexity))
            .collect()
    }

    #[test]
    fn no_decisions_scores_one() {
        assert_eq!(scores("(defn f [x] (inc x))"), vec![("f".into(), 1)]);
    }

    #[test]
    fn two_nested_decisions_score_three() {
        let src = "(defn f [x]\n  (when (pos? x)\n    (if (even? x) :even :odd)))";
        assert_eq!(scores(src), vec![("f".into(), 3)]);
    }

    #[test]
    fn branch_count_is_not_weighted() {
        let src = "(defn f [x] (cond (= x 1) :a (= x 2) :b (= x 3) :c :else :d))";
        assert_eq!(scores(src), vec![("f".into(), 2)]);
    }

    #[test]
    fn every_decision_head_counts() {
        for head in DECISION_HEADS {
            let src = format!("(defn f [x] ({head} x y))");
            assert_eq!(scores(&src), vec![("f".into(), 2)], "head {head}");
        }
    }

    #[test]
    fn namespaced_heads_count() {
        assert_eq!(scores("(defn f [x] (clojure.core/if x 1 2))")[0].1, 2);
        assert_eq!(scores("(defn f [x] (/ x 2))")[0].1, 1);
    }

    #[test]
    fn nested_definitions_add_to_outer() {
        let src = "(defn outer [] (letfn [(inner [y] (if y 1 2))] (when-let [z 1] z)))";
        assert_eq!(scores(src), vec![("outer".into(), 3)]);
    }

    #[test]
    fn decisions_inside_literals_and_reader_macros_count() {
        let src = "(defmacro m [x] `(if ~x {:a #(when % 1)} [(case x 1 2)]))";
        assert_eq!(scores(src), vec![("m".into(), 4)]);
    }

    #[test]
    fn anonymous_fn_head_counts() {
        assert_eq!(scores("(defn f [xs] (map #(when % 1) xs))")[0].1, 2);
        assert_eq!(scores("(defn f [xs] (map #(inc %) xs))")[0].1, 1);
    }

    #[test]
    fn definitions_inside_reader_conditionals_are_found() {
        let src = "(ns demo)\n\
                   #?(:clj (defn now [] (if x 1 2)) :cljs (defn now [] 0))\n\
                   #?@(:clj [(defn- a [] 1) (def b 2)])\n\
                   (defn plain [] 1)";
        assert_eq!(
            scores(src),
            vec![
                ("now".into(), 2),
                ("now".into(), 1),
                ("a".into(), 1),
                ("plain".into(), 1)
            ]
        );
    }

    #[test]
    fn nested_reader_conditional_is_not_a_definition_site() {
        let src = "(defn outer [] #?(:clj (if x 1 2)))";
        assert_eq!(scores(src), vec![("outer".into(), 2)]);
    }

    #[test]
    fn only_definition_heads_are_recorded() {
        let src = "(ns demo)\n(def x (if true 1 2))\n(defn- p [] 1)\n(defmethod area :circle [c] (if c 1 2))\n(defprotocol P)";
        assert_eq!(
            scores(src),
            vec![("p".into(), 1), ("area".into(), 2)]
        );
    }

    #[test]
    fn unnamed_definition_is_skipped() {
        let src = "(defn [x] x)\n(defn)\n(defn ok [] 1)";
        assert_eq!(scores(src), vec![("ok".into(), 1)]);
    }

    #[test]
    fn metadata_before_name_is_ignored() {
        let src = "(defn ^:private ^String helper [x] (if x 1 2))";
        assert_eq!(scores(src), vec![("helper".into(), 2)]);
    }

    #[test]
    fn parse_failure_yields_error() {
        assert!(analyze_source("x.clj", "(defn f [x] (if x 1 2)").is_err());
    }

    #[test]
    fn failed_file_yields_no_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.clj"), "(defn broken [").unwrap();
        match analyze_file(dir.path(), "bad.clj") {
            FileAnalysis::Failed(failure) => {
                assert_eq!(failure.path, "bad.clj");
                assert!(failure.reason.contains("parse"), "{}", failure.reason);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            analyze_file(dir.path(), "nope.clj"),
            FileAnalysis::Failed(_)
        ));
    }

    #[test]
    fn batch_output_is_sorted_by_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/b.clj"), "(defn b1 [] 1) (defn b2 [] 2)").unwrap();
        std::fs::write(dir.path().join("src/a.cljs"), "(defn a1 [] (if 1 2 3))").unwrap();
        std::fs::write(dir.path().join("src/c.clj"), "(defn c1 [").unwrap();

        let paths: Vec<String> = ["src/c.clj", "src/b.clj", "src/a.cljs"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let report = analyze_paths(dir.path(), &paths);
        let names: Vec<&str> = report
            .records
            .iter()
            .map(|r| r.function_name.as_str())
            .collect();
        assert_eq!(names, vec!["a1", "b1", "b2"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "src/c.clj");
    }

    #[test]
    fn runaway_nesting_fails_only_that_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("deep.clj"), "(".repeat(200_000)).unwrap();
        std::fs::write(dir.path().join("ok.clj"), "(defn ok [x] (when x 1))").unwrap();

        let paths = vec!["deep.clj".to_string(), "ok.clj".to_string()];
        let report = analyze_paths(dir.path(), &paths);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].function_name, "ok");
        assert_eq!(report.records[0].complexity, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "deep.clj");
        assert!(report.failures[0].reason.contains("nesting"), "{}", report.failures[0].reason);
    }
}
