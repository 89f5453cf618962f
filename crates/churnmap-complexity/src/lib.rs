//! Structural complexity of Clojure sources.
//!
//! Reads `.clj`, `.cljs` and `.cljc` files into an explicit s-expression tree
//! and scores every top-level named definition with `1 + decision points`.
//! Analysis is best-effort per file: a file that cannot be read or parsed
//! contributes no records and never stops the others.

pub mod analyzer;
pub mod reader;

pub use analyzer::{analyze_paths, analyze_source, ComplexityReport, FileAnalysis, FileFailure};
pub use reader::{read_forms, Form, Prefix};
