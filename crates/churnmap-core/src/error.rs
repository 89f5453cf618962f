use std::path::PathBuf;

/// Errors that can occur across churnmap.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to a `miette` diagnostic at the boundary.
///
/// # Examples
///
/// ```
/// use churnmap_core::ChurnmapError;
///
/// let err = ChurnmapError::Config("top_k must be positive".into());
/// assert!(err.to_string().contains("top_k"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ChurnmapError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(churnmap::config),
        help("check .churnmap.toml or the matching command-line flag")
    )]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    #[diagnostic(code(churnmap::git))]
    Git(String),

    /// Source code parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(churnmap::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ChurnmapError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn toml_error_converts_with_code() {
        use miette::Diagnostic;

        let toml_err = toml::from_str::<toml::Value>("key = ").unwrap_err();
        let err: ChurnmapError = toml_err.into();
        assert!(err.to_string().starts_with("TOML parse error"));
        assert_eq!(err.code().unwrap().to_string(), "churnmap::toml");
    }

    #[test]
    fn parse_error_displays_message() {
        let err = ChurnmapError::Parse("unbalanced `(` at line 3".into());
        assert_eq!(err.to_string(), "parse error: unbalanced `(` at line 3");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = ChurnmapError::FileNotFound(PathBuf::from("/tmp/missing.clj"));
        assert!(err.to_string().contains("/tmp/missing.clj"));
    }
}
