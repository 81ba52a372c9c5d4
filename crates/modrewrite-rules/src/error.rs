//! Load errors and recoverable parse warnings

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort loading the rewrite configuration
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: '{directive}' appears before any module: directive", .path.display())]
    DirectiveBeforeModule {
        path: PathBuf,
        line: usize,
        directive: String,
    },

    #[error("Missing build property '{property}' for rewriting artifact {artifact} ({}:{line})", .path.display())]
    MissingProperty {
        property: String,
        artifact: String,
        path: PathBuf,
        line: usize,
    },
}

/// Why a line was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// No known directive prefix
    Unrecognized,
    /// Known prefix with an unusable body
    Malformed { directive: &'static str, reason: String },
}

impl WarningKind {
    pub(crate) fn malformed(directive: &'static str, reason: impl Into<String>) -> Self {
        WarningKind::Malformed {
            directive,
            reason: reason.into(),
        }
    }
}

/// A skipped configuration line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub path: PathBuf,
    pub line: usize,
    pub content: String,
    #[serde(flatten)]
    pub kind: WarningKind,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::Unrecognized => write!(
                f,
                "{}:Lines should be blank or start with module:, include:, export: or optional: - {}",
                self.line, self.content
            ),
            WarningKind::Malformed { directive, reason } => write!(
                f,
                "{}:Malformed {} directive ({}) - {}",
                self.line, directive, reason, self.content
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_warning_format() {
        let warning = ParseWarning {
            path: PathBuf::from("module-rewrite.conf"),
            line: 3,
            content: "notadirective:x".to_string(),
            kind: WarningKind::Unrecognized,
        };
        assert_eq!(
            warning.to_string(),
            "3:Lines should be blank or start with module:, include:, export: or optional: - notadirective:x"
        );
    }

    #[test]
    fn test_missing_property_message() {
        let err = LoadError::MissingProperty {
            property: "missing.prop".to_string(),
            artifact: "g:a".to_string(),
            path: PathBuf::from("module-rewrite.conf"),
            line: 2,
        };
        let message = err.to_string();
        assert!(message.contains("missing.prop"));
        assert!(message.contains("g:a"));
    }
}
