//! Valflow Error Handling
//!
//! Provides human-readable error messages with source locations and suggestions.

use std::fmt;

/// Source location for error reporting
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub snippet: Option<String>,
}

impl SourceLocation {
    pub fn new(file: &str, line: usize, column: usize) -> Self {
        Self {
            file: file.to_string(),
            line,
            column,
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: &str) -> Self {
        self.snippet = Some(snippet.to_string());
        self
    }
}

/// Category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SyntaxError,
    /// Assignment to something other than a plain variable; aborts analysis
    UnsupportedAssignmentTarget,
    FileError,
    InvalidExtension,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::UnsupportedAssignmentTarget => "UnsupportedAssignmentTarget",
            ErrorKind::FileError => "FileError",
            ErrorKind::InvalidExtension => "InvalidExtension",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for Valflow
#[derive(Debug, Clone)]
pub struct FlowError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub suggestion: Option<String>,
}

impl FlowError {
    pub fn new(kind: ErrorKind, message: &str, location: Option<SourceLocation>) -> Self {
        Self {
            kind,
            message: message.to_string(),
            location,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    // Common error constructors
    pub fn syntax_error(message: &str, location: SourceLocation) -> Self {
        Self::new(ErrorKind::SyntaxError, message, Some(location))
    }

    pub fn unsupported_assignment_target(target: &str, line: usize) -> Self {
        Self::new(
            ErrorKind::UnsupportedAssignmentTarget,
            &format!("Cannot assign to {}, only plain variables are supported", target),
            Some(SourceLocation::new("", line, 0)),
        )
        .with_suggestion("assign to a local variable first, e.g. `$tmp = ...;`")
    }

    pub fn file_error(message: &str) -> Self {
        Self::new(ErrorKind::FileError, message, None)
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Error header
        writeln!(f, "\x1b[1;31merror[{}]\x1b[0m: {}", self.kind, self.message)?;

        if let Some(ref loc) = self.location {
            if loc.file.is_empty() {
                writeln!(f, "  \x1b[1;34m-->\x1b[0m line {}", loc.line)?;
            } else {
                writeln!(
                    f,
                    "  \x1b[1;34m-->\x1b[0m {}:{}:{}",
                    loc.file, loc.line, loc.column
                )?;
            }

            if let Some(ref snippet) = loc.snippet {
                writeln!(f, "   \x1b[1;34m|\x1b[0m")?;
                writeln!(f, " \x1b[1;34m{:3} |\x1b[0m {}", loc.line, snippet)?;

                // Underline the error position
                let padding = " ".repeat(loc.column.saturating_sub(1));
                writeln!(f, "   \x1b[1;34m|\x1b[0m {}\x1b[1;31m^\x1b[0m", padding)?;
            }
        }

        if let Some(ref suggestion) = self.suggestion {
            writeln!(f)?;
            writeln!(f, "\x1b[1;32mhelp\x1b[0m: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for FlowError {}

/// Result type alias for Valflow operations
pub type FlowResult<T> = Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_help() {
        let err = FlowError::unsupported_assignment_target("an array element", 7);
        let rendered = err.to_string();

        assert_eq!(err.kind, ErrorKind::UnsupportedAssignmentTarget);
        assert!(rendered.contains("UnsupportedAssignmentTarget"));
        assert!(rendered.contains("line 7"));
        assert!(rendered.contains("help"));
    }

    #[test]
    fn test_snippet_rendering() {
        let loc = SourceLocation::new("test.php", 3, 5).with_snippet("$a = @;");
        let err = FlowError::syntax_error("Unexpected character '@'", loc);
        let rendered = err.to_string();

        assert!(rendered.contains("test.php:3:5"));
        assert!(rendered.contains("$a = @;"));
    }
}
