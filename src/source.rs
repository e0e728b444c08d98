//! Source loading
//!
//! Reads a `.php` file from disk and turns it into a `Program`.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ErrorKind, FlowError, FlowResult};
use crate::parser::ast::Program;
use crate::parser::parse_source;

/// Check if `path` names a PHP source file
pub fn is_php_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => ext.to_string_lossy().eq_ignore_ascii_case("php"),
        None => false,
    }
}

fn validate_file_extension(path: &Path) -> FlowResult<()> {
    if !is_php_file(path) {
        return Err(FlowError::new(
            ErrorKind::InvalidExtension,
            &format!(
                "File '{}' does not have a PHP extension.\n\
                 Supported extensions: .php",
                path.display()
            ),
            None,
        ));
    }
    Ok(())
}

/// Read the raw source text of a PHP file
pub fn read_source_file(path: &Path) -> FlowResult<String> {
    validate_file_extension(path)?;

    fs::read_to_string(path).map_err(|e| {
        FlowError::file_error(&format!("Could not read file '{}': {}", path.display(), e))
    })
}

/// Read, lex and parse a PHP file
pub fn load_program(path: impl AsRef<Path>) -> FlowResult<Program> {
    let path = path.as_ref();
    let source = read_source_file(path)?;
    debug!(file = %path.display(), bytes = source.len(), "loaded source");

    parse_source(&source, &path.to_string_lossy())
}
