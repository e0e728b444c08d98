//! Plain-text rendering of an analysis

use std::fmt::{self, Write};

use crate::semantic::{Analysis, ScopeId, ScopeTree};

const INDENT: &str = "  ";

/// Render the whole scope tree followed by the diagnostics
pub fn render(analysis: &Analysis) -> String {
    let mut out = String::new();
    // Writing into a String never fails
    let _ = write_analysis(&mut out, analysis);
    out
}

fn write_analysis(out: &mut String, analysis: &Analysis) -> fmt::Result {
    write_scope(out, &analysis.scopes, ScopeId::global(), 0)?;

    if !analysis.diagnostics.is_empty() {
        writeln!(out)?;
        writeln!(out, "diagnostics:")?;
        for diagnostic in &analysis.diagnostics {
            writeln!(out, "{}{}", INDENT, diagnostic)?;
        }
    }

    Ok(())
}

fn write_scope(out: &mut String, scopes: &ScopeTree, id: ScopeId, depth: usize) -> fmt::Result {
    let pad = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);
    let item = INDENT.repeat(depth + 2);
    let scope = scopes.get(id);

    writeln!(out, "{}scope {}", pad, scope.name())?;

    if !scope.variables().is_empty() {
        writeln!(out, "{}variables:", inner)?;
        for (name, history) in scope.variables() {
            writeln!(out, "{}${}", item, name)?;
            for (line, value) in history {
                writeln!(out, "{}{}{}: {}", item, INDENT, line, value)?;
            }
        }
    }

    if !scope.parameters().is_empty() {
        writeln!(out, "{}parameters:", inner)?;
        for (name, value) in scope.parameters() {
            writeln!(out, "{}{}: {} @ line {}", item, name, value, value.line())?;
        }
    }

    if !scope.nested().is_empty() {
        writeln!(out, "{}functions:", inner)?;
        for child in scope.nested().values() {
            write_scope(out, scopes, *child, depth + 2)?;
        }
    }

    if !scope.specialized().is_empty() {
        writeln!(out, "{}specialized:", inner)?;
        for (line, snapshot) in scope.specialized() {
            writeln!(out, "{}line {}:", item, line)?;
            write_scope(out, scopes, *snapshot, depth + 3)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::semantic::analyze;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render() {
        let source = "<?php\nfunction f(int $n) {}\n$a = 1;\nf($a);\nf($b);\n";
        let program = parse_source(source, "test.php").unwrap();
        let analysis = analyze(&program).unwrap();

        let expected = "\
scope global
  variables:
    $_GET
      0: [] (array)
    $a
      3: 1 (int)
  functions:
    scope f
      parameters:
        n: ? (int) @ line 2
      specialized:
        line 3:
          scope f
            parameters:
              n: 1 (int) @ line 3
        line 5:
          scope f
            parameters:
              n: ? (mixed) @ line 5

diagnostics:
  no value found for parameter 'n' of function 'f' at line 5
";
        assert_eq!(render(&analysis), expected);
    }
}
