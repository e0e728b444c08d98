//! Value flow analyzer
//!
//! Walks the top-level statements once, recording assignment histories in
//! the global scope, declaring function scopes with their parameters, and
//! specializing those scopes per call site.

pub mod detect;
pub mod scope;
pub mod types;
pub mod value;

pub use detect::ValueDetector;
pub use scope::{History, Scope, ScopeId, ScopeTree};
pub use types::{Primitive, TypeLabel};
pub use value::{Payload, Value};

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{FlowError, FlowResult};
use crate::parser::ast::*;

/// Non-fatal finding: an argument whose value could not be resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub callee: String,
    pub parameter: String,
    pub line: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no value found for parameter '{}' of function '{}' at line {}",
            self.parameter, self.callee, self.line
        )
    }
}

/// Result of a completed pass
#[derive(Debug, Clone)]
pub struct Analysis {
    pub scopes: ScopeTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn global(&self) -> &Scope {
        self.scopes.global()
    }

    /// Scope of a function declared (or called) at the top level
    pub fn function(&self, name: &str) -> Option<&Scope> {
        self.scopes
            .lookup_nested_scope(ScopeId::global(), name)
            .map(|id| self.scopes.get(id))
    }

    /// Call-site specialization of `function` keyed by `line`
    pub fn specialization(&self, function: &str, line: usize) -> Option<&Scope> {
        let id = self.function(function)?.specialized().get(&line)?;
        Some(self.scopes.get(*id))
    }
}

/// Single-pass analyzer over top-level statements
pub struct Analyzer {
    scopes: ScopeTree,
    current: ScopeId,
    diagnostics: Vec<Diagnostic>,
}

impl Analyzer {
    pub fn new() -> Self {
        let mut scopes = ScopeTree::new();

        // Request input is always available as an array
        scopes.get_mut(ScopeId::global()).record_value(Value::resolved(
            "_GET",
            Payload::Array(Vec::new()),
            TypeLabel::array(),
            0,
        ));

        Self {
            scopes,
            current: ScopeId::global(),
            diagnostics: Vec::new(),
        }
    }

    /// Analyze a whole program. Any fatal statement discards all state.
    pub fn analyze(mut self, program: &Program) -> FlowResult<Analysis> {
        for statement in &program.statements {
            self.visit_statement(statement)?;
        }

        Ok(self.finish())
    }

    pub fn finish(self) -> Analysis {
        Analysis {
            scopes: self.scopes,
            diagnostics: self.diagnostics,
        }
    }

    pub fn visit_statement(&mut self, statement: &Statement) -> FlowResult<()> {
        match statement {
            Statement::Expression { expr, span } => match expr {
                Expression::Assign { target, value, .. } => {
                    self.visit_assignment(target, value, span.line)
                }
                Expression::Call {
                    callee, arguments, ..
                } => {
                    self.visit_call(callee, arguments, span.line);
                    Ok(())
                }
                _ => Ok(()),
            },
            Statement::Function { name, params, .. } => {
                self.visit_function(name, params);
                Ok(())
            }
            // Bodies of conditionals and loops are not analyzed
            _ => Ok(()),
        }
    }

    fn visit_assignment(
        &mut self,
        target: &Expression,
        value: &Expression,
        line: usize,
    ) -> FlowResult<()> {
        let name = match target {
            Expression::Variable { name, .. } => name,
            other => {
                return Err(FlowError::unsupported_assignment_target(
                    other.describe(),
                    line,
                ))
            }
        };

        let detected = self.detector().detect(name, value);
        self.scopes.get_mut(self.current).record_value(detected);
        Ok(())
    }

    fn visit_call(&mut self, callee: &Callee, arguments: &[Argument], line: usize) {
        let Some(function) = callee.static_name() else {
            debug!(line, "skipping call with a computed target");
            return;
        };

        let declared = self.scopes.lookup_nested_scope(self.current, function);
        let mut values = IndexMap::new();

        for (i, argument) in arguments.iter().enumerate() {
            let parameter = argument
                .name
                .clone()
                .or_else(|| {
                    declared
                        .and_then(|id| self.scopes.get(id).lookup_parameter_at(i))
                        .map(|param| param.name().to_string())
                })
                .unwrap_or_else(|| format!("#{}", i));

            let value = self.detector().detect(&parameter, &argument.value);
            if !value.is_resolved() {
                let diagnostic = Diagnostic {
                    callee: function.to_string(),
                    parameter: parameter.clone(),
                    line,
                };
                warn!("{}", diagnostic);
                self.diagnostics.push(diagnostic);
            }

            values.insert(parameter.clone(), value.with_name(&parameter));
        }

        self.scopes.specialize(self.current, function, values);
    }

    fn visit_function(&mut self, name: &str, params: &[Parameter]) {
        let function = self.scopes.create(name, Some(self.current));
        self.scopes.attach(self.current, function);
        debug!(function = name, params = params.len(), "declared function scope");

        for param in params {
            let value = match &param.default {
                Some(default) => {
                    let detected = self.detector().detect(&param.name, default);
                    Value::new(
                        &param.name,
                        detected.value().cloned(),
                        detected.ty().clone(),
                        param.span.line,
                    )
                }
                None => Value::unresolved(
                    &param.name,
                    param
                        .type_hint
                        .as_deref()
                        .map(TypeLabel::from_annotation)
                        .unwrap_or(TypeLabel::Mixed),
                    param.span.line,
                ),
            };

            self.scopes.get_mut(function).record_parameter(value);
        }
    }

    fn detector(&self) -> ValueDetector<'_> {
        ValueDetector::new(&self.scopes, self.current)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze `program` with a fresh analyzer
pub fn analyze(program: &Program) -> FlowResult<Analysis> {
    Analyzer::new().analyze(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::parse_source;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> FlowResult<Analysis> {
        let program = parse_source(source, "test.php").unwrap();
        analyze(&program)
    }

    fn history(analysis: &Analysis, name: &str) -> Vec<(usize, Option<Payload>, String)> {
        analysis
            .global()
            .history(name)
            .unwrap()
            .iter()
            .map(|(line, value)| (*line, value.value().cloned(), value.ty().to_string()))
            .collect()
    }

    #[test]
    fn test_global_is_seeded_with_request_input() {
        let analysis = run("").unwrap();
        let get = analysis.global().latest("_GET").unwrap();

        assert_eq!(analysis.global().name(), "global");
        assert_eq!(get.ty().to_string(), "array");
        assert_eq!(get.line(), 0);
        assert!(get.is_resolved());
    }

    #[test]
    fn test_end_to_end_history_and_specializations() {
        let source = "<?php
function foo($value) {}
foo(value: 42);
$a = 23;
foo(value: $a);
$a = \"foobar\";
";
        let analysis = run(source).unwrap();

        assert_eq!(
            history(&analysis, "a"),
            vec![
                (4, Some(Payload::Int(23)), "int".to_string()),
                (6, Some(Payload::String("foobar".into())), "string".to_string()),
            ]
        );

        let foo = analysis.function("foo").unwrap();
        assert_eq!(foo.specialized().len(), 2);

        // A literal argument is keyed by the call line, a variable argument by
        // the line its value was written at
        let literal = analysis.specialization("foo", 3).unwrap();
        let variable = analysis.specialization("foo", 4).unwrap();
        assert_eq!(
            literal.lookup_parameter("value").unwrap().value(),
            Some(&Payload::Int(42))
        );
        assert_eq!(
            variable.lookup_parameter("value").unwrap().value(),
            Some(&Payload::Int(23))
        );
        assert_eq!(variable.lookup_parameter("value").unwrap().name(), "value");

        // Declared parameter stays unresolved
        assert!(!foo.lookup_parameter("value").unwrap().is_resolved());
        assert!(analysis.diagnostics.is_empty());
    }

    #[test]
    fn test_positional_arguments_take_declared_names() {
        let analysis = run("function f($a, $b) {}\nf(1, 'two');").unwrap();
        let call = analysis.specialization("f", 2).unwrap();

        let names: Vec<&str> = call.parameters().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            call.lookup_parameter("b").unwrap().value(),
            Some(&Payload::String("two".into()))
        );
    }

    #[test]
    fn test_undeclared_callee_gets_synthetic_names() {
        let analysis = run("array_key_exists('k', [1, 2, 3]);").unwrap();

        let callee = analysis.function("array_key_exists").unwrap();
        assert!(callee.parameters().is_empty());

        let call = analysis.specialization("array_key_exists", 1).unwrap();
        assert_eq!(call.lookup_parameter("#0").unwrap().ty().to_string(), "string");
        assert_eq!(call.lookup_parameter("#1").unwrap().ty().to_string(), "int[]");
    }

    #[test]
    fn test_extra_arguments_beyond_variadic_get_synthetic_names() {
        let analysis = run("function quatz(int ...$is) {}\nquatz(1, 2, 3);").unwrap();
        let call = analysis.specialization("quatz", 2).unwrap();

        let names: Vec<&str> = call.parameters().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["is", "#1", "#2"]);
    }

    #[test]
    fn test_unresolved_argument_emits_diagnostic() {
        let analysis = run("function f($a) {}\nf($missing);").unwrap();

        assert_eq!(
            analysis.diagnostics,
            vec![Diagnostic {
                callee: "f".to_string(),
                parameter: "a".to_string(),
                line: 2,
            }]
        );

        // The unresolved value is still specialized
        let call = analysis.specialization("f", 2).unwrap();
        assert!(!call.lookup_parameter("a").unwrap().is_resolved());
    }

    #[test]
    fn test_dynamic_call_is_skipped() {
        let analysis = run("$fn = 'strlen';\n$fn('abc');").unwrap();

        assert!(analysis.global().nested().is_empty());
        assert!(analysis.diagnostics.is_empty());
    }

    #[test]
    fn test_call_without_arguments_creates_nothing() {
        let analysis = run("time();").unwrap();
        assert!(analysis.function("time").is_none());
    }

    #[test]
    fn test_function_parameters() {
        let analysis =
            run("function f(int $a, $b = [1, 2], ?string $c = null, int|float $d) {}").unwrap();
        let f = analysis.function("f").unwrap();

        let a = f.lookup_parameter("a").unwrap();
        assert!(!a.is_resolved());
        assert_eq!(a.ty().to_string(), "int");

        let b = f.lookup_parameter("b").unwrap();
        assert!(b.is_resolved());
        assert_eq!(b.ty().to_string(), "int[]");
        assert_eq!(b.name(), "b");

        // `null` is a constant, so the default stays unresolved
        let c = f.lookup_parameter("c").unwrap();
        assert!(!c.is_resolved());
        assert!(c.ty().is_mixed());

        assert_eq!(f.lookup_parameter("d").unwrap().ty().to_string(), "int|float");
        assert!(f.specialized().is_empty());
    }

    #[test]
    fn test_function_body_is_not_visited() {
        let analysis = run("function f() { $inner = 1; g(2); }").unwrap();

        assert!(analysis.global().history("inner").is_none());
        assert!(analysis.function("g").is_none());
    }

    #[test]
    fn test_redeclared_function_replaces_scope() {
        let analysis = run("function f($a) {}\nfunction f($b, $c) {}").unwrap();
        let f = analysis.function("f").unwrap();

        assert_eq!(f.parameters().len(), 2);
        assert!(f.lookup_parameter("a").is_none());
    }

    #[test]
    fn test_unsupported_assignment_target_aborts() {
        let err = run("$a = 1;\nfoo($a);\n$b['k'] = 2;\n$c = 3;").unwrap_err();

        assert_eq!(err.kind, ErrorKind::UnsupportedAssignmentTarget);
        assert_eq!(err.location.map(|loc| loc.line), Some(3));
    }

    #[test]
    fn test_other_statements_are_ignored() {
        let analysis = run("$pi = 3.14;\nif ($pi > 3) { $x = 1; }\nfor ($i = 0; $i < 2; $i++) { }\n$a .= 'x';").unwrap();

        let names: Vec<&str> = analysis
            .global()
            .variables()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["_GET", "pi"]);
    }

    #[test]
    fn test_unresolved_assignment_keeps_previous_value() {
        let analysis = run("$a = 1;\n$a = $unknown;").unwrap();

        assert_eq!(
            history(&analysis, "a"),
            vec![(1, Some(Payload::Int(1)), "int".to_string())]
        );
    }

    #[test]
    fn test_php_literal_forms() {
        let source = r#"$a = 010;
$b = "hi $a";
$f = function ($x) { return $x; };
$c = Foo::bar($a);
$d = 0xFFFFFFFFFFFFFFFF;"#;
        let analysis = run(source).unwrap();
        let global = analysis.global();

        assert_eq!(global.latest("a").unwrap().value(), Some(&Payload::Int(8)));
        for name in ["b", "f", "c"] {
            let value = global.latest(name).unwrap();
            assert!(!value.is_resolved(), "${} should be unresolved", name);
            assert!(value.ty().is_mixed());
        }
        assert_eq!(global.latest("d").unwrap().ty().to_string(), "float");

        // Static calls are not specialized
        assert!(analysis.function("bar").is_none());
    }
}
