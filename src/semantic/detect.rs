//! Value detection
//!
//! Folds an expression into the most specific `Value` the current scope
//! state allows. Detection never fails: missing information becomes an
//! unresolved value.

use crate::parser::ast::{ArrayItem, Expression};

use super::scope::{ScopeId, ScopeTree};
use super::types::TypeLabel;
use super::value::{Payload, Value};

/// Read-only view used to resolve expressions against one scope
pub struct ValueDetector<'a> {
    scopes: &'a ScopeTree,
    scope: ScopeId,
}

impl<'a> ValueDetector<'a> {
    pub fn new(scopes: &'a ScopeTree, scope: ScopeId) -> Self {
        Self { scopes, scope }
    }

    /// Detect the value `expr` yields when bound to `name`
    pub fn detect(&self, name: &str, expr: &Expression) -> Value {
        match expr {
            Expression::Variable { name: referenced, .. } => {
                if let Some(value) = self.detect_variable(name, referenced) {
                    return value;
                }
            }
            Expression::Int { value, span } => {
                return Value::resolved(name, Payload::Int(*value), TypeLabel::int(), span.line);
            }
            Expression::Float { value, span } => {
                return Value::resolved(
                    name,
                    Payload::Float(*value),
                    TypeLabel::float(),
                    span.line,
                );
            }
            Expression::String { value, span } => {
                return Value::resolved(
                    name,
                    Payload::String(value.clone()),
                    TypeLabel::string(),
                    span.line,
                );
            }
            Expression::Array { items, span } => {
                return self.detect_array(name, items, span.line);
            }
            _ => {}
        }

        self.detect_structural(name, expr)
    }

    /// Latest recorded write of the referenced variable, else the parameter
    /// bound to the target name in the current scope
    fn detect_variable(&self, name: &str, referenced: &str) -> Option<Value> {
        let latest = self
            .scopes
            .lookup_variable(self.scope, referenced)
            .and_then(|history| history.last())
            .map(|(_, value)| value.clone());

        latest.or_else(|| {
            self.scopes
                .get(self.scope)
                .lookup_parameter(name)
                .cloned()
        })
    }

    fn detect_array(&self, name: &str, items: &[ArrayItem], line: usize) -> Value {
        if items.is_empty() {
            return Value::resolved(name, Payload::Array(Vec::new()), TypeLabel::array(), line);
        }

        let mut key_type = None;
        let mut value_type = None;
        let mut values = Vec::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            let observed_key = match &item.key {
                Some(key) => self.detect(&format!("key_{}", i), key).ty().clone(),
                None => TypeLabel::int(),
            };
            key_type = Some(TypeLabel::unify(key_type, observed_key));

            let value = self.detect(&format!("value_{}", i), &item.value);
            value_type = Some(TypeLabel::unify(value_type, value.ty().clone()));
            values.push(value);
        }

        let ty = TypeLabel::for_array(
            key_type.unwrap_or(TypeLabel::Mixed),
            value_type.unwrap_or(TypeLabel::Mixed),
        );
        Value::resolved(name, Payload::Array(values), ty, line)
    }

    /// Generic recursion over the immediate children of `expr`
    fn detect_structural(&self, name: &str, expr: &Expression) -> Value {
        let mut found: Vec<Value> = expr
            .children()
            .into_iter()
            .map(|child| self.detect(name, child))
            .filter(Value::is_resolved)
            .collect();

        match found.len() {
            0 => Value::unresolved(name, TypeLabel::Mixed, expr.line()),
            // A lone resolved operand passes through untouched
            1 => found.remove(0),
            _ => {
                let candidates = found.into_iter().map(|value| value.ty().clone()).collect();
                Value::unresolved(name, TypeLabel::union(candidates), expr.line())
            }
        }
    }
}
