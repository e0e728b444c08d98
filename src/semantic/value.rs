//! Inferred values

use std::fmt;

use super::types::TypeLabel;

/// Concrete payload of a resolved value
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Int(i64),
    Float(f64),
    String(String),
    /// Element values of an array literal, in source order
    Array(Vec<Value>),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Int(n) => write!(f, "{}", n),
            Payload::Float(n) => write!(f, "{:?}", n),
            Payload::String(s) => write!(f, "{:?}", s),
            Payload::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match value.value() {
                        Some(payload) => write!(f, "{}", payload)?,
                        None => write!(f, "?{}", value.ty())?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

/// A name bound to what is known about its value at one source line.
///
/// An absent payload means the value could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    name: String,
    value: Option<Payload>,
    ty: TypeLabel,
    line: usize,
}

impl Value {
    pub fn new(name: &str, value: Option<Payload>, ty: TypeLabel, line: usize) -> Self {
        Self {
            name: name.to_string(),
            value,
            ty,
            line,
        }
    }

    pub fn resolved(name: &str, payload: Payload, ty: TypeLabel, line: usize) -> Self {
        Self::new(name, Some(payload), ty, line)
    }

    pub fn unresolved(name: &str, ty: TypeLabel, line: usize) -> Self {
        Self::new(name, None, ty, line)
    }

    /// Same value, bound to another name
    pub fn with_name(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&Payload> {
        self.value.as_ref()
    }

    pub fn ty(&self) -> &TypeLabel {
        &self.ty
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(payload) => write!(f, "{} ({})", payload, self.ty),
            None => write!(f, "? ({})", self.ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_name_keeps_everything_else() {
        let value = Value::resolved("a", Payload::Int(23), TypeLabel::int(), 15);
        let renamed = value.with_name("value");

        assert_eq!(renamed.name(), "value");
        assert_eq!(renamed.value(), Some(&Payload::Int(23)));
        assert_eq!(renamed.ty(), &TypeLabel::int());
        assert_eq!(renamed.line(), 15);
        assert_eq!(value.name(), "a");
    }

    #[test]
    fn test_display() {
        let array = Value::resolved(
            "xs",
            Payload::Array(vec![
                Value::resolved("value_0", Payload::Int(1), TypeLabel::int(), 1),
                Value::unresolved("value_1", TypeLabel::Mixed, 1),
            ]),
            TypeLabel::array(),
            1,
        );

        assert_eq!(array.to_string(), "[1, ?mixed] (array)");
        assert_eq!(
            Value::resolved("s", Payload::String("foobar".into()), TypeLabel::string(), 2)
                .to_string(),
            "\"foobar\" (string)"
        );
        assert_eq!(Value::unresolved("p", TypeLabel::Mixed, 3).to_string(), "? (mixed)");
    }
}
