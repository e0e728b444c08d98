//! Type labels inferred for values

use std::fmt;

/// Primitive labels produced by literal recognition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Float,
    String,
    Array,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Array => "array",
        }
    }
}

/// Inferred type of a value.
///
/// Rendered as a string (`int[]`, `array<string, mixed>`, `int|string`) only
/// when displayed.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeLabel {
    Primitive(Primitive),
    /// Declared annotation with no dedicated variant (`bool`, `?int`, `Foo`)
    Named(String),
    /// Sequence whose keys and values share one type: `T[]`
    Homogeneous(Box<TypeLabel>),
    /// Key type differs from value type: `array<K, V>`
    Mapping {
        key: Box<TypeLabel>,
        value: Box<TypeLabel>,
    },
    /// Several competing candidates, in the order they were found
    Union(Vec<TypeLabel>),
    Mixed,
}

impl TypeLabel {
    pub fn int() -> Self {
        TypeLabel::Primitive(Primitive::Int)
    }

    pub fn float() -> Self {
        TypeLabel::Primitive(Primitive::Float)
    }

    pub fn string() -> Self {
        TypeLabel::Primitive(Primitive::String)
    }

    pub fn array() -> Self {
        TypeLabel::Primitive(Primitive::Array)
    }

    /// Interpret a declared type hint such as `int`, `mixed` or `int|string`
    pub fn from_annotation(annotation: &str) -> Self {
        let annotation = annotation.trim();

        if annotation.contains('|') {
            return TypeLabel::Union(annotation.split('|').map(Self::from_annotation).collect());
        }

        match annotation.to_ascii_lowercase().as_str() {
            "int" => TypeLabel::int(),
            "float" => TypeLabel::float(),
            "string" => TypeLabel::string(),
            "array" => TypeLabel::array(),
            "mixed" | "" => TypeLabel::Mixed,
            _ => TypeLabel::Named(annotation.to_string()),
        }
    }

    /// Union of the given candidates; a single candidate stands for itself
    pub fn union(mut candidates: Vec<TypeLabel>) -> Self {
        match candidates.len() {
            0 => TypeLabel::Mixed,
            1 => candidates.remove(0),
            _ => TypeLabel::Union(candidates),
        }
    }

    /// Fold one more observed type into a running unification:
    /// equal observations keep the type, any disagreement yields `mixed`.
    pub fn unify(current: Option<TypeLabel>, observed: TypeLabel) -> TypeLabel {
        match current {
            Some(current) if current != observed => TypeLabel::Mixed,
            _ => observed,
        }
    }

    /// Label of an array from its unified key and value types
    pub fn for_array(key: TypeLabel, value: TypeLabel) -> Self {
        if key == value {
            TypeLabel::Homogeneous(Box::new(value))
        } else {
            TypeLabel::Mapping {
                key: Box::new(key),
                value: Box::new(value),
            }
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, TypeLabel::Mixed)
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeLabel::Primitive(primitive) => f.write_str(primitive.as_str()),
            TypeLabel::Named(name) => f.write_str(name),
            TypeLabel::Homogeneous(inner) => write!(f, "{}[]", inner),
            TypeLabel::Mapping { key, value } => write!(f, "array<{}, {}>", key, value),
            TypeLabel::Union(labels) => {
                for (i, label) in labels.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{}", label)?;
                }
                Ok(())
            }
            TypeLabel::Mixed => f.write_str("mixed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TypeLabel::for_array(TypeLabel::int(), TypeLabel::int()).to_string(), "int[]");
        assert_eq!(
            TypeLabel::for_array(TypeLabel::string(), TypeLabel::Mixed).to_string(),
            "array<string, mixed>"
        );
        assert_eq!(
            TypeLabel::union(vec![TypeLabel::int(), TypeLabel::string()]).to_string(),
            "int|string"
        );
    }

    #[test]
    fn test_unify() {
        let first = TypeLabel::unify(None, TypeLabel::int());
        assert_eq!(first, TypeLabel::int());

        let same = TypeLabel::unify(Some(first), TypeLabel::int());
        assert_eq!(same, TypeLabel::int());

        let differ = TypeLabel::unify(Some(same), TypeLabel::string());
        assert!(differ.is_mixed());

        // Once mixed, further disagreement stays mixed
        assert!(TypeLabel::unify(Some(differ), TypeLabel::float()).is_mixed());
    }

    #[test]
    fn test_from_annotation() {
        assert_eq!(TypeLabel::from_annotation("int"), TypeLabel::int());
        assert_eq!(TypeLabel::from_annotation("mixed"), TypeLabel::Mixed);
        assert_eq!(
            TypeLabel::from_annotation("?int"),
            TypeLabel::Named("?int".to_string())
        );
        assert_eq!(TypeLabel::from_annotation("int|float").to_string(), "int|float");
    }
}
