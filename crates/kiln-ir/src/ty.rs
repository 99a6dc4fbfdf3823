//! Value types as far as they are known before resolution
//!
//! Scope resolution attaches a `ValueType` to fields, variables and type
//! symbols when the type is evident from the declaration. Anything that
//! still depends on resolution is `Unknown`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// Signed integer
    Int,
    /// Unsigned integer
    Uint,
    /// Floating point
    Real,
    /// Imaginary
    Imag,
    /// Complex
    Complex,
    /// Boolean
    Bool,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Int => write!(f, "int"),
            ScalarKind::Uint => write!(f, "uint"),
            ScalarKind::Real => write!(f, "real"),
            ScalarKind::Imag => write!(f, "imag"),
            ScalarKind::Complex => write!(f, "complex"),
            ScalarKind::Bool => write!(f, "bool"),
        }
    }
}

/// Type of a value, field or symbol
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueType {
    /// Not known until resolution
    #[default]
    Unknown,
    /// The `any` type (unconstrained type variable)
    Any,
    /// Primitive scalar
    Scalar {
        /// Scalar kind
        scalar: ScalarKind,
    },
    /// Reference (class) type
    Class {
        /// Class name
        name: String,
        /// Whether the class still has unbound generic parameters
        #[serde(default)]
        generic: bool,
    },
    /// Value (record) type
    Record {
        /// Record name
        name: String,
        /// Whether the record still has unbound generic parameters
        #[serde(default)]
        generic: bool,
        /// Whether the record declares its own initializers
        #[serde(default)]
        has_initializers: bool,
    },
}

impl ValueType {
    /// Scalar type shorthand
    pub fn scalar(scalar: ScalarKind) -> Self {
        ValueType::Scalar { scalar }
    }

    /// Non-generic class shorthand
    pub fn class(name: impl Into<String>) -> Self {
        ValueType::Class {
            name: name.into(),
            generic: false,
        }
    }

    /// Non-generic record with initializers shorthand
    pub fn record(name: impl Into<String>) -> Self {
        ValueType::Record {
            name: name.into(),
            generic: false,
            has_initializers: true,
        }
    }

    /// True unless the type is `Unknown`
    pub fn is_known(&self) -> bool {
        !matches!(self, ValueType::Unknown)
    }

    /// int, uint, real, imag, complex or bool
    pub fn is_primitive_scalar(&self) -> bool {
        matches!(self, ValueType::Scalar { .. })
    }

    /// Class type without unbound generic parameters
    pub fn is_non_generic_class(&self) -> bool {
        matches!(self, ValueType::Class { generic: false, .. })
    }

    /// Record type without unbound generic parameters that has initializers
    pub fn is_non_generic_record_with_initializers(&self) -> bool {
        matches!(
            self,
            ValueType::Record {
                generic: false,
                has_initializers: true,
                ..
            }
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Unknown => write!(f, "?"),
            ValueType::Any => write!(f, "any"),
            ValueType::Scalar { scalar } => write!(f, "{}", scalar),
            ValueType::Class { name, .. } | ValueType::Record { name, .. } => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_predicates() {
        let int = ValueType::scalar(ScalarKind::Int);
        assert!(int.is_primitive_scalar());
        assert!(!int.is_non_generic_class());

        let generic_class = ValueType::Class {
            name: "List".to_string(),
            generic: true,
        };
        assert!(!generic_class.is_non_generic_class());
        assert!(ValueType::class("Node").is_non_generic_class());

        let plain_record = ValueType::Record {
            name: "Pair".to_string(),
            generic: false,
            has_initializers: false,
        };
        assert!(!plain_record.is_non_generic_record_with_initializers());
        assert!(ValueType::record("Pair").is_non_generic_record_with_initializers());

        assert!(!ValueType::Unknown.is_known());
    }

    #[test]
    fn test_deserialize_tagged() {
        let ty: ValueType = serde_json::from_str(r#"{"kind":"scalar","scalar":"real"}"#).unwrap();
        assert_eq!(ty, ValueType::scalar(ScalarKind::Real));
        assert_eq!(ty.to_string(), "real");
    }
}
