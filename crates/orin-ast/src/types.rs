//! Resolved semantic types
//!
//! The resolver guarantees that no type alias survives resolution, so this
//! representation simply has no alias variant: the invariant is enforced by
//! construction rather than checked at runtime.

use serde::{Deserialize, Serialize};

/// Primitive (scalar) types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Boolean,
    Integer,
    Real,
    Void,
}

/// A named record field with its resolved type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// A fully resolved semantic type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    /// Scalar type
    Primitive(Primitive),

    /// Array type; `size` is present for fixed-size arrays and absent for
    /// unsized array parameters
    Array { elem: Box<Type>, size: Option<u32> },

    /// Record type with ordered named fields
    Record { fields: Vec<Field> },

    /// Routine signature: ordered argument types and return type
    Function { params: Vec<Type>, ret: Box<Type> },
}

impl Type {
    /// The `boolean` type
    pub fn boolean() -> Self {
        Type::Primitive(Primitive::Boolean)
    }

    /// The `integer` type
    pub fn integer() -> Self {
        Type::Primitive(Primitive::Integer)
    }

    /// The `real` type
    pub fn real() -> Self {
        Type::Primitive(Primitive::Real)
    }

    /// The `void` type (routines without a return value)
    pub fn void() -> Self {
        Type::Primitive(Primitive::Void)
    }

    /// Fixed-size array of `elem`
    pub fn array(elem: Type, size: u32) -> Self {
        Type::Array {
            elem: Box::new(elem),
            size: Some(size),
        }
    }

    /// Check for the void type
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Primitive(Primitive::Void))
    }

    /// Check for the boolean type
    pub fn is_boolean(&self) -> bool {
        matches!(self, Type::Primitive(Primitive::Boolean))
    }

    /// Check for the real type
    pub fn is_real(&self) -> bool {
        matches!(self, Type::Primitive(Primitive::Real))
    }

    /// Scalars are primitive; arrays, records and routines are not
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Composite types need a synthesized backing representation
    pub fn is_composite(&self) -> bool {
        matches!(self, Type::Array { .. } | Type::Record { .. })
    }

    /// Record fields, if this is a record type
    pub fn record_fields(&self) -> Option<&[Field]> {
        match self {
            Type::Record { fields } => Some(fields),
            _ => None,
        }
    }

    /// Structural position of a record field by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.record_fields()?.iter().position(|f| f.name == name)
    }

    /// Element type, if this is an array type
    pub fn array_elem(&self) -> Option<&Type> {
        match self {
            Type::Array { elem, .. } => Some(elem),
            _ => None,
        }
    }
}
