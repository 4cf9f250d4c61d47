//! Type descriptor mangling
//!
//! Pure mapping from resolved semantic types to wire descriptor strings and
//! opcode families. Boolean and integer share one descriptor letter and one
//! family; record descriptors are built from their field types in declared
//! order, so structurally identical records collapse to a single synthesized
//! class no matter where or under what name they were declared. The mapping
//! is total over the resolved-type domain.

use orin_ast::types::{Primitive, Type};

/// Opcode family selecting the mnemonic prefix for typed instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// `i`-prefixed: integers and booleans
    Int,
    /// `f`-prefixed: reals
    Float,
    /// `a`-prefixed: arrays and records
    Ref,
}

/// Opcode family of a value of type `ty`; void and routine signatures have
/// no value representation and no family
pub fn family(ty: &Type) -> Option<Family> {
    match ty {
        Type::Primitive(Primitive::Boolean) | Type::Primitive(Primitive::Integer) => {
            Some(Family::Int)
        }
        Type::Primitive(Primitive::Real) => Some(Family::Float),
        Type::Primitive(Primitive::Void) => None,
        Type::Array { .. } | Type::Record { .. } => Some(Family::Ref),
        Type::Function { .. } => None,
    }
}

/// Wire descriptor of a type; void mangles to the empty string
pub fn descriptor(ty: &Type) -> String {
    match ty {
        Type::Primitive(Primitive::Boolean) | Type::Primitive(Primitive::Integer) => {
            "I".to_string()
        }
        Type::Primitive(Primitive::Real) => "F".to_string(),
        Type::Primitive(Primitive::Void) => String::new(),
        Type::Array { elem, .. } => format!("[{}", descriptor(elem)),
        Type::Record { .. } => format!("L{};", record_class_name(ty)),
        Type::Function { params, ret } => method_descriptor(params, ret),
    }
}

/// Method descriptor `(args)ret` from resolved signature parts
pub fn method_descriptor(params: &[Type], ret: &Type) -> String {
    let args: String = params.iter().map(|p| descriptor(p)).collect();
    let ret = if ret.is_void() {
        "V".to_string()
    } else {
        descriptor(ret)
    };
    format!("({}){}", args, ret)
}

/// Name of the synthesized class backing a record shape
///
/// The name encodes the ordered field-type sequence: one letter per scalar,
/// an `A` prefix per array dimension, and the nested class name with a `_`
/// terminator for record fields. The terminator keeps the encoding uniquely
/// decodable, so two structurally different records can never share a name.
pub fn record_class_name(ty: &Type) -> String {
    let fields = ty
        .record_fields()
        .expect("record_class_name requires a record type");
    let mut name = String::from("Rec");
    for field in fields {
        name.push_str(&name_atom(&field.ty));
    }
    name
}

fn name_atom(ty: &Type) -> String {
    match ty {
        Type::Primitive(Primitive::Boolean) | Type::Primitive(Primitive::Integer) => {
            "I".to_string()
        }
        Type::Primitive(Primitive::Real) => "F".to_string(),
        Type::Primitive(Primitive::Void) | Type::Function { .. } => String::new(),
        Type::Array { elem, .. } => format!("A{}", name_atom(elem)),
        Type::Record { .. } => format!("{}_", record_class_name(ty)),
    }
}
