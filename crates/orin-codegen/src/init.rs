//! Default construction of composite values
//!
//! Declarations without an explicit initializer, and record fields during
//! constructor synthesis, are default-constructed here: scalars get their
//! zero value, fixed arrays get an allocation sized from their type, and
//! records get an instance of their backing class. Explicit initializers
//! bypass this path entirely.

use crate::descriptor::{descriptor, family, record_class_name, Family};
use crate::error::{CodegenError, CodegenResult};
use crate::stmt::RoutineCompiler;
use orin_ast::types::{Primitive, Type};
use orin_jasm::{ArrayElem, Const, Instr};

impl<'a> RoutineCompiler<'a> {
    /// Push the default value of `ty`
    pub(crate) fn emit_default_init(&mut self, ty: &Type) -> CodegenResult<()> {
        match ty {
            Type::Primitive(Primitive::Boolean) | Type::Primitive(Primitive::Integer) => {
                self.push_int(0);
                Ok(())
            }
            Type::Primitive(Primitive::Real) => {
                self.emit(Instr::Ldc(Const::Float(0.0)));
                Ok(())
            }
            Type::Array { .. } => self.emit_array_init(ty),
            Type::Record { .. } => self.emit_record_init(ty),
            Type::Primitive(Primitive::Void) | Type::Function { .. } => Err(
                CodegenError::internal(format!("type {:?} has no default value", ty)),
            ),
        }
    }

    /// Allocate a fixed array: dimension sizes outermost-first, then one
    /// allocation opcode
    pub(crate) fn emit_array_init(&mut self, ty: &Type) -> CodegenResult<()> {
        let mut dims = 0u8;
        let mut current = ty;
        while let Type::Array {
            elem,
            size: Some(size),
        } = current
        {
            self.push_int(*size as i32);
            dims += 1;
            current = elem;
        }
        if dims == 0 {
            return Err(CodegenError::internal(
                "array without a fixed size has no default construction",
            ));
        }

        if dims == 1 {
            let elem = ty.array_elem().expect("checked above");
            match family(elem) {
                Some(Family::Int) => self.emit(Instr::Newarray(ArrayElem::Int)),
                Some(Family::Float) => self.emit(Instr::Newarray(ArrayElem::Float)),
                Some(Family::Ref) => {
                    let name = match elem {
                        Type::Record { .. } => record_class_name(elem),
                        other => descriptor(other),
                    };
                    self.emit(Instr::Anewarray(name));
                }
                None => {
                    return Err(CodegenError::internal(format!(
                        "array of {:?} has no element representation",
                        elem
                    )))
                }
            }
        } else {
            self.emit(Instr::Multianewarray {
                desc: descriptor(ty),
                dims,
            });
        }
        Ok(())
    }

    /// Allocate a record and run its no-argument constructor
    pub(crate) fn emit_record_init(&mut self, ty: &Type) -> CodegenResult<()> {
        if ty.record_fields().is_none() {
            return Err(CodegenError::internal(format!(
                "record construction of non-record type {:?}",
                ty
            )));
        }
        let name = record_class_name(ty);
        self.emit(Instr::New(name.clone()));
        self.emit(Instr::Dup);
        self.emit(Instr::Invokespecial {
            owner: name,
            name: "<init>".to_string(),
            desc: "()V".to_string(),
        });
        Ok(())
    }
}
