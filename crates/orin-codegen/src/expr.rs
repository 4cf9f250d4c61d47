//! Expression compilation
//!
//! Expressions compile in one of two modes. Value mode pushes the result on
//! the operand stack; branch mode compiles the expression as a jump
//! decision and pushes nothing. Relational and short-circuit operators are
//! naturally branch-shaped; every other consumer needs a value, and boolean
//! results are materialized as integer 0/1 through the branch machinery
//! since the stack has no native boolean representation.
//!
//! Branch-compiled code transfers control to `on_true` exactly when the
//! expression holds and to `on_false` otherwise, and never relies on
//! instruction layout: relational leaves emit the inverse compare-jump to
//! `on_false` followed by a jump to `on_true`. That discipline is what lets
//! `not` compile as a pure label swap and lets `or`/`and` short-circuit
//! with a single extra label each.

use crate::descriptor::{descriptor, Family};
use crate::error::{CodegenError, CodegenResult};
use crate::stmt::{require_family, RoutineCompiler};
use orin_ast::{BinaryOp, Expr, ExprKind, Type, UnaryOp};
use orin_jasm::{Cond, Const, Instr, Label};

/// Compilation mode for expressions
#[derive(Debug, Clone, Copy)]
pub enum Mode {
    /// Push the result on the operand stack
    Value,
    /// Jump to `on_true` or `on_false`; push nothing
    Branch { on_true: Label, on_false: Label },
}

impl<'a> RoutineCompiler<'a> {
    pub fn compile_expr(&mut self, expr: &Expr, mode: Mode) -> CodegenResult<()> {
        match mode {
            Mode::Value => self.compile_value(expr),
            Mode::Branch { on_true, on_false } => self.compile_branch(expr, on_true, on_false),
        }
    }

    fn compile_value(&mut self, expr: &Expr) -> CodegenResult<()> {
        match &expr.kind {
            ExprKind::Int(value) => {
                self.push_int(*value);
                Ok(())
            }
            ExprKind::Bool(value) => {
                self.push_int(*value as i32);
                Ok(())
            }
            ExprKind::Real(value) => {
                self.emit(Instr::Ldc(Const::Float(*value as f32)));
                Ok(())
            }

            ExprKind::Var(name) => match self.ctx.lookup(name) {
                Some(slot) => {
                    let load = match require_family(&expr.ty)? {
                        Family::Int => Instr::Iload(slot),
                        Family::Float => Instr::Fload(slot),
                        Family::Ref => Instr::Aload(slot),
                    };
                    self.emit(load);
                    Ok(())
                }
                None => {
                    self.emit(Instr::Getstatic {
                        owner: self.class.to_string(),
                        name: name.clone(),
                        desc: descriptor(&expr.ty),
                    });
                    Ok(())
                }
            },

            ExprKind::Index { array, index } => {
                self.compile_value(array)?;
                self.compile_value(index)?;
                // Source indices are one-based.
                self.emit(Instr::Iconst(1));
                self.emit(Instr::Isub);
                let load = match require_family(&expr.ty)? {
                    Family::Int => Instr::Iaload,
                    Family::Float => Instr::Faload,
                    Family::Ref => Instr::Aaload,
                };
                self.emit(load);
                Ok(())
            }

            ExprKind::Field { record, field } => {
                let index = record.ty.field_index(field).ok_or_else(|| {
                    CodegenError::internal(format!(
                        "read of unknown field {} of {:?}",
                        field, record.ty
                    ))
                })?;
                self.compile_value(record)?;
                self.emit(Instr::Getfield {
                    owner: crate::descriptor::record_class_name(&record.ty),
                    name: format!("f{}", index),
                    desc: descriptor(&expr.ty),
                });
                Ok(())
            }

            ExprKind::Len(array) => {
                self.compile_value(array)?;
                self.emit(Instr::Arraylength);
                Ok(())
            }

            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => {
                self.compile_value(operand)?;
                let neg = match require_family(&expr.ty)? {
                    Family::Int => Instr::Ineg,
                    Family::Float => Instr::Fneg,
                    Family::Ref => {
                        return Err(CodegenError::internal("negation of a reference value"))
                    }
                };
                self.emit(neg);
                Ok(())
            }

            ExprKind::Unary {
                op: UnaryOp::Not, ..
            } => self.materialize(expr),

            ExprKind::Binary { op, lhs, rhs } => {
                if op.is_comparison() || op.is_logical() {
                    return self.materialize(expr);
                }
                self.compile_value(lhs)?;
                self.compile_value(rhs)?;
                let instr = match (*op, require_family(&expr.ty)?) {
                    (BinaryOp::Add, Family::Int) => Instr::Iadd,
                    (BinaryOp::Sub, Family::Int) => Instr::Isub,
                    (BinaryOp::Mul, Family::Int) => Instr::Imul,
                    (BinaryOp::Div, Family::Int) => Instr::Idiv,
                    (BinaryOp::Mod, Family::Int) => Instr::Irem,
                    (BinaryOp::Xor, Family::Int) => Instr::Ixor,
                    (BinaryOp::Add, Family::Float) => Instr::Fadd,
                    (BinaryOp::Sub, Family::Float) => Instr::Fsub,
                    (BinaryOp::Mul, Family::Float) => Instr::Fmul,
                    (BinaryOp::Div, Family::Float) => Instr::Fdiv,
                    (BinaryOp::Mod, Family::Float) => Instr::Frem,
                    (op, fam) => {
                        return Err(CodegenError::internal(format!(
                            "operator {} has no {:?}-family form",
                            op, fam
                        )))
                    }
                };
                self.emit(instr);
                Ok(())
            }

            ExprKind::Call { routine, args } => self.compile_invocation(routine, args, &expr.ty),

            ExprKind::Cast(inner) => self.compile_cast(inner, &expr.ty),
        }
    }

    fn compile_branch(&mut self, expr: &Expr, on_true: Label, on_false: Label) -> CodegenResult<()> {
        match &expr.kind {
            ExprKind::Binary {
                op: BinaryOp::Or,
                lhs,
                rhs,
            } => {
                // A true left result jumps straight to the then-label; a
                // false one falls to the right operand, the final decision.
                let eval_right = self.ctx.fresh_label()?;
                self.compile_branch(lhs, on_true, eval_right)?;
                self.emit(Instr::Label(eval_right));
                self.compile_branch(rhs, on_true, on_false)
            }

            ExprKind::Binary {
                op: BinaryOp::And,
                lhs,
                rhs,
            } => {
                let eval_right = self.ctx.fresh_label()?;
                self.compile_branch(lhs, eval_right, on_false)?;
                self.emit(Instr::Label(eval_right));
                self.compile_branch(rhs, on_true, on_false)
            }

            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => self.compile_branch(operand, on_false, on_true),

            ExprKind::Binary { op, lhs, rhs } if op.is_comparison() => {
                self.compile_comparison(*op, lhs, rhs, on_true, on_false)
            }

            // Anything else produces a 0/1 value tested against zero.
            _ => {
                self.compile_value(expr)?;
                self.emit(Instr::If(Cond::Eq, on_false));
                self.emit(Instr::Goto(on_true));
                Ok(())
            }
        }
    }

    fn compile_comparison(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        on_true: Label,
        on_false: Label,
    ) -> CodegenResult<()> {
        self.compile_value(lhs)?;
        self.compile_value(rhs)?;
        let cond = comparison_cond(op)?;
        match require_family(&lhs.ty)? {
            Family::Int => {
                self.emit(Instr::IfIcmp(invert(cond), on_false));
            }
            Family::Float => {
                let reduce = match op {
                    BinaryOp::Gt | BinaryOp::Ge => Instr::Fcmpg,
                    _ => Instr::Fcmpl,
                };
                self.emit(reduce);
                self.emit(Instr::If(invert(cond), on_false));
            }
            Family::Ref => {
                return Err(CodegenError::internal(
                    "comparison of reference operands reached the generator",
                ))
            }
        }
        self.emit(Instr::Goto(on_true));
        Ok(())
    }

    /// Branch-compile a boolean expression and materialize the decision as
    /// an integer 0/1
    fn materialize(&mut self, expr: &Expr) -> CodegenResult<()> {
        let on_true = self.ctx.fresh_label()?;
        let on_false = self.ctx.fresh_label()?;
        let end = self.ctx.fresh_label()?;
        self.compile_branch(expr, on_true, on_false)?;
        self.emit(Instr::Label(on_true));
        self.emit(Instr::Iconst(1));
        self.emit(Instr::Goto(end));
        self.emit(Instr::Label(on_false));
        self.emit(Instr::Iconst(0));
        self.emit(Instr::Label(end));
        Ok(())
    }

    fn compile_cast(&mut self, inner: &Expr, target: &Type) -> CodegenResult<()> {
        // Boolean operator shapes materialize to 0/1 through their own
        // value-mode path before any numeric conversion.
        self.compile_value(inner)?;
        match (require_family(&inner.ty)?, require_family(target)?) {
            (Family::Int, Family::Float) => self.emit(Instr::I2f),
            (Family::Float, Family::Int) => self.emit(Instr::F2i),
            _ => {}
        }
        Ok(())
    }

    /// Push an integer using the most compact form its value allows
    pub(crate) fn push_int(&mut self, value: i32) {
        let instr = match value {
            -1 => Instr::IconstM1,
            0..=5 => Instr::Iconst(value as u8),
            -128..=127 => Instr::Bipush(value as i8),
            _ => Instr::Ldc(Const::Int(value)),
        };
        self.emit(instr);
    }
}

fn comparison_cond(op: BinaryOp) -> CodegenResult<Cond> {
    match op {
        BinaryOp::Lt => Ok(Cond::Lt),
        BinaryOp::Le => Ok(Cond::Le),
        BinaryOp::Gt => Ok(Cond::Gt),
        BinaryOp::Ge => Ok(Cond::Ge),
        BinaryOp::Eq => Ok(Cond::Eq),
        BinaryOp::Ne => Ok(Cond::Ne),
        other => Err(CodegenError::internal(format!(
            "operator {} is not a comparison",
            other
        ))),
    }
}

/// Inverse jump condition; exhaustive over all six comparison forms
fn invert(cond: Cond) -> Cond {
    match cond {
        Cond::Eq => Cond::Ne,
        Cond::Ne => Cond::Eq,
        Cond::Lt => Cond::Ge,
        Cond::Ge => Cond::Lt,
        Cond::Gt => Cond::Le,
        Cond::Le => Cond::Gt,
    }
}
