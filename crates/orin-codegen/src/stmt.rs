//! Statement compilation
//!
//! Translates lowered statements into instructions. By the time code
//! reaches this module the lowering pass has rewritten every `for`-style
//! loop, so `while` is the only loop shape compiled here. Break and
//! continue outside a loop are upstream contract violations surfaced as
//! errors, not re-validated semantics.

use crate::context::{LoopLabels, RoutineCtx};
use crate::descriptor::{descriptor, family, method_descriptor, record_class_name, Family};
use crate::error::{CodegenError, CodegenResult};
use crate::expr::Mode;
use orin_ast::{Assign, Expr, If, Print, Return, RoutineCall, Stmt, Target, Type, VarDecl, While};
use orin_jasm::{Const, Instr};

/// Compiles one routine body into a flat instruction list
///
/// Created when a routine body begins compiling and discarded once its
/// instruction list is finalized; never shared or reused.
pub struct RoutineCompiler<'a> {
    pub(crate) ctx: RoutineCtx,
    pub(crate) code: Vec<Instr>,
    /// Owner class for static fields and routine invocations
    pub(crate) class: &'a str,
    /// Declared return type of the routine being compiled
    pub(crate) ret: Type,
}

impl<'a> RoutineCompiler<'a> {
    pub fn new(class: &'a str, ret: Type) -> Self {
        Self {
            ctx: RoutineCtx::new(),
            code: Vec::new(),
            class,
            ret,
        }
    }

    /// Bind a routine argument to the next slot
    pub fn declare_param(&mut self, name: &str) -> CodegenResult<u16> {
        self.ctx.declare(name)
    }

    pub(crate) fn emit(&mut self, instr: Instr) {
        self.code.push(instr);
    }

    /// Finalize: the instruction list and the routine's slot limit
    pub fn finish(self) -> (Vec<Instr>, u16) {
        (self.code, self.ctx.max_locals())
    }

    pub fn compile_body(&mut self, stmts: &[Stmt]) -> CodegenResult<()> {
        for stmt in stmts {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn compile_stmt(&mut self, stmt: &Stmt) -> CodegenResult<()> {
        if let Some(line) = stmt_line(stmt) {
            self.emit(Instr::Line(line));
        }
        match stmt {
            Stmt::VarDecl(decl) => self.compile_var_decl(decl),
            Stmt::Assign(assign) => self.compile_assign(assign),
            Stmt::If(if_stmt) => self.compile_if(if_stmt),
            Stmt::While(while_stmt) => self.compile_while(while_stmt),
            Stmt::Break { .. } => self.compile_break(),
            Stmt::Continue { .. } => self.compile_continue(),
            Stmt::Return(ret) => self.compile_return(ret),
            Stmt::Print(print) => self.compile_print(print),
            Stmt::Call(call) => self.compile_call_stmt(call),
            Stmt::Block(block) => {
                self.ctx.enter_block();
                let result = self.compile_body(&block.body);
                self.ctx.exit_block();
                result
            }
            Stmt::ForRange(_) | Stmt::ForEach(_) => Err(CodegenError::internal(
                "loop statement reached the generator without being lowered",
            )),
        }
    }

    fn compile_var_decl(&mut self, decl: &VarDecl) -> CodegenResult<()> {
        let slot = self.ctx.declare(&decl.name)?;
        match &decl.init {
            Some(init) => self.compile_expr(init, Mode::Value)?,
            None => self.emit_default_init(&decl.ty)?,
        }
        self.emit_store_slot(&decl.ty, slot)
    }

    fn compile_assign(&mut self, assign: &Assign) -> CodegenResult<()> {
        match &assign.target {
            Target::Var { name, ty } => {
                self.compile_expr(&assign.value, Mode::Value)?;
                match self.ctx.lookup(name) {
                    Some(slot) => self.emit_store_slot(ty, slot),
                    None => {
                        self.emit(Instr::Putstatic {
                            owner: self.class.to_string(),
                            name: name.clone(),
                            desc: descriptor(ty),
                        });
                        Ok(())
                    }
                }
            }
            Target::Index { array, index } => {
                let elem_ty = array.ty.array_elem().cloned().ok_or_else(|| {
                    CodegenError::internal(format!(
                        "element assignment into non-array type {:?}",
                        array.ty
                    ))
                })?;
                self.compile_expr(array, Mode::Value)?;
                self.compile_expr(index, Mode::Value)?;
                // Source indices are one-based.
                self.emit(Instr::Iconst(1));
                self.emit(Instr::Isub);
                self.compile_expr(&assign.value, Mode::Value)?;
                let store = match require_family(&elem_ty)? {
                    Family::Int => Instr::Iastore,
                    Family::Float => Instr::Fastore,
                    Family::Ref => Instr::Aastore,
                };
                self.emit(store);
                Ok(())
            }
            Target::Field { record, field } => {
                let index = record.ty.field_index(field).ok_or_else(|| {
                    CodegenError::internal(format!(
                        "assignment to unknown field {} of {:?}",
                        field, record.ty
                    ))
                })?;
                let field_ty = record.ty.record_fields().expect("checked above")[index]
                    .ty
                    .clone();
                self.compile_expr(record, Mode::Value)?;
                self.compile_expr(&assign.value, Mode::Value)?;
                self.emit(Instr::Putfield {
                    owner: record_class_name(&record.ty),
                    name: format!("f{}", index),
                    desc: descriptor(&field_ty),
                });
                Ok(())
            }
        }
    }

    fn compile_if(&mut self, if_stmt: &If) -> CodegenResult<()> {
        let then_label = self.ctx.fresh_label()?;
        let end_label = self.ctx.fresh_label()?;
        // The else label collapses into the end label when no else exists.
        let else_label = if if_stmt.else_body.is_some() {
            self.ctx.fresh_label()?
        } else {
            end_label
        };

        self.compile_expr(
            &if_stmt.cond,
            Mode::Branch {
                on_true: then_label,
                on_false: else_label,
            },
        )?;

        self.emit(Instr::Label(then_label));
        self.ctx.enter_block();
        let then_result = self.compile_body(&if_stmt.then_body);
        self.ctx.exit_block();
        then_result?;

        if let Some(else_body) = &if_stmt.else_body {
            self.emit(Instr::Goto(end_label));
            self.emit(Instr::Label(else_label));
            self.ctx.enter_block();
            let else_result = self.compile_body(else_body);
            self.ctx.exit_block();
            else_result?;
        }

        self.emit(Instr::Label(end_label));
        Ok(())
    }

    fn compile_while(&mut self, while_stmt: &While) -> CodegenResult<()> {
        let start_label = self.ctx.fresh_label()?;
        let body_label = self.ctx.fresh_label()?;
        let end_label = self.ctx.fresh_label()?;

        self.emit(Instr::Label(start_label));
        self.compile_expr(
            &while_stmt.cond,
            Mode::Branch {
                on_true: body_label,
                on_false: end_label,
            },
        )?;
        self.emit(Instr::Label(body_label));

        self.ctx.push_loop(LoopLabels {
            start: start_label,
            cond: start_label,
            end: end_label,
        });
        self.ctx.enter_block();
        let body_result = self.compile_body(&while_stmt.body);
        self.ctx.exit_block();
        self.ctx.pop_loop();
        body_result?;

        self.emit(Instr::Goto(start_label));
        self.emit(Instr::Label(end_label));
        Ok(())
    }

    fn compile_break(&mut self) -> CodegenResult<()> {
        let target = self
            .ctx
            .current_loop()
            .ok_or(CodegenError::BreakOutsideLoop)?
            .end;
        self.emit(Instr::Goto(target));
        Ok(())
    }

    fn compile_continue(&mut self) -> CodegenResult<()> {
        let target = self
            .ctx
            .current_loop()
            .ok_or(CodegenError::ContinueOutsideLoop)?
            .cond;
        self.emit(Instr::Goto(target));
        Ok(())
    }

    fn compile_return(&mut self, ret: &Return) -> CodegenResult<()> {
        match &ret.value {
            Some(value) => {
                self.compile_expr(value, Mode::Value)?;
                let instr = match require_family(&self.ret)? {
                    Family::Int => Instr::Ireturn,
                    Family::Float => Instr::Freturn,
                    Family::Ref => Instr::Areturn,
                };
                self.emit(instr);
            }
            None => self.emit(Instr::Return),
        }
        Ok(())
    }

    fn compile_print(&mut self, print: &Print) -> CodegenResult<()> {
        for (i, arg) in print.args.iter().enumerate() {
            if i > 0 {
                self.emit_out();
                self.emit(Instr::Ldc(Const::Str(" ".to_string())));
                self.emit_print("(Ljava/lang/String;)V");
            }
            self.emit_out();
            self.compile_expr(arg, Mode::Value)?;
            let desc = match require_family(&arg.ty)? {
                Family::Int => "(I)V",
                Family::Float => "(F)V",
                Family::Ref => "(Ljava/lang/Object;)V",
            };
            self.emit_print(desc);
        }
        self.emit_out();
        self.emit(Instr::Invokevirtual {
            owner: "java/io/PrintStream".to_string(),
            name: "println".to_string(),
            desc: "()V".to_string(),
        });
        Ok(())
    }

    fn compile_call_stmt(&mut self, call: &RoutineCall) -> CodegenResult<()> {
        self.compile_invocation(&call.routine, &call.args, &call.ret)?;
        if !call.ret.is_void() {
            self.emit(Instr::Pop);
        }
        Ok(())
    }

    /// Shared call emission: arguments left to right, then the invocation
    /// with a descriptor built from the resolved signature
    pub(crate) fn compile_invocation(
        &mut self,
        routine: &str,
        args: &[Expr],
        ret: &Type,
    ) -> CodegenResult<()> {
        for arg in args {
            self.compile_expr(arg, Mode::Value)?;
        }
        let params: Vec<Type> = args.iter().map(|a| a.ty.clone()).collect();
        self.emit(Instr::Invokestatic {
            owner: self.class.to_string(),
            name: routine.to_string(),
            desc: method_descriptor(&params, ret),
        });
        Ok(())
    }

    pub(crate) fn emit_store_slot(&mut self, ty: &Type, slot: u16) -> CodegenResult<()> {
        let instr = match require_family(ty)? {
            Family::Int => Instr::Istore(slot),
            Family::Float => Instr::Fstore(slot),
            Family::Ref => Instr::Astore(slot),
        };
        self.emit(instr);
        Ok(())
    }

    fn emit_out(&mut self) {
        self.emit(Instr::Getstatic {
            owner: "java/lang/System".to_string(),
            name: "out".to_string(),
            desc: "Ljava/io/PrintStream;".to_string(),
        });
    }

    fn emit_print(&mut self, desc: &str) {
        self.emit(Instr::Invokevirtual {
            owner: "java/io/PrintStream".to_string(),
            name: "print".to_string(),
            desc: desc.to_string(),
        });
    }
}

/// Family of a type that must have a value representation
pub(crate) fn require_family(ty: &Type) -> CodegenResult<Family> {
    family(ty).ok_or_else(|| {
        CodegenError::internal(format!("type {:?} has no value representation", ty))
    })
}

fn stmt_line(stmt: &Stmt) -> Option<u32> {
    match stmt {
        Stmt::VarDecl(s) => s.line,
        Stmt::Assign(s) => s.line,
        Stmt::If(s) => s.line,
        Stmt::While(s) => s.line,
        Stmt::ForRange(s) => s.line,
        Stmt::ForEach(s) => s.line,
        Stmt::Break { line } | Stmt::Continue { line } => *line,
        Stmt::Return(s) => s.line,
        Stmt::Print(s) => s.line,
        Stmt::Call(s) => s.line,
        Stmt::Block(_) => None,
    }
}
