//! Program assembly
//!
//! One pass over the top-level declarations routes globals to static-field
//! synthesis (initializer emission deferred) and routines to method
//! compilation. After the pass the assembler synthesizes the static
//! initializer, the command-line dispatcher, and one backing class per
//! distinct record shape reachable anywhere in the program.

use crate::descriptor::{descriptor, method_descriptor, record_class_name, Family};
use crate::error::{CodegenError, CodegenResult};
use crate::lower::lower_stmts;
use crate::stmt::RoutineCompiler;
use orin_ast::{Decl, Expr, ExprKind, Program, Routine, Stmt, Target, Type, VarDecl};
use orin_jasm::{access, max_stack, Class, Field, Instr, Method};
use rustc_hash::FxHashMap;

/// Compile a resolved program into its emitted classes: the program class
/// first, then one synthesized class per distinct record shape
pub fn compile_program(program: &Program) -> CodegenResult<Vec<Class>> {
    let class_name = program.name.as_str();
    let mut main_class = Class::new(class_name);
    let mut globals: Vec<&VarDecl> = Vec::new();

    for decl in &program.decls {
        match decl {
            Decl::Var(var) => {
                main_class.add_field(Field::global(&var.name, descriptor(&var.ty)));
                globals.push(var);
            }
            Decl::Routine(routine) => {
                main_class.add_method(compile_routine(class_name, routine)?);
            }
        }
    }

    if !globals.is_empty() {
        main_class.add_method(compile_clinit(class_name, &globals)?);
    }
    main_class.add_method(compile_dispatcher(class_name, &program.decls)?);

    let mut classes = vec![main_class];
    for shape in collect_record_shapes(program) {
        classes.push(synthesize_record_class(&shape)?);
    }
    Ok(classes)
}

/// Compile one routine into a static method
fn compile_routine(class_name: &str, routine: &Routine) -> CodegenResult<Method> {
    let mut rc = RoutineCompiler::new(class_name, routine.ret.clone());
    for param in &routine.params {
        rc.declare_param(&param.name)?;
    }

    let body = lower_stmts(&routine.body)?;
    rc.compile_body(&body)?;

    // The resolver's reachability pass guarantees value-returning routines
    // end on a return; void routines may fall off the end.
    if !rc.code.last().is_some_and(Instr::is_terminator) {
        rc.emit(Instr::Return);
    }

    let params: Vec<Type> = routine.params.iter().map(|p| p.ty.clone()).collect();
    let method = Method::new(
        access::PUBLIC | access::STATIC,
        &routine.name,
        method_descriptor(&params, &routine.ret),
    );
    seal(method, rc)
}

/// Synthesize `<clinit>` running every global initializer in declaration
/// order
fn compile_clinit(class_name: &str, globals: &[&VarDecl]) -> CodegenResult<Method> {
    let mut rc = RoutineCompiler::new(class_name, Type::void());
    for var in globals {
        if let Some(line) = var.line {
            rc.emit(Instr::Line(line));
        }
        match &var.init {
            Some(init) => rc.compile_expr(init, crate::expr::Mode::Value)?,
            None => rc.emit_default_init(&var.ty)?,
        }
        rc.emit(Instr::Putstatic {
            owner: class_name.to_string(),
            name: var.name.clone(),
            desc: descriptor(&var.ty),
        });
    }
    rc.emit(Instr::Return);

    let method = Method::new(access::STATIC, "<clinit>", "()V");
    seal(method, rc)
}

/// Synthesize the command-line dispatcher
///
/// Reads `args[0]`, hashes it, and multi-way-branches to one case per
/// routine whose every parameter is primitive; remaining arguments are
/// parsed by declared family, the routine is invoked, any result is
/// discarded. An unmatched hash falls through to a bare return.
fn compile_dispatcher(class_name: &str, decls: &[Decl]) -> CodegenResult<Method> {
    let dispatchable: Vec<&Routine> = decls
        .iter()
        .filter_map(|d| match d {
            Decl::Routine(r) if r.params.iter().all(|p| p.ty.is_primitive()) => Some(r),
            _ => None,
        })
        .collect();

    let mut rc = RoutineCompiler::new(class_name, Type::void());
    rc.declare_param("args")?;

    if dispatchable.is_empty() {
        rc.emit(Instr::Return);
    } else {
        let end = rc.ctx.fresh_label()?;

        rc.emit(Instr::Aload(0));
        rc.push_int(0);
        rc.emit(Instr::Aaload);
        rc.emit(Instr::Invokevirtual {
            owner: "java/lang/String".to_string(),
            name: "hashCode".to_string(),
            desc: "()I".to_string(),
        });

        let mut keys: FxHashMap<i32, &str> = FxHashMap::default();
        let mut cases = Vec::with_capacity(dispatchable.len());
        for routine in &dispatchable {
            let key = java_string_hash(&routine.name);
            if let Some(first) = keys.insert(key, &routine.name) {
                return Err(CodegenError::DispatchHashCollision {
                    first: first.to_string(),
                    second: routine.name.clone(),
                });
            }
            cases.push((key, rc.ctx.fresh_label()?));
        }
        let mut table = cases.clone();
        table.sort_by_key(|(key, _)| *key);
        rc.emit(Instr::Lookupswitch {
            cases: table,
            default: end,
        });

        for (routine, (_, label)) in dispatchable.iter().zip(&cases) {
            rc.emit(Instr::Label(*label));
            for (i, param) in routine.params.iter().enumerate() {
                rc.emit(Instr::Aload(0));
                rc.push_int(i as i32 + 1);
                rc.emit(Instr::Aaload);
                match crate::descriptor::family(&param.ty) {
                    Some(Family::Int) => rc.emit(Instr::Invokestatic {
                        owner: "java/lang/Integer".to_string(),
                        name: "parseInt".to_string(),
                        desc: "(Ljava/lang/String;)I".to_string(),
                    }),
                    Some(Family::Float) => rc.emit(Instr::Invokestatic {
                        owner: "java/lang/Float".to_string(),
                        name: "parseFloat".to_string(),
                        desc: "(Ljava/lang/String;)F".to_string(),
                    }),
                    _ => {
                        return Err(CodegenError::internal(format!(
                            "dispatchable routine {} has non-primitive parameter",
                            routine.name
                        )))
                    }
                }
            }
            let params: Vec<Type> = routine.params.iter().map(|p| p.ty.clone()).collect();
            rc.emit(Instr::Invokestatic {
                owner: class_name.to_string(),
                name: routine.name.clone(),
                desc: method_descriptor(&params, &routine.ret),
            });
            if !routine.ret.is_void() {
                rc.emit(Instr::Pop);
            }
            rc.emit(Instr::Return);
        }

        rc.emit(Instr::Label(end));
        rc.emit(Instr::Return);
    }

    let method = Method::new(
        access::PUBLIC | access::STATIC,
        "main",
        "([Ljava/lang/String;)V",
    );
    seal(method, rc)
}

/// Synthesize the backing class of one record shape: positional fields and
/// a no-argument constructor that default-constructs composite members
fn synthesize_record_class(shape: &Type) -> CodegenResult<Class> {
    let name = record_class_name(shape);
    let fields = shape
        .record_fields()
        .ok_or_else(|| CodegenError::internal("record synthesis on non-record type"))?;

    let mut class = Class::new(name.clone());
    for (i, field) in fields.iter().enumerate() {
        class.add_field(Field::member(format!("f{}", i), descriptor(&field.ty)));
    }

    let mut rc = RoutineCompiler::new("", Type::void());
    rc.declare_param("this")?;
    rc.emit(Instr::Aload(0));
    rc.emit(Instr::Invokespecial {
        owner: "java/lang/Object".to_string(),
        name: "<init>".to_string(),
        desc: "()V".to_string(),
    });
    for (i, field) in fields.iter().enumerate() {
        if field.ty.is_composite() {
            rc.emit(Instr::Aload(0));
            rc.emit_default_init(&field.ty)?;
            rc.emit(Instr::Putfield {
                owner: name.clone(),
                name: format!("f{}", i),
                desc: descriptor(&field.ty),
            });
        }
    }
    rc.emit(Instr::Return);

    let method = Method::new(access::PUBLIC, "<init>", "()V");
    class.add_method(seal(method, rc)?);
    Ok(class)
}

/// Attach the finished code and compute both resource limits
fn seal(mut method: Method, rc: RoutineCompiler) -> CodegenResult<Method> {
    let (code, max_locals) = rc.finish();
    method.limit_stack = max_stack(&code).map_err(|source| CodegenError::Stack {
        method: method.name.clone(),
        source,
    })?;
    method.limit_locals = max_locals;
    method.code = code;
    Ok(method)
}

/// `String.hashCode` of a routine name, computed the way the emitted
/// bytecode will at runtime
fn java_string_hash(s: &str) -> i32 {
    s.chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
}

/// Every distinct record shape reachable anywhere in the program, in first
/// encounter order
fn collect_record_shapes(program: &Program) -> Vec<Type> {
    let mut seen: FxHashMap<String, ()> = FxHashMap::default();
    let mut shapes = Vec::new();

    fn visit_type(ty: &Type, seen: &mut FxHashMap<String, ()>, shapes: &mut Vec<Type>) {
        match ty {
            Type::Array { elem, .. } => visit_type(elem, seen, shapes),
            Type::Record { fields } => {
                if seen.insert(record_class_name(ty), ()).is_none() {
                    shapes.push(ty.clone());
                }
                for field in fields {
                    visit_type(&field.ty, seen, shapes);
                }
            }
            Type::Function { params, ret } => {
                for p in params {
                    visit_type(p, seen, shapes);
                }
                visit_type(ret, seen, shapes);
            }
            Type::Primitive(_) => {}
        }
    }

    fn visit_expr(expr: &Expr, seen: &mut FxHashMap<String, ()>, shapes: &mut Vec<Type>) {
        visit_type(&expr.ty, seen, shapes);
        match &expr.kind {
            ExprKind::Index { array, index } => {
                visit_expr(array, seen, shapes);
                visit_expr(index, seen, shapes);
            }
            ExprKind::Field { record, .. } => visit_expr(record, seen, shapes),
            ExprKind::Len(array) => visit_expr(array, seen, shapes),
            ExprKind::Unary { operand, .. } => visit_expr(operand, seen, shapes),
            ExprKind::Binary { lhs, rhs, .. } => {
                visit_expr(lhs, seen, shapes);
                visit_expr(rhs, seen, shapes);
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    visit_expr(arg, seen, shapes);
                }
            }
            ExprKind::Cast(inner) => visit_expr(inner, seen, shapes),
            ExprKind::Int(_) | ExprKind::Real(_) | ExprKind::Bool(_) | ExprKind::Var(_) => {}
        }
    }

    fn visit_stmt(stmt: &Stmt, seen: &mut FxHashMap<String, ()>, shapes: &mut Vec<Type>) {
        match stmt {
            Stmt::VarDecl(decl) => {
                visit_type(&decl.ty, seen, shapes);
                if let Some(init) = &decl.init {
                    visit_expr(init, seen, shapes);
                }
            }
            Stmt::Assign(assign) => {
                match &assign.target {
                    Target::Var { ty, .. } => visit_type(ty, seen, shapes),
                    Target::Index { array, index } => {
                        visit_expr(array, seen, shapes);
                        visit_expr(index, seen, shapes);
                    }
                    Target::Field { record, .. } => visit_expr(record, seen, shapes),
                }
                visit_expr(&assign.value, seen, shapes);
            }
            Stmt::If(if_stmt) => {
                visit_expr(&if_stmt.cond, seen, shapes);
                for s in &if_stmt.then_body {
                    visit_stmt(s, seen, shapes);
                }
                if let Some(else_body) = &if_stmt.else_body {
                    for s in else_body {
                        visit_stmt(s, seen, shapes);
                    }
                }
            }
            Stmt::While(w) => {
                visit_expr(&w.cond, seen, shapes);
                for s in &w.body {
                    visit_stmt(s, seen, shapes);
                }
            }
            Stmt::ForRange(f) => {
                visit_expr(&f.from, seen, shapes);
                visit_expr(&f.to, seen, shapes);
                for s in &f.body {
                    visit_stmt(s, seen, shapes);
                }
            }
            Stmt::ForEach(f) => {
                visit_expr(&f.array, seen, shapes);
                for s in &f.body {
                    visit_stmt(s, seen, shapes);
                }
            }
            Stmt::Return(ret) => {
                if let Some(value) = &ret.value {
                    visit_expr(value, seen, shapes);
                }
            }
            Stmt::Print(print) => {
                for arg in &print.args {
                    visit_expr(arg, seen, shapes);
                }
            }
            Stmt::Call(call) => {
                visit_type(&call.ret, seen, shapes);
                for arg in &call.args {
                    visit_expr(arg, seen, shapes);
                }
            }
            Stmt::Block(block) => {
                for s in &block.body {
                    visit_stmt(s, seen, shapes);
                }
            }
            Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }

    for decl in &program.decls {
        match decl {
            Decl::Var(var) => {
                visit_type(&var.ty, &mut seen, &mut shapes);
                if let Some(init) = &var.init {
                    visit_expr(init, &mut seen, &mut shapes);
                }
            }
            Decl::Routine(routine) => {
                for param in &routine.params {
                    visit_type(&param.ty, &mut seen, &mut shapes);
                }
                visit_type(&routine.ret, &mut seen, &mut shapes);
                for stmt in &routine.body {
                    visit_stmt(stmt, &mut seen, &mut shapes);
                }
            }
        }
    }
    shapes
}
