//! Loop lowering
//!
//! Rewrites `for`-in-range and `foreach` into blocks around an equivalent
//! `while` before code generation, so `while` is the only loop shape the
//! statement compiler has to get right. A range loop becomes a block with
//! the counter and a hidden bound declaration plus the counter mutation
//! appended to the body; reversed ranges swap the bound roles, step by
//! subtraction and flip the comparison. A `foreach` becomes a hidden array
//! binding plus a range loop over `0..len-1` with a per-iteration element
//! fetch. Hidden names contain `$`, which no source identifier can.

use crate::error::{CodegenError, CodegenResult};
use orin_ast::{
    Assign, BinaryOp, Block, Expr, ExprKind, ForEach, ForRange, If, Stmt, Target, Type, VarDecl,
    While,
};

/// Lower every statement in a routine body
pub fn lower_stmts(stmts: &[Stmt]) -> CodegenResult<Vec<Stmt>> {
    stmts.iter().map(lower_stmt).collect()
}

fn lower_stmt(stmt: &Stmt) -> CodegenResult<Stmt> {
    match stmt {
        Stmt::ForRange(f) => lower_for_range(f),
        Stmt::ForEach(f) => lower_for_each(f),
        Stmt::If(i) => Ok(Stmt::If(If {
            cond: i.cond.clone(),
            then_body: lower_stmts(&i.then_body)?,
            else_body: i.else_body.as_deref().map(lower_stmts).transpose()?,
            line: i.line,
        })),
        Stmt::While(w) => Ok(Stmt::While(While {
            cond: w.cond.clone(),
            body: lower_stmts(&w.body)?,
            line: w.line,
        })),
        Stmt::Block(b) => Ok(Stmt::Block(Block {
            body: lower_stmts(&b.body)?,
        })),
        other => Ok(other.clone()),
    }
}

fn lower_for_range(f: &ForRange) -> CodegenResult<Stmt> {
    let bound = format!("{}$bound", f.var);
    let (init, limit) = if f.reverse {
        (f.to.clone(), f.from.clone())
    } else {
        (f.from.clone(), f.to.clone())
    };
    let cmp = if f.reverse { BinaryOp::Ge } else { BinaryOp::Le };
    let step = if f.reverse { BinaryOp::Sub } else { BinaryOp::Add };

    let counter = Expr::var(&f.var, Type::integer());
    let mut body = lower_stmts(&f.body)?;
    body.push(Stmt::Assign(Assign {
        target: Target::Var {
            name: f.var.clone(),
            ty: Type::integer(),
        },
        value: Expr::binary(step, counter.clone(), Expr::int(1), Type::integer()),
        line: f.line,
    }));

    Ok(Stmt::Block(Block {
        body: vec![
            Stmt::VarDecl(VarDecl {
                name: f.var.clone(),
                ty: Type::integer(),
                init: Some(init),
                line: f.line,
            }),
            Stmt::VarDecl(VarDecl {
                name: bound.clone(),
                ty: Type::integer(),
                init: Some(limit),
                line: f.line,
            }),
            Stmt::While(While {
                cond: Expr::binary(
                    cmp,
                    counter,
                    Expr::var(&bound, Type::integer()),
                    Type::boolean(),
                ),
                body,
                line: f.line,
            }),
        ],
    }))
}

fn lower_for_each(f: &ForEach) -> CodegenResult<Stmt> {
    let elem_ty = f.array.ty.array_elem().cloned().ok_or_else(|| {
        CodegenError::internal(format!(
            "foreach over non-array type {:?} (variable {})",
            f.array.ty, f.var
        ))
    })?;
    let arr = format!("{}$arr", f.var);
    let idx = format!("{}$idx", f.var);
    let arr_ty = f.array.ty.clone();

    let arr_var = Expr::var(&arr, arr_ty.clone());
    let len = Expr {
        kind: ExprKind::Len(Box::new(arr_var.clone())),
        ty: Type::integer(),
    };

    // Per-iteration fetch: the hidden counter is zero-based, the Index node
    // is one-based, so the fetch indexes at counter + 1.
    let fetch = Expr {
        kind: ExprKind::Index {
            array: Box::new(arr_var),
            index: Box::new(Expr::binary(
                BinaryOp::Add,
                Expr::var(&idx, Type::integer()),
                Expr::int(1),
                Type::integer(),
            )),
        },
        ty: elem_ty.clone(),
    };

    let mut body = vec![Stmt::VarDecl(VarDecl {
        name: f.var.clone(),
        ty: elem_ty,
        init: Some(fetch),
        line: f.line,
    })];
    body.extend_from_slice(&f.body);

    let range = Stmt::ForRange(ForRange {
        var: idx,
        from: Expr::int(0),
        to: Expr::binary(BinaryOp::Sub, len, Expr::int(1), Type::integer()),
        reverse: false,
        body,
        line: f.line,
    });

    Ok(Stmt::Block(Block {
        body: vec![
            Stmt::VarDecl(VarDecl {
                name: arr,
                ty: arr_ty,
                init: Some(f.array.clone()),
                line: f.line,
            }),
            lower_stmt(&range)?,
        ],
    }))
}
