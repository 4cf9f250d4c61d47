//! Textual Jasmin rendering
//!
//! One textual unit per class: source-name directive, class directive,
//! superclass directive, field directives, then method blocks. Labels render
//! at column zero; instructions and limit directives are indented. Exact
//! whitespace is not contractual; the token stream is.

use crate::class::{access_str, Class, Method};
use crate::instr::Instr;
use std::fmt::Write;

/// Render a complete class to Jasmin text
pub fn render_class(class: &Class) -> String {
    let mut out = String::new();
    writeln!(out, ".source {}", class.source).unwrap();
    writeln!(out, ".class {} {}", access_str(class.access), class.name).unwrap();
    writeln!(out, ".super {}", class.super_name).unwrap();

    if !class.fields.is_empty() {
        writeln!(out).unwrap();
        for field in &class.fields {
            writeln!(
                out,
                ".field {} {} {}",
                access_str(field.access),
                field.name,
                field.desc
            )
            .unwrap();
        }
    }

    for method in &class.methods {
        writeln!(out).unwrap();
        write_method(&mut out, method);
    }

    out
}

fn write_method(out: &mut String, method: &Method) {
    writeln!(
        out,
        ".method {} {}{}",
        access_str(method.access),
        method.name,
        method.desc
    )
    .unwrap();
    writeln!(out, "    .limit stack {}", method.limit_stack).unwrap();
    writeln!(out, "    .limit locals {}", method.limit_locals).unwrap();

    for instr in &method.code {
        match instr {
            Instr::Label(label) => writeln!(out, "{}:", label).unwrap(),
            other => writeln!(out, "    {}", other).unwrap(),
        }
    }

    writeln!(out, ".end method").unwrap();
}
