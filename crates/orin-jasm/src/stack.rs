//! Static stack-depth estimation
//!
//! Computes the peak operand-stack depth of a finished instruction list so
//! the assembler's `.limit stack` directive can be filled in before emission.
//! The analysis walks every path reachable from the method entry with a
//! worklist, merging the known entry depth at each jump target; a depth
//! mismatch at a join or a pop past empty indicates the generator emitted
//! inconsistent code and is reported rather than papered over.

use crate::instr::{Instr, Label};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Stack analysis errors
#[derive(Debug, Error)]
pub enum StackError {
    #[error("Stack underflow at instruction {0}")]
    Underflow(usize),

    #[error("Label {0} defined more than once")]
    DuplicateLabel(Label),

    #[error("Jump to undefined label {0}")]
    UndefinedLabel(Label),

    #[error("Inconsistent stack depth at {label}: {first} vs {second}")]
    InconsistentDepth {
        label: Label,
        first: i32,
        second: i32,
    },
}

/// Compute the peak operand-stack depth of a method body
pub fn max_stack(code: &[Instr]) -> Result<u16, StackError> {
    let labels = index_labels(code)?;
    let target = |label: &Label| -> Result<usize, StackError> {
        labels
            .get(label)
            .copied()
            .ok_or(StackError::UndefinedLabel(*label))
    };

    let mut seen: FxHashMap<usize, i32> = FxHashMap::default();
    let mut work: Vec<(usize, i32)> = vec![(0, 0)];
    let mut max = 0i32;

    while let Some((mut pc, mut depth)) = work.pop() {
        loop {
            if pc >= code.len() {
                break;
            }
            match seen.get(&pc) {
                Some(&known) if known == depth => break,
                Some(&known) => {
                    let label = nearest_label(code, pc);
                    return Err(StackError::InconsistentDepth {
                        label,
                        first: known,
                        second: depth,
                    });
                }
                None => {
                    seen.insert(pc, depth);
                }
            }

            let instr = &code[pc];
            let (pops, pushes) = effect(instr);
            if depth < pops {
                return Err(StackError::Underflow(pc));
            }
            depth = depth - pops + pushes;
            max = max.max(depth);

            match instr {
                Instr::Goto(label) => {
                    pc = target(label)?;
                    continue;
                }
                Instr::If(_, label) | Instr::IfIcmp(_, label) => {
                    work.push((target(label)?, depth));
                }
                Instr::Lookupswitch { cases, default } => {
                    for (_, label) in cases {
                        work.push((target(label)?, depth));
                    }
                    work.push((target(default)?, depth));
                    break;
                }
                Instr::Ireturn | Instr::Freturn | Instr::Areturn | Instr::Return => break,
                _ => {}
            }
            pc += 1;
        }
    }

    Ok(max as u16)
}

fn index_labels(code: &[Instr]) -> Result<FxHashMap<Label, usize>, StackError> {
    let mut labels = FxHashMap::default();
    for (index, instr) in code.iter().enumerate() {
        if let Instr::Label(label) = instr {
            if labels.insert(*label, index).is_some() {
                return Err(StackError::DuplicateLabel(*label));
            }
        }
    }
    Ok(labels)
}

/// The label defined at or immediately before `pc`, for error reporting
fn nearest_label(code: &[Instr], pc: usize) -> Label {
    code[..=pc]
        .iter()
        .rev()
        .find_map(|i| match i {
            Instr::Label(label) => Some(*label),
            _ => None,
        })
        .unwrap_or(Label(0))
}

/// (pops, pushes) of one instruction
fn effect(instr: &Instr) -> (i32, i32) {
    match instr {
        Instr::Label(_) | Instr::Line(_) => (0, 0),

        Instr::IconstM1 | Instr::Iconst(_) | Instr::Bipush(_) | Instr::Ldc(_) => (0, 1),

        Instr::Iload(_) | Instr::Fload(_) | Instr::Aload(_) => (0, 1),
        Instr::Istore(_) | Instr::Fstore(_) | Instr::Astore(_) => (1, 0),

        Instr::Iaload | Instr::Faload | Instr::Aaload => (2, 1),
        Instr::Iastore | Instr::Fastore | Instr::Aastore => (3, 0),
        Instr::Arraylength => (1, 1),

        Instr::Iadd
        | Instr::Isub
        | Instr::Imul
        | Instr::Idiv
        | Instr::Irem
        | Instr::Ixor
        | Instr::Fadd
        | Instr::Fsub
        | Instr::Fmul
        | Instr::Fdiv
        | Instr::Frem => (2, 1),
        Instr::Ineg | Instr::Fneg | Instr::I2f | Instr::F2i => (1, 1),
        Instr::Fcmpg | Instr::Fcmpl => (2, 1),

        Instr::Goto(_) => (0, 0),
        Instr::If(_, _) => (1, 0),
        Instr::IfIcmp(_, _) => (2, 0),
        Instr::Lookupswitch { .. } => (1, 0),

        Instr::New(_) => (0, 1),
        Instr::Dup => (1, 2),
        Instr::Pop => (1, 0),
        Instr::Getstatic { .. } => (0, 1),
        Instr::Putstatic { .. } => (1, 0),
        Instr::Getfield { .. } => (1, 1),
        Instr::Putfield { .. } => (2, 0),

        Instr::Newarray(_) | Instr::Anewarray(_) => (1, 1),
        Instr::Multianewarray { dims, .. } => (*dims as i32, 1),

        Instr::Invokestatic { desc, .. } => invoke_effect(desc, 0),
        Instr::Invokevirtual { desc, .. } | Instr::Invokespecial { desc, .. } => {
            invoke_effect(desc, 1)
        }

        Instr::Ireturn | Instr::Freturn | Instr::Areturn => (1, 0),
        Instr::Return => (0, 0),
    }
}

fn invoke_effect(desc: &str, receiver: i32) -> (i32, i32) {
    let args = descriptor_arg_count(desc) as i32;
    let pushes = if desc.ends_with('V') { 0 } else { 1 };
    (args + receiver, pushes)
}

/// Count the argument slots in a `(..)R` method descriptor
fn descriptor_arg_count(desc: &str) -> usize {
    let inner = desc
        .strip_prefix('(')
        .and_then(|d| d.split_once(')'))
        .map(|(args, _)| args)
        .unwrap_or("");
    let mut count = 0;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' => continue,
            'L' => {
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                }
                count += 1;
            }
            _ => count += 1,
        }
    }
    count
}
