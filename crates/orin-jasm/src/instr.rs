//! Instruction model
//!
//! The subset of JVM instructions the backend emits, as a closed enum with
//! typed operands. Jump targets are symbolic labels resolved by the
//! downstream assembler; a label definition is a pseudo-instruction that
//! carries no opcode.

use std::fmt;

/// Symbolic jump label, unique within one method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Condition suffix for `if<cond>` and `if_icmp<cond>` jumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Lt => "lt",
            Cond::Ge => "ge",
            Cond::Gt => "gt",
            Cond::Le => "le",
        };
        write!(f, "{}", s)
    }
}

/// Operand of a generic `ldc` constant load
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    Int(i32),
    Float(f32),
    Str(String),
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Const::Int(v) => write!(f, "{}", v),
            Const::Float(v) => write!(f, "{}", fmt_float(*v)),
            Const::Str(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        }
    }
}

/// Render a float so the assembler always reads it as a float constant
fn fmt_float(v: f32) -> String {
    if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Element type operand of `newarray`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayElem {
    Int,
    Float,
}

impl fmt::Display for ArrayElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayElem::Int => write!(f, "int"),
            ArrayElem::Float => write!(f, "float"),
        }
    }
}

/// One emitted instruction (or pseudo-instruction)
///
/// Instructions are grouped the way the emitter uses them:
/// - pseudo-instructions (labels, `.line` directives)
/// - constant pushes
/// - local slot loads and stores
/// - array element access
/// - arithmetic, conversion and comparison
/// - jumps and the multi-way branch
/// - object and field access
/// - invocations and returns
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// Label definition; carries no opcode
    Label(Label),
    /// `.line` source directive
    Line(u32),

    /// Push integer -1
    IconstM1,
    /// Push a small integer 0..=5 via its dedicated opcode
    Iconst(u8),
    /// Push a byte-range integer
    Bipush(i8),
    /// Generic constant load
    Ldc(Const),

    /// Load integer-family local
    Iload(u16),
    /// Load float local
    Fload(u16),
    /// Load reference local
    Aload(u16),
    /// Store integer-family local
    Istore(u16),
    /// Store float local
    Fstore(u16),
    /// Store reference local
    Astore(u16),

    Iaload,
    Faload,
    Aaload,
    Iastore,
    Fastore,
    Aastore,
    Arraylength,

    Iadd,
    Isub,
    Imul,
    Idiv,
    Irem,
    Ineg,
    Ixor,
    Fadd,
    Fsub,
    Fmul,
    Fdiv,
    Frem,
    Fneg,

    /// Widen integer family to float
    I2f,
    /// Narrow float to integer
    F2i,

    /// Float compare pushing 1 on NaN ("greater"-reducing)
    Fcmpg,
    /// Float compare pushing -1 on NaN ("lesser"-reducing)
    Fcmpl,

    Goto(Label),
    /// Zero-test jump: `if<cond>`
    If(Cond, Label),
    /// Integer compare-and-jump: `if_icmp<cond>`
    IfIcmp(Cond, Label),
    /// Multi-way branch: ordered key→label cases plus a default label
    Lookupswitch {
        cases: Vec<(i32, Label)>,
        default: Label,
    },

    New(String),
    Dup,
    Pop,
    Getstatic {
        owner: String,
        name: String,
        desc: String,
    },
    Putstatic {
        owner: String,
        name: String,
        desc: String,
    },
    Getfield {
        owner: String,
        name: String,
        desc: String,
    },
    Putfield {
        owner: String,
        name: String,
        desc: String,
    },

    /// Allocate a one-dimensional primitive array
    Newarray(ArrayElem),
    /// Allocate a one-dimensional reference array
    Anewarray(String),
    /// Allocate a multi-dimensional array from its mangled descriptor
    Multianewarray { desc: String, dims: u8 },

    Invokestatic {
        owner: String,
        name: String,
        desc: String,
    },
    Invokevirtual {
        owner: String,
        name: String,
        desc: String,
    },
    Invokespecial {
        owner: String,
        name: String,
        desc: String,
    },

    Ireturn,
    Freturn,
    Areturn,
    Return,
}

impl Instr {
    /// True for instructions after which control never falls through
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instr::Goto(_)
                | Instr::Lookupswitch { .. }
                | Instr::Ireturn
                | Instr::Freturn
                | Instr::Areturn
                | Instr::Return
        )
    }
}

/// Render a load/store mnemonic, using the compact `_n` form for slots 0..=3
fn fmt_slot(f: &mut fmt::Formatter<'_>, mnemonic: &str, slot: u16) -> fmt::Result {
    if slot <= 3 {
        write!(f, "{}_{}", mnemonic, slot)
    } else {
        write!(f, "{} {}", mnemonic, slot)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Label(label) => write!(f, "{}:", label),
            Instr::Line(n) => write!(f, ".line {}", n),

            Instr::IconstM1 => write!(f, "iconst_m1"),
            Instr::Iconst(n) => write!(f, "iconst_{}", n),
            Instr::Bipush(v) => write!(f, "bipush {}", v),
            Instr::Ldc(c) => write!(f, "ldc {}", c),

            Instr::Iload(slot) => fmt_slot(f, "iload", *slot),
            Instr::Fload(slot) => fmt_slot(f, "fload", *slot),
            Instr::Aload(slot) => fmt_slot(f, "aload", *slot),
            Instr::Istore(slot) => fmt_slot(f, "istore", *slot),
            Instr::Fstore(slot) => fmt_slot(f, "fstore", *slot),
            Instr::Astore(slot) => fmt_slot(f, "astore", *slot),

            Instr::Iaload => write!(f, "iaload"),
            Instr::Faload => write!(f, "faload"),
            Instr::Aaload => write!(f, "aaload"),
            Instr::Iastore => write!(f, "iastore"),
            Instr::Fastore => write!(f, "fastore"),
            Instr::Aastore => write!(f, "aastore"),
            Instr::Arraylength => write!(f, "arraylength"),

            Instr::Iadd => write!(f, "iadd"),
            Instr::Isub => write!(f, "isub"),
            Instr::Imul => write!(f, "imul"),
            Instr::Idiv => write!(f, "idiv"),
            Instr::Irem => write!(f, "irem"),
            Instr::Ineg => write!(f, "ineg"),
            Instr::Ixor => write!(f, "ixor"),
            Instr::Fadd => write!(f, "fadd"),
            Instr::Fsub => write!(f, "fsub"),
            Instr::Fmul => write!(f, "fmul"),
            Instr::Fdiv => write!(f, "fdiv"),
            Instr::Frem => write!(f, "frem"),
            Instr::Fneg => write!(f, "fneg"),

            Instr::I2f => write!(f, "i2f"),
            Instr::F2i => write!(f, "f2i"),
            Instr::Fcmpg => write!(f, "fcmpg"),
            Instr::Fcmpl => write!(f, "fcmpl"),

            Instr::Goto(label) => write!(f, "goto {}", label),
            Instr::If(cond, label) => write!(f, "if{} {}", cond, label),
            Instr::IfIcmp(cond, label) => write!(f, "if_icmp{} {}", cond, label),
            Instr::Lookupswitch { cases, default } => {
                writeln!(f, "lookupswitch")?;
                for (key, label) in cases {
                    writeln!(f, "    {} : {}", key, label)?;
                }
                write!(f, "    default : {}", default)
            }

            Instr::New(class) => write!(f, "new {}", class),
            Instr::Dup => write!(f, "dup"),
            Instr::Pop => write!(f, "pop"),
            Instr::Getstatic { owner, name, desc } => {
                write!(f, "getstatic {}/{} {}", owner, name, desc)
            }
            Instr::Putstatic { owner, name, desc } => {
                write!(f, "putstatic {}/{} {}", owner, name, desc)
            }
            Instr::Getfield { owner, name, desc } => {
                write!(f, "getfield {}/{} {}", owner, name, desc)
            }
            Instr::Putfield { owner, name, desc } => {
                write!(f, "putfield {}/{} {}", owner, name, desc)
            }

            Instr::Newarray(elem) => write!(f, "newarray {}", elem),
            Instr::Anewarray(class) => write!(f, "anewarray {}", class),
            Instr::Multianewarray { desc, dims } => {
                write!(f, "multianewarray {} {}", desc, dims)
            }

            Instr::Invokestatic { owner, name, desc } => {
                write!(f, "invokestatic {}/{}{}", owner, name, desc)
            }
            Instr::Invokevirtual { owner, name, desc } => {
                write!(f, "invokevirtual {}/{}{}", owner, name, desc)
            }
            Instr::Invokespecial { owner, name, desc } => {
                write!(f, "invokespecial {}/{}{}", owner, name, desc)
            }

            Instr::Ireturn => write!(f, "ireturn"),
            Instr::Freturn => write!(f, "freturn"),
            Instr::Areturn => write!(f, "areturn"),
            Instr::Return => write!(f, "return"),
        }
    }
}
