//! Test harness: a minimal stack-machine interpreter
//!
//! Executes emitted instruction lists directly, with enough of the JVM's
//! surface to cover what the backend emits: locals, the operand stack,
//! static fields, arrays, records, `String.hashCode`, argument parsing and
//! `System.out`. Every `invokestatic` against a compiled class is recorded
//! in a call log so tests can prove which routines actually ran.

use orin_ast::{Decl, Param, Program, Routine, Stmt, Type};
use orin_jasm::{ArrayElem, Class, Cond, Const, Instr, Label};
use std::collections::{HashMap, HashSet};

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Str(String),
    Ref(usize),
    Null,
}

impl Value {
    fn as_int(&self) -> i32 {
        match self {
            Value::Int(v) => *v,
            other => panic!("expected int, got {:?}", other),
        }
    }

    fn as_float(&self) -> f32 {
        match self {
            Value::Float(v) => *v,
            other => panic!("expected float, got {:?}", other),
        }
    }

    fn as_ref(&self) -> usize {
        match self {
            Value::Ref(r) => *r,
            other => panic!("expected reference, got {:?}", other),
        }
    }
}

/// Heap object
#[derive(Debug, Clone)]
enum Obj {
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    RefArray(Vec<Value>),
    StrArray(Vec<String>),
    Record { fields: Vec<Value> },
}

/// Result of one interpreted entry point
pub struct Run {
    pub result: Option<Value>,
    pub output: String,
    pub calls: Vec<String>,
}

pub struct Machine {
    classes: HashMap<String, Class>,
    initialized: HashSet<String>,
    heap: Vec<Obj>,
    statics: HashMap<(String, String), Value>,
    output: String,
    calls: Vec<String>,
}

impl Machine {
    pub fn new(classes: Vec<Class>) -> Self {
        Self {
            classes: classes.into_iter().map(|c| (c.name.clone(), c)).collect(),
            initialized: HashSet::new(),
            heap: Vec::new(),
            statics: HashMap::new(),
            output: String::new(),
            calls: Vec::new(),
        }
    }

    fn alloc(&mut self, obj: Obj) -> Value {
        self.heap.push(obj);
        Value::Ref(self.heap.len() - 1)
    }

    fn ensure_initialized(&mut self, class: &str) {
        if self.initialized.contains(class) {
            return;
        }
        self.initialized.insert(class.to_string());
        let has_clinit = self
            .classes
            .get(class)
            .is_some_and(|c| c.methods.iter().any(|m| m.name == "<clinit>"));
        if has_clinit {
            self.run_method(class, "<clinit>", vec![]);
        }
    }

    pub fn run_static(&mut self, class: &str, method: &str, args: Vec<Value>) -> Option<Value> {
        self.ensure_initialized(class);
        self.run_method(class, method, args)
    }

    fn run_method(&mut self, class: &str, method: &str, args: Vec<Value>) -> Option<Value> {
        let code = self
            .classes
            .get(class)
            .unwrap_or_else(|| panic!("unknown class {}", class))
            .methods
            .iter()
            .find(|m| m.name == method)
            .unwrap_or_else(|| panic!("unknown method {}/{}", class, method))
            .code
            .clone();

        let labels: HashMap<Label, usize> = code
            .iter()
            .enumerate()
            .filter_map(|(i, instr)| match instr {
                Instr::Label(label) => Some((*label, i)),
                _ => None,
            })
            .collect();
        let jump = |label: &Label| {
            *labels
                .get(label)
                .unwrap_or_else(|| panic!("jump to undefined label {}", label))
        };

        let mut locals: HashMap<u16, Value> = args
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as u16, v))
            .collect();
        let mut stack: Vec<Value> = Vec::new();
        let mut pc = 0usize;

        macro_rules! int_binop {
            ($op:expr) => {{
                let b = stack.pop().unwrap().as_int();
                let a = stack.pop().unwrap().as_int();
                stack.push(Value::Int($op(a, b)));
            }};
        }
        macro_rules! float_binop {
            ($op:expr) => {{
                let b = stack.pop().unwrap().as_float();
                let a = stack.pop().unwrap().as_float();
                stack.push(Value::Float($op(a, b)));
            }};
        }

        loop {
            assert!(pc < code.len(), "fell off the end of {}/{}", class, method);
            match &code[pc] {
                Instr::Label(_) | Instr::Line(_) => {}

                Instr::IconstM1 => stack.push(Value::Int(-1)),
                Instr::Iconst(n) => stack.push(Value::Int(*n as i32)),
                Instr::Bipush(v) => stack.push(Value::Int(*v as i32)),
                Instr::Ldc(Const::Int(v)) => stack.push(Value::Int(*v)),
                Instr::Ldc(Const::Float(v)) => stack.push(Value::Float(*v)),
                Instr::Ldc(Const::Str(s)) => stack.push(Value::Str(s.clone())),

                Instr::Iload(slot) | Instr::Fload(slot) | Instr::Aload(slot) => {
                    stack.push(locals.get(slot).cloned().unwrap_or(Value::Null));
                }
                Instr::Istore(slot) | Instr::Fstore(slot) | Instr::Astore(slot) => {
                    locals.insert(*slot, stack.pop().unwrap());
                }

                Instr::Iaload => {
                    let index = stack.pop().unwrap().as_int() as usize;
                    let array = stack.pop().unwrap().as_ref();
                    let Obj::IntArray(values) = &self.heap[array] else {
                        panic!("iaload on non-int array");
                    };
                    stack.push(Value::Int(values[index]));
                }
                Instr::Faload => {
                    let index = stack.pop().unwrap().as_int() as usize;
                    let array = stack.pop().unwrap().as_ref();
                    let Obj::FloatArray(values) = &self.heap[array] else {
                        panic!("faload on non-float array");
                    };
                    stack.push(Value::Float(values[index]));
                }
                Instr::Aaload => {
                    let index = stack.pop().unwrap().as_int() as usize;
                    let array = stack.pop().unwrap().as_ref();
                    match &self.heap[array] {
                        Obj::RefArray(values) => stack.push(values[index].clone()),
                        Obj::StrArray(values) => stack.push(Value::Str(values[index].clone())),
                        other => panic!("aaload on {:?}", other),
                    }
                }
                Instr::Iastore => {
                    let value = stack.pop().unwrap().as_int();
                    let index = stack.pop().unwrap().as_int() as usize;
                    let array = stack.pop().unwrap().as_ref();
                    let Obj::IntArray(values) = &mut self.heap[array] else {
                        panic!("iastore on non-int array");
                    };
                    values[index] = value;
                }
                Instr::Fastore => {
                    let value = stack.pop().unwrap().as_float();
                    let index = stack.pop().unwrap().as_int() as usize;
                    let array = stack.pop().unwrap().as_ref();
                    let Obj::FloatArray(values) = &mut self.heap[array] else {
                        panic!("fastore on non-float array");
                    };
                    values[index] = value;
                }
                Instr::Aastore => {
                    let value = stack.pop().unwrap();
                    let index = stack.pop().unwrap().as_int() as usize;
                    let array = stack.pop().unwrap().as_ref();
                    let Obj::RefArray(values) = &mut self.heap[array] else {
                        panic!("aastore on non-ref array");
                    };
                    values[index] = value;
                }
                Instr::Arraylength => {
                    let array = stack.pop().unwrap().as_ref();
                    let len = match &self.heap[array] {
                        Obj::IntArray(v) => v.len(),
                        Obj::FloatArray(v) => v.len(),
                        Obj::RefArray(v) => v.len(),
                        Obj::StrArray(v) => v.len(),
                        Obj::Record { .. } => panic!("arraylength on record"),
                    };
                    stack.push(Value::Int(len as i32));
                }

                Instr::Iadd => int_binop!(|a: i32, b: i32| a.wrapping_add(b)),
                Instr::Isub => int_binop!(|a: i32, b: i32| a.wrapping_sub(b)),
                Instr::Imul => int_binop!(|a: i32, b: i32| a.wrapping_mul(b)),
                Instr::Idiv => int_binop!(|a: i32, b: i32| a.wrapping_div(b)),
                Instr::Irem => int_binop!(|a: i32, b: i32| a.wrapping_rem(b)),
                Instr::Ixor => int_binop!(|a: i32, b: i32| a ^ b),
                Instr::Ineg => {
                    let a = stack.pop().unwrap().as_int();
                    stack.push(Value::Int(a.wrapping_neg()));
                }
                Instr::Fadd => float_binop!(|a: f32, b: f32| a + b),
                Instr::Fsub => float_binop!(|a: f32, b: f32| a - b),
                Instr::Fmul => float_binop!(|a: f32, b: f32| a * b),
                Instr::Fdiv => float_binop!(|a: f32, b: f32| a / b),
                Instr::Frem => float_binop!(|a: f32, b: f32| a % b),
                Instr::Fneg => {
                    let a = stack.pop().unwrap().as_float();
                    stack.push(Value::Float(-a));
                }

                Instr::I2f => {
                    let a = stack.pop().unwrap().as_int();
                    stack.push(Value::Float(a as f32));
                }
                Instr::F2i => {
                    let a = stack.pop().unwrap().as_float();
                    stack.push(Value::Int(a as i32));
                }
                Instr::Fcmpg | Instr::Fcmpl => {
                    let nan = matches!(code[pc], Instr::Fcmpg);
                    let b = stack.pop().unwrap().as_float();
                    let a = stack.pop().unwrap().as_float();
                    let result = if a.is_nan() || b.is_nan() {
                        if nan {
                            1
                        } else {
                            -1
                        }
                    } else if a > b {
                        1
                    } else if a < b {
                        -1
                    } else {
                        0
                    };
                    stack.push(Value::Int(result));
                }

                Instr::Goto(label) => {
                    pc = jump(label);
                    continue;
                }
                Instr::If(cond, label) => {
                    let a = stack.pop().unwrap().as_int();
                    if cond_holds(*cond, a, 0) {
                        pc = jump(label);
                        continue;
                    }
                }
                Instr::IfIcmp(cond, label) => {
                    let b = stack.pop().unwrap().as_int();
                    let a = stack.pop().unwrap().as_int();
                    if cond_holds(*cond, a, b) {
                        pc = jump(label);
                        continue;
                    }
                }
                Instr::Lookupswitch { cases, default } => {
                    let key = stack.pop().unwrap().as_int();
                    let label = cases
                        .iter()
                        .find(|(k, _)| *k == key)
                        .map(|(_, l)| l)
                        .unwrap_or(default);
                    pc = jump(label);
                    continue;
                }

                Instr::New(name) => {
                    let field_count = self
                        .classes
                        .get(name)
                        .unwrap_or_else(|| panic!("new of unknown class {}", name))
                        .fields
                        .len();
                    let obj = Obj::Record {
                        fields: vec![Value::Null; field_count],
                    };
                    let value = self.alloc(obj);
                    stack.push(value);
                }
                Instr::Dup => {
                    let top = stack.last().unwrap().clone();
                    stack.push(top);
                }
                Instr::Pop => {
                    stack.pop().unwrap();
                }

                Instr::Getstatic { owner, name, .. } => {
                    if owner == "java/lang/System" {
                        stack.push(Value::Null);
                    } else {
                        stack.push(
                            self.statics
                                .get(&(owner.clone(), name.clone()))
                                .cloned()
                                .unwrap_or(Value::Null),
                        );
                    }
                }
                Instr::Putstatic { owner, name, .. } => {
                    let value = stack.pop().unwrap();
                    self.statics.insert((owner.clone(), name.clone()), value);
                }
                Instr::Getfield { name, .. } => {
                    let object = stack.pop().unwrap().as_ref();
                    let index = field_index(name);
                    let Obj::Record { fields } = &self.heap[object] else {
                        panic!("getfield on non-record");
                    };
                    stack.push(fields[index].clone());
                }
                Instr::Putfield { name, .. } => {
                    let value = stack.pop().unwrap();
                    let object = stack.pop().unwrap().as_ref();
                    let index = field_index(name);
                    let Obj::Record { fields } = &mut self.heap[object] else {
                        panic!("putfield on non-record");
                    };
                    fields[index] = value;
                }

                Instr::Newarray(elem) => {
                    let len = stack.pop().unwrap().as_int() as usize;
                    let obj = match elem {
                        ArrayElem::Int => Obj::IntArray(vec![0; len]),
                        ArrayElem::Float => Obj::FloatArray(vec![0.0; len]),
                    };
                    let value = self.alloc(obj);
                    stack.push(value);
                }
                Instr::Anewarray(_) => {
                    let len = stack.pop().unwrap().as_int() as usize;
                    let value = self.alloc(Obj::RefArray(vec![Value::Null; len]));
                    stack.push(value);
                }
                Instr::Multianewarray { desc, dims } => {
                    let mut sizes = Vec::new();
                    for _ in 0..*dims {
                        sizes.push(stack.pop().unwrap().as_int() as usize);
                    }
                    sizes.reverse();
                    let value = self.alloc_multi(desc, &sizes);
                    stack.push(value);
                }

                Instr::Invokestatic { owner, name, desc } => {
                    let argc = descriptor_arg_count(desc);
                    let mut args = Vec::with_capacity(argc);
                    for _ in 0..argc {
                        args.push(stack.pop().unwrap());
                    }
                    args.reverse();
                    if owner == "java/lang/Integer" && name == "parseInt" {
                        let Value::Str(s) = &args[0] else {
                            panic!("parseInt on non-string");
                        };
                        stack.push(Value::Int(s.parse().unwrap()));
                    } else if owner == "java/lang/Float" && name == "parseFloat" {
                        let Value::Str(s) = &args[0] else {
                            panic!("parseFloat on non-string");
                        };
                        stack.push(Value::Float(s.parse().unwrap()));
                    } else {
                        self.calls.push(name.clone());
                        if let Some(result) = self.run_static(owner, name, args) {
                            stack.push(result);
                        }
                    }
                }
                Instr::Invokevirtual { owner, name, .. } => {
                    if owner == "java/lang/String" && name == "hashCode" {
                        let Value::Str(s) = stack.pop().unwrap() else {
                            panic!("hashCode on non-string");
                        };
                        let hash = s
                            .chars()
                            .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32));
                        stack.push(Value::Int(hash));
                    } else if owner == "java/io/PrintStream" && name == "print" {
                        let value = stack.pop().unwrap();
                        stack.pop().unwrap(); // receiver
                        match value {
                            Value::Int(v) => self.output.push_str(&v.to_string()),
                            Value::Float(v) => self.output.push_str(&format!("{:?}", v)),
                            Value::Str(s) => self.output.push_str(&s),
                            Value::Ref(r) => self.output.push_str(&format!("<ref {}>", r)),
                            Value::Null => self.output.push_str("null"),
                        }
                    } else if owner == "java/io/PrintStream" && name == "println" {
                        stack.pop().unwrap(); // receiver
                        self.output.push('\n');
                    } else {
                        panic!("unsupported invokevirtual {}/{}", owner, name);
                    }
                }
                Instr::Invokespecial { owner, name, .. } => {
                    let receiver = stack.pop().unwrap();
                    if owner != "java/lang/Object" {
                        self.run_method(owner, name, vec![receiver]);
                    }
                }

                Instr::Ireturn | Instr::Freturn | Instr::Areturn => {
                    return Some(stack.pop().unwrap());
                }
                Instr::Return => return None,
            }
            pc += 1;
        }
    }

    fn alloc_multi(&mut self, desc: &str, sizes: &[usize]) -> Value {
        let inner = &desc[1..];
        if sizes.len() == 1 {
            let obj = match inner {
                "I" => Obj::IntArray(vec![0; sizes[0]]),
                "F" => Obj::FloatArray(vec![0.0; sizes[0]]),
                _ => Obj::RefArray(vec![Value::Null; sizes[0]]),
            };
            return self.alloc(obj);
        }
        let elems: Vec<Value> = (0..sizes[0])
            .map(|_| self.alloc_multi(inner, &sizes[1..]))
            .collect();
        self.alloc(Obj::RefArray(elems))
    }
}

fn cond_holds(cond: Cond, a: i32, b: i32) -> bool {
    match cond {
        Cond::Eq => a == b,
        Cond::Ne => a != b,
        Cond::Lt => a < b,
        Cond::Ge => a >= b,
        Cond::Gt => a > b,
        Cond::Le => a <= b,
    }
}

fn field_index(name: &str) -> usize {
    name.strip_prefix('f')
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("unexpected field name {}", name))
}

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

// ── Program construction and entry points ───────────────────────────────

/// A routine declaration with defaulted metadata
pub fn routine(name: &str, params: Vec<(&str, Type)>, ret: Type, body: Vec<Stmt>) -> Decl {
    Decl::Routine(Routine {
        name: name.to_string(),
        params: params
            .into_iter()
            .map(|(name, ty)| Param {
                name: name.to_string(),
                ty,
            })
            .collect(),
        ret,
        body,
        line: None,
    })
}

pub fn program(decls: Vec<Decl>) -> Program {
    Program {
        name: "Main".to_string(),
        decls,
    }
}

/// Compile and interpret one routine of a program
pub fn run_routine(program: &Program, name: &str, args: Vec<Value>) -> Run {
    let classes = orin_codegen::compile_program(program).expect("compilation failed");
    let mut machine = Machine::new(classes);
    let result = machine.run_static(&program.name, name, args);
    Run {
        result,
        output: machine.output,
        calls: machine.calls,
    }
}

/// Compile a program and interpret its command-line dispatcher
pub fn run_main(program: &Program, argv: &[&str]) -> Run {
    let classes = orin_codegen::compile_program(program).expect("compilation failed");
    let mut machine = Machine::new(classes);
    let args = Obj::StrArray(argv.iter().map(|s| s.to_string()).collect());
    let args_ref = machine.alloc(args);
    let result = machine.run_static(&program.name, "main", vec![args_ref]);
    Run {
        result,
        output: machine.output,
        calls: machine.calls,
    }
}
