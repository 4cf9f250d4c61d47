//! Class, field and method entities

use crate::instr::Instr;

/// Access flags
pub mod access {
    /// Publicly visible
    pub const PUBLIC: u16 = 0x0001;
    /// Static member
    pub const STATIC: u16 = 0x0008;
}

/// Render access flags in canonical order
pub(crate) fn access_str(flags: u16) -> String {
    let mut parts = Vec::new();
    if flags & access::PUBLIC != 0 {
        parts.push("public");
    }
    if flags & access::STATIC != 0 {
        parts.push("static");
    }
    parts.join(" ")
}

/// One emitted class: the program class or a synthesized record class
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub access: u16,
    pub name: String,
    pub super_name: String,
    /// Name written to the `.source` directive
    pub source: String,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

impl Class {
    /// New public class extending `java/lang/Object`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            access: access::PUBLIC,
            source: format!("{}.j", name),
            name,
            super_name: "java/lang/Object".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn add_method(&mut self, method: Method) {
        self.methods.push(method);
    }
}

/// Field entity
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub access: u16,
    pub name: String,
    pub desc: String,
}

impl Field {
    /// Public static field, the shape every Orin global uses
    pub fn global(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            access: access::PUBLIC | access::STATIC,
            name: name.into(),
            desc: desc.into(),
        }
    }

    /// Public instance field, the shape synthesized record members use
    pub fn member(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            access: access::PUBLIC,
            name: name.into(),
            desc: desc.into(),
        }
    }
}

/// Method entity with its resource limits and finished instruction list
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub access: u16,
    pub name: String,
    /// Full mangled descriptor, `(args)ret`
    pub desc: String,
    pub limit_stack: u16,
    pub limit_locals: u16,
    pub code: Vec<Instr>,
}

impl Method {
    pub fn new(access: u16, name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            desc: desc.into(),
            limit_stack: 0,
            limit_locals: 0,
            code: Vec::new(),
        }
    }
}
