//! Aggregate type descriptors
//!
//! An `AggregateType` owns the ordered field list of a class or record, the
//! names of the methods it declares and the descriptors of its direct
//! parents. Declaration order is the canonical initialization order and is
//! never changed once the type is defined.

use serde::{Deserialize, Serialize};

use crate::expr::{Expr, Symbol};
use crate::span::Span;
use crate::ty::ValueType;

/// Class or record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// Reference type with single inheritance
    Class,
    /// Value type
    Record,
}

/// Field flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFlags {
    /// `param` field (compile-time constant)
    #[serde(default)]
    pub param: bool,
    /// `type` field
    #[serde(default)]
    pub type_variable: bool,
    /// Synthesized reference to the enclosing type's instance
    #[serde(default)]
    pub outer: bool,
    /// Synthesized `super` placeholder at the head of a derived class
    #[serde(default)]
    pub super_placeholder: bool,
}

impl FieldFlags {
    /// param or type field
    pub fn is_generic(&self) -> bool {
        self.param || self.type_variable
    }
}

/// Field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared type expression
    #[serde(default)]
    pub type_expr: Option<Expr>,
    /// Default-value expression
    #[serde(default)]
    pub init: Option<Expr>,
    /// Value type as known after scope resolution
    #[serde(default)]
    pub ty: ValueType,
    /// Flags
    #[serde(default)]
    pub flags: FieldFlags,
    /// Declaration location
    #[serde(default)]
    pub span: Span,
}

impl FieldDecl {
    /// Field with neither type expression nor default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_expr: None,
            init: None,
            ty: ValueType::Unknown,
            flags: FieldFlags::default(),
            span: Span::default(),
        }
    }

    /// Set the declared type expression
    pub fn with_type_expr(mut self, type_expr: Expr) -> Self {
        self.type_expr = Some(type_expr);
        self
    }

    /// Set the default-value expression
    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }

    /// Set the value type
    pub fn with_ty(mut self, ty: ValueType) -> Self {
        self.ty = ty;
        self
    }

    /// Set the flags
    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Class or record descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateType {
    /// Type name
    pub name: String,
    /// Class or record
    pub kind: AggregateKind,
    /// Has unbound generic parameters
    #[serde(default)]
    pub generic: bool,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Names of the methods the type itself declares
    #[serde(default)]
    pub methods: Vec<String>,
    /// Direct parents
    #[serde(default)]
    pub parents: Vec<AggregateType>,
    /// Name of the enclosing type for nested types
    #[serde(default)]
    pub outer: Option<String>,
}

impl AggregateType {
    /// Empty descriptor
    pub fn new(name: impl Into<String>, kind: AggregateKind) -> Self {
        Self {
            name: name.into(),
            kind,
            generic: false,
            fields: Vec::new(),
            methods: Vec::new(),
            parents: Vec::new(),
            outer: None,
        }
    }

    /// Append a field
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a method name
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.methods.push(method.into());
        self
    }

    /// Add a direct parent; classes get the `super` placeholder at their head
    pub fn with_parent(mut self, parent: AggregateType) -> Self {
        if self.kind == AggregateKind::Class && !self.has_super_placeholder() {
            let placeholder = FieldDecl::new("super")
                .with_ty(ValueType::class(parent.name.clone()))
                .with_flags(FieldFlags {
                    super_placeholder: true,
                    ..FieldFlags::default()
                });
            self.fields.insert(0, placeholder);
        }
        self.parents.push(parent);
        self
    }

    /// Record the enclosing type
    pub fn with_outer(mut self, outer: impl Into<String>) -> Self {
        self.outer = Some(outer.into());
        self
    }

    fn has_super_placeholder(&self) -> bool {
        self.fields
            .first()
            .is_some_and(|field| field.flags.super_placeholder)
    }

    /// Index of the first field that has to be initialized, skipping the
    /// `super` placeholder of derived classes
    pub fn first_real_field(&self) -> Option<usize> {
        let first = usize::from(self.has_super_placeholder());
        (first < self.fields.len()).then_some(first)
    }

    /// Index of the field named `name`
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Field named `name`
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Whether the type itself declares a method `name`
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|method| method == name)
    }

    /// Classify `expr` as a reference to one of this type's own fields,
    /// either a bare field symbol or `this.name`; returns its index
    pub fn local_field(&self, expr: &Expr) -> Option<usize> {
        let name = match expr {
            Expr::Sym(sym) => match &sym.symbol {
                Symbol::Field { owner, name } if *owner == self.name => name.as_str(),
                _ => return None,
            },
            Expr::Call(call) => match call.member_access() {
                Some((base, name)) if base.is_this() => name,
                _ => return None,
            },
            _ => return None,
        };
        self.field_index(name)
            .filter(|&idx| !self.fields[idx].flags.super_placeholder)
    }

    /// Classify `expr` as a reference to a field inherited through a direct
    /// parent; returns the parent field
    pub fn super_field(&self, expr: &Expr) -> Option<&FieldDecl> {
        match expr {
            Expr::Sym(sym) => match &sym.symbol {
                Symbol::Field { owner, name } if *owner != self.name => {
                    self.parents
                        .iter()
                        .filter(|parent| parent.name == *owner)
                        .find_map(|parent| parent.field(name))
                }
                _ => None,
            },
            Expr::Call(call) => match call.member_access() {
                Some((base, name)) if base.is_this() && self.field_index(name).is_none() => {
                    self.parent_field(name)
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Field `name` declared by a direct parent
    pub fn parent_field(&self, name: &str) -> Option<&FieldDecl> {
        self.parents
            .iter()
            .find_map(|parent| parent.field(name).filter(|f| !f.flags.super_placeholder))
    }

    /// The synthesized outer-reference field, if any
    pub fn outer_field(&self) -> Option<usize> {
        self.fields.iter().position(|field| field.flags.outer)
    }
}
