//! Initializer methods and compilation units

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateType;
use crate::span::Span;
use crate::stmt::Block;
use crate::ty::ValueType;

/// Formal parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Declared type
    #[serde(default)]
    pub ty: ValueType,
    /// Generic formal (type determined at the call site)
    #[serde(default)]
    pub generic: bool,
}

/// Initializer method of an aggregate type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitMethod {
    /// Method name
    pub name: String,
    /// Name of the type under construction
    pub owner: String,
    /// Formals (not counting the receiver)
    #[serde(default)]
    pub params: Vec<Param>,
    /// Synthesized reference to the enclosing instance of a nested type
    #[serde(default)]
    pub outer: Option<Param>,
    /// Body
    #[serde(default)]
    pub body: Block,
    /// Generated by the compiler rather than written by the user
    #[serde(default)]
    pub compiler_generated: bool,
    /// Declaration location
    #[serde(default)]
    pub span: Span,
}

impl InitMethod {
    /// User-written initializer `owner.name()` with `body`
    pub fn new(owner: impl Into<String>, name: impl Into<String>, body: Block) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            params: Vec::new(),
            outer: None,
            body,
            compiler_generated: false,
            span: Span::default(),
        }
    }

    /// Qualified name used in logs
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    /// Qualified name with the user-written formals, e.g. `R.init(x: int)`.
    /// Overloads sharing a name differ here.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        format!("{}({})", self.qualified_name(), params.join(", "))
    }
}

/// Everything the pass needs from one source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Source path, used when rendering diagnostics
    #[serde(default)]
    pub source_name: Option<String>,
    /// Source text, used when rendering diagnostics
    #[serde(default)]
    pub source: Option<String>,
    /// Aggregate types
    #[serde(default)]
    pub types: Vec<AggregateType>,
    /// Initializers to normalize
    #[serde(default)]
    pub initializers: Vec<InitMethod>,
}
