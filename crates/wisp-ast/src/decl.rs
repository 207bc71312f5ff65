// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Declaration AST nodes.

use crate::expr::Expr;
use crate::stmt::Stmt;
use crate::{NodeId, NodeIdGen, Span};

/// One translation unit: a flat list of class declarations.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompilationUnit {
    pub types: Vec<TypeDecl>,
    /// Id source for nodes synthesized after parsing.
    pub ids: NodeIdGen,
}

impl CompilationUnit {
    pub fn new(types: Vec<TypeDecl>, ids: NodeIdGen) -> Self {
        Self { types, ids }
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn find_type_mut(&mut self, name: &str) -> Option<&mut TypeDecl> {
        self.types.iter_mut().find(|t| t.name == name)
    }
}

/// Where a type declaration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeOrigin {
    /// Written by the user.
    Source,
    /// Synthesized by iterator lowering for `owner.method`.
    StateHolder {
        owner: String,
        method: String,
        is_static: bool,
    },
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDecl {
    pub id: NodeId,
    pub name: String,
    pub type_params: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub ctors: Vec<CtorDecl>,
    pub methods: Vec<MethodDecl>,
    pub origin: TypeOrigin,
    pub span: Span,
}

impl TypeDecl {
    pub fn is_state_holder(&self) -> bool {
        matches!(self.origin, TypeOrigin::StateHolder { .. })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDecl {
    pub id: NodeId,
    pub name: String,
    pub ty: String,
    pub init: Option<Expr>,
    pub is_static: bool,
}

/// A method or constructor parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub id: NodeId,
    pub name: String,
    pub ty: String,
}

/// A constructor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CtorDecl {
    pub id: NodeId,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodDecl {
    pub id: NodeId,
    pub name: String,
    pub params: Vec<Param>,
    pub ret_ty: Option<String>,
    pub body: Vec<Stmt>,
    pub is_static: bool,
    pub span: Span,
}

impl MethodDecl {
    /// Generator methods are the ones whose body yields.
    pub fn is_generator(&self) -> bool {
        crate::stmt::contains_yield(&self.body)
    }
}
