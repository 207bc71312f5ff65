// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Read-only navigation index over a compilation unit.
//!
//! The tree itself only links parents to children. Semantic queries need the
//! other direction (which method or type encloses a node), so the index walks
//! a unit once and records every node's parent and kind.

use std::collections::HashMap;

use crate::decl::{CompilationUnit, CtorDecl, MethodDecl, TypeDecl};
use crate::expr::{Expr, ExprKind};
use crate::stmt::{Stmt, StmtKind};
use crate::NodeId;

/// Coarse classification of an indexed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Type,
    Field,
    Ctor,
    Method,
    Param,
    Stmt,
    Expr,
    /// A bare identifier expression.
    Ident,
    /// The name after `.` in a member access.
    MemberName,
}

#[derive(Debug, Clone)]
struct Entry {
    parent: Option<NodeId>,
    kind: NodeKind,
    name: Option<String>,
}

/// Parent/kind lookup table for one unit.
///
/// The index is a snapshot: rebuild it after rewriting the tree.
#[derive(Debug, Default)]
pub struct SyntaxIndex {
    entries: HashMap<NodeId, Entry>,
    identifiers: Vec<NodeId>,
}

impl SyntaxIndex {
    pub fn build(unit: &CompilationUnit) -> Self {
        let mut index = Self::default();
        for ty in &unit.types {
            index.index_type(ty);
        }
        index
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(&id).and_then(|e| e.parent)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.entries.get(&id).map(|e| e.kind)
    }

    /// Declared or referenced name of a node, for the kinds that carry one.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.entries.get(&id).and_then(|e| e.name.as_deref())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Nearest enclosing method or constructor.
    pub fn containing_method(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&a| matches!(self.kind(a), Some(NodeKind::Method | NodeKind::Ctor)))
    }

    pub fn containing_type(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&a| self.kind(a) == Some(NodeKind::Type))
    }

    /// Identifier and member-name nodes in tree order.
    pub fn identifiers(&self) -> &[NodeId] {
        &self.identifiers
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&mut self, id: NodeId, parent: Option<NodeId>, kind: NodeKind, name: Option<&str>) {
        if matches!(kind, NodeKind::Ident | NodeKind::MemberName) {
            self.identifiers.push(id);
        }
        self.entries.insert(
            id,
            Entry {
                parent,
                kind,
                name: name.map(String::from),
            },
        );
    }

    fn index_type(&mut self, ty: &TypeDecl) {
        self.record(ty.id, None, NodeKind::Type, Some(&ty.name));
        for field in &ty.fields {
            self.record(field.id, Some(ty.id), NodeKind::Field, Some(&field.name));
            if let Some(init) = &field.init {
                self.index_expr(init, field.id);
            }
        }
        for ctor in &ty.ctors {
            self.index_ctor(ctor, ty.id);
        }
        for method in &ty.methods {
            self.index_method(method, ty.id);
        }
    }

    fn index_ctor(&mut self, ctor: &CtorDecl, parent: NodeId) {
        self.record(ctor.id, Some(parent), NodeKind::Ctor, None);
        for param in &ctor.params {
            self.record(param.id, Some(ctor.id), NodeKind::Param, Some(&param.name));
        }
        self.index_stmts(&ctor.body, ctor.id);
    }

    fn index_method(&mut self, method: &MethodDecl, parent: NodeId) {
        self.record(method.id, Some(parent), NodeKind::Method, Some(&method.name));
        for param in &method.params {
            self.record(param.id, Some(method.id), NodeKind::Param, Some(&param.name));
        }
        self.index_stmts(&method.body, method.id);
    }

    fn index_stmts(&mut self, stmts: &[Stmt], parent: NodeId) {
        for stmt in stmts {
            self.index_stmt(stmt, parent);
        }
    }

    fn index_stmt(&mut self, stmt: &Stmt, parent: NodeId) {
        let name = match &stmt.kind {
            StmtKind::Let { name, .. } | StmtKind::ForEach { binding: name, .. } => Some(name.as_str()),
            _ => None,
        };
        self.record(stmt.id, Some(parent), NodeKind::Stmt, name);
        let id = stmt.id;
        match &stmt.kind {
            StmtKind::Expr(e) | StmtKind::YieldReturn(e) => self.index_expr(e, id),
            StmtKind::Let { init, .. } => {
                if let Some(init) = init {
                    self.index_expr(init, id);
                }
            }
            StmtKind::Assign { target, value } => {
                self.index_expr(target, id);
                self.index_expr(value, id);
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                self.index_expr(cond, id);
                self.index_stmts(then_branch, id);
                self.index_stmts(else_branch, id);
            }
            StmtKind::While { cond, body } => {
                self.index_expr(cond, id);
                self.index_stmts(body, id);
            }
            StmtKind::ForEach { iter, body, .. } => {
                self.index_expr(iter, id);
                self.index_stmts(body, id);
            }
            StmtKind::Loop { body } | StmtKind::Block(body) => self.index_stmts(body, id),
            StmtKind::Switch { scrutinee, cases, default } => {
                self.index_expr(scrutinee, id);
                for case in cases {
                    self.index_stmts(&case.body, id);
                }
                self.index_stmts(default, id);
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.index_expr(value, id);
                }
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::YieldBreak => {}
        }
    }

    fn index_expr(&mut self, expr: &Expr, parent: NodeId) {
        let id = expr.id;
        match &expr.kind {
            ExprKind::Ident(name) => self.record(id, Some(parent), NodeKind::Ident, Some(name)),
            ExprKind::Member { object, member } => {
                self.record(id, Some(parent), NodeKind::Expr, None);
                self.index_expr(object, id);
                self.record(member.id, Some(id), NodeKind::MemberName, Some(&member.text));
            }
            ExprKind::Call { callee, args } => {
                self.record(id, Some(parent), NodeKind::Expr, None);
                self.index_expr(callee, id);
                for arg in args {
                    self.index_expr(arg, id);
                }
            }
            ExprKind::New { ty, args } => {
                self.record(id, Some(parent), NodeKind::Expr, Some(ty));
                for arg in args {
                    self.index_expr(arg, id);
                }
            }
            ExprKind::Binary { left, right, .. } => {
                self.record(id, Some(parent), NodeKind::Expr, None);
                self.index_expr(left, id);
                self.index_expr(right, id);
            }
            ExprKind::Unary { operand, .. } => {
                self.record(id, Some(parent), NodeKind::Expr, None);
                self.index_expr(operand, id);
            }
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::This => self.record(id, Some(parent), NodeKind::Expr, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AstBuilder;

    #[test]
    fn member_name_is_child_of_member_expr() {
        let mut b = AstBuilder::new();
        let this = b.this();
        let access = b.member(this, "count");
        let access_id = access.id;
        let name_id = match &access.kind {
            ExprKind::Member { member, .. } => member.id,
            _ => unreachable!(),
        };
        let body = vec![b.expr_stmt(access)];
        let method = b.method("Run", vec![], body);
        let method_id = method.id;
        let class = b.class("Counter", vec![], vec![], vec![method]);
        let class_id = class.id;
        let unit = b.unit(vec![class]);

        let index = SyntaxIndex::build(&unit);
        assert_eq!(index.kind(name_id), Some(NodeKind::MemberName));
        assert_eq!(index.parent(name_id), Some(access_id));
        assert_eq!(index.containing_method(name_id), Some(method_id));
        assert_eq!(index.containing_type(name_id), Some(class_id));
        assert_eq!(index.name(name_id), Some("count"));
    }

    #[test]
    fn field_initializer_has_no_containing_method() {
        let mut b = AstBuilder::new();
        let init = b.ident("Default");
        let init_id = init.id;
        let field = b.field("value", "int", Some(init));
        let class = b.class("Holder", vec![field], vec![], vec![]);
        let unit = b.unit(vec![class]);

        let index = SyntaxIndex::build(&unit);
        assert_eq!(index.kind(init_id), Some(NodeKind::Ident));
        assert_eq!(index.containing_method(init_id), None);
        assert!(index.containing_type(init_id).is_some());
        assert_eq!(index.identifiers(), &[init_id]);
    }
}
