// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Mutable tree traversal.
//!
//! Passes override the `visit_*` hooks they care about and call the matching
//! `walk_*` function to keep descending.

use crate::decl::{CtorDecl, MethodDecl, TypeDecl};
use crate::expr::{Expr, ExprKind};
use crate::stmt::{Stmt, StmtKind};

pub trait VisitMut {
    fn visit_type(&mut self, ty: &mut TypeDecl) {
        walk_type(self, ty);
    }

    fn visit_ctor(&mut self, ctor: &mut CtorDecl) {
        walk_stmts(self, &mut ctor.body);
    }

    fn visit_method(&mut self, method: &mut MethodDecl) {
        walk_stmts(self, &mut method.body);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_type<V: VisitMut + ?Sized>(v: &mut V, ty: &mut TypeDecl) {
    for field in &mut ty.fields {
        if let Some(init) = &mut field.init {
            v.visit_expr(init);
        }
    }
    for ctor in &mut ty.ctors {
        v.visit_ctor(ctor);
    }
    for method in &mut ty.methods {
        v.visit_method(method);
    }
}

pub fn walk_stmts<V: VisitMut + ?Sized>(v: &mut V, stmts: &mut [Stmt]) {
    for stmt in stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Expr(e) | StmtKind::YieldReturn(e) => v.visit_expr(e),
        StmtKind::Let { init, .. } => {
            if let Some(init) = init {
                v.visit_expr(init);
            }
        }
        StmtKind::Assign { target, value } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        StmtKind::If { cond, then_branch, else_branch } => {
            v.visit_expr(cond);
            walk_stmts(v, then_branch);
            walk_stmts(v, else_branch);
        }
        StmtKind::While { cond, body } => {
            v.visit_expr(cond);
            walk_stmts(v, body);
        }
        StmtKind::ForEach { iter, body, .. } => {
            v.visit_expr(iter);
            walk_stmts(v, body);
        }
        StmtKind::Loop { body } | StmtKind::Block(body) => walk_stmts(v, body),
        StmtKind::Switch { scrutinee, cases, default } => {
            v.visit_expr(scrutinee);
            for case in cases {
                walk_stmts(v, &mut case.body);
            }
            walk_stmts(v, default);
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::YieldBreak => {}
    }
}

pub fn walk_expr<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Member { object, .. } => v.visit_expr(object),
        ExprKind::Call { callee, args } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::New { args, .. } => {
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::String(_)
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::This
        | ExprKind::Ident(_) => {}
    }
}
