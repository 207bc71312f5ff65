// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Node constructors that take care of id allocation.
//!
//! Passes that synthesize code and tests that build trees by hand both go
//! through an `AstBuilder`, so every node in a unit gets a distinct id.

use crate::decl::{CompilationUnit, CtorDecl, FieldDecl, MethodDecl, Param, TypeDecl, TypeOrigin};
use crate::expr::{BinOp, Expr, ExprKind, Name, UnaryOp};
use crate::stmt::{Stmt, StmtKind, SwitchCase};
use crate::{NodeId, NodeIdGen, Span};

#[derive(Debug, Default)]
pub struct AstBuilder {
    ids: NodeIdGen,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self { ids: NodeIdGen::new() }
    }

    /// Continue allocating from an existing generator (usually a unit's).
    pub fn from_gen(ids: NodeIdGen) -> Self {
        Self { ids }
    }

    pub fn into_gen(self) -> NodeIdGen {
        self.ids
    }

    pub fn fresh_id(&mut self) -> NodeId {
        self.ids.fresh()
    }

    /// Finish a unit; the builder's generator moves into it.
    pub fn unit(self, types: Vec<TypeDecl>) -> CompilationUnit {
        CompilationUnit::new(types, self.ids)
    }

    // ── Expressions ─────────────────────────────────────────────────

    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr { id: self.fresh_id(), kind, span: Span::default() }
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.expr(ExprKind::Int(value))
    }

    pub fn float(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::Float(value))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.expr(ExprKind::String(value.to_string()))
    }

    pub fn bool(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::Bool(value))
    }

    pub fn null(&mut self) -> Expr {
        self.expr(ExprKind::Null)
    }

    pub fn this(&mut self) -> Expr {
        self.expr(ExprKind::This)
    }

    pub fn ident(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Ident(name.to_string()))
    }

    pub fn name(&mut self, text: &str) -> Name {
        Name { id: self.fresh_id(), text: text.to_string() }
    }

    pub fn member(&mut self, object: Expr, member: &str) -> Expr {
        let member = self.name(member);
        self.expr(ExprKind::Member { object: Box::new(object), member })
    }

    pub fn call(&mut self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call { callee: Box::new(callee), args })
    }

    /// `object.method(args)`
    pub fn method_call(&mut self, object: Expr, method: &str, args: Vec<Expr>) -> Expr {
        let callee = self.member(object, method);
        self.call(callee, args)
    }

    pub fn new_object(&mut self, ty: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::New { ty: ty.to_string(), args })
    }

    pub fn binary(&mut self, op: BinOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary { op, operand: Box::new(operand) })
    }

    // ── Statements ──────────────────────────────────────────────────

    pub fn stmt(&mut self, kind: StmtKind) -> Stmt {
        Stmt { id: self.fresh_id(), kind, span: Span::default() }
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn let_(&mut self, name: &str, init: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Let { name: name.to_string(), ty: None, init })
    }

    pub fn assign(&mut self, target: Expr, value: Expr) -> Stmt {
        self.stmt(StmtKind::Assign { target, value })
    }

    /// `name = value`
    pub fn assign_to(&mut self, name: &str, value: Expr) -> Stmt {
        let target = self.ident(name);
        self.assign(target, value)
    }

    pub fn if_(&mut self, cond: Expr, then_branch: Vec<Stmt>, else_branch: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::If { cond, then_branch, else_branch })
    }

    pub fn while_(&mut self, cond: Expr, body: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::While { cond, body })
    }

    pub fn loop_(&mut self, body: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Loop { body })
    }

    pub fn for_each(&mut self, binding: &str, iter: Expr, body: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::ForEach { binding: binding.to_string(), iter, body })
    }

    pub fn block(&mut self, body: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(body))
    }

    pub fn switch(&mut self, scrutinee: Expr, cases: Vec<(i64, Vec<Stmt>)>, default: Vec<Stmt>) -> Stmt {
        let cases = cases
            .into_iter()
            .map(|(value, body)| SwitchCase { value, body })
            .collect();
        self.stmt(StmtKind::Switch { scrutinee, cases, default })
    }

    pub fn ret(&mut self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn break_(&mut self) -> Stmt {
        self.stmt(StmtKind::Break)
    }

    pub fn continue_(&mut self) -> Stmt {
        self.stmt(StmtKind::Continue)
    }

    pub fn yield_return(&mut self, value: Expr) -> Stmt {
        self.stmt(StmtKind::YieldReturn(value))
    }

    pub fn yield_break(&mut self) -> Stmt {
        self.stmt(StmtKind::YieldBreak)
    }

    // ── Declarations ────────────────────────────────────────────────

    pub fn param(&mut self, name: &str, ty: &str) -> Param {
        Param { id: self.fresh_id(), name: name.to_string(), ty: ty.to_string() }
    }

    pub fn field(&mut self, name: &str, ty: &str, init: Option<Expr>) -> FieldDecl {
        FieldDecl {
            id: self.fresh_id(),
            name: name.to_string(),
            ty: ty.to_string(),
            init,
            is_static: false,
        }
    }

    pub fn static_field(&mut self, name: &str, ty: &str, init: Option<Expr>) -> FieldDecl {
        FieldDecl { is_static: true, ..self.field(name, ty, init) }
    }

    pub fn ctor(&mut self, params: Vec<Param>, body: Vec<Stmt>) -> CtorDecl {
        CtorDecl { id: self.fresh_id(), params, body }
    }

    pub fn method(&mut self, name: &str, params: Vec<Param>, body: Vec<Stmt>) -> MethodDecl {
        MethodDecl {
            id: self.fresh_id(),
            name: name.to_string(),
            params,
            ret_ty: None,
            body,
            is_static: false,
            span: Span::default(),
        }
    }

    pub fn static_method(&mut self, name: &str, params: Vec<Param>, body: Vec<Stmt>) -> MethodDecl {
        MethodDecl { is_static: true, ..self.method(name, params, body) }
    }

    pub fn class(
        &mut self,
        name: &str,
        fields: Vec<FieldDecl>,
        ctors: Vec<CtorDecl>,
        methods: Vec<MethodDecl>,
    ) -> TypeDecl {
        TypeDecl {
            id: self.fresh_id(),
            name: name.to_string(),
            type_params: Vec::new(),
            fields,
            ctors,
            methods,
            origin: TypeOrigin::Source,
            span: Span::default(),
        }
    }
}
