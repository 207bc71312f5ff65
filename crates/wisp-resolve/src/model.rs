// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The semantic-model query surface and a lexically scoped implementation.

use std::collections::HashMap;

use wisp_ast::decl::{CompilationUnit, CtorDecl, MethodDecl, TypeDecl};
use wisp_ast::expr::{Expr, ExprKind};
use wisp_ast::stmt::{Stmt, StmtKind};
use wisp_ast::{NodeId, SyntaxIndex};

use crate::scope::ScopeTree;
use crate::symbol::{Symbol, SymbolId, SymbolKind, SymbolTable};

/// What the model knows about a type that encloses a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub node: NodeId,
    pub name: String,
    pub is_state_holder: bool,
}

/// Read-only oracle supplied by the front end.
///
/// `resolve_symbol` returning `None` means the name could not be bound in
/// the scope where it appears.
pub trait SemanticModel {
    fn resolve_symbol(&self, node: NodeId) -> Option<&Symbol>;
    fn containing_method(&self, node: NodeId) -> Option<NodeId>;
    fn containing_type(&self, node: NodeId) -> Option<TypeInfo>;
}

/// Lexical model: locals after their declaration, parameters, members of the
/// containing type, type names and host builtins.
///
/// Members of *other* types are never in scope, which is what makes an outer
/// instance's fields unresolvable from inside a state holder.
#[derive(Debug)]
pub struct ScopeModel {
    index: SyntaxIndex,
    symbols: SymbolTable,
    resolutions: HashMap<NodeId, SymbolId>,
    types: HashMap<NodeId, TypeInfo>,
}

impl ScopeModel {
    pub fn build(unit: &CompilationUnit) -> Self {
        Self::with_builtins(unit, &[])
    }

    /// Build with extra globally visible host names (`Console`, `Math`, ...).
    pub fn with_builtins(unit: &CompilationUnit, builtins: &[&str]) -> Self {
        let mut builder = ModelBuilder {
            symbols: SymbolTable::new(),
            scopes: ScopeTree::new(),
            resolutions: HashMap::new(),
        };
        for name in builtins {
            builder.declare(name, SymbolKind::Builtin, None, None);
        }
        for ty in &unit.types {
            builder.declare(&ty.name, SymbolKind::Type, None, Some(ty.id));
        }
        for ty in &unit.types {
            builder.resolve_type(ty);
        }

        let types = unit
            .types
            .iter()
            .map(|ty| {
                let info = TypeInfo {
                    node: ty.id,
                    name: ty.name.clone(),
                    is_state_holder: ty.is_state_holder(),
                };
                (ty.id, info)
            })
            .collect();

        Self {
            index: SyntaxIndex::build(unit),
            symbols: builder.symbols,
            resolutions: builder.resolutions,
            types,
        }
    }

    pub fn index(&self) -> &SyntaxIndex {
        &self.index
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Number of identifier uses that resolved.
    pub fn resolved_count(&self) -> usize {
        self.resolutions.len()
    }
}

impl SemanticModel for ScopeModel {
    fn resolve_symbol(&self, node: NodeId) -> Option<&Symbol> {
        self.resolutions
            .get(&node)
            .and_then(|&id| self.symbols.get(id))
    }

    fn containing_method(&self, node: NodeId) -> Option<NodeId> {
        self.index.containing_method(node)
    }

    fn containing_type(&self, node: NodeId) -> Option<TypeInfo> {
        self.index
            .containing_type(node)
            .and_then(|id| self.types.get(&id).cloned())
    }
}

struct ModelBuilder {
    symbols: SymbolTable,
    scopes: ScopeTree,
    resolutions: HashMap<NodeId, SymbolId>,
}

impl ModelBuilder {
    fn declare(&mut self, name: &str, kind: SymbolKind, ty: Option<&str>, decl: Option<NodeId>) {
        let id = self
            .symbols
            .insert(name.to_string(), kind, ty.map(String::from), decl);
        self.scopes.define(name.to_string(), id);
    }

    fn resolve_type(&mut self, ty: &TypeDecl) {
        self.scopes.push();
        for field in &ty.fields {
            let kind = SymbolKind::Field {
                owner: ty.name.clone(),
                is_static: field.is_static,
            };
            self.declare(&field.name, kind, Some(&field.ty), Some(field.id));
        }
        for method in &ty.methods {
            let kind = SymbolKind::Method {
                owner: ty.name.clone(),
                is_static: method.is_static,
            };
            self.declare(&method.name, kind, method.ret_ty.as_deref(), Some(method.id));
        }

        for field in &ty.fields {
            if let Some(init) = &field.init {
                self.resolve_expr(init);
            }
        }
        for ctor in &ty.ctors {
            self.resolve_ctor(ctor);
        }
        for method in &ty.methods {
            self.resolve_method(method);
        }
        self.scopes.pop();
    }

    fn resolve_ctor(&mut self, ctor: &CtorDecl) {
        self.scopes.push();
        for param in &ctor.params {
            self.declare(&param.name, SymbolKind::Parameter, Some(&param.ty), Some(param.id));
        }
        self.resolve_stmts(&ctor.body);
        self.scopes.pop();
    }

    fn resolve_method(&mut self, method: &MethodDecl) {
        self.scopes.push();
        for param in &method.params {
            self.declare(&param.name, SymbolKind::Parameter, Some(&param.ty), Some(param.id));
        }
        self.resolve_stmts(&method.body);
        self.scopes.pop();
    }

    fn resolve_block(&mut self, stmts: &[Stmt]) {
        self.scopes.push();
        self.resolve_stmts(stmts);
        self.scopes.pop();
    }

    fn resolve_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(e) | StmtKind::YieldReturn(e) => self.resolve_expr(e),
            StmtKind::Let { name, ty, init } => {
                // The initializer cannot see the name it initializes.
                if let Some(init) = init {
                    self.resolve_expr(init);
                }
                self.declare(name, SymbolKind::Local, ty.as_deref(), Some(stmt.id));
            }
            StmtKind::Assign { target, value } => {
                self.resolve_expr(target);
                self.resolve_expr(value);
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                self.resolve_expr(cond);
                self.resolve_block(then_branch);
                self.resolve_block(else_branch);
            }
            StmtKind::While { cond, body } => {
                self.resolve_expr(cond);
                self.resolve_block(body);
            }
            StmtKind::Loop { body } | StmtKind::Block(body) => self.resolve_block(body),
            StmtKind::ForEach { binding, iter, body } => {
                self.resolve_expr(iter);
                self.scopes.push();
                self.declare(binding, SymbolKind::Local, None, Some(stmt.id));
                self.resolve_stmts(body);
                self.scopes.pop();
            }
            StmtKind::Switch { scrutinee, cases, default } => {
                self.resolve_expr(scrutinee);
                for case in cases {
                    self.resolve_block(&case.body);
                }
                self.resolve_block(default);
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::YieldBreak => {}
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => {
                if let Some(symbol) = self.scopes.lookup(name) {
                    self.resolutions.insert(expr.id, symbol);
                }
            }
            // Member names need the object's type; only the object is bound here.
            ExprKind::Member { object, .. } => self.resolve_expr(object),
            ExprKind::Call { callee, args } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            ExprKind::New { args, .. } => {
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            ExprKind::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            ExprKind::Unary { operand, .. } => self.resolve_expr(operand),
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::This => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_ast::AstBuilder;

    #[test]
    fn local_is_not_visible_before_its_declaration() {
        let mut b = AstBuilder::new();
        let early = b.ident("x");
        let early_id = early.id;
        let late = b.ident("x");
        let late_id = late.id;
        let one = b.int(1);
        let body = vec![b.expr_stmt(early), b.let_("x", Some(one)), b.expr_stmt(late)];
        let method = b.method("Run", vec![], body);
        let class = b.class("A", vec![], vec![], vec![method]);
        let unit = b.unit(vec![class]);

        let model = ScopeModel::build(&unit);
        assert!(model.resolve_symbol(early_id).is_none());
        let sym = model.resolve_symbol(late_id).map(|s| s.kind.clone());
        assert_eq!(sym, Some(SymbolKind::Local));
    }

    #[test]
    fn members_of_other_types_are_out_of_scope() {
        let mut b = AstBuilder::new();
        let field = b.field("count", "int", None);
        let outer = b.class("Outer", vec![field], vec![], vec![]);

        let use_count = b.ident("count");
        let use_id = use_count.id;
        let use_type = b.ident("Outer");
        let type_id = use_type.id;
        let body = vec![b.expr_stmt(use_count), b.expr_stmt(use_type)];
        let method = b.method("Run", vec![], body);
        let other = b.class("Other", vec![], vec![], vec![method]);
        let unit = b.unit(vec![outer, other]);

        let model = ScopeModel::build(&unit);
        assert!(model.resolve_symbol(use_id).is_none());
        assert_eq!(
            model.resolve_symbol(type_id).map(|s| s.kind.clone()),
            Some(SymbolKind::Type)
        );
        let info = model.containing_type(use_id).map(|t| t.name);
        assert_eq!(info.as_deref(), Some("Other"));
    }

    #[test]
    fn builtins_resolve_everywhere() {
        let mut b = AstBuilder::new();
        let console = b.ident("Console");
        let id = console.id;
        let body = vec![b.expr_stmt(console)];
        let method = b.method("Run", vec![], body);
        let class = b.class("A", vec![], vec![], vec![method]);
        let unit = b.unit(vec![class]);

        assert!(ScopeModel::build(&unit).resolve_symbol(id).is_none());
        let model = ScopeModel::with_builtins(&unit, &["Console"]);
        assert_eq!(
            model.resolve_symbol(id).map(|s| s.kind.clone()),
            Some(SymbolKind::Builtin)
        );
    }
}
