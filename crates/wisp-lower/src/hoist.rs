// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Local renaming before hoisting.
//!
//! Every local of a generator ends up as a field of one flat state holder,
//! so block scoping is lost. A local whose name is also used outside its own
//! scope (an outer member read in a sibling block, a parameter, another local
//! of the same name) would capture those uses once hoisted. Such locals get a
//! fresh `name$N` and only the identifiers bound to them are rewritten.

use std::collections::{HashMap, HashSet};

use wisp_ast::decl::Param;
use wisp_ast::expr::{Expr, ExprKind};
use wisp_ast::stmt::{Stmt, StmtKind};
use wisp_ast::visit::{walk_expr, walk_stmt, walk_stmts, VisitMut};
use wisp_ast::NodeId;

/// Rename the locals of `body` that would collide once hoisted. Returns how
/// many declarations were renamed.
pub(crate) fn rename_conflicting_locals(body: &mut [Stmt], params: &[Param]) -> usize {
    let mut bindings = Bindings {
        params: params.iter().map(|p| p.name.clone()).collect(),
        ..Bindings::default()
    };
    bindings.stmts(body);

    let mut taken: HashSet<String> = bindings.free.clone();
    taken.extend(bindings.params.iter().cloned());
    taken.extend(bindings.decls.iter().map(|d| d.name.clone()));

    let mut renamed_decls: HashMap<NodeId, String> = HashMap::new();
    let mut fresh_for: Vec<Option<String>> = vec![None; bindings.decls.len()];
    let mut suffix = 0;
    for (index, decl) in bindings.decls.iter().enumerate() {
        if !bindings.conflicts(&decl.name) {
            continue;
        }
        let fresh = loop {
            suffix += 1;
            let candidate = format!("{}${suffix}", decl.name);
            if taken.insert(candidate.clone()) {
                break candidate;
            }
        };
        renamed_decls.insert(decl.node, fresh.clone());
        fresh_for[index] = Some(fresh);
    }
    if renamed_decls.is_empty() {
        return 0;
    }

    let renamed_uses: HashMap<NodeId, String> = bindings
        .uses
        .iter()
        .filter_map(|(&expr, &decl)| fresh_for[decl].clone().map(|fresh| (expr, fresh)))
        .collect();
    let mut rename = Rename { decls: &renamed_decls, uses: &renamed_uses };
    walk_stmts(&mut rename, body);
    renamed_decls.len()
}

struct Decl {
    name: String,
    /// The `let` or `foreach` statement.
    node: NodeId,
}

/// Lexical binding of identifiers to the method's own locals.
#[derive(Default)]
struct Bindings {
    params: HashSet<String>,
    decls: Vec<Decl>,
    /// Identifier expression to the index of the local it reads.
    uses: HashMap<NodeId, usize>,
    /// Names used where neither a local nor a parameter is in scope.
    free: HashSet<String>,
    scopes: Vec<HashMap<String, usize>>,
}

impl Bindings {
    fn conflicts(&self, name: &str) -> bool {
        self.params.contains(name)
            || self.free.contains(name)
            || self.decls.iter().filter(|d| d.name == name).count() > 1
    }

    fn declare(&mut self, name: &str, node: NodeId) {
        let index = self.decls.len();
        self.decls.push(Decl { name: name.to_string(), node });
        if self.scopes.is_empty() {
            self.scopes.push(HashMap::new());
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), index);
        }
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }

    fn block(&mut self, stmts: &[Stmt]) {
        self.scopes.push(HashMap::new());
        self.stmts(stmts);
        self.scopes.pop();
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(e) | StmtKind::YieldReturn(e) => self.expr(e),
            StmtKind::Let { name, init, .. } => {
                if let Some(init) = init {
                    self.expr(init);
                }
                self.declare(name, stmt.id);
            }
            StmtKind::Assign { target, value } => {
                self.expr(target);
                self.expr(value);
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                self.expr(cond);
                self.block(then_branch);
                self.block(else_branch);
            }
            StmtKind::While { cond, body } => {
                self.expr(cond);
                self.block(body);
            }
            StmtKind::Loop { body } | StmtKind::Block(body) => self.block(body),
            StmtKind::ForEach { binding, iter, body } => {
                self.expr(iter);
                self.scopes.push(HashMap::new());
                self.declare(binding, stmt.id);
                self.stmts(body);
                self.scopes.pop();
            }
            StmtKind::Switch { scrutinee, cases, default } => {
                self.expr(scrutinee);
                for case in cases {
                    self.block(&case.body);
                }
                self.block(default);
            }
            StmtKind::Return(Some(e)) => self.expr(e),
            StmtKind::Return(None)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::YieldBreak => {}
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => match self.lookup(name) {
                Some(decl) => {
                    self.uses.insert(expr.id, decl);
                }
                None if self.params.contains(name) => {}
                None => {
                    self.free.insert(name.clone());
                }
            },
            ExprKind::Member { object, .. } => self.expr(object),
            ExprKind::Call { callee, args } => {
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
            }
            ExprKind::New { args, .. } => {
                for arg in args {
                    self.expr(arg);
                }
            }
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::This => {}
        }
    }
}

struct Rename<'a> {
    decls: &'a HashMap<NodeId, String>,
    uses: &'a HashMap<NodeId, String>,
}

impl VisitMut for Rename<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        if let Some(fresh) = self.decls.get(&stmt.id) {
            match &mut stmt.kind {
                StmtKind::Let { name, .. } => *name = fresh.clone(),
                StmtKind::ForEach { binding, .. } => *binding = fresh.clone(),
                _ => {}
            }
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        if let Some(fresh) = self.uses.get(&expr.id) {
            if let ExprKind::Ident(name) = &mut expr.kind {
                *name = fresh.clone();
            }
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_ast::AstBuilder;

    fn let_names(stmts: &[Stmt], out: &mut Vec<String>) {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Let { name, .. } => out.push(name.clone()),
                StmtKind::If { then_branch, else_branch, .. } => {
                    let_names(then_branch, out);
                    let_names(else_branch, out);
                }
                StmtKind::Block(body) => let_names(body, out),
                _ => {}
            }
        }
    }

    #[test]
    fn unique_locals_keep_their_names() {
        let mut b = AstBuilder::new();
        let zero = b.int(0);
        let decl = b.let_("i", Some(zero));
        let i = b.ident("i");
        let mut body = vec![decl, b.yield_return(i)];
        let before = body.clone();
        assert_eq!(rename_conflicting_locals(&mut body, &[]), 0);
        assert_eq!(body, before);
    }

    #[test]
    fn local_in_one_branch_leaves_the_other_branch_alone() {
        // if (flag) { yield return count; } else { let count = 5; yield return count; }
        let mut b = AstBuilder::new();
        let outer = b.ident("count");
        let outer_id = outer.id;
        let then_branch = vec![b.yield_return(outer)];
        let five = b.int(5);
        let decl = b.let_("count", Some(five));
        let inner = b.ident("count");
        let inner_id = inner.id;
        let else_branch = vec![decl, b.yield_return(inner)];
        let flag = b.ident("flag");
        let mut body = vec![b.if_(flag, then_branch, else_branch)];
        let flag = b.param("flag", "bool");

        assert_eq!(rename_conflicting_locals(&mut body, &[flag]), 1);
        let mut names = Vec::new();
        let_names(&body, &mut names);
        assert_eq!(names, vec!["count$1"]);

        let mut idents = HashMap::new();
        let StmtKind::If { then_branch, else_branch, .. } = &body[0].kind else {
            unreachable!()
        };
        for stmt in then_branch.iter().chain(else_branch) {
            if let StmtKind::YieldReturn(e) = &stmt.kind {
                idents.insert(e.id, e.as_ident().map(str::to_string));
            }
        }
        assert_eq!(idents[&outer_id].as_deref(), Some("count"));
        assert_eq!(idents[&inner_id].as_deref(), Some("count$1"));
    }

    #[test]
    fn locals_shadowing_parameters_and_each_other_are_renamed() {
        // let n = n + 1; { let x = 1; } { let x = 2; }
        let mut b = AstBuilder::new();
        let n = b.ident("n");
        let one = b.int(1);
        let next = b.binary(wisp_ast::expr::BinOp::Add, n, one);
        let shadow = b.let_("n", Some(next));
        let one = b.int(1);
        let first = b.let_("x", Some(one));
        let first = b.block(vec![first]);
        let two = b.int(2);
        let second = b.let_("x", Some(two));
        let second = b.block(vec![second]);
        let mut body = vec![shadow, first, second];
        let n = b.param("n", "int");

        assert_eq!(rename_conflicting_locals(&mut body, &[n]), 3);
        let mut names = Vec::new();
        let_names(&body, &mut names);
        assert_eq!(names, vec!["n$1", "x$2", "x$3"]);
        // The initializer still reads the parameter.
        let StmtKind::Let { init: Some(init), .. } = &body[0].kind else {
            unreachable!()
        };
        let ExprKind::Binary { left, .. } = &init.kind else {
            unreachable!()
        };
        assert_eq!(left.as_ident(), Some("n"));
    }
}
