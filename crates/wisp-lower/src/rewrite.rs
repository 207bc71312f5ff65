// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Back-reference rewrite.
//!
//! After synthesis, identifiers in state-holder bodies that name members of
//! the original instance no longer resolve. Each one becomes a member access
//! through the back-reference (`limit` → `$this.limit`), or through the
//! owner type for static generators (`limit` → `Owner.limit`).

use std::collections::HashSet;

use wisp_ast::decl::{CompilationUnit, TypeOrigin};
use wisp_ast::expr::{Expr, ExprKind, Name};
use wisp_ast::visit::{walk_expr, VisitMut};
use wisp_ast::{AstBuilder, NodeId, SyntaxIndex};
use wisp_resolve::{outer_references, ScopeModel, SemanticModel};

use crate::options::LowerOptions;

/// Rewrite outer references using the built-in lexical model.
///
/// Returns the number of identifiers rewritten.
pub fn redirect_outer_references(unit: &mut CompilationUnit, options: &LowerOptions) -> usize {
    let builtins: Vec<&str> = options.builtins.iter().map(String::as_str).collect();
    let model = ScopeModel::with_builtins(unit, &builtins);
    redirect_with_model(unit, model.index(), &model, options)
}

/// Rewrite outer references as classified by a front end's own model.
///
/// `index` and `model` must describe `unit` as it is now.
pub fn redirect_with_model<M>(
    unit: &mut CompilationUnit,
    index: &SyntaxIndex,
    model: &M,
    options: &LowerOptions,
) -> usize
where
    M: SemanticModel + ?Sized,
{
    let targets: HashSet<NodeId> = outer_references(index, model).into_iter().collect();
    if targets.is_empty() {
        return 0;
    }

    let mut b = AstBuilder::from_gen(std::mem::take(&mut unit.ids));
    let mut total = 0;
    for ty in &mut unit.types {
        let receiver = match &ty.origin {
            TypeOrigin::StateHolder { owner, is_static: true, .. } => owner.clone(),
            TypeOrigin::StateHolder { .. } => options.back_reference.clone(),
            TypeOrigin::Source => continue,
        };
        let mut redirector = Redirector {
            b: &mut b,
            targets: &targets,
            receiver: &receiver,
            rewritten: 0,
        };
        redirector.visit_type(ty);
        total += redirector.rewritten;
    }
    unit.ids = b.into_gen();
    total
}

struct Redirector<'a> {
    b: &'a mut AstBuilder,
    targets: &'a HashSet<NodeId>,
    receiver: &'a str,
    rewritten: usize,
}

impl VisitMut for Redirector<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if !matches!(expr.kind, ExprKind::Ident(_)) {
            walk_expr(self, expr);
            return;
        }
        if !self.targets.contains(&expr.id) {
            return;
        }
        let ExprKind::Ident(name) = &expr.kind else {
            return;
        };
        let name = name.clone();

        tracing::trace!(node = ?expr.id, %name, receiver = self.receiver, "redirecting outer reference");
        // The original node id moves to the member name.
        let member = Name { id: expr.id, text: name };
        let object = self.b.ident(self.receiver);
        expr.id = self.b.fresh_id();
        expr.kind = ExprKind::Member { object: Box::new(object), member };
        self.rewritten += 1;
    }
}
