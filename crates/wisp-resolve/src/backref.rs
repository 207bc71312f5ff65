// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Back-reference classification for lowered generator bodies.
//!
//! A lowered body lives in a synthesized state-holder type that declares the
//! original method's locals and parameters as its own fields, but none of
//! the original instance's members. So inside a state holder, an identifier
//! the model cannot bind is taken to name an outer member and must be
//! reached through the back-reference field.
//!
//! Genuinely bad names (typos, forward references) are indistinguishable
//! from outer members here and get redirected too; they fail later, at the
//! rewritten access.

use wisp_ast::{NodeId, NodeKind, SyntaxIndex};

use crate::model::SemanticModel;

/// Decision for one identifier node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackRef {
    /// Not an identifier inside a state-holder method; leave it alone.
    NotApplicable,
    /// Binds to a field, parameter or local of the state holder.
    ResolvedLocally,
    /// Names a member of the original enclosing instance.
    RedirectToOuterState,
}

/// Classify one node.
pub fn classify<M>(index: &SyntaxIndex, model: &M, node: NodeId) -> BackRef
where
    M: SemanticModel + ?Sized,
{
    // Member names after `.` are already qualified by their object.
    if index.kind(node) != Some(NodeKind::Ident) {
        return BackRef::NotApplicable;
    }
    if model.containing_method(node).is_none() {
        return BackRef::NotApplicable;
    }
    match model.containing_type(node) {
        Some(info) if info.is_state_holder => {}
        _ => return BackRef::NotApplicable,
    }

    let decision = match model.resolve_symbol(node) {
        Some(_) => BackRef::ResolvedLocally,
        None => BackRef::RedirectToOuterState,
    };
    tracing::trace!(?node, name = ?index.name(node), ?decision, "classified identifier");
    decision
}

/// Every identifier in the index that must go through the back-reference.
pub fn outer_references<M>(index: &SyntaxIndex, model: &M) -> Vec<NodeId>
where
    M: SemanticModel + ?Sized,
{
    index
        .identifiers()
        .iter()
        .copied()
        .filter(|&id| classify(index, model, id) == BackRef::RedirectToOuterState)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScopeModel;
    use wisp_ast::decl::{CompilationUnit, TypeOrigin};
    use wisp_ast::expr::ExprKind;
    use wisp_ast::AstBuilder;

    struct Ids {
        local: NodeId,
        outer_field: NodeId,
        member_name: NodeId,
        back_ref: NodeId,
    }

    /// A state holder whose MoveNext reads its own field `i`, the outer
    /// field `limit`, and `$this.limit`.
    fn state_holder_unit() -> (CompilationUnit, Ids) {
        let mut b = AstBuilder::new();
        let limit = b.field("limit", "int", None);
        let owner = b.class("Counter", vec![limit], vec![], vec![]);

        let local = b.ident("i");
        let outer_field = b.ident("limit");
        let back_ref = b.ident("$this");
        let qualified = b.member(back_ref, "limit");
        let (back_ref_id, member_name) = match &qualified.kind {
            ExprKind::Member { object, member } => (object.id, member.id),
            _ => unreachable!(),
        };
        let ids = Ids {
            local: local.id,
            outer_field: outer_field.id,
            member_name,
            back_ref: back_ref_id,
        };
        let body = vec![
            b.expr_stmt(local),
            b.expr_stmt(outer_field),
            b.expr_stmt(qualified),
        ];
        let move_next = b.method("MoveNext", vec![], body);
        let fields = vec![b.field("i", "int", None), b.field("$this", "Counter", None)];
        let mut holder = b.class("YieldEnumerator$Counter$Items", fields, vec![], vec![move_next]);
        holder.origin = TypeOrigin::StateHolder {
            owner: "Counter".to_string(),
            method: "Items".to_string(),
            is_static: false,
        };
        (b.unit(vec![owner, holder]), ids)
    }

    #[test]
    fn unresolved_name_in_state_holder_redirects() {
        let (unit, ids) = state_holder_unit();
        let model = ScopeModel::build(&unit);
        let index = model.index();
        assert_eq!(classify(index, &model, ids.outer_field), BackRef::RedirectToOuterState);
        assert_eq!(classify(index, &model, ids.local), BackRef::ResolvedLocally);
        assert_eq!(classify(index, &model, ids.back_ref), BackRef::ResolvedLocally);
        assert_eq!(classify(index, &model, ids.member_name), BackRef::NotApplicable);
        assert_eq!(outer_references(index, &model), vec![ids.outer_field]);
    }

    #[test]
    fn ordinary_types_are_never_redirected() {
        let mut b = AstBuilder::new();
        let missing = b.ident("nowhere");
        let id = missing.id;
        let body = vec![b.expr_stmt(missing)];
        let method = b.method("Run", vec![], body);
        let class = b.class("Plain", vec![], vec![], vec![method]);
        let unit = b.unit(vec![class]);

        let model = ScopeModel::build(&unit);
        assert_eq!(classify(model.index(), &model, id), BackRef::NotApplicable);
    }

    #[test]
    fn identifiers_outside_methods_are_not_applicable() {
        let mut b = AstBuilder::new();
        let init = b.ident("seed");
        let id = init.id;
        let field = b.field("value", "int", Some(init));
        let mut holder = b.class("YieldEnumerator$A$B", vec![field], vec![], vec![]);
        holder.origin = TypeOrigin::StateHolder {
            owner: "A".to_string(),
            method: "B".to_string(),
            is_static: false,
        };
        let unit = b.unit(vec![holder]);

        let model = ScopeModel::build(&unit);
        assert_eq!(classify(model.index(), &model, id), BackRef::NotApplicable);
    }

    #[test]
    fn unknown_nodes_are_not_applicable() {
        let (unit, _) = state_holder_unit();
        let model = ScopeModel::build(&unit);
        assert_eq!(classify(model.index(), &model, NodeId::DUMMY), BackRef::NotApplicable);
    }
}
