// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! State-holder synthesis.
//!
//! A generator method `Owner.M(params)` is split in two:
//!
//! - a new type `YieldEnumerator$Owner$M` holding the back-reference, the
//!   resume state, the last yielded value, and one field per parameter and
//!   local; its `MoveNext` is the flattened body;
//! - the original method, whose body becomes
//!   `return new YieldEnumerator$Owner$M(this, params...);`.
//!
//! Static generators get no back-reference field and pass no `this`.

use wisp_ast::decl::{CtorDecl, MethodDecl, Param, TypeDecl, TypeOrigin};
use wisp_ast::expr::{Expr, ExprKind};
use wisp_ast::stmt::Stmt;
use wisp_ast::visit::{walk_expr, walk_stmts, VisitMut};
use wisp_ast::AstBuilder;

use crate::flatten::Flattener;
use crate::hoist::rename_conflicting_locals;
use crate::options::LowerOptions;
use crate::protocol::{CURRENT, DISPOSE, FINISHED, GET_ENUMERATOR, MOVE_NEXT, RESET};
use crate::report::{LowerDiagnostic, LoweredMethod};

pub(crate) struct Lowered {
    pub holder: TypeDecl,
    pub report: LoweredMethod,
}

/// Replace `method`'s body and return the state holder that now carries it.
pub(crate) fn lower_generator(
    b: &mut AstBuilder,
    options: &LowerOptions,
    owner: &str,
    method: &mut MethodDecl,
    holder_name: String,
    diagnostics: &mut Vec<LowerDiagnostic>,
) -> Lowered {
    let mut body = std::mem::take(&mut method.body);
    if !method.is_static {
        // Inside the holder, `this` is the holder; the original instance
        // is the back-reference.
        let mut redirect = ThisToBackRef { back_reference: &options.back_reference };
        walk_stmts(&mut redirect, &mut body);
    }
    let renamed = rename_conflicting_locals(&mut body, &method.params);
    if renamed > 0 {
        tracing::trace!(owner, method = %method.name, renamed, "renamed hoisted locals");
    }

    let flat = Flattener::new(b, options, owner, &method.name, diagnostics).run(body);
    let states = flat.states;

    let mut fields = Vec::new();
    if !method.is_static {
        fields.push(b.field(&options.back_reference, owner, None));
    }
    let start = b.int(0);
    fields.push(b.field(&options.state_field, "int", Some(start)));
    let current_ty = method.ret_ty.clone().unwrap_or_else(|| "object".to_string());
    fields.push(b.field(&options.current_field, &current_ty, None));

    let mut captured = Vec::new();
    for param in &method.params {
        fields.push(b.field(&param.name, &param.ty, None));
        captured.push(param.name.clone());
    }
    for (name, ty) in &flat.locals {
        if method.params.iter().any(|p| &p.name == name) {
            continue;
        }
        fields.push(b.field(name, ty, None));
        captured.push(name.clone());
    }

    let ctor = build_ctor(b, options, owner, method);
    let methods = vec![
        b.method(MOVE_NEXT, vec![], flat.move_next),
        current_method(b, options),
        b.method(RESET, vec![], vec![]),
        dispose_method(b, options),
        get_enumerator_method(b),
    ];

    let mut holder = b.class(&holder_name, fields, vec![ctor], methods);
    holder.origin = TypeOrigin::StateHolder {
        owner: owner.to_string(),
        method: method.name.clone(),
        is_static: method.is_static,
    };
    holder.span = method.span;

    method.body = vec![construct_holder(b, &holder_name, method)];

    tracing::debug!(owner, method = %method.name, holder = %holder_name, states, "lowered generator");

    Lowered {
        holder,
        report: LoweredMethod {
            owner: owner.to_string(),
            method: method.name.clone(),
            state_holder: holder_name,
            states,
            captured,
        },
    }
}

/// `ctor($this, p1, ..) { this.$this = $this; this.p1 = p1; .. }`
fn build_ctor(
    b: &mut AstBuilder,
    options: &LowerOptions,
    owner: &str,
    method: &MethodDecl,
) -> CtorDecl {
    let mut params: Vec<Param> = Vec::new();
    if !method.is_static {
        params.push(b.param(&options.back_reference, owner));
    }
    for param in &method.params {
        params.push(b.param(&param.name, &param.ty));
    }

    let body = params
        .iter()
        .map(|param| {
            let this = b.this();
            let target = b.member(this, &param.name);
            let value = b.ident(&param.name);
            b.assign(target, value)
        })
        .collect();
    b.ctor(params, body)
}

fn current_method(b: &mut AstBuilder, options: &LowerOptions) -> MethodDecl {
    let value = b.ident(&options.current_field);
    let body = vec![b.ret(Some(value))];
    b.method(CURRENT, vec![], body)
}

fn dispose_method(b: &mut AstBuilder, options: &LowerOptions) -> MethodDecl {
    let done = b.int(FINISHED);
    let body = vec![b.assign_to(&options.state_field, done)];
    b.method(DISPOSE, vec![], body)
}

fn get_enumerator_method(b: &mut AstBuilder) -> MethodDecl {
    let this = b.this();
    let body = vec![b.ret(Some(this))];
    b.method(GET_ENUMERATOR, vec![], body)
}

/// `return new Holder(this, p1, ..);`
fn construct_holder(b: &mut AstBuilder, holder: &str, method: &MethodDecl) -> Stmt {
    let mut args = Vec::new();
    if !method.is_static {
        args.push(b.this());
    }
    for param in &method.params {
        args.push(b.ident(&param.name));
    }
    let instance = b.new_object(holder, args);
    b.ret(Some(instance))
}

struct ThisToBackRef<'a> {
    back_reference: &'a str,
}

impl VisitMut for ThisToBackRef<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if expr.kind == ExprKind::This {
            expr.kind = ExprKind::Ident(self.back_reference.to_string());
            return;
        }
        walk_expr(self, expr);
    }
}
