// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Generator body flattening.
//!
//! Splits a generator body at its yield points into numbered blocks and
//! wraps them in a dispatch loop:
//!
//! ```text
//! loop {
//!     switch ($state) {
//!         case 0: ...
//!         case 1: ...
//!         default: return false;
//!     }
//! }
//! ```
//!
//! Every block ends by jumping (`$state = n; continue;`), suspending
//! (`$current = v; $state = n; return true;`) or finishing
//! (`$state = -1; return false;`). Statements that contain no yield are
//! kept whole, with `let` turned into an assignment to a state-holder
//! field so the value survives suspension.

use wisp_ast::stmt::{Stmt, StmtKind, SwitchCase};
use wisp_ast::AstBuilder;

use crate::options::LowerOptions;
use crate::protocol::{CURRENT, FINISHED, GET_ENUMERATOR, MOVE_NEXT};
use crate::report::LowerDiagnostic;

/// Output of flattening one body.
pub(crate) struct Flattened {
    /// The `MoveNext` body: a single dispatch loop.
    pub move_next: Vec<Stmt>,
    /// Locals and temporaries that became fields, with their declared types.
    pub locals: Vec<(String, String)>,
    pub states: usize,
}

#[derive(Debug, Clone, Copy)]
struct LoopTargets {
    head: usize,
    exit: usize,
}

pub(crate) struct Flattener<'a> {
    b: &'a mut AstBuilder,
    options: &'a LowerOptions,
    owner: &'a str,
    method: &'a str,
    diagnostics: &'a mut Vec<LowerDiagnostic>,
    /// Block bodies, indexed by state number.
    blocks: Vec<Vec<Stmt>>,
    current: usize,
    loops: Vec<LoopTargets>,
    locals: Vec<(String, String)>,
    temps: u32,
}

impl<'a> Flattener<'a> {
    pub fn new(
        b: &'a mut AstBuilder,
        options: &'a LowerOptions,
        owner: &'a str,
        method: &'a str,
        diagnostics: &'a mut Vec<LowerDiagnostic>,
    ) -> Self {
        Self {
            b,
            options,
            owner,
            method,
            diagnostics,
            blocks: vec![Vec::new()],
            current: 0,
            loops: Vec::new(),
            locals: Vec::new(),
            temps: 0,
        }
    }

    pub fn run(mut self, body: Vec<Stmt>) -> Flattened {
        self.lower_stmts(body);
        let finish = self.finish_stmts();
        self.emit_all(finish);

        let states = self.blocks.len();
        let dispatch = self.dispatch();
        Flattened {
            move_next: vec![dispatch],
            locals: self.locals,
            states,
        }
    }

    // ── Blocks ──────────────────────────────────────────────────────

    fn new_block(&mut self) -> usize {
        self.blocks.push(Vec::new());
        self.blocks.len() - 1
    }

    fn emit(&mut self, stmt: Stmt) {
        self.blocks[self.current].push(stmt);
    }

    fn emit_all(&mut self, stmts: Vec<Stmt>) {
        self.blocks[self.current].extend(stmts);
    }

    fn set_state(&mut self, state: i64) -> Stmt {
        let value = self.b.int(state);
        self.b.assign_to(&self.options.state_field, value)
    }

    /// `$state = target; continue;`
    fn jump_stmts(&mut self, target: usize) -> Vec<Stmt> {
        vec![self.set_state(target as i64), self.b.continue_()]
    }

    fn jump(&mut self, target: usize) {
        let stmts = self.jump_stmts(target);
        self.emit_all(stmts);
    }

    /// `$state = -1; return false;`
    fn finish_stmts(&mut self) -> Vec<Stmt> {
        let done = self.b.bool(false);
        vec![self.set_state(FINISHED), self.b.ret(Some(done))]
    }

    fn dispatch(&mut self) -> Stmt {
        let blocks = std::mem::take(&mut self.blocks);
        let cases = blocks
            .into_iter()
            .enumerate()
            .map(|(state, body)| (state as i64, body))
            .collect();
        let scrutinee = self.b.ident(&self.options.state_field);
        let done = self.b.bool(false);
        let default = vec![self.b.ret(Some(done))];
        let switch = self.b.switch(scrutinee, cases, default);
        self.b.loop_(vec![switch])
    }

    fn record_local(&mut self, name: &str, ty: &str) {
        if !self.locals.iter().any(|(n, _)| n == name) {
            self.locals.push((name.to_string(), ty.to_string()));
        }
    }

    fn fresh_temp(&mut self, prefix: &str) -> String {
        let name = format!("${prefix}{}", self.temps);
        self.temps += 1;
        name
    }

    // ── Yield-carrying statements ───────────────────────────────────

    fn lower_stmts(&mut self, stmts: Vec<Stmt>) {
        for stmt in stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: Stmt) {
        if !stmt.contains_yield() {
            let mut out = Vec::new();
            self.localize(stmt, 0, &mut out);
            self.emit_all(out);
            return;
        }

        let Stmt { id, kind, span } = stmt;
        match kind {
            StmtKind::YieldReturn(value) => {
                let next = self.new_block();
                let store = self.b.assign_to(&self.options.current_field, value);
                let resume = self.set_state(next as i64);
                let suspended = self.b.bool(true);
                let ret = self.b.ret(Some(suspended));
                self.emit_all(vec![store, resume, ret]);
                self.current = next;
            }
            StmtKind::YieldBreak => {
                let finish = self.finish_stmts();
                self.emit_all(finish);
                // Anything after `yield break` is unreachable but still gets a home.
                self.current = self.new_block();
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                let then_block = self.new_block();
                let else_block = if else_branch.is_empty() {
                    None
                } else {
                    Some(self.new_block())
                };
                let join = self.new_block();

                let to_then = self.jump_stmts(then_block);
                let to_else = self.jump_stmts(else_block.unwrap_or(join));
                let branch = self.b.if_(cond, to_then, to_else);
                self.emit(branch);

                self.current = then_block;
                self.lower_stmts(then_branch);
                self.jump(join);

                if let Some(else_block) = else_block {
                    self.current = else_block;
                    self.lower_stmts(else_branch);
                    self.jump(join);
                }
                self.current = join;
            }
            StmtKind::While { cond, body } => {
                let head = self.new_block();
                let body_block = self.new_block();
                let exit = self.new_block();
                self.jump(head);

                self.current = head;
                let enter = self.jump_stmts(body_block);
                let leave = self.jump_stmts(exit);
                let test = self.b.if_(cond, enter, leave);
                self.emit(test);

                self.current = body_block;
                self.lower_loop_body(LoopTargets { head, exit }, body);
                self.current = exit;
            }
            StmtKind::Loop { body } => {
                let head = self.new_block();
                let exit = self.new_block();
                self.jump(head);

                self.current = head;
                self.lower_loop_body(LoopTargets { head, exit }, body);
                self.current = exit;
            }
            StmtKind::ForEach { binding, iter, body } => {
                self.lower_for_each(binding, iter, body);
            }
            StmtKind::Block(body) => self.lower_stmts(body),
            StmtKind::Switch { scrutinee, cases, default } => {
                self.lower_switch(scrutinee, cases, default);
            }
            other => {
                let mut out = Vec::new();
                self.localize(Stmt { id, kind: other, span }, 0, &mut out);
                self.emit_all(out);
            }
        }
    }

    fn lower_loop_body(&mut self, targets: LoopTargets, body: Vec<Stmt>) {
        self.loops.push(targets);
        self.lower_stmts(body);
        self.loops.pop();
        self.jump(targets.head);
    }

    /// `foreach (x in e) body` becomes a temporary enumerator driven by
    /// `MoveNext`/`Current`, both kept in fields.
    fn lower_for_each(&mut self, binding: String, iter: wisp_ast::expr::Expr, body: Vec<Stmt>) {
        let enumerator = self.fresh_temp("enum");
        self.record_local(&enumerator, "IEnumerator");
        self.record_local(&binding, "object");

        let get = self.b.method_call(iter, GET_ENUMERATOR, vec![]);
        let init = self.b.assign_to(&enumerator, get);
        self.emit(init);

        let head = self.new_block();
        let body_block = self.new_block();
        let exit = self.new_block();
        self.jump(head);

        self.current = head;
        let target = self.b.ident(&enumerator);
        let advance = self.b.method_call(target, MOVE_NEXT, vec![]);
        let enter = self.jump_stmts(body_block);
        let leave = self.jump_stmts(exit);
        let test = self.b.if_(advance, enter, leave);
        self.emit(test);

        self.current = body_block;
        let target = self.b.ident(&enumerator);
        let current = self.b.method_call(target, CURRENT, vec![]);
        let bind = self.b.assign_to(&binding, current);
        self.emit(bind);
        self.lower_loop_body(LoopTargets { head, exit }, body);
        self.current = exit;
    }

    fn lower_switch(
        &mut self,
        scrutinee: wisp_ast::expr::Expr,
        cases: Vec<SwitchCase>,
        default: Vec<Stmt>,
    ) {
        let join = self.new_block();
        let mut arms = Vec::with_capacity(cases.len());
        let mut bodies = Vec::with_capacity(cases.len() + 1);
        for case in cases {
            let block = self.new_block();
            arms.push((case.value, self.jump_stmts(block)));
            bodies.push((block, case.body));
        }
        let default_target = if default.is_empty() {
            join
        } else {
            let block = self.new_block();
            bodies.push((block, default));
            block
        };
        let otherwise = self.jump_stmts(default_target);
        let switch = self.b.switch(scrutinee, arms, otherwise);
        self.emit(switch);

        for (block, body) in bodies {
            self.current = block;
            self.lower_stmts(body);
            self.jump(join);
        }
        self.current = join;
    }

    // ── Yield-free statements ───────────────────────────────────────

    fn localize_list(&mut self, stmts: Vec<Stmt>, native_loops: usize) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            self.localize(stmt, native_loops, &mut out);
        }
        out
    }

    /// Rewrite a statement that stays whole.
    ///
    /// `native_loops` counts loops kept as real loops between this statement
    /// and the dispatch loop; `break`/`continue` at depth zero belong to a
    /// flattened loop and become state jumps.
    fn localize(&mut self, stmt: Stmt, native_loops: usize, out: &mut Vec<Stmt>) {
        let Stmt { id, kind, span } = stmt;
        match kind {
            StmtKind::Let { name, ty, init } => {
                self.record_local(&name, ty.as_deref().unwrap_or("object"));
                if let Some(value) = init {
                    let target = self.b.ident(&name);
                    out.push(Stmt { id, kind: StmtKind::Assign { target, value }, span });
                }
            }
            StmtKind::Return(value) => {
                if value.is_some() {
                    self.diagnostics.push(LowerDiagnostic::ReturnValueInGenerator {
                        owner: self.owner.to_string(),
                        method: self.method.to_string(),
                    });
                }
                out.extend(self.finish_stmts());
            }
            StmtKind::Break if native_loops == 0 => match self.loops.last().copied() {
                Some(targets) => out.extend(self.jump_stmts(targets.exit)),
                None => {
                    self.stray("break");
                    out.push(Stmt { id, kind: StmtKind::Break, span });
                }
            },
            StmtKind::Continue if native_loops == 0 => match self.loops.last().copied() {
                Some(targets) => out.extend(self.jump_stmts(targets.head)),
                None => {
                    self.stray("continue");
                    out.push(Stmt { id, kind: StmtKind::Continue, span });
                }
            },
            StmtKind::If { cond, then_branch, else_branch } => {
                let then_branch = self.localize_list(then_branch, native_loops);
                let else_branch = self.localize_list(else_branch, native_loops);
                out.push(Stmt { id, kind: StmtKind::If { cond, then_branch, else_branch }, span });
            }
            StmtKind::While { cond, body } => {
                let body = self.localize_list(body, native_loops + 1);
                out.push(Stmt { id, kind: StmtKind::While { cond, body }, span });
            }
            StmtKind::Loop { body } => {
                let body = self.localize_list(body, native_loops + 1);
                out.push(Stmt { id, kind: StmtKind::Loop { body }, span });
            }
            StmtKind::ForEach { binding, iter, body } => {
                // The binding stays a block-scoped local of the native loop.
                let body = self.localize_list(body, native_loops + 1);
                out.push(Stmt { id, kind: StmtKind::ForEach { binding, iter, body }, span });
            }
            StmtKind::Block(body) => {
                let body = self.localize_list(body, native_loops);
                out.push(Stmt { id, kind: StmtKind::Block(body), span });
            }
            StmtKind::Switch { scrutinee, cases, default } => {
                let cases = cases
                    .into_iter()
                    .map(|case| SwitchCase {
                        value: case.value,
                        body: self.localize_list(case.body, native_loops),
                    })
                    .collect();
                let default = self.localize_list(default, native_loops);
                out.push(Stmt { id, kind: StmtKind::Switch { scrutinee, cases, default }, span });
            }
            other => out.push(Stmt { id, kind: other, span }),
        }
    }

    fn stray(&mut self, keyword: &str) {
        self.diagnostics.push(LowerDiagnostic::StrayJump {
            owner: self.owner.to_string(),
            method: self.method.to_string(),
            keyword: keyword.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_ast::expr::ExprKind;

    fn flatten(b: &mut AstBuilder, body: Vec<Stmt>) -> (Flattened, Vec<LowerDiagnostic>) {
        let options = LowerOptions::default();
        let mut diagnostics = Vec::new();
        let flat = Flattener::new(b, &options, "Owner", "Items", &mut diagnostics).run(body);
        (flat, diagnostics)
    }

    fn cases(flat: &Flattened) -> &[SwitchCase] {
        let StmtKind::Loop { body } = &flat.move_next[0].kind else {
            panic!("expected dispatch loop");
        };
        let StmtKind::Switch { cases, .. } = &body[0].kind else {
            panic!("expected state switch");
        };
        cases
    }

    #[test]
    fn straight_line_yields_get_one_state_each() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let body = vec![b.yield_return(one), b.yield_return(two)];
        let (flat, diags) = flatten(&mut b, body);

        assert_eq!(flat.states, 3);
        assert!(diags.is_empty());
        let cases = cases(&flat);
        assert_eq!(cases.len(), 3);
        // Each suspending block ends in `return true`.
        let last = cases[0].body.last().map(|s| &s.kind);
        assert!(matches!(
            last,
            Some(StmtKind::Return(Some(e))) if e.kind == ExprKind::Bool(true)
        ));
        // The final block finishes.
        let last = cases[2].body.last().map(|s| &s.kind);
        assert!(matches!(
            last,
            Some(StmtKind::Return(Some(e))) if e.kind == ExprKind::Bool(false)
        ));
    }

    #[test]
    fn locals_become_fields_and_lets_become_assignments() {
        let mut b = AstBuilder::new();
        let zero = b.int(0);
        let decl = b.stmt(StmtKind::Let {
            name: "n".to_string(),
            ty: Some("int".to_string()),
            init: Some(zero),
        });
        let n = b.ident("n");
        let body = vec![decl, b.yield_return(n)];
        let (flat, _) = flatten(&mut b, body);

        assert_eq!(flat.locals, vec![("n".to_string(), "int".to_string())]);
        let first = &cases(&flat)[0].body[0];
        assert!(matches!(&first.kind, StmtKind::Assign { target, .. } if target.as_ident() == Some("n")));
    }

    #[test]
    fn foreach_with_yield_uses_an_enumerator_field() {
        let mut b = AstBuilder::new();
        let source = b.ident("source");
        let x = b.ident("x");
        let inner = vec![b.yield_return(x)];
        let body = vec![b.for_each("x", source, inner)];
        let (flat, _) = flatten(&mut b, body);

        let names: Vec<_> = flat.locals.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["$enum0", "x"]);
    }

    #[test]
    fn break_outside_any_loop_is_reported() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let body = vec![b.yield_return(one), b.break_()];
        let (_, diags) = flatten(&mut b, body);
        assert_eq!(
            diags,
            vec![LowerDiagnostic::StrayJump {
                owner: "Owner".to_string(),
                method: "Items".to_string(),
                keyword: "break".to_string(),
            }]
        );
    }

    #[test]
    fn return_with_value_is_reported() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let body = vec![b.yield_return(one), b.ret(Some(two))];
        let (_, diags) = flatten(&mut b, body);
        assert!(matches!(diags.as_slice(), [LowerDiagnostic::ReturnValueInGenerator { .. }]));
    }
}
