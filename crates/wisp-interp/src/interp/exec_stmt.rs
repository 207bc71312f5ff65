// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement execution.

use wisp_ast::expr::Expr;
use wisp_ast::stmt::{Stmt, StmtKind};
use wisp_lower::protocol::{CURRENT, GET_ENUMERATOR};
use wisp_rt::Value;

use super::{Interpreter, RuntimeError};

/// What a loop does after its body ran.
enum Flow {
    Next,
    Exit,
}

/// Absorb the loop-targeting control signals.
fn loop_flow(result: Result<(), RuntimeError>) -> Result<Flow, RuntimeError> {
    match result {
        Ok(()) | Err(RuntimeError::Continue) => Ok(Flow::Next),
        Err(RuntimeError::Break) => Ok(Flow::Exit),
        Err(e) => Err(e),
    }
}

impl Interpreter {
    pub(super) fn exec_stmts(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    /// Run `stmts` in a fresh block scope.
    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        self.frame.env.push_scope();
        let result = self.exec_stmts(stmts);
        self.frame.env.pop_scope();
        result
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }

            StmtKind::Let { name, ty, init } => {
                let value = match init {
                    Some(init) => self.eval_expr(init)?,
                    None => Value::default_for(ty.as_deref().unwrap_or("object")),
                };
                self.frame.env.define(name.clone(), value);
                Ok(())
            }

            StmtKind::Assign { target, value } => {
                let value = self.eval_expr(value)?;
                self.assign_target(target, value)
            }

            StmtKind::If { cond, then_branch, else_branch } => {
                if self.eval_cond(cond)? {
                    self.exec_block(then_branch)
                } else {
                    self.exec_block(else_branch)
                }
            }

            StmtKind::While { cond, body } => {
                while self.eval_cond(cond)? {
                    if let Flow::Exit = loop_flow(self.exec_block(body))? {
                        break;
                    }
                }
                Ok(())
            }

            StmtKind::Loop { body } => loop {
                if let Flow::Exit = loop_flow(self.exec_block(body))? {
                    return Ok(());
                }
            },

            StmtKind::ForEach { binding, iter, body } => {
                let source = self.eval_expr(iter)?;
                let enumerator = self.dispatch(&source, GET_ENUMERATOR, Vec::new())?;
                while self.move_next(&enumerator)? {
                    let item = self.dispatch(&enumerator, CURRENT, Vec::new())?;
                    self.frame.env.push_scope();
                    self.frame.env.define(binding.clone(), item);
                    let result = self.exec_stmts(body);
                    self.frame.env.pop_scope();
                    if let Flow::Exit = loop_flow(result)? {
                        break;
                    }
                }
                Ok(())
            }

            StmtKind::Block(body) => self.exec_block(body),

            // `break` inside a case leaves the enclosing loop, not the switch.
            StmtKind::Switch { scrutinee, cases, default } => {
                let value = self.eval_expr(scrutinee)?;
                let Some(key) = value.as_int() else {
                    return Err(RuntimeError::TypeError(format!(
                        "switch expects an int, got {}",
                        value.type_name()
                    )));
                };
                match cases.iter().find(|case| case.value == key) {
                    Some(case) => self.exec_block(&case.body),
                    None => self.exec_block(default),
                }
            }

            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                Err(RuntimeError::Return(value))
            }

            StmtKind::Break => Err(RuntimeError::Break),
            StmtKind::Continue => Err(RuntimeError::Continue),

            StmtKind::YieldReturn(_) | StmtKind::YieldBreak => Err(RuntimeError::UnloweredYield),
        }
    }

    fn eval_cond(&mut self, cond: &Expr) -> Result<bool, RuntimeError> {
        let value = self.eval_expr(cond)?;
        value.as_bool().ok_or_else(|| {
            RuntimeError::TypeError(format!("condition must be bool, got {}", value.type_name()))
        })
    }
}
