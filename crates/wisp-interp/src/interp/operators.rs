// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Binary and unary operators on primitive values.

use std::cmp::Ordering;

use wisp_ast::expr::{BinOp, Expr, UnaryOp};
use wisp_rt::Value;

use super::{Interpreter, RuntimeError};

impl Interpreter {
    pub(super) fn eval_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<Value, RuntimeError> {
        // Short-circuit before evaluating the right side.
        if matches!(op, BinOp::And | BinOp::Or) {
            let lhs = expect_bool(self.eval_expr(left)?, op)?;
            if (op == BinOp::And) != lhs {
                return Ok(Value::Bool(lhs));
            }
            return Ok(Value::Bool(expect_bool(self.eval_expr(right)?, op)?));
        }
        let lhs = self.eval_expr(left)?;
        let rhs = self.eval_expr(right)?;
        binary(op, lhs, rhs)
    }

    pub(super) fn eval_unary(&mut self, op: UnaryOp, value: Value) -> Result<Value, RuntimeError> {
        match (op, value) {
            (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
            (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (op, value) => Err(RuntimeError::TypeError(format!(
                "cannot apply {op:?} to {}",
                value.type_name()
            ))),
        }
    }
}

fn expect_bool(value: Value, op: BinOp) -> Result<bool, RuntimeError> {
    value.as_bool().ok_or_else(|| {
        RuntimeError::TypeError(format!("{op:?} expects bool operands, got {}", value.type_name()))
    })
}

fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match op {
        BinOp::Eq => return Ok(Value::Bool(loose_eq(&lhs, &rhs))),
        BinOp::Ne => return Ok(Value::Bool(!loose_eq(&lhs, &rhs))),
        BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            let ordering = compare(&lhs, &rhs).ok_or_else(|| mismatch(op, &lhs, &rhs))?;
            let holds = match op {
                BinOp::Lt => ordering == Ordering::Less,
                BinOp::Gt => ordering == Ordering::Greater,
                BinOp::Le => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            return Ok(Value::Bool(holds));
        }
        _ => {}
    }

    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => int_arith(op, *a, *b),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Ok(Value::Float(float_arith(op, as_f64(&lhs), as_f64(&rhs)).ok_or_else(|| mismatch(op, &lhs, &rhs))?))
        }
        (Value::Str(_), _) | (_, Value::Str(_)) if op == BinOp::Add => Ok(Value::str(&format!("{lhs}{rhs}"))),
        _ => Err(mismatch(op, &lhs, &rhs)),
    }
}

fn int_arith(op: BinOp, a: i64, b: i64) -> Result<Value, RuntimeError> {
    let n = match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Div | BinOp::Mod if b == 0 => return Err(RuntimeError::DivisionByZero),
        BinOp::Div => a.wrapping_div(b),
        BinOp::Mod => a.wrapping_rem(b),
        _ => return Err(mismatch(op, &Value::Int(a), &Value::Int(b))),
    };
    Ok(Value::Int(n))
}

fn float_arith(op: BinOp, a: f64, b: f64) -> Option<f64> {
    match op {
        BinOp::Add => Some(a + b),
        BinOp::Sub => Some(a - b),
        BinOp::Mul => Some(a * b),
        BinOp::Div => Some(a / b),
        BinOp::Mod => Some(a % b),
        _ => None,
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

/// Numbers compare across int and double; everything else uses value
/// equality.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => as_f64(lhs) == as_f64(rhs),
        (Value::Float(a), Value::Float(b)) => a == b,
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            as_f64(lhs).partial_cmp(&as_f64(rhs))
        }
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn mismatch(op: BinOp, lhs: &Value, rhs: &Value) -> RuntimeError {
    RuntimeError::TypeError(format!(
        "cannot apply {op:?} to {} and {}",
        lhs.type_name(),
        rhs.type_name()
    ))
}
