// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression evaluation and assignment.

use wisp_ast::expr::{Expr, ExprKind};
use wisp_rt::Value;

use super::{Interpreter, RuntimeError};

impl Interpreter {
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::String(s) => Ok(Value::str(s)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::This => match &self.frame.this {
                Some(this) => Ok(Value::Object(this.clone())),
                None => Err(RuntimeError::TypeError("`this` in a static context".to_string())),
            },
            ExprKind::Ident(name) => self.lookup(name),
            ExprKind::Member { object, member } => {
                let receiver = self.eval_expr(object)?;
                self.read_member(&receiver, &member.text)
            }
            ExprKind::Call { callee, args } => match &callee.kind {
                ExprKind::Member { object, member } => {
                    let receiver = self.eval_expr(object)?;
                    let args = self.eval_args(args)?;
                    self.dispatch(&receiver, &member.text, args)
                }
                ExprKind::Ident(name) => {
                    let args = self.eval_args(args)?;
                    self.call_unqualified(name, args)
                }
                _ => Err(RuntimeError::TypeError("expression is not callable".to_string())),
            },
            ExprKind::New { ty, args } => {
                let args = self.eval_args(args)?;
                self.construct(ty, args)
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                self.eval_unary(*op, value)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    /// Locals, then fields of `this`, then statics of the executing class,
    /// then type names.
    fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.frame.env.get(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.frame.this.as_ref().and_then(|this| this.get(name)) {
            return Ok(value);
        }
        if let Some(value) = self.frame.class.as_ref().and_then(|c| self.get_static(&c.name, name)) {
            return Ok(value);
        }
        if let Some(ty) = self.runtime.registry.get(name) {
            return Ok(Value::Type(ty.clone()));
        }
        Err(RuntimeError::UndefinedVariable(name.to_string()))
    }

    fn read_member(&self, receiver: &Value, member: &str) -> Result<Value, RuntimeError> {
        let found = match receiver {
            Value::Object(object) => object
                .get(member)
                .or_else(|| self.get_static(object.ty().name(), member)),
            Value::Type(ty) => self.get_static(ty.name(), member),
            _ => None,
        };
        found.ok_or_else(|| RuntimeError::NoSuchField {
            ty: receiver.type_name(),
            field: member.to_string(),
        })
    }

    pub(super) fn assign_target(&mut self, target: &Expr, value: Value) -> Result<(), RuntimeError> {
        match &target.kind {
            ExprKind::Ident(name) => {
                if self.frame.env.assign(name, value.clone()) {
                    return Ok(());
                }
                if let Some(this) = self.frame.this.as_ref().filter(|this| this.has_field(name)) {
                    this.set(name, value)?;
                    return Ok(());
                }
                match self.frame.class.clone() {
                    Some(class) if self.get_static(&class.name, name).is_some() => {
                        self.set_static(&class.name, name, value)
                    }
                    _ => Err(RuntimeError::UndefinedVariable(name.clone())),
                }
            }
            ExprKind::Member { object, member } => {
                let receiver = self.eval_expr(object)?;
                self.write_member(&receiver, &member.text, value)
            }
            _ => Err(RuntimeError::TypeError("invalid assignment target".to_string())),
        }
    }

    fn write_member(&mut self, receiver: &Value, member: &str, value: Value) -> Result<(), RuntimeError> {
        match receiver {
            Value::Object(object) if object.has_field(member) => Ok(object.set(member, value)?),
            Value::Object(object) => {
                let ty = object.ty().name().to_string();
                self.set_static(&ty, member, value)
            }
            Value::Type(ty) => {
                let ty = ty.name().to_string();
                self.set_static(&ty, member, value)
            }
            other => Err(RuntimeError::NoSuchField {
                ty: other.type_name(),
                field: member.to_string(),
            }),
        }
    }
}
