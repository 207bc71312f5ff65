// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Construction and method dispatch.

use std::rc::Rc;

use wisp_ast::decl::{MethodDecl, TypeDecl};
use wisp_rt::{ObjectRef, Value};

use super::{Frame, Interpreter, RuntimeError};

fn find_method<'c>(class: &'c TypeDecl, name: &str, arity: usize) -> Option<&'c MethodDecl> {
    class
        .methods
        .iter()
        .find(|m| m.name == name && m.params.len() == arity)
}

/// Wrong arity if the name exists at all, otherwise an unknown method.
fn missing_method(class: &TypeDecl, name: &str, got: usize) -> RuntimeError {
    match class.method(name) {
        Some(m) => RuntimeError::ArityMismatch { expected: m.params.len(), got },
        None => RuntimeError::NoSuchMethod {
            ty: class.name.clone(),
            method: name.to_string(),
        },
    }
}

impl Interpreter {
    /// `new ty(args)` through the reflection descriptor, whose constructor
    /// calls back into [`Interpreter::initialize`].
    pub(super) fn construct(&mut self, ty: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.class_decl(ty)?;
        let descriptor = self.runtime.registry.lookup(ty)?.clone();
        let Some(ctor) = descriptor.constructor(args.len()) else {
            let expected = descriptor.constructors().first().map_or(0, |c| c.arity());
            return Err(RuntimeError::ArityMismatch { expected, got: args.len() });
        };
        *self.runtime.parked.borrow_mut() = None;
        let instance = ctor
            .invoke(&args)
            .map_err(|ex| self.runtime.parked.take().unwrap_or(RuntimeError::Exception(ex)))?;
        tracing::trace!(ty, "constructed instance");
        Ok(instance)
    }

    /// Run field initializers in declaration order, then the constructor
    /// matching the argument count, against a freshly allocated `object`.
    pub(super) fn initialize(
        &mut self,
        class: &TypeDecl,
        object: &ObjectRef,
        args: &[Value],
    ) -> Result<(), RuntimeError> {
        for field in class.fields.iter().filter(|f| !f.is_static) {
            if let Some(init) = &field.init {
                let value = self.eval_expr(init)?;
                object.set(&field.name, value)?;
            }
        }
        if let Some(ctor) = class.ctors.iter().find(|c| c.params.len() == args.len()) {
            for (param, arg) in ctor.params.iter().zip(args) {
                self.frame.env.define(param.name.clone(), arg.clone());
            }
            match self.exec_stmts(&ctor.body) {
                Ok(()) | Err(RuntimeError::Return(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub(super) fn dispatch(
        &mut self,
        receiver: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        match receiver {
            Value::Object(object) => {
                let class = self.class_decl(object.ty().name())?;
                let Some(decl) = find_method(&class, method, args.len()) else {
                    return Err(missing_method(&class, method, args.len()));
                };
                let this = if decl.is_static { None } else { Some(object.clone()) };
                self.invoke(&class, decl, this, args)
            }
            Value::Type(ty) => {
                let class = self.class_decl(ty.name())?;
                self.invoke_static(&class, method, args)
            }
            other => Err(RuntimeError::NoSuchMethod {
                ty: other.type_name(),
                method: method.to_string(),
            }),
        }
    }

    pub(super) fn invoke_static(
        &mut self,
        class: &Rc<TypeDecl>,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let Some(decl) = find_method(class, method, args.len()) else {
            return Err(missing_method(class, method, args.len()));
        };
        if !decl.is_static {
            return Err(RuntimeError::TypeError(format!(
                "`{}.{method}` is an instance method",
                class.name
            )));
        }
        self.invoke(class, decl, None, args)
    }

    /// A call by bare name: a method of the executing class, else a host
    /// function.
    pub(super) fn call_unqualified(&mut self, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        if let Some(class) = self.frame.class.clone() {
            if let Some(decl) = find_method(&class, name, args.len()) {
                let this = if decl.is_static {
                    None
                } else {
                    let this = self.frame.this.clone().ok_or_else(|| {
                        RuntimeError::TypeError(format!("instance method `{name}` called from a static context"))
                    })?;
                    Some(this)
                };
                return self.invoke(&class, decl, this, args);
            }
        }
        let host = self.runtime.host.borrow().get(name).cloned();
        if let Some(host) = host {
            return Ok(host(&args)?);
        }
        Err(RuntimeError::UndefinedFunction(name.to_string()))
    }

    fn invoke(
        &mut self,
        class: &Rc<TypeDecl>,
        decl: &MethodDecl,
        this: Option<ObjectRef>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        if decl.params.len() != args.len() {
            return Err(RuntimeError::ArityMismatch {
                expected: decl.params.len(),
                got: args.len(),
            });
        }
        let mut frame = Frame::new(this, Some(class.clone()));
        for (param, arg) in decl.params.iter().zip(args) {
            frame.env.define(param.name.clone(), arg);
        }
        match self.with_frame(frame, |interp| interp.exec_stmts(&decl.body)) {
            Ok(()) => Ok(Value::Null),
            Err(RuntimeError::Return(value)) => Ok(value),
            Err(RuntimeError::Break | RuntimeError::Continue) => Err(RuntimeError::TypeError(format!(
                "`break` or `continue` escaped `{}.{}`",
                class.name, decl.name
            ))),
            Err(e) => Err(e),
        }
    }

    pub(super) fn get_static(&self, ty: &str, field: &str) -> Option<Value> {
        self.runtime
            .statics
            .borrow()
            .get(ty)
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    pub(super) fn set_static(&mut self, ty: &str, field: &str, value: Value) -> Result<(), RuntimeError> {
        let mut statics = self.runtime.statics.borrow_mut();
        let Some(slot) = statics.get_mut(ty).and_then(|fields| fields.get_mut(field)) else {
            return Err(RuntimeError::NoSuchField {
                ty: ty.to_string(),
                field: field.to_string(),
            });
        };
        *slot = value;
        Ok(())
    }
}
