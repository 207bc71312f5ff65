// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Class registration.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use wisp_ast::decl::{CompilationUnit, TypeDecl};
use wisp_rt::reflect::CtorBody;
use wisp_rt::{Exception, ObjectRef, TypeBuilder, TypeRegistry, Value};

use super::{Frame, Interpreter, Runtime, RuntimeError};

impl Runtime {
    /// Describe every class of `unit`. `this` is the handle the constructor
    /// bodies use to get back into the evaluator.
    pub(super) fn register(unit: &CompilationUnit, this: &Weak<Runtime>) -> Runtime {
        let mut registry = TypeRegistry::new();
        let mut classes = HashMap::new();
        for ty in &unit.types {
            let class = Rc::new(ty.clone());
            registry.register(describe(&class, this));
            classes.insert(ty.name.clone(), class);
        }
        tracing::debug!(classes = unit.types.len(), "registered unit");

        // Statics start at their type's default so initializers may read
        // fields declared later in the same class.
        let statics = unit
            .types
            .iter()
            .filter_map(|ty| {
                let defaults: IndexMap<String, Value> = ty
                    .fields
                    .iter()
                    .filter(|f| f.is_static)
                    .map(|f| (f.name.clone(), Value::default_for(&f.ty)))
                    .collect();
                (!defaults.is_empty()).then(|| (ty.name.clone(), defaults))
            })
            .collect();

        Runtime {
            registry,
            classes,
            statics: RefCell::new(statics),
            host: RefCell::new(HashMap::new()),
            parked: RefCell::new(None),
        }
    }
}

impl Interpreter {
    pub(super) fn init_statics(&mut self, unit: &CompilationUnit) -> Result<(), RuntimeError> {
        for ty in &unit.types {
            let class = self.class_decl(&ty.name)?;
            self.with_frame(Frame::new(None, Some(class.clone())), |interp| {
                for field in class.fields.iter().filter(|f| f.is_static) {
                    if let Some(init) = &field.init {
                        let value = interp.eval_expr(init)?;
                        interp.set_static(&class.name, &field.name, value)?;
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Reflection view of a class: instance fields with their zero values and
/// one constructor per declared signature, each running the initializers
/// and body through the evaluator.
fn describe(class: &Rc<TypeDecl>, runtime: &Weak<Runtime>) -> TypeBuilder {
    let mut builder = TypeBuilder::new(&class.name);
    for param in &class.type_params {
        builder = builder.type_param(param);
    }
    for field in class.fields.iter().filter(|f| !f.is_static) {
        builder = builder.field(&field.name, &field.ty, Value::default_for(&field.ty));
    }
    if class.ctors.is_empty() {
        return builder.constructor(&[], Some(ctor_body(class, runtime)));
    }
    for ctor in &class.ctors {
        let params: Vec<(&str, &str)> = ctor
            .params
            .iter()
            .map(|p| (p.name.as_str(), p.ty.as_str()))
            .collect();
        builder = builder.constructor(&params, Some(ctor_body(class, runtime)));
    }
    builder
}

fn ctor_body(class: &Rc<TypeDecl>, runtime: &Weak<Runtime>) -> CtorBody {
    let (class, runtime) = (class.clone(), runtime.clone());
    Rc::new(move |object: &ObjectRef, args: &[Value]| -> wisp_rt::Result<()> {
        let runtime = runtime
            .upgrade()
            .ok_or_else(|| Exception::invalid_operation(format!("`{}` outlived its interpreter", class.name)))?;
        let mut interp = Interpreter {
            runtime: runtime.clone(),
            frame: Frame::new(Some(object.clone()), Some(class.clone())),
        };
        interp
            .initialize(&class, object, args)
            .map_err(|e| runtime.park(e))
    })
}
