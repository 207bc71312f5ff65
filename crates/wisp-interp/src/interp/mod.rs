// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The interpreter implementation.
//!
//! A tree-walk evaluator over the class-based syntax tree. Classes are
//! registered as reflection descriptors, instances are `wisp-rt` objects and
//! `foreach` drives the enumerator protocol the lowering pass emits.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

mod call;
mod eval_expr;
mod exec_stmt;
mod operators;
mod register;

use indexmap::IndexMap;
use wisp_ast::decl::{CompilationUnit, TypeDecl};
use wisp_lower::protocol::{CURRENT, GET_ENUMERATOR, MOVE_NEXT};
use wisp_lower::{lower_unit, LowerOptions, LowerReport};
use wisp_rt::{Exception, ObjectRef, TypeRegistry, Value};

use crate::env::Environment;

/// A function provided by the embedder, callable by unqualified name.
pub type HostFn = Rc<dyn Fn(&[Value]) -> wisp_rt::Result<Value>>;

/// One activation: locals plus the receiver and class being executed.
struct Frame {
    env: Environment,
    this: Option<ObjectRef>,
    class: Option<Rc<TypeDecl>>,
}

impl Frame {
    fn new(this: Option<ObjectRef>, class: Option<Rc<TypeDecl>>) -> Self {
        Self { env: Environment::new(), this, class }
    }
}

/// State shared by the interpreter and the constructor bodies it hands to
/// the reflection descriptors. Descriptors hold it weakly.
struct Runtime {
    /// Reflection descriptors for every registered class.
    registry: TypeRegistry,
    /// Class declarations by name.
    classes: HashMap<String, Rc<TypeDecl>>,
    /// Static field storage per class.
    statics: RefCell<HashMap<String, IndexMap<String, Value>>>,
    /// Embedder-provided functions.
    host: RefCell<HashMap<String, HostFn>>,
    /// An evaluator error raised inside a constructor body, kept while it
    /// crosses the reflection layer as an [`Exception`].
    parked: RefCell<Option<RuntimeError>>,
}

impl Runtime {
    /// Hand `error` to the reflection layer. Anything but an exception is
    /// parked so `construct` can surface it unchanged.
    fn park(&self, error: RuntimeError) -> Exception {
        match error {
            RuntimeError::Exception(ex) => ex,
            other => {
                let ex = Exception::invalid_operation(other.to_string());
                *self.parked.borrow_mut() = Some(other);
                ex
            }
        }
    }
}

/// The tree-walk interpreter.
pub struct Interpreter {
    runtime: Rc<Runtime>,
    /// The executing frame. Callers' frames are parked on the Rust stack.
    frame: Frame,
}

impl Interpreter {
    /// Register every class of `unit` and run static initializers.
    ///
    /// Constructors of the registered descriptors run the class's field
    /// initializers and constructor body, so [`wisp_rt::Activator`] and
    /// [`wisp_rt::Lazy::from_type`] build the same instances as `new` does,
    /// for as long as this interpreter is alive.
    ///
    /// Generator methods are accepted but fail with
    /// [`RuntimeError::UnloweredYield`] when executed.
    pub fn new(unit: &CompilationUnit) -> Result<Self, RuntimeError> {
        let runtime = Rc::new_cyclic(|weak| Runtime::register(unit, weak));
        let mut interp = Self { runtime, frame: Frame::new(None, None) };
        interp.init_statics(unit)?;
        Ok(interp)
    }

    /// Lower the unit's generators, then load it.
    pub fn load_lowered(
        mut unit: CompilationUnit,
        options: &LowerOptions,
    ) -> Result<(Self, LowerReport), RuntimeError> {
        let report = lower_unit(&mut unit, options);
        let interp = Self::new(&unit)?;
        Ok((interp, report))
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.runtime.registry
    }

    pub fn register_host(&mut self, name: &str, f: impl Fn(&[Value]) -> wisp_rt::Result<Value> + 'static) {
        self.runtime.host.borrow_mut().insert(name.to_string(), Rc::new(f));
    }

    pub fn static_field(&self, ty: &str, field: &str) -> Option<Value> {
        self.get_static(ty, field)
    }

    /// `new ty(args)`.
    pub fn instantiate(&mut self, ty: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.construct(ty, args)
    }

    /// Call an instance method, or a static method through an instance or a
    /// type value.
    pub fn call_method(
        &mut self,
        receiver: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        self.dispatch(receiver, method, args)
    }

    pub fn call_static(&mut self, ty: &str, method: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let class = self.class_decl(ty)?;
        self.invoke_static(&class, method, args)
    }

    /// Drain an enumerable through `GetEnumerator`/`MoveNext`/`Current`.
    pub fn enumerate(&mut self, source: &Value) -> Result<Vec<Value>, RuntimeError> {
        let enumerator = self.call_method(source, GET_ENUMERATOR, Vec::new())?;
        let mut items = Vec::new();
        while self.move_next(&enumerator)? {
            items.push(self.call_method(&enumerator, CURRENT, Vec::new())?);
        }
        Ok(items)
    }

    pub(crate) fn move_next(&mut self, enumerator: &Value) -> Result<bool, RuntimeError> {
        match self.call_method(enumerator, MOVE_NEXT, Vec::new())? {
            Value::Bool(more) => Ok(more),
            other => Err(RuntimeError::TypeError(format!(
                "{MOVE_NEXT} must return bool, got {}",
                other.type_name()
            ))),
        }
    }

    fn class_decl(&self, name: &str) -> Result<Rc<TypeDecl>, RuntimeError> {
        self.runtime
            .classes
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownType(name.to_string()))
    }

    /// Run `body` in `frame`, restoring the caller's frame afterwards.
    fn with_frame<T>(
        &mut self,
        frame: Frame,
        body: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        let caller = std::mem::replace(&mut self.frame, frame);
        let result = body(self);
        self.frame = caller;
        result
    }
}

/// A runtime error.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    #[error("undefined function `{0}`")]
    UndefinedFunction(String),

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("{0}")]
    TypeError(String),

    #[error("division by zero; check divisor before dividing")]
    DivisionByZero,

    #[error("expected {expected} argument{}, got {got}", if *.expected == 1 { "" } else { "s" })]
    ArityMismatch { expected: usize, got: usize },

    #[error("no method `{method}` on type `{ty}`")]
    NoSuchMethod { ty: String, method: String },

    #[error("no field `{field}` on type `{ty}`")]
    NoSuchField { ty: String, field: String },

    #[error("`yield` reached the evaluator; lower generators before running them")]
    UnloweredYield,

    #[error(transparent)]
    Exception(#[from] Exception),

    // Control flow (not actual errors)
    #[error("return")]
    Return(Value),

    #[error("break")]
    Break,

    #[error("continue")]
    Continue,
}
