// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Deferred, once-initialized values.
//!
//! A `Lazy` runs its factory on the first read. The outcome, success or
//! failure, is cached: a faulted cell re-raises the very exception its
//! factory raised, on every read. A factory that reads its own cell fails
//! with `RecursiveInitialization` instead of recursing.

use std::cell::RefCell;
use std::fmt;

use crate::error::{ErrorKind, Exception, Result};
use crate::reflect::{Activator, TypeRef};
use crate::value::Value;

type Factory<T> = Box<dyn FnOnce() -> Result<T>>;

enum LazyState<T> {
    Pending(Factory<T>),
    /// The factory is on the stack.
    Running,
    Completed(T),
    Faulted(Exception),
}

pub struct Lazy<T> {
    state: RefCell<LazyState<T>>,
}

impl<T: 'static> Lazy<T> {
    pub fn new(factory: impl FnOnce() -> Result<T> + 'static) -> Self {
        Self {
            state: RefCell::new(LazyState::Pending(Box::new(factory))),
        }
    }

    /// No factory: the value is `T::default()`.
    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::new(|| Ok(T::default()))
    }

    /// Already initialized.
    pub fn from_value(value: T) -> Self {
        Self {
            state: RefCell::new(LazyState::Completed(value)),
        }
    }
}

impl Lazy<Value> {
    /// Default-construct an instance of `ty` through reflection on first read.
    pub fn from_type(ty: TypeRef) -> Self {
        Self::new(move || Activator::create_instance(&ty, &[]))
    }
}

impl<T> Lazy<T> {
    pub fn is_value_created(&self) -> bool {
        matches!(*self.state.borrow(), LazyState::Completed(_))
    }

    pub fn is_value_faulted(&self) -> bool {
        matches!(*self.state.borrow(), LazyState::Faulted(_))
    }

    pub fn value(&self) -> Result<T>
    where
        T: Clone,
    {
        let factory = {
            let mut state = self.state.borrow_mut();
            match std::mem::replace(&mut *state, LazyState::Running) {
                LazyState::Pending(factory) => factory,
                LazyState::Completed(value) => {
                    let out = value.clone();
                    *state = LazyState::Completed(value);
                    return Ok(out);
                }
                LazyState::Faulted(error) => {
                    *state = LazyState::Faulted(error.clone());
                    return Err(error);
                }
                LazyState::Running => {
                    return Err(Exception::new(ErrorKind::RecursiveInitialization));
                }
            }
        };

        // The borrow is released so a reentrant read can observe `Running`.
        let outcome = factory();
        let mut state = self.state.borrow_mut();
        match outcome {
            Ok(value) => {
                *state = LazyState::Completed(value.clone());
                Ok(value)
            }
            Err(error) => {
                tracing::trace!(%error, "lazy factory faulted");
                *state = LazyState::Faulted(error.clone());
                Err(error)
            }
        }
    }
}

/// Never forces the value.
impl<T: fmt::Display> fmt::Display for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            LazyState::Completed(value) => write!(f, "{value}"),
            _ => write!(f, "Value is not created."),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Lazy");
        match &*self.state.borrow() {
            LazyState::Pending(_) => d.field("state", &"pending"),
            LazyState::Running => d.field("state", &"running"),
            LazyState::Completed(value) => d.field("value", value),
            LazyState::Faulted(error) => d.field("error", error),
        };
        d.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{TypeBuilder, TypeRegistry};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn factory_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let lazy = Lazy::new(move || {
            counter.set(counter.get() + 1);
            Ok(42)
        });
        assert!(!lazy.is_value_created());
        assert_eq!(lazy.value().unwrap(), 42);
        assert_eq!(lazy.value().unwrap(), 42);
        assert!(lazy.is_value_created());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fault_is_cached_and_rethrown_as_the_same_exception() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let lazy: Lazy<i32> = Lazy::new(move || {
            counter.set(counter.get() + 1);
            Err(Exception::user("factory failed"))
        });
        let first = lazy.value().unwrap_err();
        let second = lazy.value().unwrap_err();
        assert!(Exception::ptr_eq(&first, &second));
        assert!(!lazy.is_value_created());
        assert!(lazy.is_value_faulted());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn reentrant_read_is_detected() {
        let cell: Rc<RefCell<Option<Rc<Lazy<i32>>>>> = Rc::new(RefCell::new(None));
        let handle = cell.clone();
        let lazy = Rc::new(Lazy::new(move || {
            let me = handle.borrow().clone();
            match me {
                Some(me) => me.value().map(|v| v + 1),
                None => Ok(0),
            }
        }));
        *cell.borrow_mut() = Some(lazy.clone());

        let err = lazy.value().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::RecursiveInitialization);
        // The factory propagated the error, so the cell is faulted with it.
        let again = lazy.value().unwrap_err();
        assert!(Exception::ptr_eq(&err, &again));
        *cell.borrow_mut() = None;
    }

    #[test]
    fn display_does_not_force() {
        let lazy = Lazy::new(|| Ok(5));
        assert_eq!(lazy.to_string(), "Value is not created.");
        assert!(!lazy.is_value_created());
        lazy.value().unwrap();
        assert_eq!(lazy.to_string(), "5");
    }

    #[test]
    fn default_and_reflective_construction() {
        let lazy: Lazy<String> = Lazy::with_default();
        assert_eq!(lazy.value().unwrap(), "");

        let mut registry = TypeRegistry::new();
        let ty = registry.register(TypeBuilder::new("Config").field("retries", "int", Value::Int(3)));
        let lazy = Lazy::from_type(ty.clone());
        let value = lazy.value().unwrap();
        assert!(ty.is_instance_of(&value));
        // Same instance on every read.
        assert_eq!(lazy.value().unwrap(), value);
    }
}
