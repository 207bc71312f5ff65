// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Dynamic values.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{ErrorKind, Exception, Result};
use crate::reflect::TypeRef;

/// A value as translated code sees it.
///
/// Equality and hashing follow dictionary-key rules: primitives and strings
/// compare by value, objects by identity unless their type opts into value
/// equality, floats bitwise.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Object(ObjectRef),
    /// A type used as a value (`Owner.staticField`, reflection arguments).
    Type(TypeRef),
}

impl Value {
    pub fn str(text: &str) -> Self {
        Value::Str(Rc::from(text))
    }

    /// Zero value for a declared type name.
    pub fn default_for(ty: &str) -> Self {
        match ty {
            "int" | "long" | "short" | "byte" | "uint" | "ulong" => Value::Int(0),
            "double" | "float" | "decimal" => Value::Float(0.0),
            "bool" => Value::Bool(false),
            _ => Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Name of the value's runtime type.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "double".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Object(o) => o.ty().full_name(),
            Value::Type(_) => "Type".to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.key_eq(b),
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Object(o) => o.key_hash(state),
            Value::Type(t) => t.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Object(o) => write!(f, "{}", o.ty().full_name()),
            Value::Type(t) => write!(f, "{}", t.full_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

/// An instance of a reflected type.
pub struct Object {
    ty: TypeRef,
    fields: RefCell<IndexMap<String, Value>>,
}

/// Shared handle to an [`Object`]; clones alias the same instance.
#[derive(Clone)]
pub struct ObjectRef(Rc<Object>);

impl ObjectRef {
    pub fn new(ty: TypeRef, fields: IndexMap<String, Value>) -> Self {
        ObjectRef(Rc::new(Object {
            ty,
            fields: RefCell::new(fields),
        }))
    }

    pub fn ty(&self) -> &TypeRef {
        &self.0.ty
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.fields.borrow().get(field).cloned()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.fields.borrow().contains_key(field)
    }

    /// Assign an existing field.
    pub fn set(&self, field: &str, value: Value) -> Result<()> {
        let mut fields = self.0.fields.borrow_mut();
        match fields.get_mut(field) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Exception::new(ErrorKind::MissingMember {
                ty: self.0.ty.full_name(),
                member: field.to_string(),
            })),
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.0.fields.borrow().keys().cloned().collect()
    }

    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    fn key_eq(&self, other: &ObjectRef) -> bool {
        if ObjectRef::ptr_eq(self, other) {
            return true;
        }
        if self.ty() != other.ty() || !self.ty().has_value_equality() {
            return false;
        }
        *self.0.fields.borrow() == *other.0.fields.borrow()
    }

    fn key_hash<H: Hasher>(&self, state: &mut H) {
        if self.ty().has_value_equality() {
            self.ty().hash(state);
            for value in self.0.fields.borrow().values() {
                value.hash(state);
            }
        } else {
            std::ptr::hash(Rc::as_ptr(&self.0), state);
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Fields may point back at this object; print the type only.
        write!(f, "{}@{:p}", self.ty().full_name(), Rc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{TypeBuilder, TypeRegistry};
    use std::collections::HashSet;

    #[test]
    fn primitives_compare_by_value() {
        assert_eq!(Value::str("one"), Value::from("one"));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        let set: HashSet<Value> = [Value::Int(1), Value::Int(1), Value::Null].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn objects_compare_by_identity_unless_opted_in() {
        let mut registry = TypeRegistry::new();
        let plain = registry.register(TypeBuilder::new("Plain").field("x", "int", Value::Int(1)));
        let a = Value::Object(plain.allocate());
        let b = Value::Object(plain.allocate());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let point = registry.register(
            TypeBuilder::new("Point")
                .field("x", "int", Value::Int(1))
                .value_equality(),
        );
        let p = Value::Object(point.allocate());
        let q = Value::Object(point.allocate());
        assert_eq!(p, q);
        let set: HashSet<Value> = [p, q].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn setting_an_undeclared_field_fails() {
        let mut registry = TypeRegistry::new();
        let ty = registry.register(TypeBuilder::new("Empty"));
        let err = ty.allocate().set("missing", Value::Null).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingMember { .. }));
    }

    #[test]
    fn defaults_by_type_name() {
        assert_eq!(Value::default_for("int"), Value::Int(0));
        assert_eq!(Value::default_for("bool"), Value::Bool(false));
        assert_eq!(Value::default_for("string"), Value::Null);
        assert_eq!(Value::default_for("double"), Value::Float(0.0));
    }
}
