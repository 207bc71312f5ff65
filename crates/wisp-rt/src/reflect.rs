// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Reflection metadata.
//!
//! A `TypeRegistry` owns one descriptor per type. Constructed generic types
//! are interned per (definition, arguments) pair, so `Box<int>` is always
//! the same identity and never equal to `Box<string>`.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::error::{ErrorKind, Exception, Result};
use crate::value::{ObjectRef, Value};

/// Identity of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Runs a constructor's initialization on a freshly allocated instance.
pub type CtorBody = Rc<dyn Fn(&ObjectRef, &[Value]) -> Result<()>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: String,
    pub default: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: String,
    pub ty: String,
    pub position: usize,
}

/// One declared constructor of a type.
#[derive(Clone)]
pub struct ConstructorInfo {
    owner: Weak<TypeDescriptor>,
    params: Vec<ParameterInfo>,
    body: Option<CtorBody>,
}

impl ConstructorInfo {
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn declaring_type(&self) -> Option<TypeRef> {
        self.owner.upgrade().map(TypeRef)
    }

    /// Allocate an instance with field defaults, then run this constructor.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        let ty = self
            .declaring_type()
            .ok_or_else(|| Exception::invalid_operation("constructor outlived its type"))?;
        if args.len() != self.params.len() {
            return Err(Exception::argument_mismatch(format!(
                "`{}` constructor takes {} argument(s), got {}",
                ty.full_name(),
                self.params.len(),
                args.len()
            )));
        }
        let instance = ty.allocate();
        if let Some(body) = &self.body {
            body(&instance, args)?;
        }
        Ok(Value::Object(instance))
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("params", &self.params)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

pub struct TypeDescriptor {
    id: TypeId,
    name: String,
    type_params: Vec<String>,
    definition: Option<TypeRef>,
    type_args: Vec<TypeRef>,
    fields: Vec<FieldInfo>,
    ctors: Vec<ConstructorInfo>,
    value_equality: bool,
}

/// Shared handle to a type descriptor. Compares by `TypeId`.
#[derive(Clone)]
pub struct TypeRef(Rc<TypeDescriptor>);

impl TypeRef {
    pub fn id(&self) -> TypeId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name with type arguments: `Pair<int, string>`.
    pub fn full_name(&self) -> String {
        if self.0.type_args.is_empty() {
            return self.0.name.clone();
        }
        let args: Vec<String> = self.0.type_args.iter().map(TypeRef::full_name).collect();
        format!("{}<{}>", self.0.name, args.join(", "))
    }

    pub fn type_params(&self) -> &[String] {
        &self.0.type_params
    }

    pub fn is_generic_definition(&self) -> bool {
        !self.0.type_params.is_empty() && self.0.definition.is_none()
    }

    /// The open definition a constructed generic type came from.
    pub fn generic_definition(&self) -> Option<&TypeRef> {
        self.0.definition.as_ref()
    }

    pub fn type_args(&self) -> &[TypeRef] {
        &self.0.type_args
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.0.fields
    }

    /// Declared constructors, in declaration order. A type that declares
    /// none reports a single parameterless one.
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.0.ctors
    }

    pub fn constructor(&self, arity: usize) -> Option<&ConstructorInfo> {
        self.0.ctors.iter().find(|c| c.arity() == arity)
    }

    pub fn has_value_equality(&self) -> bool {
        self.0.value_equality
    }

    /// A new instance with every field at its declared default.
    pub fn allocate(&self) -> ObjectRef {
        let fields: IndexMap<String, Value> = self
            .0
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect();
        ObjectRef::new(self.clone(), fields)
    }

    pub fn is_instance_of(&self, value: &Value) -> bool {
        match value {
            Value::Object(o) => o.ty() == self,
            Value::Null => false,
            other => other.type_name() == self.0.name,
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.full_name(), self.0.id.0)
    }
}

/// Describes a type before registration.
pub struct TypeBuilder {
    name: String,
    type_params: Vec<String>,
    fields: Vec<FieldInfo>,
    ctors: Vec<(Vec<ParameterInfo>, Option<CtorBody>)>,
    value_equality: bool,
}

impl TypeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_params: Vec::new(),
            fields: Vec::new(),
            ctors: Vec::new(),
            value_equality: false,
        }
    }

    pub fn type_param(mut self, name: &str) -> Self {
        self.type_params.push(name.to_string());
        self
    }

    pub fn field(mut self, name: &str, ty: &str, default: Value) -> Self {
        self.fields.push(FieldInfo {
            name: name.to_string(),
            ty: ty.to_string(),
            default,
        });
        self
    }

    /// Declare a constructor. `params` are `(name, type)` pairs in order;
    /// `body` runs after allocation, or not at all when `None`.
    pub fn constructor(mut self, params: &[(&str, &str)], body: Option<CtorBody>) -> Self {
        let params = params
            .iter()
            .enumerate()
            .map(|(position, (name, ty))| ParameterInfo {
                name: name.to_string(),
                ty: ty.to_string(),
                position,
            })
            .collect();
        self.ctors.push((params, body));
        self
    }

    /// Instances compare and hash by field values instead of identity.
    pub fn value_equality(mut self) -> Self {
        self.value_equality = true;
        self
    }
}

/// Every type known to the runtime.
pub struct TypeRegistry {
    types: IndexMap<String, TypeRef>,
    constructed: HashMap<(TypeId, Vec<TypeId>), TypeRef>,
    next_id: u32,
}

impl TypeRegistry {
    /// A registry with the primitive types already present.
    pub fn new() -> Self {
        let mut registry = Self {
            types: IndexMap::new(),
            constructed: HashMap::new(),
            next_id: 0,
        };
        for name in ["object", "bool", "int", "double", "string"] {
            registry.register(TypeBuilder::new(name));
        }
        registry
    }

    /// Register a type, replacing any earlier one of the same name.
    pub fn register(&mut self, builder: TypeBuilder) -> TypeRef {
        let ty = self.build(builder, None, Vec::new());
        self.types.insert(ty.name().to_string(), ty.clone());
        ty
    }

    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.types.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<&TypeRef> {
        self.get(name).ok_or_else(|| {
            Exception::new(ErrorKind::MissingMember {
                ty: "TypeRegistry".to_string(),
                member: name.to_string(),
            })
        })
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeRef> {
        self.types.values()
    }

    /// The constructed type `definition<args>`; the same arguments always
    /// give back the same type.
    pub fn instantiate(&mut self, definition: &TypeRef, args: &[TypeRef]) -> Result<TypeRef> {
        if !definition.is_generic_definition() {
            return Err(Exception::invalid_operation(format!(
                "`{}` is not a generic type definition",
                definition.full_name()
            )));
        }
        if args.len() != definition.type_params().len() {
            return Err(Exception::argument_mismatch(format!(
                "`{}` takes {} type argument(s), got {}",
                definition.name(),
                definition.type_params().len(),
                args.len()
            )));
        }

        let key = (definition.id(), args.iter().map(TypeRef::id).collect::<Vec<_>>());
        if let Some(existing) = self.constructed.get(&key) {
            return Ok(existing.clone());
        }

        let substitute = |ty: &str| -> String {
            definition
                .type_params()
                .iter()
                .position(|p| p == ty)
                .map(|i| args[i].full_name())
                .unwrap_or_else(|| ty.to_string())
        };
        let mut builder = TypeBuilder::new(definition.name());
        for field in definition.fields() {
            let ty = substitute(&field.ty);
            let default = if ty == field.ty {
                field.default.clone()
            } else {
                Value::default_for(&ty)
            };
            builder = builder.field(&field.name, &ty, default);
        }
        for ctor in definition.constructors() {
            let params: Vec<(String, String)> = ctor
                .parameters()
                .iter()
                .map(|p| (p.name.clone(), substitute(&p.ty)))
                .collect();
            let params: Vec<(&str, &str)> =
                params.iter().map(|(n, t)| (n.as_str(), t.as_str())).collect();
            builder = builder.constructor(&params, ctor.body.clone());
        }
        if definition.has_value_equality() {
            builder = builder.value_equality();
        }

        let constructed = self.build(builder, Some(definition.clone()), args.to_vec());
        tracing::trace!(ty = %constructed.full_name(), id = constructed.id().0, "constructed generic type");
        self.constructed.insert(key, constructed.clone());
        Ok(constructed)
    }

    fn build(
        &mut self,
        builder: TypeBuilder,
        definition: Option<TypeRef>,
        type_args: Vec<TypeRef>,
    ) -> TypeRef {
        let id = TypeId(self.next_id);
        self.next_id += 1;

        let TypeBuilder { name, type_params, fields, mut ctors, value_equality } = builder;
        if ctors.is_empty() {
            ctors.push((Vec::new(), None));
        }
        let descriptor = Rc::new_cyclic(|owner| TypeDescriptor {
            id,
            name,
            type_params,
            definition,
            type_args,
            fields,
            ctors: ctors
                .into_iter()
                .map(|(params, body)| ConstructorInfo {
                    owner: owner.clone(),
                    params,
                    body,
                })
                .collect(),
            value_equality,
        });
        TypeRef(descriptor)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Reflective construction.
pub struct Activator;

impl Activator {
    /// Run the constructor whose arity matches `args`.
    pub fn create_instance(ty: &TypeRef, args: &[Value]) -> Result<Value> {
        match ty.constructor(args.len()) {
            Some(ctor) => ctor.invoke(args),
            None => Err(Exception::argument_mismatch(format!(
                "no constructor of `{}` takes {} argument(s)",
                ty.full_name(),
                args.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(registry: &mut TypeRegistry) -> TypeRef {
        let body: CtorBody = Rc::new(|this: &ObjectRef, args: &[Value]| this.set("count", args[0].clone()));
        registry.register(
            TypeBuilder::new("Counter")
                .field("count", "int", Value::Int(0))
                .field("label", "string", Value::str("counter"))
                .constructor(&[], None)
                .constructor(&[("start", "int")], Some(body)),
        )
    }

    #[test]
    fn parameterless_constructor_keeps_defaults() {
        let mut registry = TypeRegistry::new();
        let ty = counter(&mut registry);
        let ctor = &ty.constructors()[0];
        assert!(ctor.parameters().is_empty());
        let value = ctor.invoke(&[]).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("count"), Some(Value::Int(0)));
        assert_eq!(obj.get("label"), Some(Value::str("counter")));
    }

    #[test]
    fn constructor_parameters_are_ordered_and_named() {
        let mut registry = TypeRegistry::new();
        let ty = counter(&mut registry);
        let params = ty.constructors()[1].parameters();
        assert_eq!(
            params,
            &[ParameterInfo { name: "start".to_string(), ty: "int".to_string(), position: 0 }]
        );
        let value = Activator::create_instance(&ty, &[Value::Int(5)]).unwrap();
        assert_eq!(value.as_object().unwrap().get("count"), Some(Value::Int(5)));
    }

    #[test]
    fn argument_count_mismatch_fails() {
        let mut registry = TypeRegistry::new();
        let ty = counter(&mut registry);
        let err = ty.constructors()[1].invoke(&[]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ArgumentMismatch(_)));
        let err = Activator::create_instance(&ty, &[Value::Null, Value::Null]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ArgumentMismatch(_)));
    }

    #[test]
    fn type_without_constructors_gets_a_default_one() {
        let mut registry = TypeRegistry::new();
        let ty = registry.register(TypeBuilder::new("Bag").field("size", "int", Value::Int(3)));
        assert_eq!(ty.constructors().len(), 1);
        assert_eq!(ty.constructors()[0].arity(), 0);
        let bag = Activator::create_instance(&ty, &[]).unwrap();
        assert_eq!(bag.as_object().unwrap().get("size"), Some(Value::Int(3)));
        assert!(ty.is_instance_of(&bag));
    }

    #[test]
    fn generic_instantiations_have_distinct_identities() {
        let mut registry = TypeRegistry::new();
        let def = registry.register(
            TypeBuilder::new("Box").type_param("T").field("item", "T", Value::Null),
        );
        let int = registry.lookup("int").unwrap().clone();
        let string = registry.lookup("string").unwrap().clone();

        let box_int = registry.instantiate(&def, &[int.clone()]).unwrap();
        let again = registry.instantiate(&def, &[int]).unwrap();
        let box_string = registry.instantiate(&def, &[string]).unwrap();

        assert_eq!(box_int, again);
        assert_ne!(box_int, box_string);
        assert_ne!(box_int, def);
        assert_eq!(box_int.full_name(), "Box<int>");
        assert_eq!(box_int.generic_definition(), Some(&def));
        assert_eq!(box_int.fields()[0].default, Value::Int(0));
        assert_eq!(box_string.fields()[0].default, Value::Null);

        let instance = Activator::create_instance(&box_int, &[]).unwrap();
        assert!(box_int.is_instance_of(&instance));
        assert!(!box_string.is_instance_of(&instance));
    }

    #[test]
    fn instantiate_checks_arity() {
        let mut registry = TypeRegistry::new();
        let def = registry.register(TypeBuilder::new("Pair").type_param("A").type_param("B"));
        let int = registry.lookup("int").unwrap().clone();
        assert!(registry.instantiate(&def, &[int.clone()]).is_err());
        assert!(registry.instantiate(&int, &[]).is_err());
        let pair = registry.instantiate(&def, &[int.clone(), int]).unwrap();
        assert_eq!(pair.full_name(), "Pair<int, int>");
    }

    #[test]
    fn primitives_are_instances_of_their_types() {
        let registry = TypeRegistry::new();
        assert!(registry.lookup("int").unwrap().is_instance_of(&Value::Int(3)));
        assert!(!registry.lookup("string").unwrap().is_instance_of(&Value::Null));
        assert!(registry.lookup("missing").is_err());
    }
}
