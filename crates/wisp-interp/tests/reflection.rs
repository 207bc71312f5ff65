// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Reflection over interpreted classes.

use wisp_ast::decl::CompilationUnit;
use wisp_ast::expr::BinOp;
use wisp_ast::AstBuilder;
use wisp_interp::{Interpreter, RuntimeError};
use wisp_rt::{Activator, ErrorKind, Exception, Lazy, Value};

/// ```text
/// class Bag {
///     int size = 3;
///     int spare;
///     Bag() {}
///     Bag(int s) { size = s; spare = size + 1; }
/// }
/// class Plain { string label = "plain"; }
/// class Broken { Broken() { missing = 1; } }
/// class Loud { Loud() { fail(); } }
/// ```
fn unit() -> CompilationUnit {
    let mut b = AstBuilder::new();

    let three = b.int(3);
    let size = b.field("size", "int", Some(three));
    let spare = b.field("spare", "int", None);
    let empty = b.ctor(vec![], vec![]);
    let s = b.ident("s");
    let store = b.assign_to("size", s);
    let size_ref = b.ident("size");
    let one = b.int(1);
    let next = b.binary(BinOp::Add, size_ref, one);
    let store_spare = b.assign_to("spare", next);
    let param = b.param("s", "int");
    let sized = b.ctor(vec![param], vec![store, store_spare]);
    let bag = b.class("Bag", vec![size, spare], vec![empty, sized], vec![]);

    let text = b.string("plain");
    let label = b.field("label", "string", Some(text));
    let plain = b.class("Plain", vec![label], vec![], vec![]);

    let one = b.int(1);
    let store = b.assign_to("missing", one);
    let ctor = b.ctor(vec![], vec![store]);
    let broken = b.class("Broken", vec![], vec![ctor], vec![]);

    let fail = b.ident("fail");
    let call = b.call(fail, vec![]);
    let stmt = b.expr_stmt(call);
    let ctor = b.ctor(vec![], vec![stmt]);
    let loud = b.class("Loud", vec![], vec![ctor], vec![]);

    b.unit(vec![bag, plain, broken, loud])
}

fn field(value: &Value, name: &str) -> Option<Value> {
    value.as_object().and_then(|object| object.get(name))
}

#[test]
fn activator_runs_initializers_and_constructor_body() {
    let interp = Interpreter::new(&unit()).unwrap();
    let bag = interp.registry().get("Bag").unwrap().clone();

    let sized = Activator::create_instance(&bag, &[Value::Int(9)]).unwrap();
    assert_eq!(field(&sized, "size"), Some(Value::Int(9)));
    assert_eq!(field(&sized, "spare"), Some(Value::Int(10)));
    assert!(bag.is_instance_of(&sized));

    let plain = Activator::create_instance(&bag, &[]).unwrap();
    assert_eq!(field(&plain, "size"), Some(Value::Int(3)));
    assert_eq!(field(&plain, "spare"), Some(Value::Int(0)));

    let ctor = bag.constructor(1).unwrap();
    assert_eq!(ctor.parameters()[0].name, "s");
    let direct = ctor.invoke(&[Value::Int(4)]).unwrap();
    assert_eq!(field(&direct, "spare"), Some(Value::Int(5)));
}

#[test]
fn reflection_and_new_build_the_same_instance() {
    let mut interp = Interpreter::new(&unit()).unwrap();
    let bag = interp.registry().get("Bag").unwrap().clone();
    let built = interp.instantiate("Bag", vec![Value::Int(6)]).unwrap();
    let reflected = Activator::create_instance(&bag, &[Value::Int(6)]).unwrap();
    for name in ["size", "spare"] {
        assert_eq!(field(&built, name), field(&reflected, name));
    }
}

#[test]
fn lazy_from_type_uses_the_implicit_constructor() {
    let interp = Interpreter::new(&unit()).unwrap();
    let ty = interp.registry().get("Plain").unwrap().clone();
    assert_eq!(ty.constructors().len(), 1);

    let lazy = Lazy::from_type(ty);
    let value = lazy.value().unwrap();
    assert_eq!(field(&value, "label"), Some(Value::str("plain")));
    assert!(lazy.is_value_created());
}

#[test]
fn constructor_failures_keep_their_kind() {
    let mut interp = Interpreter::new(&unit()).unwrap();
    interp.register_host("fail", |_| Err(Exception::user("loud")));

    let broken = interp.registry().get("Broken").unwrap().clone();
    let err = Activator::create_instance(&broken, &[]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation(msg) if msg.contains("missing")));

    let err = interp.instantiate("Broken", vec![]).unwrap_err();
    assert!(matches!(err, RuntimeError::UndefinedVariable(name) if name == "missing"));

    let err = interp.instantiate("Loud", vec![]).unwrap_err();
    assert!(matches!(&err, RuntimeError::Exception(ex) if *ex.kind() == ErrorKind::User("loud".into())));

    // A parked failure does not leak into the next construction.
    assert!(interp.instantiate("Bag", vec![]).is_ok());
}

#[test]
fn descriptors_outliving_the_interpreter_fail_cleanly() {
    let interp = Interpreter::new(&unit()).unwrap();
    let bag = interp.registry().get("Bag").unwrap().clone();
    drop(interp);

    let err = Activator::create_instance(&bag, &[]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation(_)));
}
