use shapeshift_errors::{ErrorClass, Object, Options, Value, normalize_with};

fn main() {
    println!("--- Hostile Input Example ---\n");
    let options = Options::default();

    // 1. A record that references itself through cause and metadata
    let looped = Object::new().with("message", "I am my own cause");
    looped.set("cause", &looped);
    looped.set("self", &looped);
    println!("{}\n", normalize_with(&looped.clone().into(), &options).to_text_with(&options));
    looped.delete("cause");
    looped.delete("self");

    // 2. Getters that throw, and keys that try to hijack type identity
    let hostile = Object::new();
    hostile.define_getter("message", || Err(Value::from("nice try")));
    hostile.define_getter("secret", || Err(Object::error(ErrorClass::TypeError, "denied").into()));
    hostile.set("__proto__", Object::new().with("isAdmin", true));
    hostile.set("constructor", "Evil");
    hostile.set("code", "E_HOSTILE");
    println!("{}\n", normalize_with(&hostile.into(), &options).to_text_with(&options));

    // 3. A getter that signals resource exhaustion takes over the result
    let exhausted = Object::new().with("message", "outer");
    exhausted.define_getter("detail", || {
        Err(Object::error(ErrorClass::RangeError, "Maximum call stack size exceeded").into())
    });
    println!("{}\n", normalize_with(&exhausted.into(), &options));

    // 4. Very deep nesting stops at the ceiling
    let mut deep = Object::new().with("message", "bottom");
    for level in 0..1_000 {
        deep = Object::new().with("message", format!("level {level}")).with("cause", deep);
    }
    let shallow = Options::builder().max_depth(3).build().unwrap_or_default();
    println!("{}", normalize_with(&deep.into(), &shallow).to_text_with(&shallow));
}
