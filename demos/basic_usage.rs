use shapeshift_errors::{ErrorClass, Object, Options, Value, normalize, record, try_catch};

fn charge_card(amount: u32) -> Result<u32, Object> {
    // Simulate an upstream failure that wraps a lower-level one
    if amount > 500 {
        return Err(record! {
            "name" => "PaymentError",
            "message" => "card declined",
            "amount" => amount,
            "cause" => Object::error(ErrorClass::Error, "issuer timeout"),
        });
    }
    Ok(amount)
}

fn main() {
    println!("--- Basic Usage Example ---\n");

    // 1. Anything can be normalized: primitives, records, native errors
    for value in [Value::from("disk full"), Value::from(404), Value::Null] {
        println!("{}", normalize(&value));
    }

    // 2. Wrap a fallible call and get a normalized error back
    match try_catch(|| charge_card(900)) {
        Ok(charged) => println!("charged {charged}"),
        Err(err) => {
            println!("\n[TEXT]\n{}", err.to_text());
            println!("\n[HEADER] {err}");
            println!("[CONSTRUCTION] {:?}", err.construction());
        }
    }

    // 3. Tighter depth ceilings cut the tree, never fail
    let shallow = Options::builder().max_depth(1).build().unwrap_or_default();
    match try_catch(|| charge_card(900)) {
        Ok(_) => {}
        Err(err) => println!("\n[SHALLOW]\n{}", err.to_text_with(&shallow)),
    }
}
