use shapeshift_errors::{CapturedError, Object, Symbol, Value, record};

fn main() {
    println!("--- JSON Export Example ---\n");

    let request_id = Symbol::new("requestId");
    let input: Value = record! {
        "name" => "ImportError",
        "message" => "3 rows rejected",
        "file" => "customers.csv",
        &request_id => "req-7f3a",
        "errors" => record! {
            "row_12" => record! { "message" => "invalid email", "value" => "bob@" },
            "row_40" => "duplicate id",
            "row_41" => Value::BigInt(18_446_744_073_709_551_616),
        },
        "ratio" => f64::NAN,
    }
    .into();

    let captured = CapturedError::capture(&input);

    // 1. serde integration: the structured form is what gets serialized
    match serde_json::to_string_pretty(&captured) {
        Ok(json) => println!("{json}\n"),
        Err(err) => println!("serialization failed: {err}\n"),
    }

    // 2. The same error as text
    println!("{:#}\n", captured);

    // 3. A bare array is a multi-error container
    let batch = CapturedError::capture(&Object::array(["a failed", "b failed"]).into());
    println!("{}", batch.to_structured());
}
