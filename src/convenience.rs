//! Result wrappers and the `record!` macro.
//!
//! # Wrappers
//!
//! Each wrapper runs a fallible computation and normalizes whatever it
//! produced on failure:
//!
//! - [`try_catch`] / [`try_catch_with`]: `Err` values and panics
//! - [`try_catch_map`]: like [`try_catch`], then maps the normalized error
//! - [`try_catch_async`]: `Err` values of a future
//! - [`catch_panic`]: panics of an infallible computation
//!
//! Panics are caught with [`std::panic::catch_unwind`]; a string payload
//! becomes the message of an `Error` instance.
//!
//! # Example
//!
//! ```rust
//! use shapeshift_errors::{record, try_catch};
//!
//! let result: Result<u32, _> = try_catch(|| {
//!     Err(record! { "name" => "QuotaError", "limit" => 10 })
//! });
//!
//! let err = result.unwrap_err();
//! assert_eq!(err.name(), "QuotaError");
//! assert!(err.metadata().contains("limit"));
//! ```

use crate::models::NormalizedError;
use crate::normalize::{normalize, normalize_with};
use crate::options::Options;
use crate::value::{ErrorClass, Object, Value};
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

/// Build a plain record [`Object`](crate::Object) from `key => value` pairs.
///
/// Keys are anything convertible to a property key, values anything
/// convertible to a [`Value`](crate::Value).
///
/// ```rust
/// use shapeshift_errors::record;
///
/// let input = record! {
///     "message" => "timed out",
///     "retry" => true,
/// };
/// assert!(input.has_own_str("retry"));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Object::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let object = $crate::Object::new();
        $( object.set($key, $value); )+
        object
    }};
}

/// Run `f`, normalizing an `Err` or a panic with the default options.
pub fn try_catch<T, E, F>(f: F) -> Result<T, NormalizedError>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<Value>,
{
    try_catch_with(f, Options::global())
}

/// Run `f`, normalizing an `Err` or a panic with explicit options.
pub fn try_catch_with<T, E, F>(f: F, options: &Options) -> Result<T, NormalizedError>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<Value>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(thrown)) => Err(normalize_with(&thrown.into(), options)),
        Err(payload) => Err(normalize_with(&panic_value(payload), options)),
    }
}

/// [`try_catch`], then post-process the normalized error.
pub fn try_catch_map<T, E, F, X, M>(f: F, map: M) -> Result<T, X>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<Value>,
    M: FnOnce(NormalizedError) -> X,
{
    try_catch(f).map_err(map)
}

/// Await `future`, normalizing an `Err` with the default options.
///
/// The thrown value is converted only after the future completes, so the
/// returned future is `Send` whenever `Fut` and `E` are.
pub async fn try_catch_async<T, E, Fut>(future: Fut) -> Result<T, NormalizedError>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<Value>,
{
    future.await.map_err(|thrown| normalize(&thrown.into()))
}

/// Run an infallible computation, normalizing a panic.
pub fn catch_panic<T, F>(f: F) -> Result<T, NormalizedError>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| normalize(&panic_value(payload)))
}

fn panic_value(payload: Box<dyn Any + Send>) -> Value {
    let message = match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => return Value::Undefined,
        },
    };
    Object::error(ErrorClass::Error, message).into()
}
