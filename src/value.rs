//! Dynamic value model for thrown values.
//!
//! Anything a caller might "throw" is expressed as a [`Value`]: primitives,
//! opaque identity keys ([`Symbol`]), callables ([`Function`]) and shared,
//! interior-mutable reference values ([`Object`]). Objects carry ordered own
//! properties which are either plain data or accessors that may fail, so the
//! model can express everything the engine has to survive:
//!
//! - Self-referential graphs (`a.cause = a`)
//! - Hidden (non-enumerable) fields
//! - Getters that throw on access
//! - Native exception instances with an inherited class name
//!
//! # Reference Cycles
//!
//! `Object` is reference counted. A graph that references itself is not
//! reclaimed until one of its edges is removed with [`Object::delete`].

use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

// ============================================================================
// Native Error Classes
// ============================================================================

/// Class of a native exception instance.
///
/// Native instances without an own `name` property report their class name,
/// the same way a runtime resolves `name` through the prototype chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
    EvalError,
    UriError,
    AggregateError,
    /// User-defined subclass, identified by its constructor name.
    Custom(Arc<str>),
}

impl ErrorClass {
    /// All built-in classes, in registration order.
    pub const NATIVE: [ErrorClass; 8] = [
        ErrorClass::Error,
        ErrorClass::TypeError,
        ErrorClass::RangeError,
        ErrorClass::ReferenceError,
        ErrorClass::SyntaxError,
        ErrorClass::EvalError,
        ErrorClass::UriError,
        ErrorClass::AggregateError,
    ];

    /// Create a user-defined class.
    #[inline]
    pub fn custom(name: impl Into<Arc<str>>) -> Self {
        Self::Custom(name.into())
    }

    /// Constructor name of this class.
    pub fn name(&self) -> &str {
        match self {
            Self::Error => "Error",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
            Self::ReferenceError => "ReferenceError",
            Self::SyntaxError => "SyntaxError",
            Self::EvalError => "EvalError",
            Self::UriError => "URIError",
            Self::AggregateError => "AggregateError",
            Self::Custom(name) => name,
        }
    }

    /// Look up a built-in class by constructor name.
    pub fn native(name: &str) -> Option<Self> {
        Self::NATIVE.into_iter().find(|class| class.name() == name)
    }

    /// Whether an instance of this class signals that the runtime itself is
    /// in trouble (stack exhaustion, broken references) rather than a single
    /// faulty value.
    #[inline]
    pub const fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Self::RangeError | Self::ReferenceError)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Opaque Identity Keys
// ============================================================================

struct SymbolInner {
    description: Option<Box<str>>,
}

/// Opaque identity key.
///
/// Two symbols are equal only if they are the same symbol, regardless of
/// description. Symbols are `Send + Sync` so they can survive into
/// normalized output.
#[derive(Clone)]
pub struct Symbol(Arc<SymbolInner>);

impl Symbol {
    /// Create a new symbol with a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self(Arc::new(SymbolInner {
            description: Some(description.into().into_boxed_str()),
        }))
    }

    /// Create a new symbol without a description.
    pub fn anonymous() -> Self {
        Self(Arc::new(SymbolInner { description: None }))
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ============================================================================
// Callables
// ============================================================================

struct FunctionInner {
    name: Box<str>,
}

/// Callable value. Only its name and identity are modeled.
#[derive(Clone)]
pub struct Function(Rc<FunctionInner>);

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(FunctionInner {
            name: name.into().into_boxed_str(),
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name().is_empty() {
            f.write_str("[Function (anonymous)]")
        } else {
            write!(f, "[Function: {}]", self.name())
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ============================================================================
// Property Keys
// ============================================================================

/// Own-property key: text or an opaque identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(Arc<str>),
    Symbol(Symbol),
}

impl PropertyKey {
    /// Text of a string key, `None` for symbols.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Symbol(_) => None,
        }
    }

    #[inline]
    pub const fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }

    /// Key with any symbol converted to its textual form.
    pub fn to_text_key(&self) -> PropertyKey {
        match self {
            Self::String(_) => self.clone(),
            Self::Symbol(symbol) => Self::String(symbol.to_string().into()),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Symbol(symbol) => fmt::Display::fmt(symbol, f),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for PropertyKey {
    fn from(value: String) -> Self {
        Self::String(value.into())
    }
}

impl From<Symbol> for PropertyKey {
    fn from(value: Symbol) -> Self {
        Self::Symbol(value)
    }
}

impl From<&Symbol> for PropertyKey {
    fn from(value: &Symbol) -> Self {
        Self::Symbol(value.clone())
    }
}

// ============================================================================
// Objects
// ============================================================================

/// Accessor invoked on property read. `Err` carries the thrown value.
pub type Getter = Rc<dyn Fn() -> Result<Value, Value>>;

#[derive(Clone)]
enum Slot {
    Data(Value),
    Accessor(Getter),
}

#[derive(Clone)]
struct Property {
    slot: Slot,
    enumerable: bool,
}

/// Structural kind of an object.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Ordinary,
    Array(Vec<Value>),
    /// Native exception instance.
    Error(ErrorClass),
}

struct ObjectData {
    kind: ObjectKind,
    properties: SmallVec<[(PropertyKey, Property); 8]>,
}

impl ObjectData {
    fn position(&self, key: &PropertyKey) -> Option<usize> {
        self.properties.iter().position(|(k, _)| k == key)
    }

    fn define(&mut self, key: PropertyKey, property: Property) {
        match self.position(&key) {
            Some(idx) => self.properties[idx].1 = property,
            None => self.properties.push((key, property)),
        }
    }
}

/// Shared reference value with identity.
///
/// Cloning an `Object` clones the handle, not the contents; mutation through
/// any handle is visible through all of them.
#[derive(Clone)]
pub struct Object(Rc<RefCell<ObjectData>>);

impl Object {
    fn with_kind(kind: ObjectKind) -> Self {
        Self(Rc::new(RefCell::new(ObjectData {
            kind,
            properties: SmallVec::new(),
        })))
    }

    /// Create an empty plain record.
    pub fn new() -> Self {
        Self::with_kind(ObjectKind::Ordinary)
    }

    /// Create an array from its elements.
    pub fn array<I, V>(elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::with_kind(ObjectKind::Array(
            elements.into_iter().map(Into::into).collect(),
        ))
    }

    /// Create a native exception instance.
    ///
    /// The message is stored as a hidden own property, matching how runtimes
    /// define it on error instances.
    pub fn error(class: ErrorClass, message: impl Into<String>) -> Self {
        let object = Self::with_kind(ObjectKind::Error(class));
        object.set_hidden("message", message.into());
        object
    }

    /// Builder form of [`Object::set`].
    #[inline]
    pub fn with(self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Define or overwrite an enumerable data property.
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        self.0.borrow_mut().define(
            key.into(),
            Property {
                slot: Slot::Data(value.into()),
                enumerable: true,
            },
        );
    }

    /// Define or overwrite a non-enumerable data property.
    pub fn set_hidden(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        self.0.borrow_mut().define(
            key.into(),
            Property {
                slot: Slot::Data(value.into()),
                enumerable: false,
            },
        );
    }

    /// Define an enumerable accessor property.
    pub fn define_getter<F>(&self, key: impl Into<PropertyKey>, getter: F)
    where
        F: Fn() -> Result<Value, Value> + 'static,
    {
        self.0.borrow_mut().define(
            key.into(),
            Property {
                slot: Slot::Accessor(Rc::new(getter)),
                enumerable: true,
            },
        );
    }

    /// Remove an own property. Returns whether it existed.
    pub fn delete(&self, key: impl Into<PropertyKey>) -> bool {
        let key = key.into();
        let mut data = self.0.borrow_mut();
        match data.position(&key) {
            Some(idx) => {
                data.properties.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Append an element. No-op on non-array objects.
    pub fn push(&self, value: impl Into<Value>) {
        if let ObjectKind::Array(elements) = &mut self.0.borrow_mut().kind {
            elements.push(value.into());
        }
    }

    #[inline]
    pub fn kind(&self) -> ObjectKind {
        self.0.borrow().kind.clone()
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self.0.borrow().kind, ObjectKind::Array(_))
    }

    /// Class of a native exception instance.
    #[inline]
    pub fn error_class(&self) -> Option<ErrorClass> {
        match &self.0.borrow().kind {
            ObjectKind::Error(class) => Some(class.clone()),
            _ => None,
        }
    }

    /// Snapshot of the elements of an array.
    pub fn elements(&self) -> Option<Vec<Value>> {
        match &self.0.borrow().kind {
            ObjectKind::Array(elements) => Some(elements.clone()),
            _ => None,
        }
    }

    /// Whether an own property exists. Never invokes accessors.
    pub fn has_own(&self, key: &PropertyKey) -> bool {
        self.0.borrow().position(key).is_some()
    }

    /// Whether an own string-keyed property exists. Never invokes accessors.
    pub fn has_own_str(&self, key: &str) -> bool {
        self.0
            .borrow()
            .properties
            .iter()
            .any(|(k, _)| k.as_str() == Some(key))
    }

    /// Own keys in definition order, with their enumerable flag.
    pub fn own_keys(&self) -> Vec<(PropertyKey, bool)> {
        self.0
            .borrow()
            .properties
            .iter()
            .map(|(k, p)| (k.clone(), p.enumerable))
            .collect()
    }

    /// Number of own properties.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.borrow().properties.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read an own property.
    ///
    /// Returns `Ok(None)` when absent and `Err(thrown)` when an accessor
    /// fails. The internal borrow is released before the accessor runs, so
    /// accessors may freely touch the object they live on.
    pub fn read(&self, key: &PropertyKey) -> Result<Option<Value>, Value> {
        let slot = {
            let data = self.0.borrow();
            match data.position(key) {
                Some(idx) => data.properties[idx].1.slot.clone(),
                None => return Ok(None),
            }
        };
        match slot {
            Slot::Data(value) => Ok(Some(value)),
            Slot::Accessor(getter) => getter().map(Some),
        }
    }

    /// Read an own string-keyed property. See [`Object::read`].
    #[inline]
    pub fn read_str(&self, key: &str) -> Result<Option<Value>, Value> {
        self.read(&PropertyKey::from(key))
    }

    /// Address-based identity, stable while the object is alive.
    #[inline]
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Object {
    /// Shallow: prints keys only, so cyclic graphs format in bounded time.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        let keys: Vec<String> = data.properties.iter().map(|(k, _)| k.to_string()).collect();
        match &data.kind {
            ObjectKind::Ordinary => f.debug_struct("Object").field("keys", &keys).finish(),
            ObjectKind::Array(elements) => f
                .debug_struct("Array")
                .field("len", &elements.len())
                .field("keys", &keys)
                .finish(),
            ObjectKind::Error(class) => f
                .debug_struct("ErrorObject")
                .field("class", class)
                .field("keys", &keys)
                .finish(),
        }
    }
}

// ============================================================================
// Values
// ============================================================================

/// Any value a caller can throw.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(Rc<str>),
    Symbol(Symbol),
    Function(Function),
    Object(Object),
}

impl Value {
    /// `null` or `undefined`.
    #[inline]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    #[inline]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Text coercion for non-object values; `None` for objects.
    pub fn primitive_text(&self) -> Option<String> {
        match self {
            Self::Undefined => Some("undefined".to_owned()),
            Self::Null => Some("null".to_owned()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            Self::BigInt(n) => Some(n.to_string()),
            Self::String(s) => Some(s.to_string()),
            Self::Symbol(symbol) => Some(symbol.to_string()),
            Self::Function(function) => Some(function.to_string()),
            Self::Object(_) => None,
        }
    }

    /// Convert a Rust error and its `source()` chain into a native
    /// exception instance with a `cause` chain.
    pub fn from_std_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let object = Object::error(ErrorClass::Error, error.to_string());
        if let Some(source) = error.source() {
            object.set_hidden("cause", Self::from_std_error(source));
        }
        Self::Object(object)
    }
}

/// Format a number the way a runtime coerces it to text.
///
/// Magnitudes in `[1e-6, 1e21)` print as plain decimals; anything outside
/// switches to exponent form with an explicit sign (`1e+21`, `1.5e-7`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_owned()
    } else if n == 0.0 {
        "0".to_owned()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        exponent_form(n)
    } else if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

fn exponent_form(n: f64) -> String {
    // `{:e}` already yields the shortest round-trip mantissa.
    let text = format!("{n:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
        _ => text,
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        Self::BigInt(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value.into())
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Self::Symbol(value)
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        Self::Function(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<&Object> for Value {
    fn from(value: &Object) -> Self {
        Self::Object(value.clone())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Value {
    fn from(value: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::from_std_error(value.as_ref())
    }
}

impl From<std::io::Error> for Value {
    fn from(value: std::io::Error) -> Self {
        Self::from_std_error(&value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Self::Number(f),
                None => Self::String(n.to_string().into()),
            },
            serde_json::Value::String(s) => Self::String(s.into()),
            serde_json::Value::Array(items) => Self::Object(Object::array(items)),
            serde_json::Value::Object(map) => {
                let object = Object::new();
                for (key, item) in map {
                    object.set(key, Self::from(item));
                }
                Self::Object(object)
            }
        }
    }
}
