//! Guest-side values.
//!
//! [`GuestValue`] is the narrow view this crate has of the dynamically-typed
//! guest language: a tagged union of undefined, null, booleans, numbers,
//! strings and objects. Objects are arrays, callables, or wrapped host values.
//! Values are immutable from the host's perspective; arrays and callables are
//! shared through `Arc`.

use std::fmt;
use std::sync::Arc;

use crate::HostValue;
use crate::error::GuestError;

// ============================================================================
// Callables
// ============================================================================

/// A guest function, invoked with a receiver and an argument list.
pub trait GuestCallable: Send + Sync {
    /// Invoke the function.
    fn call(&self, this: &GuestValue, args: &[GuestValue]) -> Result<GuestValue, GuestError>;
}

impl<F> GuestCallable for F
where
    F: Fn(&GuestValue, &[GuestValue]) -> Result<GuestValue, GuestError> + Send + Sync,
{
    fn call(&self, this: &GuestValue, args: &[GuestValue]) -> Result<GuestValue, GuestError> {
        (self)(this, args)
    }
}

/// Identity of a guest callable: its shared allocation.
///
/// Stable for as long as any clone of the [`GuestFunction`] is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallableId(usize);

/// A shared handle to a guest callable.
#[derive(Clone)]
pub struct GuestFunction(Arc<dyn GuestCallable>);

impl GuestFunction {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&GuestValue, &[GuestValue]) -> Result<GuestValue, GuestError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wrap any [`GuestCallable`] implementation.
    pub fn from_callable<C>(callable: C) -> Self
    where
        C: GuestCallable + 'static,
    {
        Self(Arc::new(callable))
    }

    /// Invoke the callable.
    pub fn call(&self, this: &GuestValue, args: &[GuestValue]) -> Result<GuestValue, GuestError> {
        self.0.call(this, args)
    }

    /// Identity of the underlying callable.
    pub fn id(&self) -> CallableId {
        CallableId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// Whether two handles refer to the same callable.
    pub fn ptr_eq(&self, other: &GuestFunction) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for GuestFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GuestFunction").field(&self.id()).finish()
    }
}

// ============================================================================
// Arrays
// ============================================================================

/// An immutable guest array. Holes (missing indices) are `None`.
#[derive(Clone, Default)]
pub struct GuestArray(Arc<[Option<GuestValue>]>);

impl GuestArray {
    /// Build a dense array from a value sequence.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = GuestValue>,
    {
        Self(values.into_iter().map(Some).collect())
    }

    /// Build a possibly sparse array.
    pub fn with_holes(slots: Vec<Option<GuestValue>>) -> Self {
        Self(slots.into())
    }

    /// The array's `length`.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the array has length zero.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether index `i` holds a value (is not a hole).
    pub fn has_index(&self, i: usize) -> bool {
        matches!(self.0.get(i), Some(Some(_)))
    }

    /// Element at `i`; `None` for holes and out-of-range indices.
    pub fn get(&self, i: usize) -> Option<&GuestValue> {
        self.0.get(i).and_then(Option::as_ref)
    }

    /// Elements with holes read as `undefined`.
    pub fn to_vec(&self) -> Vec<GuestValue> {
        self.0
            .iter()
            .map(|slot| slot.clone().unwrap_or(GuestValue::Undefined))
            .collect()
    }

    fn ptr_eq(&self, other: &GuestArray) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for GuestArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl PartialEq for GuestArray {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

// ============================================================================
// GuestValue
// ============================================================================

/// The object variants of a guest value.
#[derive(Debug, Clone)]
pub enum GuestObject {
    /// An array.
    Array(GuestArray),
    /// A callable function.
    Callable(GuestFunction),
    /// A host value wrapped for guest code.
    Host(Arc<HostValue>),
}

/// A dynamically-typed guest value.
#[derive(Debug, Clone, Default)]
pub enum GuestValue {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// A boolean.
    Boolean(bool),
    /// A number (always double precision).
    Number(f64),
    /// A string.
    String(Arc<str>),
    /// An object.
    Object(GuestObject),
}

impl GuestValue {
    /// Construct a guest array from a value sequence.
    pub fn array<I>(values: I) -> Self
    where
        I: IntoIterator<Item = GuestValue>,
    {
        GuestValue::Object(GuestObject::Array(GuestArray::from_values(values)))
    }

    /// Wrap a closure as a guest function value.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&GuestValue, &[GuestValue]) -> Result<GuestValue, GuestError> + Send + Sync + 'static,
    {
        GuestValue::Object(GuestObject::Callable(GuestFunction::new(f)))
    }

    /// Wrap a host value for guest code.
    pub fn host(value: HostValue) -> Self {
        GuestValue::Object(GuestObject::Host(Arc::new(value)))
    }

    /// Get a human-readable name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            GuestValue::Undefined => "undefined",
            GuestValue::Null => "null",
            GuestValue::Boolean(_) => "boolean",
            GuestValue::Number(_) => "number",
            GuestValue::String(_) => "string",
            GuestValue::Object(GuestObject::Array(_)) => "array",
            GuestValue::Object(GuestObject::Callable(_)) => "function",
            GuestValue::Object(GuestObject::Host(_)) => "object",
        }
    }

    /// Check for `undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, GuestValue::Undefined)
    }

    /// Check for `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, GuestValue::Undefined | GuestValue::Null)
    }

    /// Check for an array.
    pub fn is_array(&self) -> bool {
        matches!(self, GuestValue::Object(GuestObject::Array(_)))
    }

    /// Check for a callable.
    pub fn is_callable(&self) -> bool {
        matches!(self, GuestValue::Object(GuestObject::Callable(_)))
    }

    /// The array, if this is one.
    pub fn as_array(&self) -> Option<&GuestArray> {
        match self {
            GuestValue::Object(GuestObject::Array(array)) => Some(array),
            _ => None,
        }
    }

    /// The callable, if this is one.
    pub fn as_callable(&self) -> Option<&GuestFunction> {
        match self {
            GuestValue::Object(GuestObject::Callable(f)) => Some(f),
            _ => None,
        }
    }

    /// The number, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            GuestValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            GuestValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Keyed property access.
    ///
    /// Arrays expose `length` and their indices; strings expose `length`.
    /// Everything else reads as `undefined`.
    pub fn get(&self, key: &str) -> GuestValue {
        match self {
            GuestValue::Object(GuestObject::Array(array)) => {
                if key == "length" {
                    return GuestValue::Number(array.len() as f64);
                }
                key.parse::<usize>()
                    .ok()
                    .and_then(|i| array.get(i).cloned())
                    .unwrap_or_default()
            }
            GuestValue::String(s) if key == "length" => {
                GuestValue::Number(s.encode_utf16().count() as f64)
            }
            _ => GuestValue::Undefined,
        }
    }

    /// Indexed property access; holes and missing indices read as `undefined`.
    pub fn get_index(&self, index: usize) -> GuestValue {
        self.as_array()
            .and_then(|array| array.get(index).cloned())
            .unwrap_or_default()
    }

    /// Convert to an opaque host value.
    ///
    /// Numbers become `float64`, arrays become untyped value arrays (`object[]`),
    /// callables stay callables until a function shape is requested, and
    /// wrapped host values are unwrapped.
    pub fn to_host(&self) -> HostValue {
        match self {
            GuestValue::Undefined | GuestValue::Null => HostValue::Null,
            GuestValue::Boolean(b) => HostValue::Bool(*b),
            GuestValue::Number(n) => HostValue::F64(*n),
            GuestValue::String(s) => HostValue::String(s.to_string()),
            GuestValue::Object(GuestObject::Array(array)) => {
                HostValue::Values(array.to_vec().iter().map(GuestValue::to_host).collect())
            }
            GuestValue::Object(GuestObject::Callable(f)) => HostValue::Callable(f.clone()),
            GuestValue::Object(GuestObject::Host(value)) => (**value).clone(),
        }
    }

    /// Convert a host value into a guest value.
    ///
    /// Numeric primitives and enums become numbers, host arrays become guest
    /// arrays, adapters return the guest callable they wrap, and any other
    /// host object is wrapped.
    pub fn from_host(value: HostValue) -> GuestValue {
        match value {
            HostValue::Void => GuestValue::Undefined,
            HostValue::Null => GuestValue::Null,
            HostValue::Bool(b) => GuestValue::Boolean(b),
            HostValue::Char(c) => GuestValue::String(c.to_string().into()),
            HostValue::I8(v) => GuestValue::Number(v.into()),
            HostValue::I16(v) => GuestValue::Number(v.into()),
            HostValue::I32(v) => GuestValue::Number(v.into()),
            HostValue::I64(v) => GuestValue::Number(v as f64),
            HostValue::U8(v) => GuestValue::Number(v.into()),
            HostValue::U16(v) => GuestValue::Number(v.into()),
            HostValue::U32(v) => GuestValue::Number(v.into()),
            HostValue::U64(v) => GuestValue::Number(v as f64),
            HostValue::F32(v) => GuestValue::Number(v.into()),
            HostValue::F64(v) => GuestValue::Number(v),
            HostValue::String(s) => GuestValue::String(s.into()),
            HostValue::Enum { value, .. } => GuestValue::Number(value as f64),
            HostValue::Array(array) => {
                GuestValue::array(array.into_items().into_iter().map(GuestValue::from_host))
            }
            HostValue::Values(items) => GuestValue::array(items.into_iter().map(GuestValue::from_host)),
            HostValue::Callable(f) => GuestValue::Object(GuestObject::Callable(f)),
            HostValue::Guest(v) => v,
            HostValue::GuestArgs(values) => GuestValue::array(values),
            HostValue::Function(adapter) => match adapter.origin() {
                Some(f) => GuestValue::Object(GuestObject::Callable(f.clone())),
                None => GuestValue::host(HostValue::Function(adapter)),
            },
            other @ (HostValue::Object(_) | HostValue::Context(_)) => GuestValue::host(other),
        }
    }
}

impl PartialEq for GuestValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (GuestValue::Undefined, GuestValue::Undefined) => true,
            (GuestValue::Null, GuestValue::Null) => true,
            (GuestValue::Boolean(a), GuestValue::Boolean(b)) => a == b,
            (GuestValue::Number(a), GuestValue::Number(b)) => a == b,
            (GuestValue::String(a), GuestValue::String(b)) => a == b,
            (GuestValue::Object(GuestObject::Array(a)), GuestValue::Object(GuestObject::Array(b))) => {
                a == b
            }
            (
                GuestValue::Object(GuestObject::Callable(a)),
                GuestValue::Object(GuestObject::Callable(b)),
            ) => a.ptr_eq(b),
            (GuestValue::Object(GuestObject::Host(a)), GuestValue::Object(GuestObject::Host(b))) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

impl From<bool> for GuestValue {
    fn from(value: bool) -> Self {
        GuestValue::Boolean(value)
    }
}

impl From<f64> for GuestValue {
    fn from(value: f64) -> Self {
        GuestValue::Number(value)
    }
}

impl From<i32> for GuestValue {
    fn from(value: i32) -> Self {
        GuestValue::Number(value.into())
    }
}

impl From<&str> for GuestValue {
    fn from(value: &str) -> Self {
        GuestValue::String(value.into())
    }
}

impl From<String> for GuestValue {
    fn from(value: String) -> Self {
        GuestValue::String(value.into())
    }
}

impl From<GuestArray> for GuestValue {
    fn from(value: GuestArray) -> Self {
        GuestValue::Object(GuestObject::Array(value))
    }
}

impl From<GuestFunction> for GuestValue {
    fn from(value: GuestFunction) -> Self {
        GuestValue::Object(GuestObject::Callable(value))
    }
}
