//! Host-side values.
//!
//! A [`HostValue`] is the result of converting a guest value to a host type:
//! what a host procedure receives as an argument and returns as its result.
//! Unlike [`GuestValue`], host values are strongly typed; every value carries
//! enough information to recover its runtime [`TypeHash`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{Adapter, EnumType, GuestFunction, GuestValue, HostType, ObjectType, TypeHash, primitives};

/// A typed host value.
#[derive(Clone)]
pub enum HostValue {
    /// No value (the result of a procedure returning nothing).
    Void,
    /// The null reference.
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    /// A member of an enum type, stored as its underlying integer.
    Enum {
        /// The enum type.
        ty: EnumType,
        /// The underlying integer.
        value: i64,
    },
    /// A typed array `T[]`.
    Array(HostArray),
    /// An untyped value array (`object[]`).
    Values(Vec<HostValue>),
    /// A typed function adapter.
    Function(Adapter),
    /// A guest callable that has not been adapted to any shape.
    Callable(GuestFunction),
    /// A guest value passed through unconverted.
    Guest(GuestValue),
    /// Raw guest arguments (a variadic tail of guest values).
    GuestArgs(Vec<GuestValue>),
    /// An opaque host object.
    Object(HostObject),
    /// The injected context handle.
    Context(ContextHandle),
}

impl HostValue {
    /// Runtime type identity, used as the source half of conversion cache keys.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            HostValue::Void => primitives::VOID,
            HostValue::Null => primitives::NULL,
            HostValue::Bool(_) => primitives::BOOL,
            HostValue::Char(_) => primitives::CHAR,
            HostValue::I8(_) => primitives::INT8,
            HostValue::I16(_) => primitives::INT16,
            HostValue::I32(_) => primitives::INT32,
            HostValue::I64(_) => primitives::INT64,
            HostValue::U8(_) => primitives::UINT8,
            HostValue::U16(_) => primitives::UINT16,
            HostValue::U32(_) => primitives::UINT32,
            HostValue::U64(_) => primitives::UINT64,
            HostValue::F32(_) => primitives::FLOAT32,
            HostValue::F64(_) => primitives::FLOAT64,
            HostValue::String(_) => primitives::STRING,
            HostValue::Enum { ty, .. } => ty.type_hash(),
            HostValue::Array(array) => array.array_type().type_hash(),
            HostValue::Values(_) => primitives::VALUES,
            HostValue::Function(adapter) => adapter.shape().type_hash(),
            HostValue::Callable(_) => primitives::CALLABLE,
            HostValue::Guest(_) => primitives::GUEST,
            HostValue::GuestArgs(_) => primitives::GUEST_ARGS,
            HostValue::Object(obj) => obj.type_hash(),
            HostValue::Context(_) => primitives::CONTEXT,
        }
    }

    /// Human-readable runtime type name.
    pub fn type_name(&self) -> String {
        match self {
            HostValue::Void => "void".into(),
            HostValue::Null => "null".into(),
            HostValue::Bool(_) => "bool".into(),
            HostValue::Char(_) => "char".into(),
            HostValue::I8(_) => "int8".into(),
            HostValue::I16(_) => "int16".into(),
            HostValue::I32(_) => "int32".into(),
            HostValue::I64(_) => "int64".into(),
            HostValue::U8(_) => "uint8".into(),
            HostValue::U16(_) => "uint16".into(),
            HostValue::U32(_) => "uint32".into(),
            HostValue::U64(_) => "uint64".into(),
            HostValue::F32(_) => "float32".into(),
            HostValue::F64(_) => "float64".into(),
            HostValue::String(_) => "string".into(),
            HostValue::Enum { ty, .. } => ty.name().to_string(),
            HostValue::Array(array) => array.array_type().to_string(),
            HostValue::Values(_) => "object[]".into(),
            HostValue::Function(adapter) => adapter.shape().to_string(),
            HostValue::Callable(_) => "callable".into(),
            HostValue::Guest(v) => format!("guest {}", v.type_name()),
            HostValue::GuestArgs(_) => "guest[]".into(),
            HostValue::Object(obj) => obj.type_name().to_string(),
            HostValue::Context(_) => "context".into(),
        }
    }

    /// Check for null.
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Check for void.
    pub fn is_void(&self) -> bool {
        matches!(self, HostValue::Void)
    }

    /// Whether this value is already an instance of `ty`.
    pub fn satisfies(&self, ty: &HostType) -> bool {
        match (self, ty) {
            (HostValue::Null, ty) => ty.accepts_null(),
            (HostValue::Void, _) => false,
            (_, HostType::Any) => true,
            (_, HostType::Nullable(inner)) => self.satisfies(inner),
            (HostValue::Guest(_), HostType::Guest) => true,
            (HostValue::GuestArgs(_), HostType::GuestArgs) => true,
            (HostValue::Values(_), HostType::Array(element)) => **element == HostType::Any,
            (HostValue::Array(array), HostType::Array(element)) => array.element() == &**element,
            (HostValue::Function(adapter), HostType::Function(shape)) => {
                adapter.shape().type_hash() == shape.type_hash()
            }
            (HostValue::Enum { ty: actual, .. }, HostType::Enum(expected)) => actual == expected,
            (HostValue::Object(obj), HostType::Object(expected)) => {
                obj.type_hash() == expected.type_hash()
            }
            (value, HostType::Primitive(_)) => value.type_hash() == ty.type_hash(),
            _ => false,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Void => write!(f, "Void"),
            HostValue::Null => write!(f, "Null"),
            HostValue::Bool(v) => write!(f, "Bool({})", v),
            HostValue::Char(v) => write!(f, "Char({:?})", v),
            HostValue::I8(v) => write!(f, "I8({})", v),
            HostValue::I16(v) => write!(f, "I16({})", v),
            HostValue::I32(v) => write!(f, "I32({})", v),
            HostValue::I64(v) => write!(f, "I64({})", v),
            HostValue::U8(v) => write!(f, "U8({})", v),
            HostValue::U16(v) => write!(f, "U16({})", v),
            HostValue::U32(v) => write!(f, "U32({})", v),
            HostValue::U64(v) => write!(f, "U64({})", v),
            HostValue::F32(v) => write!(f, "F32({})", v),
            HostValue::F64(v) => write!(f, "F64({})", v),
            HostValue::String(s) => write!(f, "String({:?})", s),
            HostValue::Enum { ty, value } => match ty.member_name(*value) {
                Some(member) => write!(f, "Enum({}::{})", ty.name(), member),
                None => write!(f, "Enum({}({}))", ty.name(), value),
            },
            HostValue::Array(array) => f
                .debug_tuple("Array")
                .field(&array.element)
                .field(&array.items)
                .finish(),
            HostValue::Values(items) => f.debug_tuple("Values").field(items).finish(),
            HostValue::Function(adapter) => write!(f, "Function({})", adapter.shape()),
            HostValue::Callable(func) => write!(f, "{:?}", func),
            HostValue::Guest(v) => f.debug_tuple("Guest").field(v).finish(),
            HostValue::GuestArgs(v) => f.debug_tuple("GuestArgs").field(v).finish(),
            HostValue::Object(obj) => write!(f, "Object({})", obj.type_name()),
            HostValue::Context(_) => write!(f, "Context(...)"),
        }
    }
}

// ============================================================================
// Arrays
// ============================================================================

/// A typed host array: every item satisfies the element type.
#[derive(Clone)]
pub struct HostArray {
    element: HostType,
    items: Vec<HostValue>,
}

impl HostArray {
    /// Create an array. Callers are responsible for item types.
    pub fn new(element: HostType, items: Vec<HostValue>) -> Self {
        Self { element, items }
    }

    /// Element type.
    pub fn element(&self) -> &HostType {
        &self.element
    }

    /// The array's own type, `T[]`.
    pub fn array_type(&self) -> HostType {
        HostType::array(self.element.clone())
    }

    pub fn items(&self) -> &[HostValue] {
        &self.items
    }

    pub fn into_items(self) -> Vec<HostValue> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Opaque objects
// ============================================================================

/// An opaque host object with a registered type identity.
///
/// The payload is shared; cloning a `HostObject` aliases the same instance.
#[derive(Clone)]
pub struct HostObject {
    ty: ObjectType,
    value: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    /// Wrap a Rust value as an instance of `ty`.
    pub fn new<T: Any + Send + Sync>(ty: ObjectType, value: T) -> Self {
        Self {
            ty,
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn type_hash(&self) -> TypeHash {
        self.ty.type_hash()
    }

    /// Borrow the payload as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether two objects alias the same instance.
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// The handle injected into procedures that declare a context parameter.
#[derive(Clone)]
pub struct ContextHandle(Arc<dyn Any + Send + Sync>);

impl ContextHandle {
    /// Wrap a shared context value.
    pub fn new<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self(value)
    }

    /// Borrow the context as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Recover the shared context as `Arc<T>`.
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).downcast::<T>().ok()
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle").finish_non_exhaustive()
    }
}
