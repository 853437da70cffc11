//! Host type descriptors.
//!
//! [`HostType`] describes the type a host procedure parameter (or a function
//! shape's parameter/return) expects. It is the conversion target for
//! [`HostValue`](crate::HostValue)s and carries a deterministic [`TypeHash`]
//! identity used for cache keys and identity checks.
//!
//! # Example
//!
//! ```
//! use hostbridge_core::{FunctionShape, HostType, PrimitiveKind};
//!
//! // int32[]
//! let ints = HostType::array(HostType::INT32);
//!
//! // func<int32, int32, float64>
//! let shape = FunctionShape::func(vec![HostType::INT32, HostType::INT32], HostType::FLOAT64);
//! let callback = HostType::Function(shape);
//!
//! assert!(ints.accepts_null());
//! assert!(!HostType::Primitive(PrimitiveKind::Int32).accepts_null());
//! assert_ne!(ints.type_hash(), callback.type_hash());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::{TypeHash, primitives};

// ============================================================================
// Primitives
// ============================================================================

/// Built-in scalar host types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
}

impl PrimitiveKind {
    /// Get the TypeHash for this primitive type.
    pub const fn type_hash(self) -> TypeHash {
        match self {
            PrimitiveKind::Bool => primitives::BOOL,
            PrimitiveKind::Char => primitives::CHAR,
            PrimitiveKind::Int8 => primitives::INT8,
            PrimitiveKind::Int16 => primitives::INT16,
            PrimitiveKind::Int32 => primitives::INT32,
            PrimitiveKind::Int64 => primitives::INT64,
            PrimitiveKind::UInt8 => primitives::UINT8,
            PrimitiveKind::UInt16 => primitives::UINT16,
            PrimitiveKind::UInt32 => primitives::UINT32,
            PrimitiveKind::UInt64 => primitives::UINT64,
            PrimitiveKind::Float32 => primitives::FLOAT32,
            PrimitiveKind::Float64 => primitives::FLOAT64,
            PrimitiveKind::String => primitives::STRING,
        }
    }

    /// Get the name of this primitive type.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::UInt8 => "uint8",
            PrimitiveKind::UInt16 => "uint16",
            PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::String => "string",
        }
    }

    /// Integer kinds (signed or unsigned).
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int8
                | PrimitiveKind::Int16
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::UInt8
                | PrimitiveKind::UInt16
                | PrimitiveKind::UInt32
                | PrimitiveKind::UInt64
        )
    }

    /// Floating point kinds.
    pub const fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::Float32 | PrimitiveKind::Float64)
    }

    /// Integer or floating point.
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Value types reject null; only `string` is reference-like.
    pub const fn is_value_type(self) -> bool {
        !matches!(self, PrimitiveKind::String)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Named types
// ============================================================================

/// A plain, opaque host object type identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectType {
    name: Arc<str>,
    type_hash: TypeHash,
}

impl ObjectType {
    /// Create an object type from its qualified name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        let type_hash = TypeHash::from_name(&name);
        Self { name, type_hash }
    }

    /// Qualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type identity.
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }
}

#[derive(Debug)]
struct EnumInner {
    name: String,
    type_hash: TypeHash,
    values: Vec<(String, i64)>,
    is_flags: bool,
}

/// A host enum: a name plus its integer domain.
///
/// Cloning is cheap; equality is by type identity.
#[derive(Debug, Clone)]
pub struct EnumType(Arc<EnumInner>);

impl EnumType {
    /// Create an enum type from its declared `(name, value)` pairs.
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let name = name.into();
        let type_hash = TypeHash::from_name(&name);
        Self(Arc::new(EnumInner {
            name,
            type_hash,
            values: values.into_iter().map(|(n, v)| (n.into(), v)).collect(),
            is_flags: false,
        }))
    }

    /// Create a flags enum: any bitwise combination of declared values is valid.
    pub fn flags<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let plain = Self::new(name, values);
        let inner = &plain.0;
        Self(Arc::new(EnumInner {
            name: inner.name.clone(),
            type_hash: inner.type_hash,
            values: inner.values.clone(),
            is_flags: true,
        }))
    }

    /// Enum type name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type identity.
    pub fn type_hash(&self) -> TypeHash {
        self.0.type_hash
    }

    /// Whether this is a flags enum.
    pub fn is_flags(&self) -> bool {
        self.0.is_flags
    }

    /// Declared `(name, value)` pairs.
    pub fn values(&self) -> &[(String, i64)] {
        &self.0.values
    }

    /// Check whether `value` belongs to the enum's integer domain.
    pub fn contains(&self, value: i64) -> bool {
        if self.0.is_flags {
            let all = self.0.values.iter().fold(0i64, |acc, (_, v)| acc | v);
            value & !all == 0
        } else {
            self.0.values.iter().any(|(_, v)| *v == value)
        }
    }

    /// Name of the member with this exact value.
    pub fn member_name(&self, value: i64) -> Option<&str> {
        self.0
            .values
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }
}

impl PartialEq for EnumType {
    fn eq(&self, other: &Self) -> bool {
        self.0.type_hash == other.0.type_hash
    }
}

// ============================================================================
// Function shapes
// ============================================================================

/// A member of a named function type.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMember {
    /// Member name.
    pub name: String,
    /// Parameter types.
    pub params: Vec<HostType>,
    /// Return type (`None` = void).
    pub ret: Option<HostType>,
    /// Abstract members must be supplied by the adapter.
    pub is_abstract: bool,
}

impl ShapeMember {
    /// Create the abstract invoke member of a function type.
    pub fn invoke(params: Vec<HostType>, ret: Option<HostType>) -> Self {
        Self {
            name: "invoke".to_string(),
            params,
            ret,
            is_abstract: true,
        }
    }

    /// Create a concrete (non-abstract) helper member.
    pub fn concrete(name: impl Into<String>, params: Vec<HostType>, ret: Option<HostType>) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            is_abstract: false,
        }
    }
}

/// A user-declared function type, described by its members.
///
/// Adapters for a named shape are resolved against its single abstract
/// member, mirroring how a delegate type exposes one `invoke` method.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedShape {
    /// Qualified type name.
    pub name: String,
    /// Type identity.
    pub type_hash: TypeHash,
    /// Declared members.
    pub members: Vec<ShapeMember>,
}

impl NamedShape {
    /// Create a named shape with the given members.
    pub fn new(name: impl Into<String>, members: Vec<ShapeMember>) -> Self {
        let name = name.into();
        let type_hash = TypeHash::from_name(&name);
        Self {
            name,
            type_hash,
            members,
        }
    }

    /// The single abstract member, if there is exactly one.
    pub fn invoke_member(&self) -> Option<&ShapeMember> {
        let mut abstract_members = self.members.iter().filter(|m| m.is_abstract);
        let first = abstract_members.next()?;
        match abstract_members.next() {
            Some(_) => None,
            None => Some(first),
        }
    }
}

/// The shape of a host function value.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionShape {
    /// Bare zero-argument action returning nothing.
    Action,
    /// `action<T1..Tn>`: fixed arity, no result.
    GenericAction(Vec<HostType>),
    /// `func<T1..Tn, R>`: fixed arity with a result.
    GenericFunc {
        /// Parameter types.
        params: Vec<HostType>,
        /// Result type.
        ret: Box<HostType>,
    },
    /// A named function type resolved through its invoke member.
    Named(Arc<NamedShape>),
}

impl FunctionShape {
    /// `action<T1..Tn>`; an empty parameter list yields the bare action.
    pub fn action(params: Vec<HostType>) -> Self {
        if params.is_empty() {
            FunctionShape::Action
        } else {
            FunctionShape::GenericAction(params)
        }
    }

    /// `func<T1..Tn, R>`.
    pub fn func(params: Vec<HostType>, ret: HostType) -> Self {
        FunctionShape::GenericFunc {
            params,
            ret: Box::new(ret),
        }
    }

    /// A named function type.
    pub fn named(shape: NamedShape) -> Self {
        FunctionShape::Named(Arc::new(shape))
    }

    /// Parameter types, or `None` for a named shape without a usable invoke member.
    pub fn params(&self) -> Option<&[HostType]> {
        match self {
            FunctionShape::Action => Some(&[]),
            FunctionShape::GenericAction(params) => Some(params),
            FunctionShape::GenericFunc { params, .. } => Some(params),
            FunctionShape::Named(named) => named.invoke_member().map(|m| m.params.as_slice()),
        }
    }

    /// Return type; `None` means void (or an unusable named shape).
    pub fn return_type(&self) -> Option<&HostType> {
        match self {
            FunctionShape::Action | FunctionShape::GenericAction(_) => None,
            FunctionShape::GenericFunc { ret, .. } => Some(ret),
            FunctionShape::Named(named) => named.invoke_member().and_then(|m| m.ret.as_ref()),
        }
    }

    /// Type identity of the shape.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            FunctionShape::Action => primitives::ACTION,
            FunctionShape::GenericAction(params) => {
                let args: Vec<_> = params.iter().map(HostType::type_hash).collect();
                TypeHash::from_template_instance(primitives::ACTION_TEMPLATE, &args)
            }
            FunctionShape::GenericFunc { params, ret } => {
                let mut args: Vec<_> = params.iter().map(HostType::type_hash).collect();
                args.push(ret.type_hash());
                TypeHash::from_template_instance(primitives::FUNC_TEMPLATE, &args)
            }
            FunctionShape::Named(named) => named.type_hash,
        }
    }
}

impl fmt::Display for FunctionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionShape::Action => write!(f, "action"),
            FunctionShape::GenericAction(params) => {
                write!(f, "action<")?;
                write_list(f, params)?;
                write!(f, ">")
            }
            FunctionShape::GenericFunc { params, ret } => {
                write!(f, "func<")?;
                write_list(f, params)?;
                if !params.is_empty() {
                    write!(f, ", ")?;
                }
                write!(f, "{}>", ret)
            }
            FunctionShape::Named(named) => write!(f, "{}", named.name),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[HostType]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

// ============================================================================
// HostType
// ============================================================================

/// Descriptor of a target host type.
#[derive(Debug, Clone, PartialEq)]
pub enum HostType {
    /// A built-in scalar.
    Primitive(PrimitiveKind),
    /// `object`: every value satisfies it.
    Any,
    /// A named opaque host type.
    Object(ObjectType),
    /// An enum with an integer domain.
    Enum(EnumType),
    /// `T[]`.
    Array(Box<HostType>),
    /// A function value of the given shape.
    Function(FunctionShape),
    /// `T?`.
    Nullable(Box<HostType>),
    /// The guest value itself, passed through unconverted.
    Guest,
    /// A raw array of guest values (typically a variadic tail).
    GuestArgs,
}

impl HostType {
    pub const BOOL: HostType = HostType::Primitive(PrimitiveKind::Bool);
    pub const CHAR: HostType = HostType::Primitive(PrimitiveKind::Char);
    pub const INT8: HostType = HostType::Primitive(PrimitiveKind::Int8);
    pub const INT16: HostType = HostType::Primitive(PrimitiveKind::Int16);
    pub const INT32: HostType = HostType::Primitive(PrimitiveKind::Int32);
    pub const INT64: HostType = HostType::Primitive(PrimitiveKind::Int64);
    pub const UINT8: HostType = HostType::Primitive(PrimitiveKind::UInt8);
    pub const UINT16: HostType = HostType::Primitive(PrimitiveKind::UInt16);
    pub const UINT32: HostType = HostType::Primitive(PrimitiveKind::UInt32);
    pub const UINT64: HostType = HostType::Primitive(PrimitiveKind::UInt64);
    pub const FLOAT32: HostType = HostType::Primitive(PrimitiveKind::Float32);
    pub const FLOAT64: HostType = HostType::Primitive(PrimitiveKind::Float64);
    pub const STRING: HostType = HostType::Primitive(PrimitiveKind::String);

    /// `T[]`.
    pub fn array(element: HostType) -> Self {
        HostType::Array(Box::new(element))
    }

    /// `T?`.
    pub fn nullable(inner: HostType) -> Self {
        HostType::Nullable(Box::new(inner))
    }

    /// A named opaque host type.
    pub fn object(name: impl Into<Arc<str>>) -> Self {
        HostType::Object(ObjectType::new(name))
    }

    /// Whether null is an acceptable value of this type.
    pub fn accepts_null(&self) -> bool {
        match self {
            HostType::Primitive(kind) => !kind.is_value_type(),
            HostType::Enum(_) => false,
            HostType::Any
            | HostType::Object(_)
            | HostType::Array(_)
            | HostType::Function(_)
            | HostType::Nullable(_)
            | HostType::Guest
            | HostType::GuestArgs => true,
        }
    }

    /// Type identity.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            HostType::Primitive(kind) => kind.type_hash(),
            HostType::Any => primitives::OBJECT,
            HostType::Object(obj) => obj.type_hash(),
            HostType::Enum(e) => e.type_hash(),
            HostType::Array(element) => {
                if **element == HostType::Any {
                    primitives::VALUES
                } else {
                    TypeHash::from_template_instance(
                        primitives::ARRAY_TEMPLATE,
                        &[element.type_hash()],
                    )
                }
            }
            HostType::Function(shape) => shape.type_hash(),
            HostType::Nullable(inner) => {
                TypeHash::from_template_instance(primitives::NULLABLE_TEMPLATE, &[inner.type_hash()])
            }
            HostType::Guest => primitives::GUEST,
            HostType::GuestArgs => primitives::GUEST_ARGS,
        }
    }

    /// The primitive kind, if this is a primitive.
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            HostType::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Element type of an array type.
    pub fn element(&self) -> Option<&HostType> {
        match self {
            HostType::Array(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Primitive(kind) => write!(f, "{}", kind),
            HostType::Any => write!(f, "object"),
            HostType::Object(obj) => write!(f, "{}", obj.name()),
            HostType::Enum(e) => write!(f, "{}", e.name()),
            HostType::Array(element) => write!(f, "{}[]", element),
            HostType::Function(shape) => write!(f, "{}", shape),
            HostType::Nullable(inner) => write!(f, "{}?", inner),
            HostType::Guest => write!(f, "guest"),
            HostType::GuestArgs => write!(f, "guest[]"),
        }
    }
}
