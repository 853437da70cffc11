//! Conversion traits between Rust types and [`HostValue`]s.
//!
//! This module provides:
//! - [`FromHost`]: Extract a Rust value from a [`HostValue`]
//! - [`IntoHost`]: Convert a Rust value into a [`HostValue`]
//! - [`HostTyped`]: The [`HostType`] a Rust type stands for
//! - [`HostArgs`]: Tuples of the above, used by typed adapters
//!
//! ## Supported Types
//!
//! - Integers: `i8`, `i16`, `i32`, `i64`, `u8`, `u16`, `u32`, `u64`
//! - Floats: `f32`, `f64`
//! - `bool`, `char`, `String`
//! - `Option<T>` (nullable), `Vec<T>` (arrays)
//! - [`GuestValue`], [`HostValue`], [`Adapter`], [`GuestFunction`]
//! - Unit: `()` (void)
//!
//! Extraction is exact about kind but lenient about width: any integer variant
//! converts to any integer type it fits in.

use crate::error::ConversionError;
use crate::{Adapter, GuestFunction, GuestValue, HostType, HostValue};

/// Extract a value from a [`HostValue`].
pub trait FromHost: Sized {
    /// Extract a value, or report why the value does not fit.
    fn from_host(value: &HostValue) -> Result<Self, ConversionError>;
}

/// Convert a value into a [`HostValue`].
pub trait IntoHost {
    /// Convert this value.
    fn into_host(self) -> HostValue;
}

/// A Rust type with a corresponding [`HostType`].
pub trait HostTyped {
    /// `true` only for `()`: the type stands for "no value".
    const IS_VOID: bool = false;

    /// The host type descriptor.
    fn host_type() -> HostType;
}

fn integer_of(value: &HostValue) -> Option<i128> {
    match value {
        HostValue::I8(v) => Some((*v).into()),
        HostValue::I16(v) => Some((*v).into()),
        HostValue::I32(v) => Some((*v).into()),
        HostValue::I64(v) => Some((*v).into()),
        HostValue::U8(v) => Some((*v).into()),
        HostValue::U16(v) => Some((*v).into()),
        HostValue::U32(v) => Some((*v).into()),
        HostValue::U64(v) => Some((*v).into()),
        HostValue::Enum { value, .. } => Some((*value).into()),
        _ => None,
    }
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_host_int {
    ($($ty:ty => $variant:ident, $host:ident);* $(;)?) => {
        $(
            impl FromHost for $ty {
                fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
                    match integer_of(value) {
                        Some(v) => <$ty>::try_from(v).map_err(|_| ConversionError::IntegerOverflow {
                            value: v.to_string(),
                            target: HostType::$host.to_string(),
                        }),
                        None => Err(ConversionError::mismatch(
                            HostType::$host.to_string(),
                            value.type_name(),
                        )),
                    }
                }
            }

            impl IntoHost for $ty {
                fn into_host(self) -> HostValue {
                    HostValue::$variant(self)
                }
            }

            impl HostTyped for $ty {
                fn host_type() -> HostType {
                    HostType::$host
                }
            }
        )*
    };
}

impl_host_int! {
    i8 => I8, INT8;
    i16 => I16, INT16;
    i32 => I32, INT32;
    i64 => I64, INT64;
    u8 => U8, UINT8;
    u16 => U16, UINT16;
    u32 => U32, UINT32;
    u64 => U64, UINT64;
}

// ============================================================================
// Float implementations
// ============================================================================

impl FromHost for f64 {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::F64(v) => Ok(*v),
            HostValue::F32(v) => Ok((*v).into()),
            other => integer_of(other)
                .map(|v| v as f64)
                .ok_or_else(|| ConversionError::mismatch("float64", other.type_name())),
        }
    }
}

impl FromHost for f32 {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::F32(v) => Ok(*v),
            HostValue::F64(v) => {
                // Preserve infinities and NaN; reject finite values out of range
                if !v.is_finite() || (*v >= f32::MIN as f64 && *v <= f32::MAX as f64) {
                    Ok(*v as f32)
                } else {
                    Err(ConversionError::IntegerOverflow {
                        value: v.to_string(),
                        target: "float32".into(),
                    })
                }
            }
            other => integer_of(other)
                .map(|v| v as f32)
                .ok_or_else(|| ConversionError::mismatch("float32", other.type_name())),
        }
    }
}

impl IntoHost for f32 {
    fn into_host(self) -> HostValue {
        HostValue::F32(self)
    }
}

impl IntoHost for f64 {
    fn into_host(self) -> HostValue {
        HostValue::F64(self)
    }
}

impl HostTyped for f32 {
    fn host_type() -> HostType {
        HostType::FLOAT32
    }
}

impl HostTyped for f64 {
    fn host_type() -> HostType {
        HostType::FLOAT64
    }
}

// ============================================================================
// Other scalars
// ============================================================================

impl FromHost for bool {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Bool(b) => Ok(*b),
            other => Err(ConversionError::mismatch("bool", other.type_name())),
        }
    }
}

impl IntoHost for bool {
    fn into_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

impl HostTyped for bool {
    fn host_type() -> HostType {
        HostType::BOOL
    }
}

impl FromHost for char {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Char(c) => Ok(*c),
            other => Err(ConversionError::mismatch("char", other.type_name())),
        }
    }
}

impl IntoHost for char {
    fn into_host(self) -> HostValue {
        HostValue::Char(self)
    }
}

impl HostTyped for char {
    fn host_type() -> HostType {
        HostType::CHAR
    }
}

impl FromHost for String {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::String(s) => Ok(s.clone()),
            other => Err(ConversionError::mismatch("string", other.type_name())),
        }
    }
}

impl IntoHost for String {
    fn into_host(self) -> HostValue {
        HostValue::String(self)
    }
}

impl IntoHost for &str {
    fn into_host(self) -> HostValue {
        HostValue::String(self.to_string())
    }
}

impl HostTyped for String {
    fn host_type() -> HostType {
        HostType::STRING
    }
}

impl FromHost for () {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Void | HostValue::Null => Ok(()),
            other => Err(ConversionError::mismatch("void", other.type_name())),
        }
    }
}

impl IntoHost for () {
    fn into_host(self) -> HostValue {
        HostValue::Void
    }
}

impl HostTyped for () {
    const IS_VOID: bool = true;

    fn host_type() -> HostType {
        HostType::Any
    }
}

// ============================================================================
// Composites
// ============================================================================

impl<T: FromHost> FromHost for Option<T> {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Null => Ok(None),
            other => T::from_host(other).map(Some),
        }
    }
}

impl<T: IntoHost> IntoHost for Option<T> {
    fn into_host(self) -> HostValue {
        match self {
            Some(v) => v.into_host(),
            None => HostValue::Null,
        }
    }
}

impl<T: HostTyped> HostTyped for Option<T> {
    fn host_type() -> HostType {
        HostType::nullable(T::host_type())
    }
}

impl<T: FromHost> FromHost for Vec<T> {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        let items = match value {
            HostValue::Array(array) => array.items(),
            HostValue::Values(items) => items.as_slice(),
            other => {
                return Err(ConversionError::NotAnArray {
                    actual: other.type_name(),
                });
            }
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::from_host(item).map_err(|e| ConversionError::ArrayElement {
                    index,
                    source: Box::new(e),
                })
            })
            .collect()
    }
}

impl<T: IntoHost + HostTyped> IntoHost for Vec<T> {
    fn into_host(self) -> HostValue {
        HostValue::Array(crate::HostArray::new(
            T::host_type(),
            self.into_iter().map(IntoHost::into_host).collect(),
        ))
    }
}

impl<T: HostTyped> HostTyped for Vec<T> {
    fn host_type() -> HostType {
        HostType::array(T::host_type())
    }
}

// ============================================================================
// Runtime values
// ============================================================================

impl FromHost for HostValue {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl IntoHost for HostValue {
    fn into_host(self) -> HostValue {
        self
    }
}

impl HostTyped for HostValue {
    fn host_type() -> HostType {
        HostType::Any
    }
}

impl FromHost for GuestValue {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        Ok(GuestValue::from_host(value.clone()))
    }
}

impl IntoHost for GuestValue {
    fn into_host(self) -> HostValue {
        HostValue::Guest(self)
    }
}

impl HostTyped for GuestValue {
    fn host_type() -> HostType {
        HostType::Guest
    }
}

impl FromHost for Adapter {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Function(adapter) => Ok(adapter.clone()),
            other => Err(ConversionError::mismatch("function", other.type_name())),
        }
    }
}

impl IntoHost for Adapter {
    fn into_host(self) -> HostValue {
        HostValue::Function(self)
    }
}

impl FromHost for GuestFunction {
    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Callable(f) => Ok(f.clone()),
            HostValue::Guest(guest) => guest
                .as_callable()
                .cloned()
                .ok_or_else(|| ConversionError::mismatch("callable", guest.type_name())),
            HostValue::Function(adapter) => adapter
                .origin()
                .cloned()
                .ok_or_else(|| ConversionError::mismatch("callable", value.type_name())),
            other => Err(ConversionError::mismatch("callable", other.type_name())),
        }
    }
}

// ============================================================================
// Argument tuples
// ============================================================================

/// A tuple of host-typed arguments.
pub trait HostArgs: Sized {
    /// Parameter types, in order.
    fn types() -> Vec<HostType>;

    /// Convert into host values.
    fn into_values(self) -> Vec<HostValue>;

    /// Extract from host values; the count must match exactly.
    fn from_values(values: &[HostValue]) -> Result<Self, ConversionError>;
}

impl HostArgs for () {
    fn types() -> Vec<HostType> {
        Vec::new()
    }

    fn into_values(self) -> Vec<HostValue> {
        Vec::new()
    }

    fn from_values(values: &[HostValue]) -> Result<Self, ConversionError> {
        if values.is_empty() {
            Ok(())
        } else {
            Err(ConversionError::mismatch("0 arguments", format!("{} arguments", values.len())))
        }
    }
}

macro_rules! impl_host_args {
    ($count:literal; $($name:ident : $idx:tt),+) => {
        impl<$($name),+> HostArgs for ($($name,)+)
        where
            $($name: FromHost + IntoHost + HostTyped),+
        {
            fn types() -> Vec<HostType> {
                vec![$($name::host_type()),+]
            }

            fn into_values(self) -> Vec<HostValue> {
                vec![$(self.$idx.into_host()),+]
            }

            fn from_values(values: &[HostValue]) -> Result<Self, ConversionError> {
                if values.len() != $count {
                    return Err(ConversionError::mismatch(
                        concat!($count, " arguments"),
                        format!("{} arguments", values.len()),
                    ));
                }
                Ok(($($name::from_host(&values[$idx])?,)+))
            }
        }
    };
}

impl_host_args!(1; A: 0);
impl_host_args!(2; A: 0, B: 1);
impl_host_args!(3; A: 0, B: 1, C: 2);
impl_host_args!(4; A: 0, B: 1, C: 2, D: 3);
