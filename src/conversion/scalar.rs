//! Scalar conversions.
//!
//! This module handles the fallback step of value conversion: coercing one
//! scalar (number, bool, char, string, enum) to a primitive host type.
//!
//! - Numeric to numeric: range-checked; float to integer rounds half to even.
//! - Numeric/bool to string: invariant formatting.
//! - String to numeric/bool/char: invariant parsing, surrounding whitespace ignored.
//! - Char from a single-character string or an integer code point.

use hostbridge_core::{ConversionError, HostValue, PrimitiveKind};

/// A numeric value lifted out of its host representation.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn of(value: &HostValue) -> Option<Number> {
        Some(match value {
            HostValue::I8(v) => Number::Int((*v).into()),
            HostValue::I16(v) => Number::Int((*v).into()),
            HostValue::I32(v) => Number::Int((*v).into()),
            HostValue::I64(v) => Number::Int((*v).into()),
            HostValue::U8(v) => Number::Int((*v).into()),
            HostValue::U16(v) => Number::Int((*v).into()),
            HostValue::U32(v) => Number::Int((*v).into()),
            HostValue::U64(v) => Number::Int((*v).into()),
            HostValue::Enum { value, .. } => Number::Int((*value).into()),
            HostValue::F32(v) => Number::Float((*v).into()),
            HostValue::F64(v) => Number::Float(*v),
            _ => return None,
        })
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(v) => v == 0,
            Number::Float(v) => v == 0.0,
        }
    }

    /// Integral value for an integer target; floats round half to even.
    fn to_integer(self, target: PrimitiveKind) -> Result<i128, ConversionError> {
        match self {
            Number::Int(v) => Ok(v),
            Number::Float(v) => {
                let rounded = v.round_ties_even();
                // i128 covers every integer target; anything outside it overflows anyway
                if rounded.is_finite() && rounded.abs() < 1e38 {
                    Ok(rounded as i128)
                } else {
                    Err(overflow(v, target))
                }
            }
        }
    }
}

fn overflow(value: impl ToString, target: PrimitiveKind) -> ConversionError {
    ConversionError::IntegerOverflow {
        value: value.to_string(),
        target: target.name().to_string(),
    }
}

macro_rules! narrow {
    ($value:expr, $target:expr, $($kind:ident => $ty:ty, $variant:ident);* $(;)?) => {
        match $target {
            $(
                PrimitiveKind::$kind => <$ty>::try_from($value)
                    .map(HostValue::$variant)
                    .map_err(|_| overflow($value, $target)),
            )*
            _ => Err(ConversionError::unsupported("integer", $target.name())),
        }
    };
}

fn integer_to(value: i128, target: PrimitiveKind) -> Result<HostValue, ConversionError> {
    narrow!(value, target,
        Int8 => i8, I8;
        Int16 => i16, I16;
        Int32 => i32, I32;
        Int64 => i64, I64;
        UInt8 => u8, U8;
        UInt16 => u16, U16;
        UInt32 => u32, U32;
        UInt64 => u64, U64;
    )
}

fn number_to(number: Number, target: PrimitiveKind) -> Result<HostValue, ConversionError> {
    match target {
        PrimitiveKind::Float64 => Ok(HostValue::F64(number.as_f64())),
        PrimitiveKind::Float32 => {
            let v = number.as_f64();
            if v.is_finite() && v.abs() > f32::MAX as f64 {
                Err(overflow(v, target))
            } else {
                Ok(HostValue::F32(v as f32))
            }
        }
        PrimitiveKind::Bool => Ok(HostValue::Bool(!number.is_zero())),
        PrimitiveKind::String => Ok(HostValue::String(format_number(number))),
        PrimitiveKind::Char => {
            let code = number.to_integer(target)?;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(HostValue::Char)
                .ok_or_else(|| overflow(code, target))
        }
        kind if kind.is_integer() => integer_to(number.to_integer(kind)?, kind),
        kind => Err(ConversionError::unsupported("number", kind.name())),
    }
}

fn format_number(number: Number) -> String {
    match number {
        Number::Int(v) => v.to_string(),
        Number::Float(v) if v.is_nan() => "NaN".to_string(),
        Number::Float(v) if v.is_infinite() => {
            let sign = if v > 0.0 { "" } else { "-" };
            format!("{sign}Infinity")
        }
        Number::Float(v) => v.to_string(),
    }
}

fn parse_number(s: &str, target: PrimitiveKind) -> Result<Number, ConversionError> {
    let trimmed = s.trim();
    let parse_error = || ConversionError::Parse {
        value: s.to_string(),
        target: target.name().to_string(),
    };
    if target.is_integer() || target == PrimitiveKind::Char {
        trimmed.parse::<i128>().map(Number::Int).map_err(|_| parse_error())
    } else {
        match trimmed {
            "NaN" => Ok(Number::Float(f64::NAN)),
            "Infinity" => Ok(Number::Float(f64::INFINITY)),
            "-Infinity" => Ok(Number::Float(f64::NEG_INFINITY)),
            _ => trimmed.parse::<f64>().map(Number::Float).map_err(|_| parse_error()),
        }
    }
}

fn string_to(s: &str, target: PrimitiveKind) -> Result<HostValue, ConversionError> {
    match target {
        PrimitiveKind::String => Ok(HostValue::String(s.to_string())),
        PrimitiveKind::Bool => match s.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(HostValue::Bool(true)),
            t if t.eq_ignore_ascii_case("false") => Ok(HostValue::Bool(false)),
            _ => Err(ConversionError::Parse {
                value: s.to_string(),
                target: target.name().to_string(),
            }),
        },
        PrimitiveKind::Char => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(HostValue::Char(c)),
                _ => Err(ConversionError::Parse {
                    value: s.to_string(),
                    target: target.name().to_string(),
                }),
            }
        }
        kind => number_to(parse_number(s, kind)?, kind),
    }
}

/// Coerce a scalar host value to a primitive host type.
pub fn change_type(value: &HostValue, target: PrimitiveKind) -> Result<HostValue, ConversionError> {
    if let Some(number) = Number::of(value) {
        return number_to(number, target);
    }
    match value {
        HostValue::String(s) => string_to(s, target),
        HostValue::Bool(b) => match target {
            PrimitiveKind::Bool => Ok(HostValue::Bool(*b)),
            PrimitiveKind::String => Ok(HostValue::String(b.to_string())),
            PrimitiveKind::Char => Err(ConversionError::unsupported("bool", target.name())),
            kind => number_to(Number::Int(i128::from(*b)), kind),
        },
        HostValue::Char(c) => match target {
            PrimitiveKind::Char => Ok(HostValue::Char(*c)),
            PrimitiveKind::String => Ok(HostValue::String(c.to_string())),
            kind if kind.is_integer() => integer_to(u32::from(*c).into(), kind),
            kind => Err(ConversionError::unsupported("char", kind.name())),
        },
        other => Err(ConversionError::unsupported(other.type_name(), target.name())),
    }
}
