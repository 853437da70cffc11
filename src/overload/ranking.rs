//! Cost-based structural ranking.
//!
//! Each guest argument is scored against its parameter type without running
//! any conversion. Scores reuse one cost scale so that an exact match always
//! beats a lossy or parsing conversion, and anything that will most likely
//! fail to convert sinks to the bottom without being discarded.

use tracing::trace;

use hostbridge_core::{GuestObject, GuestValue, HostType, Parameter, PrimitiveKind};
use hostbridge_registry::HostProcedure;

use super::OverloadResolver;

/// Default [`OverloadResolver`]: sums per-argument conversion costs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralResolver;

impl StructuralResolver {
    /// Exact match, no conversion needed.
    pub const COST_EXACT: u32 = 0;
    /// Nullable wrapper around an otherwise matching type.
    pub const COST_NULLABLE_WRAP: u32 = 1;
    /// Integral number to an enum containing it.
    pub const COST_ENUM: u32 = 3;
    /// Number to a narrower float.
    pub const COST_PRIMITIVE_NARROWING: u32 = 5;
    /// Integral number to an integer type that holds it.
    pub const COST_FLOAT_TO_INT: u32 = 9;
    /// Array to a typed array; elements are converted one by one.
    pub const COST_REFERENCE_CAST: u32 = 10;
    /// Cross-domain scalar conversion (parse or format).
    pub const COST_OBJECT_TO_PRIMITIVE: u32 = 11;
    /// Anything to `object` or a guest pass-through parameter.
    pub const COST_TO_OBJECT: u32 = 12;
    /// Conversion is expected to fail.
    pub const COST_EXPLICIT_ONLY: u32 = 100;

    pub fn new() -> Self {
        Self
    }

    fn score(procedure: &HostProcedure, args: &[GuestValue]) -> u32 {
        procedure
            .signature
            .value_params()
            .iter()
            .zip(args)
            .map(|(param, arg)| match param {
                Parameter::Typed(ty) => argument_cost(arg, ty),
                Parameter::Context => Self::COST_EXPLICIT_ONLY,
            })
            .sum()
    }
}

impl OverloadResolver for StructuralResolver {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn rank<'a>(
        &self,
        candidates: &'a [HostProcedure],
        args: &[GuestValue],
    ) -> Vec<&'a HostProcedure> {
        let mut scored: Vec<(u32, &HostProcedure)> = candidates
            .iter()
            .filter(|c| c.signature.value_arity() == args.len())
            .map(|c| (Self::score(c, args), c))
            .collect();
        scored.sort_by_key(|(cost, c)| (*cost, c.declaration_index));

        for (cost, c) in &scored {
            trace!(candidate = %c.signature, cost, "ranked overload");
        }
        scored.into_iter().map(|(_, c)| c).collect()
    }
}

/// Cost of passing `arg` to a parameter of type `ty` (lower is better).
pub fn argument_cost(arg: &GuestValue, ty: &HostType) -> u32 {
    type R = StructuralResolver;

    match ty {
        HostType::Any | HostType::Guest => return R::COST_TO_OBJECT,
        HostType::GuestArgs => {
            return if arg.is_array() {
                R::COST_EXACT
            } else {
                R::COST_EXPLICIT_ONLY
            };
        }
        HostType::Nullable(inner) => {
            return if arg.is_nullish() {
                R::COST_EXACT
            } else {
                argument_cost(arg, inner).saturating_add(R::COST_NULLABLE_WRAP)
            };
        }
        _ => {}
    }

    match (arg, ty) {
        (GuestValue::Undefined | GuestValue::Null, ty) => {
            if ty.accepts_null() {
                R::COST_EXACT
            } else {
                R::COST_EXPLICIT_ONLY
            }
        }
        (GuestValue::Number(n), HostType::Primitive(kind)) => number_cost(*n, *kind),
        (GuestValue::Number(n), HostType::Enum(e)) => {
            if n.fract() == 0.0 && e.contains(*n as i64) {
                R::COST_ENUM
            } else {
                R::COST_EXPLICIT_ONLY
            }
        }
        (GuestValue::String(s), HostType::Primitive(kind)) => match kind {
            PrimitiveKind::String => R::COST_EXACT,
            PrimitiveKind::Char if s.chars().count() == 1 => R::COST_PRIMITIVE_NARROWING,
            PrimitiveKind::Char => R::COST_EXPLICIT_ONLY,
            _ => R::COST_OBJECT_TO_PRIMITIVE,
        },
        (GuestValue::String(_), HostType::Enum(_)) => R::COST_OBJECT_TO_PRIMITIVE,
        (GuestValue::Boolean(_), HostType::Primitive(kind)) => match kind {
            PrimitiveKind::Bool => R::COST_EXACT,
            PrimitiveKind::Char => R::COST_EXPLICIT_ONLY,
            _ => R::COST_OBJECT_TO_PRIMITIVE,
        },
        (GuestValue::Object(GuestObject::Array(_)), HostType::Array(element)) => {
            if **element == HostType::Any {
                R::COST_EXACT
            } else {
                R::COST_REFERENCE_CAST
            }
        }
        (GuestValue::Object(GuestObject::Callable(_)), HostType::Function(_)) => R::COST_EXACT,
        (GuestValue::Object(GuestObject::Host(value)), ty) => {
            if value.satisfies(ty) {
                R::COST_EXACT
            } else if matches!(ty, HostType::Primitive(_) | HostType::Enum(_)) {
                R::COST_OBJECT_TO_PRIMITIVE
            } else {
                R::COST_EXPLICIT_ONLY
            }
        }
        _ => R::COST_EXPLICIT_ONLY,
    }
}

fn number_cost(n: f64, kind: PrimitiveKind) -> u32 {
    type R = StructuralResolver;

    match kind {
        PrimitiveKind::Float64 => R::COST_EXACT,
        PrimitiveKind::Float32 => R::COST_PRIMITIVE_NARROWING,
        PrimitiveKind::Bool | PrimitiveKind::String | PrimitiveKind::Char => {
            R::COST_OBJECT_TO_PRIMITIVE
        }
        kind if integral_fits(n, kind) => R::COST_FLOAT_TO_INT,
        _ => R::COST_EXPLICIT_ONLY,
    }
}

fn integral_fits(n: f64, kind: PrimitiveKind) -> bool {
    if n.fract() != 0.0 || !n.is_finite() {
        return false;
    }
    let (min, max) = match kind {
        PrimitiveKind::Int8 => (i8::MIN as f64, i8::MAX as f64),
        PrimitiveKind::Int16 => (i16::MIN as f64, i16::MAX as f64),
        PrimitiveKind::Int32 => (i32::MIN as f64, i32::MAX as f64),
        PrimitiveKind::Int64 => (i64::MIN as f64, i64::MAX as f64),
        PrimitiveKind::UInt8 => (0.0, u8::MAX as f64),
        PrimitiveKind::UInt16 => (0.0, u16::MAX as f64),
        PrimitiveKind::UInt32 => (0.0, u32::MAX as f64),
        PrimitiveKind::UInt64 => (0.0, u64::MAX as f64),
        _ => return false,
    };
    (min..=max).contains(&n)
}
