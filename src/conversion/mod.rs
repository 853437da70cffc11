//! Value conversion.
//!
//! [`ConversionEngine`] coerces host values to requested host types. The
//! conversion order is:
//!
//! 1. null: accepted by nullable-capable targets, rejected by value types
//! 2. identity: a value that already satisfies the target is returned as is
//! 3. enum targets: coerce to a 32-bit integer, then check the enum's domain
//! 4. function targets: adapt a guest callable (cached per callable and shape)
//! 5. array targets: convert every element of an untyped value array
//! 6. nullable targets: unwrap and retry from step 2
//! 7. scalar fallback ([`scalar::change_type`])
//!
//! ## Memoization
//!
//! [`ConversionEngine::try_convert`] remembers, per (source runtime type,
//! target type) pair, whether conversion succeeded. Only the yes/no outcome is
//! cached: a `true` hit re-runs the conversion, a `false` hit returns `None`
//! without attempting it. Entries are never evicted.

pub mod scalar;

use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use hostbridge_core::{
    Adapter, ConversionError, EnumType, FunctionShape, GuestFunction, GuestValue, HostArray,
    HostType, HostValue, PrimitiveKind, TypeHash,
};

use crate::adapter::{AdapterSynthesizer, synthesize};

/// A user-supplied conversion from a guest callable to one function shape.
pub type CallableConversion =
    dyn Fn(&GuestFunction) -> Result<Adapter, ConversionError> + Send + Sync;

/// Where a conversion gets adapters for guest callables.
pub(crate) trait AdapterSource {
    fn adapt(&self, callable: &GuestFunction, shape: &FunctionShape)
    -> Result<Adapter, ConversionError>;
}

/// Cache key: source runtime type (or the null marker) and target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversionKey {
    /// Runtime type of the source value.
    pub source: TypeHash,
    /// Requested type.
    pub target: TypeHash,
}

impl ConversionKey {
    pub fn new(value: &HostValue, target: &HostType) -> Self {
        Self {
            source: value.type_hash(),
            target: target.type_hash(),
        }
    }
}

/// Converts host values to host types, memoizing convertibility.
pub struct ConversionEngine {
    known: RwLock<FxHashMap<ConversionKey, bool>>,
    // Reentrant: custom callable conversions may convert through this engine
    population: ReentrantMutex<()>,
    adapters: AdapterSynthesizer,
    callable_conversions: RwLock<FxHashMap<TypeHash, Arc<CallableConversion>>>,
}

impl ConversionEngine {
    pub fn new() -> Self {
        Self {
            known: RwLock::new(FxHashMap::default()),
            population: ReentrantMutex::new(()),
            adapters: AdapterSynthesizer::new(),
            callable_conversions: RwLock::new(FxHashMap::default()),
        }
    }

    /// Convert `value` to `target`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn convert(&self, value: &HostValue, target: &HostType) -> Result<HostValue, ConversionError> {
        convert_with(value, target, self)
    }

    /// Convert `value` to `target`, memoizing whether the pair converts.
    ///
    /// Never fails; `None` means the value does not convert, or that a value
    /// of the same runtime type failed to convert before.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_convert(&self, value: &HostValue, target: &HostType) -> Option<HostValue> {
        let key = ConversionKey::new(value, target);

        // Release the read guard before replaying; replay may convert reentrantly
        let known = self.known.read().get(&key).copied();
        if let Some(known) = known {
            return self.replay(known, value, target);
        }

        let _population = self.population.lock();
        // Another thread may have populated the entry while we waited
        let known = self.known.read().get(&key).copied();
        if let Some(known) = known {
            return self.replay(known, value, target);
        }

        let result = self.convert(value, target);
        debug!(
            source = %value.type_name(),
            %target,
            convertible = result.is_ok(),
            "conversion cache miss"
        );
        self.known.write().insert(key, result.is_ok());
        result.ok()
    }

    fn replay(&self, known: bool, value: &HostValue, target: &HostType) -> Option<HostValue> {
        trace!(source = %value.type_name(), %target, known, "conversion cache hit");
        if known {
            self.convert(value, target).ok()
        } else {
            None
        }
    }

    /// The cached outcome for a (value, target) pair, if any.
    pub fn cached_outcome(&self, value: &HostValue, target: &HostType) -> Option<bool> {
        self.known.read().get(&ConversionKey::new(value, target)).copied()
    }

    /// Number of memoized pairs.
    pub fn cache_len(&self) -> usize {
        self.known.read().len()
    }

    /// Register a custom conversion used when a guest callable is requested as
    /// `shape`. The first registration for a shape wins; later ones are
    /// ignored and `false` is returned.
    pub fn register_callable_conversion<F>(&self, shape: &FunctionShape, conversion: F) -> bool
    where
        F: Fn(&GuestFunction) -> Result<Adapter, ConversionError> + Send + Sync + 'static,
    {
        self.register_callable_conversion_arc(shape, Arc::new(conversion))
    }

    pub(crate) fn register_callable_conversion_arc(
        &self,
        shape: &FunctionShape,
        conversion: Arc<CallableConversion>,
    ) -> bool {
        let mut conversions = self.callable_conversions.write();
        let hash = shape.type_hash();
        if conversions.contains_key(&hash) {
            debug!(%shape, "callable conversion already registered; keeping the first");
            return false;
        }
        conversions.insert(hash, conversion);
        true
    }

    /// The adapter cache.
    pub fn adapters(&self) -> &AdapterSynthesizer {
        &self.adapters
    }
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionEngine")
            .field("known", &self.cache_len())
            .field("adapters", &self.adapters)
            .field("callable_conversions", &self.callable_conversions.read().len())
            .finish()
    }
}

impl AdapterSource for ConversionEngine {
    fn adapt(
        &self,
        callable: &GuestFunction,
        shape: &FunctionShape,
    ) -> Result<Adapter, ConversionError> {
        if let Some(adapter) = self.adapters.cached(callable, shape) {
            return Ok(adapter);
        }

        let custom = self
            .callable_conversions
            .read()
            .get(&shape.type_hash())
            .cloned();
        let adapter = match custom {
            Some(conversion) => {
                let adapter = conversion(callable)?;
                if adapter.shape().type_hash() != shape.type_hash() {
                    return Err(ConversionError::mismatch(
                        shape.to_string(),
                        adapter.shape().to_string(),
                    ));
                }
                adapter
            }
            None => synthesize(callable, shape)?,
        };
        Ok(self.adapters.insert(callable, shape, adapter))
    }
}

// ============================================================================
// Conversion steps
// ============================================================================

pub(crate) fn convert_with(
    value: &HostValue,
    target: &HostType,
    adapters: &dyn AdapterSource,
) -> Result<HostValue, ConversionError> {
    if value.is_null() {
        return if target.accepts_null() {
            Ok(HostValue::Null)
        } else {
            Err(ConversionError::NullToValueType {
                target: target.to_string(),
            })
        };
    }
    convert_present(value, target, adapters)
}

fn convert_present(
    value: &HostValue,
    target: &HostType,
    adapters: &dyn AdapterSource,
) -> Result<HostValue, ConversionError> {
    if value.satisfies(target) {
        return Ok(value.clone());
    }

    match target {
        HostType::Enum(ty) => to_enum(value, ty),
        HostType::Function(shape) => match callable_of(value) {
            Some(callable) => Ok(HostValue::Function(adapters.adapt(&callable, shape)?)),
            None => Err(ConversionError::mismatch(shape.to_string(), value.type_name())),
        },
        HostType::Array(element) => to_array(value, element, adapters),
        HostType::Nullable(inner) => convert_present(value, inner, adapters),
        HostType::Guest => Ok(HostValue::Guest(GuestValue::from_host(value.clone()))),
        HostType::GuestArgs => match value {
            HostValue::Values(items) => Ok(HostValue::GuestArgs(
                items.iter().cloned().map(GuestValue::from_host).collect(),
            )),
            other => Err(ConversionError::NotAnArray {
                actual: other.type_name(),
            }),
        },
        HostType::Primitive(kind) => scalar::change_type(value, *kind),
        HostType::Any => Ok(value.clone()),
        HostType::Object(ty) => Err(ConversionError::mismatch(ty.name(), value.type_name())),
    }
}

fn callable_of(value: &HostValue) -> Option<GuestFunction> {
    match value {
        HostValue::Callable(f) => Some(f.clone()),
        HostValue::Guest(guest) => guest.as_callable().cloned(),
        HostValue::Function(adapter) => adapter.origin().cloned(),
        _ => None,
    }
}

fn to_enum(value: &HostValue, ty: &EnumType) -> Result<HostValue, ConversionError> {
    let raw = match scalar::change_type(value, PrimitiveKind::Int32)? {
        HostValue::I32(v) => i64::from(v),
        other => return Err(ConversionError::mismatch("int32", other.type_name())),
    };
    if !ty.contains(raw) {
        return Err(ConversionError::InvalidEnumValue {
            value: raw,
            enum_name: ty.name().to_string(),
        });
    }
    Ok(HostValue::Enum {
        ty: ty.clone(),
        value: raw,
    })
}

fn to_array(
    value: &HostValue,
    element: &HostType,
    adapters: &dyn AdapterSource,
) -> Result<HostValue, ConversionError> {
    let HostValue::Values(items) = value else {
        return Err(ConversionError::NotAnArray {
            actual: value.type_name(),
        });
    };
    let converted = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            convert_with(item, element, adapters).map_err(|e| ConversionError::ArrayElement {
                index,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(HostValue::Array(HostArray::new(element.clone(), converted)))
}
