//! Adapter synthesis.
//!
//! Turns a guest callable into a host function value of a requested
//! [`FunctionShape`]. Every adapter routes through one trampoline:
//!
//! 1. host arguments are converted to their declared parameter types, turned
//!    into guest values and packed into the guest argument array,
//! 2. the guest callable is invoked with an undefined receiver,
//! 3. the guest result is coerced to the declared return type, or discarded
//!    for actions.
//!
//! Building an adapter never invokes the guest callable.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use hostbridge_core::{
    Adapter, CallableId, ConversionError, FunctionShape, GuestFunction, GuestValue, HostError,
    HostType, HostValue, TypeHash,
};

use crate::conversion::{AdapterSource, convert_with};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AdapterKey {
    callable: CallableId,
    shape: TypeHash,
}

impl AdapterKey {
    fn new(callable: &GuestFunction, shape: &FunctionShape) -> Self {
        Self {
            callable: callable.id(),
            shape: shape.type_hash(),
        }
    }
}

/// Builds adapters and caches them per guest callable and shape.
///
/// Cached adapters hold their guest callable, so a [`CallableId`] in the
/// cache can never be reused by a different callable.
#[derive(Default)]
pub struct AdapterSynthesizer {
    cache: Mutex<FxHashMap<AdapterKey, Adapter>>,
}

impl AdapterSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The adapter for `callable` as `shape`, built on first request.
    ///
    /// Repeated requests for the same callable and shape return the same
    /// adapter instance.
    pub fn adapter_for(
        &self,
        callable: &GuestFunction,
        shape: &FunctionShape,
    ) -> Result<Adapter, ConversionError> {
        if let Some(adapter) = self.cached(callable, shape) {
            return Ok(adapter);
        }
        let adapter = synthesize(callable, shape)?;
        Ok(self.insert(callable, shape, adapter))
    }

    /// A previously built adapter, if any.
    pub fn cached(&self, callable: &GuestFunction, shape: &FunctionShape) -> Option<Adapter> {
        let adapter = self.cache.lock().get(&AdapterKey::new(callable, shape)).cloned();
        if adapter.is_some() {
            trace!(callable = ?callable.id(), %shape, "adapter cache hit");
        }
        adapter
    }

    /// Cache `adapter` unless another one won the race; returns the cached one.
    pub(crate) fn insert(
        &self,
        callable: &GuestFunction,
        shape: &FunctionShape,
        adapter: Adapter,
    ) -> Adapter {
        self.cache
            .lock()
            .entry(AdapterKey::new(callable, shape))
            .or_insert(adapter)
            .clone()
    }

    /// Number of cached adapters.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl std::fmt::Debug for AdapterSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterSynthesizer")
            .field("cached", &self.len())
            .finish()
    }
}

/// Build a fresh, uncached adapter for `callable` as `shape`.
///
/// Named shapes are resolved through their single abstract invoke member.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn synthesize(
    callable: &GuestFunction,
    shape: &FunctionShape,
) -> Result<Adapter, ConversionError> {
    let params = shape.params().ok_or_else(|| ConversionError::NoInvokeMember {
        shape: shape.to_string(),
    })?;
    debug!(callable = ?callable.id(), %shape, arity = params.len(), "synthesizing adapter");

    let target = callable.clone();
    if matches!(shape, FunctionShape::Action) {
        return Ok(Adapter::new(shape.clone(), Some(callable.clone()), move |_| {
            target.call(&GuestValue::Undefined, &[])?;
            Ok(HostValue::Void)
        }));
    }

    let params = params.to_vec();
    let ret = shape.return_type().cloned();
    Ok(Adapter::new(
        shape.clone(),
        Some(callable.clone()),
        move |args: &[HostValue]| {
            let guest_args = args
                .iter()
                .zip(&params)
                .map(|(arg, ty)| coerce_argument(arg, ty))
                .collect::<Result<Vec<_>, _>>()?;
            let result = target.call(&GuestValue::Undefined, &guest_args)?;
            match &ret {
                None => Ok(HostValue::Void),
                Some(ty) => coerce_result(result, ty),
            }
        },
    ))
}

/// Coerce a host argument to its declared parameter type, then hand it to the guest.
fn coerce_argument(arg: &HostValue, ty: &HostType) -> Result<GuestValue, ConversionError> {
    let converted = convert_with(arg, ty, &Unmemoized)?;
    Ok(GuestValue::from_host(converted))
}

/// Coerce a guest result to an adapter's declared return type.
fn coerce_result(result: GuestValue, ty: &HostType) -> Result<HostValue, HostError> {
    match ty {
        HostType::Guest => Ok(HostValue::Guest(result)),
        _ => Ok(convert_with(&result.to_host(), ty, &Unmemoized)?),
    }
}

/// Adapter source for return values: synthesizes without touching any cache.
struct Unmemoized;

impl AdapterSource for Unmemoized {
    fn adapt(
        &self,
        callable: &GuestFunction,
        shape: &FunctionShape,
    ) -> Result<Adapter, ConversionError> {
        synthesize(callable, shape)
    }
}
