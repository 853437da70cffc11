//! The interop facade.
//!
//! [`Interop`] ties a [`SignatureSource`] to one [`ConversionEngine`], an
//! [`OverloadResolver`] and [`InteropOptions`]. It is cheap to clone and can be
//! shared across threads; all clones share the same caches.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use tracing::debug;

use hostbridge_core::{
    Adapter, ContextHandle, ConversionError, FunctionShape, GuestError, GuestFunction, GuestValue,
    HostType, HostValue,
};
use hostbridge_registry::{HostProcedure, SignatureSource};

use crate::conversion::{CallableConversion, ConversionEngine};
use crate::dispatch::Dispatcher;
use crate::error::InteropError;
use crate::options::InteropOptions;
use crate::overload::{OverloadResolver, StructuralResolver};

/// Guest-to-host call entry point.
#[derive(Clone)]
pub struct Interop {
    inner: Arc<InteropInner>,
}

struct InteropInner {
    engine: Arc<ConversionEngine>,
    source: Box<dyn SignatureSource>,
    resolver: Box<dyn OverloadResolver>,
    options: InteropOptions,
    context: ContextHandle,
}

impl Interop {
    /// An interop over `source` with default options and the structural resolver.
    pub fn new<S: SignatureSource + 'static>(source: S) -> Self {
        Self::builder(source).build()
    }

    pub fn builder<S: SignatureSource + 'static>(source: S) -> InteropBuilder {
        InteropBuilder {
            source: Box::new(source),
            resolver: None,
            options: InteropOptions::default(),
            context: None,
            conversions: Vec::new(),
        }
    }

    /// Call the host procedure group `name` with guest arguments.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(
        &self,
        name: &str,
        this: &GuestValue,
        args: &[GuestValue],
    ) -> Result<GuestValue, InteropError> {
        let candidates = self
            .inner
            .source
            .candidates(name)
            .ok_or_else(|| InteropError::UnknownProcedure {
                name: name.to_string(),
            })?;
        self.dispatch(name, candidates, this, args)
    }

    /// Dispatch over an explicit candidate list.
    pub fn dispatch(
        &self,
        name: &str,
        candidates: &[HostProcedure],
        this: &GuestValue,
        args: &[GuestValue],
    ) -> Result<GuestValue, InteropError> {
        let inner = &*self.inner;
        Dispatcher::new(
            &inner.engine,
            inner.resolver.as_ref(),
            &inner.options,
            &inner.context,
        )
        .dispatch(name, candidates, this, args)
    }

    /// The procedure group `name` as a guest callable.
    ///
    /// The callable does not keep the interop alive; calling it after every
    /// `Interop` clone is dropped raises a guest error.
    pub fn host_function(&self, name: &str) -> Result<GuestFunction, InteropError> {
        if self.inner.source.candidates(name).is_none() {
            return Err(InteropError::UnknownProcedure {
                name: name.to_string(),
            });
        }
        let weak: Weak<InteropInner> = Arc::downgrade(&self.inner);
        let name = name.to_string();
        Ok(GuestFunction::new(move |this: &GuestValue, args: &[GuestValue]| {
            let inner = weak
                .upgrade()
                .ok_or_else(|| GuestError::error(format!("{name}: interop has been dropped")))?;
            Interop { inner }
                .call(&name, this, args)
                .map_err(GuestError::from)
        }))
    }

    /// Convert a guest callable to a host function of `shape`.
    pub fn adapter(&self, callable: &GuestFunction, shape: &FunctionShape) -> Result<Adapter, InteropError> {
        let target = HostType::Function(shape.clone());
        match self.inner.engine.convert(&HostValue::Callable(callable.clone()), &target)? {
            HostValue::Function(adapter) => Ok(adapter),
            other => Err(ConversionError::mismatch(shape.to_string(), other.type_name()).into()),
        }
    }

    pub fn engine(&self) -> &ConversionEngine {
        &self.inner.engine
    }

    pub fn options(&self) -> &InteropOptions {
        &self.inner.options
    }

    /// The handle injected into context-taking procedures.
    pub fn context(&self) -> &ContextHandle {
        &self.inner.context
    }
}

impl fmt::Debug for Interop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interop")
            .field("engine", &self.inner.engine)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Interop`].
pub struct InteropBuilder {
    source: Box<dyn SignatureSource>,
    resolver: Option<Box<dyn OverloadResolver>>,
    options: InteropOptions,
    context: Option<ContextHandle>,
    conversions: Vec<(FunctionShape, Arc<CallableConversion>)>,
}

impl InteropBuilder {
    pub fn options(mut self, options: InteropOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the structural resolver.
    pub fn resolver<R: OverloadResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// The value handed to context-taking procedures. Defaults to the
    /// interop's [`ConversionEngine`].
    pub fn context<T: Any + Send + Sync>(mut self, value: Arc<T>) -> Self {
        self.context = Some(ContextHandle::new(value));
        self
    }

    /// Register a custom conversion from guest callables to `shape`.
    ///
    /// The first conversion registered for a shape wins.
    pub fn callable_conversion<F>(mut self, shape: FunctionShape, conversion: F) -> Self
    where
        F: Fn(&GuestFunction) -> Result<Adapter, ConversionError> + Send + Sync + 'static,
    {
        self.conversions.push((shape, Arc::new(conversion)));
        self
    }

    pub fn build(self) -> Interop {
        let engine = Arc::new(ConversionEngine::new());
        for (shape, conversion) in self.conversions {
            engine.register_callable_conversion_arc(&shape, conversion);
        }
        let context = self
            .context
            .unwrap_or_else(|| ContextHandle::new(Arc::clone(&engine)));
        debug!(options = ?self.options, "interop built");

        Interop {
            inner: Arc::new(InteropInner {
                engine,
                source: self.source,
                resolver: self
                    .resolver
                    .unwrap_or_else(|| Box::new(StructuralResolver::new())),
                options: self.options,
                context,
            }),
        }
    }
}
