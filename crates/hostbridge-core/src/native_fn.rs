//! Native procedure storage and execution context.
//!
//! Host procedures are stored type-erased as [`NativeFn`]s. A call receives a
//! [`CallContext`] holding the converted arguments and a return slot.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::convert::{FromHost, IntoHost};
use crate::error::HostError;
use crate::{ContextHandle, GuestValue, HostValue, TypeHash};

/// Type-erased native procedure.
///
/// The inner callable is wrapped in `Arc` so registrations can share it.
#[derive(Clone)]
pub struct NativeFn {
    /// Identity, normally the signature hash of the procedure it implements.
    pub id: TypeHash,
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    /// Create a new NativeFn from a callable.
    pub fn new<F>(id: TypeHash, f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self {
            id,
            inner: Arc::new(f),
        }
    }

    /// Call this native function with the given context.
    pub fn call(&self, ctx: &mut CallContext) -> Result<(), HostError> {
        self.inner.call(ctx)
    }

    /// Call through the invocation boundary.
    ///
    /// Any failure, including a panic, comes back wrapped in exactly one
    /// [`HostError::Invocation`] level.
    pub fn invoke(&self, ctx: &mut CallContext) -> Result<(), HostError> {
        match catch_unwind(AssertUnwindSafe(|| self.inner.call(ctx))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(HostError::Invocation(Box::new(err))),
            Err(payload) => Err(HostError::Invocation(Box::new(HostError::Panic {
                message: panic_message(payload.as_ref()),
            }))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Trait for callable native procedures.
pub trait NativeCallable {
    /// Call this function with the given context.
    fn call(&self, ctx: &mut CallContext) -> Result<(), HostError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext) -> Result<(), HostError>,
{
    fn call(&self, ctx: &mut CallContext) -> Result<(), HostError> {
        (self)(ctx)
    }
}

/// Context for native procedure calls.
///
/// Bridges the dispatcher and Rust: arguments are already converted to the
/// declared parameter types. When the procedure declares a context slot, the
/// handle is available through [`CallContext::context`] and is not counted
/// among the arguments.
pub struct CallContext<'a> {
    args: &'a [HostValue],
    context: Option<&'a ContextHandle>,
    receiver: Option<&'a GuestValue>,
    return_slot: &'a mut HostValue,
}

impl<'a> CallContext<'a> {
    /// Create a new call context.
    pub fn new(
        args: &'a [HostValue],
        context: Option<&'a ContextHandle>,
        return_slot: &'a mut HostValue,
    ) -> Self {
        Self {
            args,
            context,
            receiver: None,
            return_slot,
        }
    }

    /// Attach the guest receiver the call was made on.
    pub fn with_receiver(mut self, receiver: &'a GuestValue) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// The guest receiver, if the dispatcher supplied one.
    pub fn this(&self) -> Option<&GuestValue> {
        self.receiver
    }

    /// Number of value arguments.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Raw access to an argument.
    pub fn arg_value(&self, index: usize) -> Result<&HostValue, HostError> {
        self.args
            .get(index)
            .ok_or(HostError::ArgumentIndexOutOfBounds {
                index,
                count: self.args.len(),
            })
    }

    /// Extract a typed argument.
    pub fn arg<T: FromHost>(&self, index: usize) -> Result<T, HostError> {
        Ok(T::from_host(self.arg_value(index)?)?)
    }

    /// All arguments.
    pub fn args(&self) -> &[HostValue] {
        self.args
    }

    /// The injected context, if the procedure declared one.
    pub fn context(&self) -> Option<&ContextHandle> {
        self.context
    }

    /// Downcast the injected context.
    pub fn context_as<T: Any + Send + Sync>(&self) -> Result<Arc<T>, HostError> {
        self.context
            .and_then(ContextHandle::downcast_arc::<T>)
            .ok_or_else(|| HostError::invalid_this("context handle missing or of unexpected type"))
    }

    /// Store the return value.
    pub fn set_return<T: IntoHost>(&mut self, value: T) {
        *self.return_slot = value.into_host();
    }

    /// Store a raw return value.
    pub fn set_return_value(&mut self, value: HostValue) {
        *self.return_slot = value;
    }
}
