//! Typed function adapters.
//!
//! An [`Adapter`] is a host function value of a specific [`FunctionShape`].
//! Adapters synthesized from guest callables remember their origin so the
//! callable can be handed back to guest code unchanged.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::convert::{FromHost, HostArgs, HostTyped};
use crate::error::{ConversionError, HostError};
use crate::{FunctionShape, GuestFunction, HostValue};

/// The body of an adapter: receives exactly the shape's parameters.
pub type Trampoline = dyn Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync;

struct AdapterInner {
    shape: FunctionShape,
    origin: Option<GuestFunction>,
    trampoline: Box<Trampoline>,
}

/// A host function value with a fixed shape.
///
/// Cloning is cheap and preserves identity: clones compare equal under
/// [`Adapter::ptr_eq`].
#[derive(Clone)]
pub struct Adapter(Arc<AdapterInner>);

impl Adapter {
    /// Create an adapter wrapping a guest callable.
    pub fn new<F>(shape: FunctionShape, origin: Option<GuestFunction>, trampoline: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        Self(Arc::new(AdapterInner {
            shape,
            origin,
            trampoline: Box::new(trampoline),
        }))
    }

    /// Create an adapter backed by host code alone.
    pub fn from_fn<F>(shape: FunctionShape, f: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostError> + Send + Sync + 'static,
    {
        Self::new(shape, None, f)
    }

    /// The adapter's shape.
    pub fn shape(&self) -> &FunctionShape {
        &self.0.shape
    }

    /// The guest callable this adapter wraps, if any.
    pub fn origin(&self) -> Option<&GuestFunction> {
        self.0.origin.as_ref()
    }

    /// Whether two adapters are the same instance.
    pub fn ptr_eq(&self, other: &Adapter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Invoke the adapter with host arguments.
    ///
    /// The argument count must match the shape's parameter count.
    pub fn invoke(&self, args: &[HostValue]) -> Result<HostValue, HostError> {
        let expected = self
            .shape()
            .params()
            .map(<[_]>::len)
            .ok_or_else(|| ConversionError::NoInvokeMember {
                shape: self.shape().to_string(),
            })?;
        if args.len() != expected {
            return Err(HostError::ArityMismatch {
                shape: self.shape().to_string(),
                expected,
                got: args.len(),
            });
        }
        (self.0.trampoline)(args)
    }

    /// View this adapter through Rust argument and result types.
    ///
    /// Fails if `Args` and `R` do not describe the adapter's shape.
    pub fn typed<Args, R>(&self) -> Result<TypedAdapter<Args, R>, ConversionError>
    where
        Args: HostArgs,
        R: FromHost + HostTyped,
    {
        let params = self.shape().params().unwrap_or_default();
        let expected = Args::types();
        let ret_matches = match self.shape().return_type() {
            Some(ret) => *ret == R::host_type(),
            None => R::IS_VOID,
        };
        if params != expected.as_slice() || !ret_matches {
            return Err(ConversionError::mismatch(
                self.shape().to_string(),
                describe::<Args, R>(),
            ));
        }
        Ok(TypedAdapter {
            adapter: self.clone(),
            _marker: PhantomData,
        })
    }
}

fn describe<Args: HostArgs, R: HostTyped>() -> String {
    let params = Args::types();
    let shape = if R::IS_VOID {
        FunctionShape::action(params)
    } else {
        FunctionShape::func(params, R::host_type())
    };
    shape.to_string()
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("shape", &self.0.shape)
            .field("origin", &self.0.origin)
            .finish_non_exhaustive()
    }
}

/// A statically-typed view of an [`Adapter`].
pub struct TypedAdapter<Args, R> {
    adapter: Adapter,
    _marker: PhantomData<fn(Args) -> R>,
}

impl<Args, R> TypedAdapter<Args, R>
where
    Args: HostArgs,
    R: FromHost,
{
    /// Call the adapter.
    pub fn call(&self, args: Args) -> Result<R, HostError> {
        let result = self.adapter.invoke(&args.into_values())?;
        Ok(R::from_host(&result)?)
    }

    /// The underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }
}

impl<Args, R> Clone for TypedAdapter<Args, R> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HostType;

    fn adder() -> Adapter {
        Adapter::from_fn(
            FunctionShape::func(vec![HostType::INT32, HostType::INT32], HostType::INT32),
            |args| match (&args[0], &args[1]) {
                (HostValue::I32(a), HostValue::I32(b)) => Ok(HostValue::I32(a + b)),
                _ => Err(HostError::failed("bad args")),
            },
        )
    }

    #[test]
    fn invoke_checks_arity() {
        let add = adder();
        assert!(matches!(
            add.invoke(&[HostValue::I32(1)]),
            Err(HostError::ArityMismatch { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            add.invoke(&[HostValue::I32(1), HostValue::I32(2)]),
            Ok(HostValue::I32(3))
        ));
    }

    #[test]
    fn typed_view_calls_through() {
        let add = adder().typed::<(i32, i32), i32>().unwrap();
        assert_eq!(add.call((2, 3)).unwrap(), 5);
    }

    #[test]
    fn typed_view_rejects_wrong_signature() {
        let err = adder().typed::<(i32,), i32>().err().unwrap();
        assert!(err.to_string().contains("func<int32, int32, int32>"));
        assert!(adder().typed::<(i32, i32), String>().is_err());
    }

    #[test]
    fn clones_share_identity() {
        let a = adder();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&adder()));
        assert!(a.origin().is_none());
    }

    #[test]
    fn action_typed_with_unit() {
        let noop = Adapter::from_fn(FunctionShape::Action, |_| Ok(HostValue::Void));
        let typed = noop.typed::<(), ()>().unwrap();
        typed.call(()).unwrap();
    }
}
