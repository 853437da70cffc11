//! Hostbridge: guest-to-host call dispatch.
//!
//! Lets a dynamically-typed guest language call statically-typed host
//! procedures, and lets host code hold guest callables as typed functions.
//!
//! - [`conversion`]: [`ConversionEngine`], value coercion with a convertibility cache
//! - [`adapter`]: [`AdapterSynthesizer`], typed host functions wrapping guest callables
//! - [`overload`]: the [`OverloadResolver`] contract and [`StructuralResolver`]
//! - [`dispatch`]: the [`Dispatcher`] selecting and invoking one overload
//! - [`Interop`]: the facade tying a procedure registry to the above
//!
//! # Example
//!
//! ```
//! use hostbridge::{GuestValue, HostType, Interop, ProcedureBuilder, ProcedureRegistry};
//!
//! let mut registry = ProcedureRegistry::new();
//! ProcedureBuilder::new("repeat")
//!     .param(HostType::STRING)
//!     .param(HostType::INT32)
//!     .returns(HostType::STRING)
//!     .native(|ctx| {
//!         let text: String = ctx.arg(0)?;
//!         let times: i32 = ctx.arg(1)?;
//!         ctx.set_return(text.repeat(times.max(0) as usize));
//!         Ok(())
//!     })
//!     .register(&mut registry)
//!     .unwrap();
//!
//! let interop = Interop::new(registry);
//! let result = interop
//!     .call("repeat", &GuestValue::Undefined, &["ab".into(), 3.into()])
//!     .unwrap();
//! assert_eq!(result, GuestValue::from("ababab"));
//! ```

pub mod adapter;
pub mod conversion;
pub mod dispatch;
mod engine;
mod error;
mod options;
pub mod overload;

pub use adapter::{AdapterSynthesizer, synthesize};
pub use conversion::{CallableConversion, ConversionEngine, ConversionKey};
pub use dispatch::{Dispatcher, fold_variadic};
pub use engine::{Interop, InteropBuilder};
pub use error::{InteropError, NO_MATCHING_OVERLOAD};
pub use options::{ExceptionTranslator, InteropOptions, PassOrder};
pub use overload::{OverloadResolver, StructuralResolver, argument_cost};

pub use hostbridge_core::{
    Adapter, CandidateSignature, ContextHandle, ConversionError, EnumType, FromHost,
    FunctionShape, GuestArray, GuestError, GuestErrorKind, GuestFunction, GuestValue, HostError,
    HostType, HostValue, IntoHost, NamedShape, Parameter, PrimitiveKind, ShapeMember,
    SignatureFlags, TypedAdapter,
};
pub use hostbridge_registry::{HostProcedure, ProcedureBuilder, ProcedureRegistry, SignatureSource};
