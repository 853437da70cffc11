//! Hostbridge Core
//!
//! Shared vocabulary for calls crossing the guest/host boundary.
//!
//! ## Modules
//!
//! - [`type_hash`]: Deterministic type and signature identity
//! - [`host_type`]: Host type descriptors and function shapes
//! - [`guest`]: Dynamically-typed guest values and callables
//! - [`host_value`]: Typed host values
//! - [`adapter`]: Host function values wrapping guest callables
//! - [`convert`]: Rust <-> host value conversion traits
//! - [`signature`]: Procedure overload signatures
//! - [`native_fn`]: Type-erased native procedures and their call context
//! - [`error`]: Error types shared by every layer

pub mod adapter;
pub mod convert;
pub mod error;
pub mod guest;
pub mod host_type;
pub mod host_value;
pub mod native_fn;
pub mod signature;
pub mod type_hash;

pub use adapter::{Adapter, Trampoline, TypedAdapter};
pub use convert::{FromHost, HostArgs, HostTyped, IntoHost};
pub use error::{ConversionError, GuestError, GuestErrorKind, HostError, RegistrationError};
pub use guest::{CallableId, GuestArray, GuestCallable, GuestFunction, GuestObject, GuestValue};
pub use host_type::{
    EnumType, FunctionShape, HostType, NamedShape, ObjectType, PrimitiveKind, ShapeMember,
};
pub use host_value::{ContextHandle, HostArray, HostObject, HostValue};
pub use native_fn::{CallContext, NativeCallable, NativeFn};
pub use signature::{CandidateSignature, Parameter, SignatureFlags};
pub use type_hash::{TypeHash, hash_constants, primitives};
