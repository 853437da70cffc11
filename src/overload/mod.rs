//! Overload ranking for guest-to-host calls.
//!
//! The dispatcher asks an [`OverloadResolver`] to order the registered
//! overloads of a procedure before it tries to bind arguments to them. The
//! resolver only orders; the dispatcher still attempts real conversions and
//! skips candidates that fail, so a resolver never has to be exact.
//!
//! ## Algorithm ([`StructuralResolver`])
//!
//! 1. Keep candidates whose value arity equals the argument count
//! 2. Score each argument against its parameter type (lower is better)
//! 3. Sum the scores per candidate
//! 4. Sort by total score, ties broken by declaration order

mod ranking;

pub use ranking::{StructuralResolver, argument_cost};

use hostbridge_core::GuestValue;
use hostbridge_registry::HostProcedure;

/// Orders candidate overloads for an argument list, most specific first.
///
/// Implementations must be deterministic: the same candidates and arguments
/// always produce the same order.
pub trait OverloadResolver: Send + Sync {
    fn rank<'a>(&self, candidates: &'a [HostProcedure], args: &[GuestValue])
    -> Vec<&'a HostProcedure>;
}
