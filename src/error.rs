//! Error types for guest-to-host dispatch.

use thiserror::Error;

use hostbridge_core::{ConversionError, GuestError, HostError, RegistrationError};

/// Message of the guest `TypeError` raised when no overload accepts a call.
pub const NO_MATCHING_OVERLOAD: &str = "No public methods with the specified arguments were found.";

/// Errors surfaced by [`Interop`](crate::Interop) and the dispatcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InteropError {
    /// Every candidate was rejected in both passes.
    #[error("{NO_MATCHING_OVERLOAD} ({name} with {arg_count} argument(s))")]
    NoMatchingOverload { name: String, arg_count: usize },

    /// Nothing is registered under the requested name.
    #[error("unknown host procedure '{name}'")]
    UnknownProcedure { name: String },

    /// A guest error raised by a guest callable or produced by translation.
    #[error(transparent)]
    Guest(#[from] GuestError),

    /// The selected host procedure failed and the translator declined it.
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl InteropError {
    /// The error as guest code observes it.
    pub fn to_guest_error(&self) -> GuestError {
        match self {
            InteropError::NoMatchingOverload { .. } => GuestError::type_error(NO_MATCHING_OVERLOAD),
            InteropError::UnknownProcedure { name } => {
                GuestError::type_error(format!("{name} is not a function"))
            }
            InteropError::Guest(e) | InteropError::Host(HostError::Guest(e)) => e.clone(),
            InteropError::Host(e) => GuestError::error(e.message()),
            InteropError::Conversion(e) => GuestError::type_error(e.to_string()),
            InteropError::Registration(e) => GuestError::error(e.to_string()),
        }
    }
}

impl From<InteropError> for GuestError {
    fn from(err: InteropError) -> Self {
        err.to_guest_error()
    }
}
