//! Error types shared by every hostbridge layer.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ConversionError    - a value cannot be coerced to a requested host type
//! GuestError         - an error raised by (or surfaced to) guest code
//! HostError          - a host procedure or adapter failed
//! RegistrationError  - a procedure could not be registered
//! ```
//!
//! `ConversionError` never reaches guest code during dispatch: the dispatcher
//! consumes it to move on to the next candidate. `HostError` crosses into guest
//! code after exception translation.

use thiserror::Error;

// ============================================================================
// Conversion Errors
// ============================================================================

/// Errors produced when coercing a value to a host type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Null was offered for a type that does not accept null.
    #[error("unable to convert null to '{target}'")]
    NullToValueType {
        /// The requested type.
        target: String,
    },

    /// The value has the wrong runtime type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The requested type.
        expected: String,
        /// The runtime type of the offered value.
        actual: String,
    },

    /// A numeric value does not fit the target type.
    #[error("integer overflow: {value} doesn't fit in {target}")]
    IntegerOverflow {
        /// The offending value, formatted.
        value: String,
        /// The target type.
        target: String,
    },

    /// An integer is outside the enum's declared domain.
    #[error("{value} is not a valid value of enum '{enum_name}'")]
    InvalidEnumValue {
        /// The integer that was offered.
        value: i64,
        /// The enum type name.
        enum_name: String,
    },

    /// An array target was requested for something that is not an untyped value array.
    #[error("value of object[] type is expected, but actual type is {actual}")]
    NotAnArray {
        /// The runtime type of the offered value.
        actual: String,
    },

    /// One element of an array failed to convert.
    #[error("array element {index}: {source}")]
    ArrayElement {
        /// Element index.
        index: usize,
        /// The element's conversion failure.
        source: Box<ConversionError>,
    },

    /// A string could not be parsed as the target type.
    #[error("cannot parse '{value}' as {target}")]
    Parse {
        /// The string that was offered.
        value: String,
        /// The target type.
        target: String,
    },

    /// No conversion exists between the two types.
    #[error("no conversion from {from} to {to}")]
    Unsupported {
        /// Source runtime type.
        from: String,
        /// Target type.
        to: String,
    },

    /// A named function shape has no single abstract invoke member.
    #[error("function type '{shape}' has no single abstract invoke member")]
    NoInvokeMember {
        /// The shape name.
        shape: String,
    },

    /// Failure reported by a custom callable conversion.
    #[error("conversion failed: {message}")]
    Custom {
        /// Description of the failure.
        message: String,
    },
}

impl ConversionError {
    /// Create a type mismatch error.
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        ConversionError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an unsupported-conversion error.
    pub fn unsupported(from: impl Into<String>, to: impl Into<String>) -> Self {
        ConversionError::Unsupported {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a custom conversion error.
    pub fn custom(message: impl Into<String>) -> Self {
        ConversionError::Custom {
            message: message.into(),
        }
    }
}

// ============================================================================
// Guest Errors
// ============================================================================

/// The guest-level error constructor an error surfaces as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuestErrorKind {
    /// Generic `Error`.
    Error,
    /// `TypeError`.
    TypeError,
    /// `RangeError`.
    RangeError,
}

impl GuestErrorKind {
    /// The guest constructor name.
    pub const fn name(self) -> &'static str {
        match self {
            GuestErrorKind::Error => "Error",
            GuestErrorKind::TypeError => "TypeError",
            GuestErrorKind::RangeError => "RangeError",
        }
    }
}

/// An error raised by guest code, or raised on behalf of the host into guest code.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {message}", .kind.name())]
pub struct GuestError {
    /// Error constructor.
    pub kind: GuestErrorKind,
    /// Error message.
    pub message: String,
}

impl GuestError {
    /// Create a generic `Error`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: GuestErrorKind::Error,
            message: message.into(),
        }
    }

    /// Create a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: GuestErrorKind::TypeError,
            message: message.into(),
        }
    }

    /// Create a `RangeError`.
    pub fn range_error(message: impl Into<String>) -> Self {
        Self {
            kind: GuestErrorKind::RangeError,
            message: message.into(),
        }
    }
}

// ============================================================================
// Host Errors
// ============================================================================

/// Errors raised while running host code: procedures and adapters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// A host procedure reported a failure.
    #[error("{message}")]
    Failed {
        /// The failure message.
        message: String,
    },

    /// Invocation wrapper: the procedure at the bottom of a call failed.
    ///
    /// [`crate::NativeFn::invoke`] wraps every failure in exactly one level of
    /// this variant; the dispatcher unwraps it before translation.
    #[error("exception has been thrown by the target of an invocation: {0}")]
    Invocation(Box<HostError>),

    /// A guest callable invoked through an adapter raised an error.
    #[error(transparent)]
    Guest(#[from] GuestError),

    /// A value crossing the boundary could not be converted.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// An adapter was invoked with the wrong number of arguments.
    #[error("'{shape}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// The function shape.
        shape: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        got: usize,
    },

    /// Argument index out of bounds.
    #[error("argument index {index} out of bounds (procedure has {count} arguments)")]
    ArgumentIndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Available arguments.
        count: usize,
    },

    /// The receiver is not of the expected host type.
    #[error("invalid 'this' reference: {message}")]
    InvalidThis {
        /// Description of the mismatch.
        message: String,
    },

    /// The host procedure panicked.
    #[error("host procedure panicked: {message}")]
    Panic {
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl HostError {
    /// Create a generic host failure.
    pub fn failed(message: impl Into<String>) -> Self {
        HostError::Failed {
            message: message.into(),
        }
    }

    /// Create an "invalid this" error.
    pub fn invalid_this(message: impl Into<String>) -> Self {
        HostError::InvalidThis {
            message: message.into(),
        }
    }

    /// Strip one level of invocation wrapper, if present.
    pub fn unwrap_invocation(self) -> HostError {
        match self {
            HostError::Invocation(inner) => *inner,
            other => other,
        }
    }

    /// The message a translated guest error carries.
    ///
    /// For [`HostError::Failed`] and [`HostError::Guest`] this is the original
    /// message text without any prefix.
    pub fn message(&self) -> String {
        match self {
            HostError::Failed { message } => message.clone(),
            HostError::Guest(err) => err.message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while registering host procedures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A signature with the same name and parameter types already exists.
    #[error("procedure '{name}' already has an overload with this signature")]
    DuplicateSignature {
        /// The procedure name.
        name: String,
    },

    /// A variadic signature whose trailing parameter is not an array.
    #[error("variadic procedure '{name}' must end in an array parameter")]
    InvalidVariadic {
        /// The procedure name.
        name: String,
    },

    /// A context slot somewhere other than the first parameter.
    #[error("procedure '{name}' may only take the context as its first parameter")]
    MisplacedContext {
        /// The procedure name.
        name: String,
    },

    /// A builder finished without an implementation.
    #[error("procedure '{name}' has no native implementation")]
    MissingImplementation {
        /// The procedure name.
        name: String,
    },
}
