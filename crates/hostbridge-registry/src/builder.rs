//! Builder for host procedure registration.
//!
//! ```
//! use hostbridge_core::HostType;
//! use hostbridge_registry::{ProcedureBuilder, ProcedureRegistry};
//!
//! let mut registry = ProcedureRegistry::new();
//! ProcedureBuilder::new("log")
//!     .context()
//!     .param(HostType::STRING)
//!     .param(HostType::array(HostType::Any))
//!     .variadic()
//!     .native(|_ctx| Ok(()))
//!     .register(&mut registry)
//!     .unwrap();
//! ```

use hostbridge_core::{
    CallContext, CandidateSignature, HostError, HostType, NativeFn, Parameter, RegistrationError,
    SignatureFlags,
};

use crate::ProcedureRegistry;

/// Builder for one procedure overload.
pub struct ProcedureBuilder {
    name: String,
    params: Vec<Parameter>,
    return_type: Option<HostType>,
    flags: SignatureFlags,
    native: Option<Box<dyn Fn(&mut CallContext) -> Result<(), HostError> + Send + Sync>>,
}

impl ProcedureBuilder {
    /// Start a procedure with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
            flags: SignatureFlags::empty(),
            native: None,
        }
    }

    /// Append a value parameter.
    pub fn param(mut self, ty: HostType) -> Self {
        self.params.push(Parameter::Typed(ty));
        self
    }

    /// Append several value parameters.
    pub fn params(mut self, types: impl IntoIterator<Item = HostType>) -> Self {
        self.params.extend(types.into_iter().map(Parameter::Typed));
        self
    }

    /// Declare the context slot. Must come before any value parameter.
    pub fn context(mut self) -> Self {
        self.params.push(Parameter::Context);
        self
    }

    /// Set the return type.
    pub fn returns(mut self, ty: HostType) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Mark the trailing parameter as variadic.
    pub fn variadic(mut self) -> Self {
        self.flags |= SignatureFlags::VARIADIC;
        self
    }

    /// Mark the overload as never selectable by dispatch.
    pub fn deny_access(mut self) -> Self {
        self.flags |= SignatureFlags::ACCESS_DENIED;
        self
    }

    /// Set the implementation.
    pub fn native<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut CallContext) -> Result<(), HostError> + Send + Sync + 'static,
    {
        self.native = Some(Box::new(f));
        self
    }

    /// Validate and produce the signature and implementation.
    pub fn build(self) -> Result<(CandidateSignature, NativeFn), RegistrationError> {
        let name = self.name;

        if self
            .params
            .iter()
            .skip(1)
            .any(|p| matches!(p, Parameter::Context))
        {
            return Err(RegistrationError::MisplacedContext { name });
        }

        if self.flags.contains(SignatureFlags::VARIADIC) {
            let tail = self.params.last().and_then(Parameter::host_type);
            if !matches!(tail, Some(HostType::Array(_) | HostType::GuestArgs)) {
                return Err(RegistrationError::InvalidVariadic { name });
            }
        }

        let Some(native) = self.native else {
            return Err(RegistrationError::MissingImplementation { name });
        };

        let signature = CandidateSignature::new(name, self.params, self.return_type, self.flags);
        let native = NativeFn::new(signature.hash, move |ctx: &mut CallContext| native(ctx));
        Ok((signature, native))
    }

    /// Build and register into `registry`.
    pub fn register(self, registry: &mut ProcedureRegistry) -> Result<(), RegistrationError> {
        let (signature, native) = self.build()?;
        registry.register(signature, native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SignatureSource;

    fn ok(_: &mut CallContext) -> Result<(), HostError> {
        Ok(())
    }

    #[test]
    fn builds_signature_with_context_and_variadic_tail() {
        let (sig, native) = ProcedureBuilder::new("log")
            .context()
            .param(HostType::STRING)
            .param(HostType::array(HostType::Any))
            .variadic()
            .native(ok)
            .build()
            .unwrap();
        assert!(sig.injects_context());
        assert!(sig.is_variadic());
        assert_eq!(sig.value_arity(), 2);
        assert_eq!(native.id, sig.hash);
    }

    #[test]
    fn context_must_be_first() {
        let err = ProcedureBuilder::new("f")
            .param(HostType::INT32)
            .context()
            .native(ok)
            .build()
            .err()
            .unwrap();
        assert_eq!(err, RegistrationError::MisplacedContext { name: "f".into() });
    }

    #[test]
    fn variadic_requires_array_tail() {
        let err = ProcedureBuilder::new("f")
            .param(HostType::INT32)
            .variadic()
            .native(ok)
            .build()
            .err()
            .unwrap();
        assert_eq!(err, RegistrationError::InvalidVariadic { name: "f".into() });

        assert!(
            ProcedureBuilder::new("g")
                .param(HostType::GuestArgs)
                .variadic()
                .native(ok)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn missing_native_is_rejected() {
        let err = ProcedureBuilder::new("f").build().err().unwrap();
        assert_eq!(err, RegistrationError::MissingImplementation { name: "f".into() });
    }

    #[test]
    fn register_adds_to_registry() {
        let mut registry = ProcedureRegistry::new();
        ProcedureBuilder::new("f")
            .params([HostType::INT32, HostType::STRING])
            .deny_access()
            .native(ok)
            .register(&mut registry)
            .unwrap();
        let candidates = registry.candidates("f").unwrap();
        assert!(candidates[0].signature.is_access_denied());
        assert_eq!(candidates[0].signature.value_arity(), 2);
    }
}
