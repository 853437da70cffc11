//! Procedure signatures.
//!
//! A [`CandidateSignature`] describes one overload of a host procedure: its
//! ordered parameter list, an optional return type and flags. The first
//! parameter may be a [`Parameter::Context`] slot, filled by the dispatcher
//! with the engine's context handle instead of a guest argument.

use bitflags::bitflags;

use crate::{HostType, TypeHash, primitives};

bitflags! {
    /// Per-signature flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SignatureFlags: u8 {
        /// The trailing parameter is a variadic array.
        const VARIADIC = 1 << 0;
        /// Dispatch must never select this signature.
        const ACCESS_DENIED = 1 << 1;
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// The engine context handle; only valid in position 0.
    Context,
    /// A value parameter of the given type.
    Typed(HostType),
}

impl Parameter {
    /// The parameter's type; `None` for the context slot.
    pub fn host_type(&self) -> Option<&HostType> {
        match self {
            Parameter::Context => None,
            Parameter::Typed(ty) => Some(ty),
        }
    }

    /// Identity contributed to the signature hash.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            Parameter::Context => primitives::CONTEXT,
            Parameter::Typed(ty) => ty.type_hash(),
        }
    }
}

/// One overload of a host procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSignature {
    /// Procedure name.
    pub name: String,
    /// Ordered parameters.
    pub params: Vec<Parameter>,
    /// Return type (`None` = void).
    pub return_type: Option<HostType>,
    /// Flags.
    pub flags: SignatureFlags,
    /// Identity: name plus parameter types.
    pub hash: TypeHash,
}

impl CandidateSignature {
    /// Create a signature, computing its identity.
    pub fn new(
        name: impl Into<String>,
        params: Vec<Parameter>,
        return_type: Option<HostType>,
        flags: SignatureFlags,
    ) -> Self {
        let name = name.into();
        let hashes: Vec<TypeHash> = params.iter().map(Parameter::type_hash).collect();
        let hash = TypeHash::from_function(&name, &hashes);
        Self {
            name,
            params,
            return_type,
            flags,
            hash,
        }
    }

    /// Whether the first parameter is the context slot.
    pub fn injects_context(&self) -> bool {
        matches!(self.params.first(), Some(Parameter::Context))
    }

    pub fn is_variadic(&self) -> bool {
        self.flags.contains(SignatureFlags::VARIADIC)
    }

    pub fn is_access_denied(&self) -> bool {
        self.flags.contains(SignatureFlags::ACCESS_DENIED)
    }

    /// The parameters guest arguments bind to (everything but the context slot).
    pub fn value_params(&self) -> &[Parameter] {
        if self.injects_context() {
            &self.params[1..]
        } else {
            &self.params
        }
    }

    /// Number of guest arguments this signature takes.
    pub fn value_arity(&self) -> usize {
        self.value_params().len()
    }

    /// Number of fixed value parameters ahead of a variadic tail.
    pub fn variadic_prefix_len(&self) -> Option<usize> {
        self.is_variadic()
            .then(|| self.value_arity().saturating_sub(1))
    }

    /// Type of the variadic tail parameter.
    pub fn variadic_tail(&self) -> Option<&HostType> {
        if !self.is_variadic() {
            return None;
        }
        self.value_params().last().and_then(Parameter::host_type)
    }
}

impl std::fmt::Display for CandidateSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if self.is_variadic() && i + 1 == self.params.len() {
                write!(f, "...")?;
            }
            match param {
                Parameter::Context => write!(f, "context")?,
                Parameter::Typed(ty) => write!(f, "{}", ty)?,
            }
        }
        write!(f, ")")?;
        if let Some(ret) = &self.return_type {
            write!(f, " -> {}", ret)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_sig() -> CandidateSignature {
        CandidateSignature::new(
            "log",
            vec![
                Parameter::Context,
                Parameter::Typed(HostType::STRING),
                Parameter::Typed(HostType::array(HostType::Any)),
            ],
            None,
            SignatureFlags::VARIADIC,
        )
    }

    #[test]
    fn context_slot_is_not_a_value_param() {
        let sig = log_sig();
        assert!(sig.injects_context());
        assert_eq!(sig.value_arity(), 2);
        assert_eq!(sig.variadic_prefix_len(), Some(1));
        assert_eq!(sig.variadic_tail(), Some(&HostType::array(HostType::Any)));
    }

    #[test]
    fn hash_depends_on_params() {
        let a = CandidateSignature::new(
            "f",
            vec![Parameter::Typed(HostType::INT32)],
            None,
            SignatureFlags::empty(),
        );
        let b = CandidateSignature::new(
            "f",
            vec![Parameter::Typed(HostType::STRING)],
            Some(HostType::INT32),
            SignatureFlags::ACCESS_DENIED,
        );
        assert_ne!(a.hash, b.hash);
        assert!(b.is_access_denied());
        assert!(!a.is_variadic());
        assert_eq!(a.variadic_prefix_len(), None);
    }

    #[test]
    fn display() {
        assert_eq!(log_sig().to_string(), "log(context, string, ...object[])");
    }
}
