//! ProcedureRegistry - storage for host procedures callable from guest code.
//!
//! Procedures are grouped by name; each name maps to its overloads in
//! declaration order. The dispatcher never depends on declaration order for
//! correctness, but the structural resolver uses it as its last tie-breaker.
//!
//! # Thread Safety
//!
//! `ProcedureRegistry` is not synchronized. Registration happens up front;
//! afterwards the registry is read-only and can be shared behind an `Arc`.
//!
//! # Example
//!
//! ```
//! use hostbridge_core::HostType;
//! use hostbridge_registry::{ProcedureBuilder, ProcedureRegistry, SignatureSource};
//!
//! let mut registry = ProcedureRegistry::new();
//! ProcedureBuilder::new("double")
//!     .param(HostType::INT32)
//!     .returns(HostType::INT32)
//!     .native(|ctx| {
//!         let v: i32 = ctx.arg(0)?;
//!         ctx.set_return(v * 2);
//!         Ok(())
//!     })
//!     .register(&mut registry)
//!     .unwrap();
//!
//! assert_eq!(registry.candidates("double").map(|c| c.len()), Some(1));
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use hostbridge_core::{CandidateSignature, NativeFn, RegistrationError, TypeHash};

/// A registered overload: its signature plus implementation.
#[derive(Debug, Clone)]
pub struct HostProcedure {
    /// The overload's signature.
    pub signature: CandidateSignature,
    /// The implementation.
    pub native: NativeFn,
    /// Position among the name's overloads, in registration order.
    pub declaration_index: usize,
}

/// Lookup of the overloads registered under a name.
///
/// This is the seam the dispatcher reads candidates through; alternative
/// stores (e.g. generated bindings) implement it directly.
pub trait SignatureSource: Send + Sync {
    /// All overloads for `name`, or `None` if nothing is registered.
    fn candidates(&self, name: &str) -> Option<&[HostProcedure]>;
}

impl<S: SignatureSource + ?Sized> SignatureSource for std::sync::Arc<S> {
    fn candidates(&self, name: &str) -> Option<&[HostProcedure]> {
        (**self).candidates(name)
    }
}

/// Registry of host procedures, keyed by name.
#[derive(Debug, Default)]
pub struct ProcedureRegistry {
    procedures: FxHashMap<String, Vec<HostProcedure>>,
    signatures: FxHashSet<TypeHash>,
}

impl ProcedureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one overload.
    ///
    /// Returns an error if an overload with the same name and parameter types
    /// already exists.
    pub fn register(
        &mut self,
        signature: CandidateSignature,
        native: NativeFn,
    ) -> Result<(), RegistrationError> {
        // The hash encodes name + parameter types
        if !self.signatures.insert(signature.hash) {
            return Err(RegistrationError::DuplicateSignature {
                name: signature.name.clone(),
            });
        }

        let overloads = self.procedures.entry(signature.name.clone()).or_default();
        debug!(
            procedure = %signature,
            overload = overloads.len(),
            "registered host procedure"
        );
        overloads.push(HostProcedure {
            declaration_index: overloads.len(),
            signature,
            native,
        });
        Ok(())
    }

    /// Whether any overload is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Whether this exact signature is registered.
    pub fn contains_signature(&self, hash: TypeHash) -> bool {
        self.signatures.contains(&hash)
    }

    /// Registered procedure names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.procedures.keys().map(String::as_str)
    }

    /// Total number of overloads.
    pub fn procedure_count(&self) -> usize {
        self.signatures.len()
    }
}

impl SignatureSource for ProcedureRegistry {
    fn candidates(&self, name: &str) -> Option<&[HostProcedure]> {
        self.procedures.get(name).map(Vec::as_slice)
    }
}
