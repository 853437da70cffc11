//! Dispatch configuration.

use std::fmt;
use std::sync::Arc;

use hostbridge_core::HostError;

/// Which calling convention the dispatcher tries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PassOrder {
    /// Candidates taking the context handle first, then plain candidates.
    #[default]
    ContextFirst,
    /// Plain candidates first, then candidates taking the context handle.
    DirectFirst,
}

impl PassOrder {
    /// The `injects_context` value of each pass, in order.
    pub(crate) const fn passes(self) -> [bool; 2] {
        match self {
            PassOrder::ContextFirst => [true, false],
            PassOrder::DirectFirst => [false, true],
        }
    }
}

/// Decides whether a host procedure failure becomes a generic guest error.
///
/// Returning `true` turns the failure into a guest `Error` carrying the
/// failure's message; returning `false` hands the failure back unchanged.
pub trait ExceptionTranslator: Send + Sync {
    fn handle(&self, error: &HostError) -> bool;
}

impl<F> ExceptionTranslator for F
where
    F: Fn(&HostError) -> bool + Send + Sync,
{
    fn handle(&self, error: &HostError) -> bool {
        (self)(error)
    }
}

/// Options for an [`Interop`](crate::Interop).
#[derive(Clone)]
pub struct InteropOptions {
    pub pass_order: PassOrder,
    /// Skip candidates flagged access-denied. Disabling this is only meant
    /// for trusted embeddings.
    pub enforce_access_denial: bool,
    pub exception_translator: Option<Arc<dyn ExceptionTranslator>>,
}

impl InteropOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pass_order(mut self, pass_order: PassOrder) -> Self {
        self.pass_order = pass_order;
        self
    }

    pub fn with_access_denial(mut self, enforce: bool) -> Self {
        self.enforce_access_denial = enforce;
        self
    }

    pub fn with_exception_translator<T>(mut self, translator: T) -> Self
    where
        T: ExceptionTranslator + 'static,
    {
        self.exception_translator = Some(Arc::new(translator));
        self
    }

    /// Whether the configured translator accepts `error`.
    pub(crate) fn translates(&self, error: &HostError) -> bool {
        self.exception_translator
            .as_ref()
            .is_some_and(|translator| translator.handle(error))
    }
}

impl Default for InteropOptions {
    fn default() -> Self {
        Self {
            pass_order: PassOrder::default(),
            enforce_access_denial: true,
            exception_translator: None,
        }
    }
}

impl fmt::Debug for InteropOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteropOptions")
            .field("pass_order", &self.pass_order)
            .field("enforce_access_denial", &self.enforce_access_denial)
            .field("exception_translator", &self.exception_translator.is_some())
            .finish()
    }
}
