//! Guest-to-host call dispatch.
//!
//! One dispatch selects and invokes exactly one overload:
//!
//! 1. fold variadic arguments ([`fold_variadic`])
//! 2. rank the overloads with the configured [`OverloadResolver`]
//! 3. run the two calling-convention passes in [`PassOrder`]; in each pass,
//!    the first ranked candidate whose arguments all convert is invoked
//! 4. translate a failure of the invoked procedure
//!
//! Candidates flagged access-denied are skipped in both passes, so they never
//! run even when they are the only overload that would match.
//!
//! [`PassOrder`]: crate::PassOrder

mod folding;

pub use folding::fold_variadic;

use tracing::debug;

use hostbridge_core::{
    CallContext, CandidateSignature, ContextHandle, GuestError, GuestValue, HostError, HostType,
    HostValue, Parameter,
};
use hostbridge_registry::HostProcedure;

use crate::conversion::ConversionEngine;
use crate::error::InteropError;
use crate::options::InteropOptions;
use crate::overload::OverloadResolver;

/// Borrowed view of everything a single dispatch needs.
pub struct Dispatcher<'a> {
    engine: &'a ConversionEngine,
    resolver: &'a dyn OverloadResolver,
    options: &'a InteropOptions,
    context: &'a ContextHandle,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        engine: &'a ConversionEngine,
        resolver: &'a dyn OverloadResolver,
        options: &'a InteropOptions,
        context: &'a ContextHandle,
    ) -> Self {
        Self {
            engine,
            resolver,
            options,
            context,
        }
    }

    /// Select and invoke one of `candidates` for a call of `name`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn dispatch(
        &self,
        name: &str,
        candidates: &[HostProcedure],
        this: &GuestValue,
        args: &[GuestValue],
    ) -> Result<GuestValue, InteropError> {
        let args = fold_variadic(candidates, args);
        let ranked = self.resolver.rank(candidates, &args);

        for injects_context in self.options.pass_order.passes() {
            for candidate in ranked
                .iter()
                .filter(|c| c.signature.injects_context() == injects_context)
            {
                let signature = &candidate.signature;
                if signature.value_arity() != args.len() {
                    continue;
                }
                if self.options.enforce_access_denial && signature.is_access_denied() {
                    debug!(candidate = %signature, "skipping access-denied overload");
                    continue;
                }
                let Some(bound) = self.bind(signature, &args) else {
                    continue;
                };

                debug!(candidate = %signature, injects_context, "selected overload");
                return self.invoke(candidate, injects_context, this, &bound);
            }
        }

        Err(InteropError::NoMatchingOverload {
            name: name.to_string(),
            arg_count: args.len(),
        })
    }

    /// Convert every argument for `signature`; `None` abandons the candidate.
    fn bind(&self, signature: &CandidateSignature, args: &[GuestValue]) -> Option<Vec<HostValue>> {
        signature
            .value_params()
            .iter()
            .zip(args)
            .enumerate()
            .map(|(index, (param, arg))| {
                let bound = match param {
                    Parameter::Context => None,
                    Parameter::Typed(HostType::Guest) => Some(HostValue::Guest(arg.clone())),
                    Parameter::Typed(HostType::GuestArgs) if arg.is_array() => arg
                        .as_array()
                        .map(|array| HostValue::GuestArgs(array.to_vec())),
                    Parameter::Typed(ty) => self.engine.try_convert(&arg.to_host(), ty),
                };
                if bound.is_none() {
                    debug!(
                        candidate = %signature,
                        index,
                        argument = arg.type_name(),
                        "argument does not convert; abandoning overload"
                    );
                }
                bound
            })
            .collect()
    }

    fn invoke(
        &self,
        candidate: &HostProcedure,
        injects_context: bool,
        this: &GuestValue,
        args: &[HostValue],
    ) -> Result<GuestValue, InteropError> {
        let mut ret = HostValue::Void;
        let outcome = {
            let context = injects_context.then_some(self.context);
            let mut ctx = CallContext::new(args, context, &mut ret).with_receiver(this);
            candidate.native.invoke(&mut ctx)
        };

        match outcome {
            Ok(()) => Ok(GuestValue::from_host(ret)),
            Err(err) => Err(self.translate(err.unwrap_invocation())),
        }
    }

    fn translate(&self, err: HostError) -> InteropError {
        if self.options.translates(&err) {
            debug!(error = %err, "host failure translated to guest error");
            InteropError::Guest(GuestError::error(err.message()))
        } else {
            InteropError::Host(err)
        }
    }
}
