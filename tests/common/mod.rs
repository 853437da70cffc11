//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hostbridge::{GuestValue, HostError, HostType, Interop, ProcedureBuilder, ProcedureRegistry};
use tracing_subscriber::{EnvFilter, fmt};

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hostbridge=debug"));
    fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}

/// Call counter shared between a test and the procedures it registers.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Register `name(types...) -> string` returning `tag`.
pub fn tagged(registry: &mut ProcedureRegistry, name: &str, types: &[HostType], tag: &'static str) {
    ProcedureBuilder::new(name)
        .params(types.iter().cloned())
        .returns(HostType::STRING)
        .native(move |ctx| {
            ctx.set_return(tag);
            Ok(())
        })
        .register(registry)
        .unwrap();
}

/// Register `name(...)` that always fails with `message`.
pub fn failing(registry: &mut ProcedureRegistry, name: &str, message: &'static str) {
    ProcedureBuilder::new(name)
        .native(move |_| Err(HostError::failed(message)))
        .register(registry)
        .unwrap();
}

pub fn call(interop: &Interop, name: &str, args: &[GuestValue]) -> Result<GuestValue, hostbridge::InteropError> {
    interop.call(name, &GuestValue::Undefined, args)
}
