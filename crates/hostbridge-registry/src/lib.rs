//! Hostbridge Registry crate.
//!
//! Storage for the host procedures guest code may call, and the builder used
//! to declare them.

pub mod builder;
pub mod registry;

pub use builder::ProcedureBuilder;
pub use registry::{HostProcedure, ProcedureRegistry, SignatureSource};
