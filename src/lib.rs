//! Launch eliminator - Terminate a stale duplicate launch before a new one
//! with the same configuration name starts
//!
//! `core` holds the host-independent logic: matching, the kind predicate,
//! synchronous termination and the orchestrating [`LaunchEliminator`].
//! `host` is an in-process host that spawns real OS processes, and
//! [`EliminatorPlugin`] wires the two together.

pub mod core;
pub mod host;
pub mod persistence;
mod platform;
mod plugin;

pub use crate::core::{
    find_equivalent_running, is_eligible, DiagnosticSink, EliminationError, Interrupter, Launch,
    LaunchConfig, LaunchEliminator, LaunchId, Outcome, Settings, SynchronousTerminator,
    TerminationError, TracingSink, MANAGED_LAUNCH_KIND,
};
pub use plugin::EliminatorPlugin;

/// Application name constant
pub const APP_NAME: &str = "launch-eliminator";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
