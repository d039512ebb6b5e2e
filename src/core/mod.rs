//! Core module - Launch model, duplicate matching and synchronous termination

mod eliminator;
pub mod error;
pub mod event;
pub mod traits;
mod kind;
mod launch;
mod matcher;
pub mod settings;
mod terminator;

#[cfg(test)]
pub(crate) mod test_support;

pub use eliminator::{LaunchEliminator, Outcome};
pub use error::{EliminationError, HostError, ResolutionError, TerminationError};
pub use event::{DebugEvent, DebugEventKind, EventSource};
pub use traits::{
    DebugEventListener, DiagnosticSink, EventChannel, LaunchListener, LaunchRegistry,
    ProcessControl, SubscriptionId, TracingSink,
};
pub use kind::{is_eligible, MANAGED_LAUNCH_KIND};
pub use launch::{Launch, LaunchConfig, LaunchId};
pub use matcher::find_equivalent_running;
pub use settings::Settings;
pub use terminator::{Interrupter, SynchronousTerminator};
