//! Host collaborator interfaces
//!
//! The eliminator never owns launches or processes. Everything it needs from
//! the outside world goes through these traits, so the reference host in
//! `crate::host` and the fakes used by tests are interchangeable.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::HostError;
use super::event::DebugEvent;
use super::launch::Launch;

/// Receives launch lifecycle notifications from a [`LaunchRegistry`]
pub trait LaunchListener: Send + Sync {
    fn launch_added(&self, launch: &Launch);

    fn launch_removed(&self, _launch: &Launch) {}

    fn launch_changed(&self, _launch: &Launch) {}
}

/// The host's set of known launches
pub trait LaunchRegistry: Send + Sync {
    /// Snapshot of every launch currently known, in registration order
    fn launches(&self) -> Vec<Launch>;

    fn add_launch_listener(&self, listener: Arc<dyn LaunchListener>);

    /// Removes a listener previously added (compared by pointer)
    fn remove_launch_listener(&self, listener: &Arc<dyn LaunchListener>);
}

/// Receives batches of debug events
pub trait DebugEventListener: Send + Sync {
    fn handle_debug_events(&self, events: &[DebugEvent]);
}

/// Handle returned when subscribing to an [`EventChannel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The host's debug event channel
pub trait EventChannel: Send + Sync {
    fn add_debug_event_listener(&self, listener: Arc<dyn DebugEventListener>) -> SubscriptionId;

    /// Removing an unknown or already removed subscription is a no-op
    fn remove_debug_event_listener(&self, id: SubscriptionId);
}

/// Process control offered by the host
pub trait ProcessControl: Send + Sync {
    /// Ask the host to terminate the launch. Returns once the request has
    /// been issued, not once the process has ended.
    fn terminate(&self, launch: &Launch) -> Result<(), HostError>;
}

/// Fire-and-forget error log
pub trait DiagnosticSink: Send + Sync {
    fn log_error(&self, message: &str);
}

/// Sink that forwards to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log_error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
