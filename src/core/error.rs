//! Error types for launch elimination

use thiserror::Error;

use super::launch::LaunchId;

/// Launch metadata that cannot be resolved.
///
/// Never reported: a launch without a configuration is simply not eligible.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// The configuration was deleted while the launch still exists.
    #[error("launch {launch} has no configuration")]
    MissingConfiguration {
        /// The launch whose configuration is gone.
        launch: LaunchId,
    },
}

/// Errors raised by host collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HostError {
    /// The process could not be signaled.
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        /// Operating system process ID.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// No process with this PID exists any more.
    #[error("process {pid} not found")]
    ProcessNotFound {
        /// Operating system process ID.
        pid: u32,
    },

    /// A host lock was poisoned by a panicking thread.
    #[error("{what} lock poisoned")]
    LockPoisoned {
        /// Which lock.
        what: &'static str,
    },
}

/// Why a synchronous termination did not complete.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TerminationError {
    /// The termination request itself failed.
    #[error("termination request for launch {launch} failed: {source}")]
    Request {
        /// The stale launch.
        launch: LaunchId,
        /// The host error.
        #[source]
        source: HostError,
    },

    /// The wait was interrupted before the confirmation arrived.
    #[error("interrupted while waiting for launch {launch} to terminate")]
    Interrupted {
        /// The stale launch.
        launch: LaunchId,
    },

    /// The event channel dropped the subscription before confirming.
    #[error("event channel closed before launch {launch} confirmed termination")]
    ChannelClosed {
        /// The stale launch.
        launch: LaunchId,
    },
}

/// Everything that can go wrong while handling one "launch added"
/// notification. Reported once and swallowed at the orchestrator boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EliminationError {
    /// The configuration's kind could not be looked up.
    #[error("launch configuration '{config}' has no registered type")]
    KindLookup {
        /// The configuration name.
        config: String,
    },

    /// The stale launch could not be terminated.
    #[error(transparent)]
    Termination(#[from] TerminationError),
}
