//! Debug events delivered by the host's event channel

use serde::{Deserialize, Serialize};

use super::launch::LaunchId;

/// Kind of a debug event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugEventKind {
    Create,
    Terminate,
    Change,
    Suspend,
    Resume,
}

/// What an event is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSource {
    /// An OS process started for a launch
    Process {
        launch: LaunchId,
        pid: Option<u32>,
    },
    /// A debug target (not a process) belonging to a launch
    DebugTarget { launch: LaunchId },
    /// Something unrelated to launches
    Other(String),
}

impl EventSource {
    /// The launch whose process this source is, if it is a process at all.
    ///
    /// Debug targets deliberately do not resolve: only the end of the
    /// process confirms a termination.
    pub fn process_launch(&self) -> Option<LaunchId> {
        match self {
            Self::Process { launch, .. } => Some(*launch),
            Self::DebugTarget { .. } | Self::Other(_) => None,
        }
    }
}

/// A single notification from the event channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugEvent {
    pub kind: DebugEventKind,
    pub source: EventSource,
}

impl DebugEvent {
    pub fn new(kind: DebugEventKind, source: EventSource) -> Self {
        Self { kind, source }
    }

    /// `Terminate` event for the process of `launch`
    pub fn process_terminated(launch: LaunchId, pid: Option<u32>) -> Self {
        Self::new(DebugEventKind::Terminate, EventSource::Process { launch, pid })
    }

    /// `Create` event for the process of `launch`
    pub fn process_created(launch: LaunchId, pid: u32) -> Self {
        Self::new(
            DebugEventKind::Create,
            EventSource::Process {
                launch,
                pid: Some(pid),
            },
        )
    }

    /// Whether this event confirms that the process of `launch` has ended
    pub fn is_terminate_for(&self, launch: LaunchId) -> bool {
        self.kind == DebugEventKind::Terminate && self.source.process_launch() == Some(launch)
    }
}
