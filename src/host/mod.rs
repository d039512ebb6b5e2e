//! Host module - An in-process launch host: registry, event bus, process
//! launcher

mod event_bus;
mod launch_manager;
mod launcher;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

pub use event_bus::DebugEventBus;
pub use launch_manager::LaunchManager;
pub use launcher::ProcessLauncher;

/// The three host services wired together
pub struct LocalHost {
    pub manager: Arc<LaunchManager>,
    pub events: Arc<DebugEventBus>,
    pub launcher: Arc<ProcessLauncher>,
}

impl LocalHost {
    pub fn new(poll_interval: Duration) -> Result<Self> {
        let manager = Arc::new(LaunchManager::new());
        let events = Arc::new(DebugEventBus::new()?);
        let launcher = Arc::new(ProcessLauncher::new(
            Arc::clone(&manager),
            Arc::clone(&events),
            poll_interval,
        )?);
        Ok(Self {
            manager,
            events,
            launcher,
        })
    }

    /// Kill remaining processes, then stop event delivery
    pub fn shutdown(&self) {
        self.launcher.shutdown();
        self.events.shutdown();
    }
}
