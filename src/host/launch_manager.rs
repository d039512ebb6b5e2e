//! Launch manager - In-process registry of launches

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::core::{Launch, LaunchListener, LaunchRegistry};

/// Keeps every known launch and notifies listeners about changes.
///
/// Notifications run on the thread that made the change. Listeners are
/// snapshotted before dispatch, so they may add or remove listeners while
/// being notified.
#[derive(Default)]
pub struct LaunchManager {
    launches: RwLock<Vec<Launch>>,
    listeners: RwLock<Vec<Arc<dyn LaunchListener>>>,
}

impl LaunchManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a launch and notify `launch_added`. Adding the same launch
    /// twice is ignored.
    pub fn add_launch(&self, launch: Launch) {
        {
            let Ok(mut launches) = self.launches.write() else {
                warn!("Launch list lock poisoned, dropping launch {}", launch.id());
                return;
            };
            if launches.contains(&launch) {
                return;
            }
            launches.push(launch.clone());
        }
        debug!("Launch '{}' added", launch.display_name());
        for listener in self.listeners_snapshot() {
            listener.launch_added(&launch);
        }
    }

    /// Forget a launch and notify `launch_removed`
    pub fn remove_launch(&self, launch: &Launch) -> bool {
        let removed = match self.launches.write() {
            Ok(mut launches) => {
                let before = launches.len();
                launches.retain(|l| l != launch);
                launches.len() != before
            }
            Err(_) => false,
        };
        if removed {
            debug!("Launch '{}' removed", launch.display_name());
            for listener in self.listeners_snapshot() {
                listener.launch_removed(launch);
            }
        }
        removed
    }

    /// Notify `launch_changed`
    pub fn launch_changed(&self, launch: &Launch) {
        for listener in self.listeners_snapshot() {
            listener.launch_changed(launch);
        }
    }

    /// Drop terminated launches, returning how many were removed
    pub fn remove_terminated(&self) -> usize {
        let terminated: Vec<Launch> = self
            .launches()
            .into_iter()
            .filter(|l| l.is_terminated())
            .collect();
        terminated.iter().filter(|l| self.remove_launch(l)).count()
    }

    pub fn active_count(&self) -> usize {
        self.launches
            .read()
            .map(|l| l.iter().filter(|l| !l.is_terminated()).count())
            .unwrap_or(0)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    fn listeners_snapshot(&self) -> Vec<Arc<dyn LaunchListener>> {
        self.listeners
            .read()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

impl LaunchRegistry for LaunchManager {
    fn launches(&self) -> Vec<Launch> {
        self.launches
            .read()
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    fn add_launch_listener(&self, listener: Arc<dyn LaunchListener>) {
        if let Ok(mut listeners) = self.listeners.write() {
            if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
                listeners.push(listener);
            }
        }
    }

    fn remove_launch_listener(&self, listener: &Arc<dyn LaunchListener>) {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.retain(|l| !Arc::ptr_eq(l, listener));
        }
    }
}
