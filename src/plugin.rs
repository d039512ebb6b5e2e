//! Plugin lifecycle - Installs the eliminator into a host and removes it again

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::{
    DiagnosticSink, EventChannel, Interrupter, LaunchEliminator, LaunchListener, LaunchRegistry,
    ProcessControl, SynchronousTerminator,
};

/// Owns one [`LaunchEliminator`] and its registration with the host.
///
/// Each plugin instance has its own eliminator, so several hosts (or tests)
/// can run side by side.
pub struct EliminatorPlugin {
    registry: Arc<dyn LaunchRegistry>,
    events: Arc<dyn EventChannel>,
    control: Arc<dyn ProcessControl>,
    diagnostics: Arc<dyn DiagnosticSink>,
    active: Option<Active>,
}

struct Active {
    listener: Arc<dyn LaunchListener>,
    interrupter: Interrupter,
}

impl EliminatorPlugin {
    pub fn new(
        registry: Arc<dyn LaunchRegistry>,
        events: Arc<dyn EventChannel>,
        control: Arc<dyn ProcessControl>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            registry,
            events,
            control,
            diagnostics,
            active: None,
        }
    }

    /// Register a fresh eliminator with the launch registry. Starting twice
    /// is a no-op.
    pub fn start(&mut self) {
        if self.active.is_some() {
            return;
        }
        let interrupter = Interrupter::new();
        let terminator = SynchronousTerminator::new(
            Arc::clone(&self.events),
            Arc::clone(&self.control),
            interrupter.clone(),
        );
        let listener: Arc<dyn LaunchListener> = Arc::new(LaunchEliminator::new(
            Arc::clone(&self.registry),
            terminator,
            Arc::clone(&self.diagnostics),
        ));
        self.registry.add_launch_listener(Arc::clone(&listener));
        info!("Launch eliminator started");
        self.active = Some(Active {
            listener,
            interrupter,
        });
    }

    /// Wake any elimination still waiting for a confirmation and deregister
    /// the eliminator
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.interrupter.interrupt();
        self.registry.remove_launch_listener(&active.listener);
        info!("Launch eliminator stopped");
    }

    pub fn is_started(&self) -> bool {
        self.active.is_some()
    }

    /// Interrupt handle of the running eliminator
    pub fn interrupter(&self) -> Option<Interrupter> {
        self.active.as_ref().map(|a| a.interrupter.clone())
    }
}

impl Drop for EliminatorPlugin {
    fn drop(&mut self) {
        if self.active.is_some() {
            debug!("Stopping launch eliminator on drop");
            self.stop();
        }
    }
}
