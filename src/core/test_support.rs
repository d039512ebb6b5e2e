//! In-memory fakes of the host collaborators

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::error::HostError;
use super::event::DebugEvent;
use super::kind::MANAGED_LAUNCH_KIND;
use super::launch::{Launch, LaunchConfig};
use super::traits::{
    DebugEventListener, DiagnosticSink, EventChannel, LaunchListener, LaunchRegistry,
    ProcessControl, SubscriptionId,
};

pub fn managed_launch(name: &str) -> Launch {
    Launch::new(LaunchConfig::new(name, MANAGED_LAUNCH_KIND))
}

/// Event channel that dispatches synchronously on the firing thread
#[derive(Default)]
pub struct FakeEventChannel {
    listeners: Mutex<BTreeMap<SubscriptionId, Arc<dyn DebugEventListener>>>,
    next_id: AtomicU64,
    removed: AtomicUsize,
}

impl FakeEventChannel {
    pub fn fire(&self, events: &[DebugEvent]) {
        let listeners: Vec<_> = self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener.handle_debug_events(events);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Subscriptions that were actually removed
    pub fn removed_count(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    /// Drop every listener without notifying anyone
    pub fn clear(&self) {
        self.listeners.lock().unwrap().clear();
    }
}

impl EventChannel for FakeEventChannel {
    fn add_debug_event_listener(&self, listener: Arc<dyn DebugEventListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().unwrap().insert(id, listener);
        id
    }

    fn remove_debug_event_listener(&self, id: SubscriptionId) {
        if self.listeners.lock().unwrap().remove(&id).is_some() {
            self.removed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

type TerminateFn = dyn Fn(&Launch) -> Result<(), HostError> + Send + Sync;

/// Process control whose behaviour is a closure
pub struct FakeControl {
    on_terminate: Box<TerminateFn>,
    requests: Mutex<Vec<Launch>>,
}

impl FakeControl {
    pub fn new<F>(on_terminate: F) -> Self
    where
        F: Fn(&Launch) -> Result<(), HostError> + Send + Sync + 'static,
    {
        Self {
            on_terminate: Box::new(on_terminate),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Confirms every request synchronously through `channel`
    pub fn confirming(channel: Arc<FakeEventChannel>) -> Self {
        Self::new(move |launch: &Launch| {
            launch.mark_terminated();
            channel.fire(&[DebugEvent::process_terminated(launch.id(), launch.pid())]);
            Ok(())
        })
    }

    pub fn requests(&self) -> Vec<Launch> {
        self.requests.lock().unwrap().clone()
    }
}

impl ProcessControl for FakeControl {
    fn terminate(&self, launch: &Launch) -> Result<(), HostError> {
        self.requests.lock().unwrap().push(launch.clone());
        (self.on_terminate)(launch)
    }
}

/// Registry over a fixed list that counts snapshot requests
#[derive(Default)]
pub struct FakeRegistry {
    launches: Mutex<Vec<Launch>>,
    listeners: Mutex<Vec<Arc<dyn LaunchListener>>>,
    scans: AtomicUsize,
}

impl FakeRegistry {
    pub fn push(&self, launch: Launch) {
        self.launches.lock().unwrap().push(launch);
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Add `launch` and notify listeners, like a host would
    pub fn add(&self, launch: Launch) {
        self.push(launch.clone());
        let listeners = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener.launch_added(&launch);
        }
    }
}

impl LaunchRegistry for FakeRegistry {
    fn launches(&self) -> Vec<Launch> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.launches.lock().unwrap().clone()
    }

    fn add_launch_listener(&self, listener: Arc<dyn LaunchListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    fn remove_launch_listener(&self, listener: &Arc<dyn LaunchListener>) {
        self.listeners
            .lock()
            .unwrap()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }
}

/// Sink that keeps every message
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn log_error(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
