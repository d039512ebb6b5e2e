//! Debug event bus - Asynchronous delivery of debug event batches

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::core::{DebugEvent, DebugEventListener, EventChannel, SubscriptionId};

type ListenerMap = BTreeMap<SubscriptionId, Arc<dyn DebugEventListener>>;

/// Event channel with its own dispatch thread.
///
/// [`DebugEventBus::fire`] only enqueues, so it never blocks the caller.
/// Batches are delivered in firing order to a snapshot of the listeners, so
/// a listener may remove itself while it is being called.
pub struct DebugEventBus {
    listeners: Arc<RwLock<ListenerMap>>,
    next_id: AtomicU64,
    queue: Mutex<Option<Sender<Vec<DebugEvent>>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl DebugEventBus {
    pub fn new() -> Result<Self> {
        let listeners: Arc<RwLock<ListenerMap>> = Arc::new(RwLock::new(BTreeMap::new()));
        let (tx, rx) = crossbeam_channel::unbounded();

        let dispatch_listeners = Arc::clone(&listeners);
        let dispatcher = thread::Builder::new()
            .name("debug-event-dispatch".into())
            .spawn(move || run_dispatch_loop(rx, dispatch_listeners))
            .context("Failed to spawn debug event dispatch thread")?;

        Ok(Self {
            listeners,
            next_id: AtomicU64::new(1),
            queue: Mutex::new(Some(tx)),
            dispatcher: Mutex::new(Some(dispatcher)),
        })
    }

    /// Queue a batch for delivery. Dropped with a warning after shutdown.
    pub fn fire(&self, events: Vec<DebugEvent>) {
        if events.is_empty() {
            return;
        }
        let sent = self
            .queue
            .lock()
            .ok()
            .and_then(|q| q.as_ref().map(|tx| tx.send(events).is_ok()))
            .unwrap_or(false);
        if !sent {
            warn!("Debug event bus is shut down, dropping events");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Deliver everything already queued, then stop the dispatch thread and
    /// drop all listeners
    pub fn shutdown(&self) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.take();
        }
        let handle = self.dispatcher.lock().ok().and_then(|mut d| d.take());
        // The last handle may be dropped by a listener on the dispatch thread.
        if let Some(handle) = handle.filter(|h| h.thread().id() != thread::current().id()) {
            if handle.join().is_err() {
                warn!("Debug event dispatch thread panicked");
            }
        }
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.clear();
        }
        debug!("Debug event bus shut down");
    }
}

impl Drop for DebugEventBus {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl EventChannel for DebugEventBus {
    fn add_debug_event_listener(&self, listener: Arc<dyn DebugEventListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.listeners.write() {
            Ok(mut listeners) => {
                listeners.insert(id, listener);
            }
            Err(_) => warn!("Listener lock poisoned, subscription {} inactive", id),
        }
        trace!("Debug event listener {} added", id);
        id
    }

    fn remove_debug_event_listener(&self, id: SubscriptionId) {
        if let Ok(mut listeners) = self.listeners.write() {
            if listeners.remove(&id).is_some() {
                trace!("Debug event listener {} removed", id);
            }
        }
    }
}

fn run_dispatch_loop(rx: Receiver<Vec<DebugEvent>>, listeners: Arc<RwLock<ListenerMap>>) {
    while let Ok(events) = rx.recv() {
        let snapshot: Vec<Arc<dyn DebugEventListener>> = match listeners.read() {
            Ok(l) => l.values().cloned().collect(),
            Err(_) => break,
        };
        for listener in snapshot {
            listener.handle_debug_events(&events);
        }
    }
}
