//! Synchronous termination - Request termination and block until confirmed
//!
//! The confirmation travels over a single-slot channel whose sender is owned
//! by a [`TerminationWatch`] subscribed on the host's event channel. The
//! subscription exists before the termination request is issued and the slot
//! buffers the value, so a confirmation that arrives before the caller starts
//! waiting is not lost. The wait runs on the calling thread and needs no
//! runtime, so it is safe from any thread, async worker threads included.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use super::error::TerminationError;
use super::event::DebugEvent;
use super::launch::{Launch, LaunchId};
use super::traits::{DebugEventListener, EventChannel, ProcessControl, SubscriptionId};

/// Wakes every blocked [`SynchronousTerminator::terminate_and_await`] call
/// sharing this handle. Sticky: once interrupted, later waits fail at once.
#[derive(Clone)]
pub struct Interrupter {
    inner: Arc<InterruptState>,
}

struct InterruptState {
    /// Nothing is ever sent. Dropping the sender disconnects every receiver
    /// at once, including receivers cloned afterwards.
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl Interrupter {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(InterruptState {
                trigger: Mutex::new(Some(tx)),
                signal: rx,
            }),
        }
    }

    pub fn interrupt(&self) {
        self.trigger().take();
    }

    pub fn is_interrupted(&self) -> bool {
        self.trigger().is_none()
    }

    fn signal(&self) -> Receiver<()> {
        self.inner.signal.clone()
    }

    fn trigger(&self) -> MutexGuard<'_, Option<Sender<()>>> {
        match self.inner.trigger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for Interrupter {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot listener for the `Terminate` event of one launch
struct TerminationWatch {
    launch: LaunchId,
    confirmed: Mutex<Option<Sender<()>>>,
    events: Arc<dyn EventChannel>,
    subscription: OnceLock<SubscriptionId>,
}

impl DebugEventListener for TerminationWatch {
    fn handle_debug_events(&self, events: &[DebugEvent]) {
        if !events.iter().any(|event| event.is_terminate_for(self.launch)) {
            return;
        }
        let sender = match self.confirmed.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(sender) = sender {
            let _ = sender.try_send(());
            if let Some(id) = self.subscription.get() {
                self.events.remove_debug_event_listener(*id);
            }
        }
    }
}

/// Removes the subscription when dropped, whatever the exit path
struct Subscription<'a> {
    events: &'a dyn EventChannel,
    id: SubscriptionId,
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        self.events.remove_debug_event_listener(self.id);
    }
}

/// Terminates a launch and waits for the host to confirm it
#[derive(Clone)]
pub struct SynchronousTerminator {
    events: Arc<dyn EventChannel>,
    control: Arc<dyn ProcessControl>,
    interrupter: Interrupter,
}

impl SynchronousTerminator {
    pub fn new(
        events: Arc<dyn EventChannel>,
        control: Arc<dyn ProcessControl>,
        interrupter: Interrupter,
    ) -> Self {
        Self {
            events,
            control,
            interrupter,
        }
    }

    pub fn interrupter(&self) -> &Interrupter {
        &self.interrupter
    }

    /// Request termination of `stale` and block until its `Terminate` event
    /// has been observed.
    ///
    /// No timeout: only the confirmation, an interrupt or the event channel
    /// dropping the subscription end the wait.
    pub fn terminate_and_await(&self, stale: &Launch) -> Result<(), TerminationError> {
        let launch = stale.id();
        let (confirmed_tx, confirmed_rx) = crossbeam_channel::bounded(1);
        let watch = Arc::new(TerminationWatch {
            launch,
            confirmed: Mutex::new(Some(confirmed_tx)),
            events: Arc::clone(&self.events),
            subscription: OnceLock::new(),
        });

        let id = self
            .events
            .add_debug_event_listener(Arc::clone(&watch) as Arc<dyn DebugEventListener>);
        let _ = watch.subscription.set(id);
        // The channel now owns the only sender.
        drop(watch);
        let _subscription = Subscription {
            events: self.events.as_ref(),
            id,
        };
        debug!("Watching for termination of launch {} ({})", launch, id);

        info!("Terminating running launch '{}'", stale.display_name());
        self.control
            .terminate(stale)
            .map_err(|source| TerminationError::Request { launch, source })?;

        self.wait(launch, confirmed_rx)?;
        info!("Launch '{}' confirmed terminated", stale.display_name());
        Ok(())
    }

    fn wait(&self, launch: LaunchId, confirmed: Receiver<()>) -> Result<(), TerminationError> {
        let interrupted = self.interrupter.signal();
        let result = crossbeam_channel::select_biased! {
            recv(confirmed) -> msg => {
                msg.map_err(|_| TerminationError::ChannelClosed { launch })
            }
            recv(interrupted) -> _ => Err(TerminationError::Interrupted { launch }),
        };
        if let Err(ref e) = result {
            warn!("Stopped waiting for launch {}: {}", launch, e);
        }
        result
    }
}
