//! Process launching - Spawning launches and reporting when they end

use std::collections::HashMap;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use super::event_bus::DebugEventBus;
use super::launch_manager::LaunchManager;
use crate::core::{DebugEvent, HostError, Launch, LaunchConfig, LaunchId, ProcessControl};
use crate::platform;

struct Tracked {
    launch: Launch,
    child: Child,
}

type ChildMap = HashMap<LaunchId, Tracked>;

/// Starts launches as OS processes and reports their end as `Terminate`
/// events.
///
/// A launch is registered with the [`LaunchManager`] before its process is
/// spawned, so listeners (the eliminator among them) run while the new
/// process does not exist yet.
pub struct ProcessLauncher {
    manager: Arc<LaunchManager>,
    events: Arc<DebugEventBus>,
    children: Arc<Mutex<ChildMap>>,
    running: Arc<AtomicBool>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl ProcessLauncher {
    pub fn new(
        manager: Arc<LaunchManager>,
        events: Arc<DebugEventBus>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let children: Arc<Mutex<ChildMap>> = Arc::new(Mutex::new(HashMap::new()));
        let running = Arc::new(AtomicBool::new(true));

        let watcher = {
            let children = Arc::clone(&children);
            let events = Arc::clone(&events);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("process-watcher".into())
                .spawn(move || watch_children(children, events, running, poll_interval))
                .context("Failed to spawn process watcher thread")?
        };

        Ok(Self {
            manager,
            events,
            children,
            running,
            watcher: Mutex::new(Some(watcher)),
        })
    }

    pub fn manager(&self) -> &Arc<LaunchManager> {
        &self.manager
    }

    /// Register a new launch for `config`, then start its process
    pub fn launch(&self, config: LaunchConfig) -> Result<Launch> {
        if config.executable_path.as_os_str().is_empty() {
            anyhow::bail!("Launch configuration '{}' has no executable", config.name);
        }

        let launch = Launch::new(config.clone());
        self.manager.add_launch(launch.clone());

        if launch.is_terminated() {
            warn!(
                "Launch '{}' was terminated before its process started",
                config.name
            );
            return Ok(launch);
        }

        if let Err(e) = self.spawn(&launch, &config) {
            launch.mark_terminated();
            self.events
                .fire(vec![DebugEvent::process_terminated(launch.id(), None)]);
            self.manager.launch_changed(&launch);
            return Err(e);
        }
        Ok(launch)
    }

    fn spawn(&self, launch: &Launch, config: &LaunchConfig) -> Result<()> {
        info!(
            "Spawning launch '{}' from {:?}",
            config.name, config.executable_path
        );

        let mut cmd = Command::new(&config.executable_path);
        if let Some(ref work_dir) = config.working_directory {
            cmd.current_dir(work_dir);
        }
        cmd.args(&config.arguments);
        for (key, value) in &config.environment {
            cmd.env(key, value);
        }

        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn process for '{}'", config.name))?;

        let pid = child.id();
        info!("Spawned process with PID {}", pid);
        launch.attach_process(pid);

        self.children
            .lock()
            .map_err(|e| anyhow::anyhow!("Children lock poisoned: {}", e))?
            .insert(
                launch.id(),
                Tracked {
                    launch: launch.clone(),
                    child,
                },
            );

        self.events
            .fire(vec![DebugEvent::process_created(launch.id(), pid)]);
        self.manager.launch_changed(launch);
        Ok(())
    }

    /// Block until every known launch has terminated
    pub fn wait_all(&self, poll_interval: Duration) {
        while self.manager.active_count() > 0 && self.running.load(Ordering::Acquire) {
            thread::sleep(poll_interval);
        }
    }

    /// Get the number of running processes
    pub fn running_count(&self) -> usize {
        self.children.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Stop watching processes and kill whatever is still running
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        let handle = self.watcher.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Process watcher thread panicked");
            }
        }

        let remaining: Vec<Tracked> = match self.children.lock() {
            Ok(mut children) => children.drain().map(|(_, t)| t).collect(),
            Err(_) => Vec::new(),
        };
        for mut tracked in remaining {
            warn!(
                "Killing launch '{}' on shutdown",
                tracked.launch.display_name()
            );
            let _ = tracked.child.kill();
            let _ = tracked.child.wait();
            report_terminated(&self.events, &tracked.launch, None);
        }
    }
}

impl Drop for ProcessLauncher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ProcessControl for ProcessLauncher {
    fn terminate(&self, launch: &Launch) -> Result<(), HostError> {
        if launch.is_terminated() {
            // The Terminate event may already have been delivered; repeat it
            // for whoever is waiting now.
            self.events
                .fire(vec![DebugEvent::process_terminated(launch.id(), launch.pid())]);
            return Ok(());
        }

        let pid = self
            .children
            .lock()
            .map_err(|_| HostError::LockPoisoned { what: "children" })?
            .get(&launch.id())
            .map(|t| t.child.id());

        let Some(pid) = pid else {
            // Never got a process: terminating the launch is all there is.
            info!(
                "Launch '{}' has no process, marking terminated",
                launch.display_name()
            );
            report_terminated(&self.events, launch, None);
            return Ok(());
        };

        info!("Stopping launch '{}' (PID {})", launch.display_name(), pid);
        match platform::terminate_process(pid) {
            Ok(()) => Ok(()),
            // Already gone; the watcher reports it.
            Err(HostError::ProcessNotFound { .. }) => Ok(()),
            Err(_) if !platform::is_process_running(pid) => Ok(()),
            Err(e) => {
                warn!("Graceful termination failed: {}, forcing kill", e);
                platform::kill_process(pid)
            }
        }
    }
}

fn report_terminated(events: &DebugEventBus, launch: &Launch, status: Option<ExitStatus>) {
    if launch.mark_terminated() {
        match status {
            Some(status) => info!(
                "Launch '{}' exited with {}",
                launch.display_name(),
                status
            ),
            None => info!("Launch '{}' terminated", launch.display_name()),
        }
    }
    events.fire(vec![DebugEvent::process_terminated(launch.id(), launch.pid())]);
}

fn watch_children(
    children: Arc<Mutex<ChildMap>>,
    events: Arc<DebugEventBus>,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
) {
    while running.load(Ordering::Acquire) {
        let exited: Vec<(Launch, Option<ExitStatus>)> = {
            let Ok(mut children) = children.lock() else {
                error!("Children lock poisoned, process watcher stopping");
                return;
            };
            let mut done = Vec::new();
            children.retain(|_, tracked| match tracked.child.try_wait() {
                Ok(Some(status)) => {
                    done.push((tracked.launch.clone(), Some(status)));
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    error!("Error checking process status: {}", e);
                    done.push((tracked.launch.clone(), None));
                    false
                }
            });
            done
        };

        for (launch, status) in exited {
            debug!("Process of launch {} ended", launch.id());
            report_terminated(&events, &launch, status);
        }

        thread::sleep(poll_interval);
    }
}
