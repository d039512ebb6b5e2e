//! Launch model - One running or finished launch and the configuration behind it

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ResolutionError;

/// Unique identifier for a launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LaunchId(pub Uuid);

impl LaunchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LaunchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LaunchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Configuration name, the key two launches are compared by
    pub name: String,
    /// Launch kind identifier. `None` when the configuration's type is not
    /// registered with the host.
    #[serde(default)]
    pub kind: Option<String>,
    /// Path to the executable
    #[serde(default)]
    pub executable_path: PathBuf,
    /// Command line arguments
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Working directory (defaults to executable's directory)
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
    /// Environment variables to set
    #[serde(default)]
    pub environment: Vec<(String, String)>,
}

impl LaunchConfig {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind.into()),
            executable_path: PathBuf::new(),
            arguments: Vec::new(),
            working_directory: None,
            environment: Vec::new(),
        }
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = path.into();
        self
    }

    pub fn with_arguments(mut self, args: Vec<String>) -> Self {
        self.arguments = args;
        self
    }

    /// Drop the kind, as if its type had been uninstalled
    pub fn without_kind(mut self) -> Self {
        self.kind = None;
        self
    }
}

struct LaunchInner {
    id: LaunchId,
    config: RwLock<Option<LaunchConfig>>,
    terminated: AtomicBool,
    /// 0 until the host attaches a process
    pid: AtomicU32,
}

/// Shared handle to a launch.
///
/// Clones refer to the same launch. Equality is identity: two launches with
/// the same configuration name are still different launches.
#[derive(Clone)]
pub struct Launch {
    inner: Arc<LaunchInner>,
}

impl Launch {
    pub fn new(config: LaunchConfig) -> Self {
        Self::with_config(Some(config))
    }

    /// A launch whose configuration has already been deleted
    pub fn detached() -> Self {
        Self::with_config(None)
    }

    fn with_config(config: Option<LaunchConfig>) -> Self {
        Self {
            inner: Arc::new(LaunchInner {
                id: LaunchId::new(),
                config: RwLock::new(config),
                terminated: AtomicBool::new(false),
                pid: AtomicU32::new(0),
            }),
        }
    }

    pub fn id(&self) -> LaunchId {
        self.inner.id
    }

    /// Snapshot of the configuration, if it still exists
    pub fn configuration(&self) -> Option<LaunchConfig> {
        self.inner.config.read().ok().and_then(|c| c.clone())
    }

    /// Like [`Launch::configuration`], but a missing configuration is an error
    pub fn resolve_configuration(&self) -> Result<LaunchConfig, ResolutionError> {
        self.configuration()
            .ok_or(ResolutionError::MissingConfiguration { launch: self.id() })
    }

    /// Configuration name, `None` once the configuration is gone
    pub fn name(&self) -> Option<String> {
        self.inner
            .config
            .read()
            .ok()
            .and_then(|c| c.as_ref().map(|c| c.name.clone()))
    }

    /// Forget the configuration. The launch itself keeps existing.
    pub fn detach_configuration(&self) {
        if let Ok(mut config) = self.inner.config.write() {
            *config = None;
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::Acquire)
    }

    /// Flip the terminated flag. Returns `true` only for the call that
    /// performed the transition.
    pub fn mark_terminated(&self) -> bool {
        !self.inner.terminated.swap(true, Ordering::AcqRel)
    }

    pub fn pid(&self) -> Option<u32> {
        match self.inner.pid.load(Ordering::Acquire) {
            0 => None,
            pid => Some(pid),
        }
    }

    pub fn attach_process(&self, pid: u32) {
        self.inner.pid.store(pid, Ordering::Release);
    }

    /// Name for log lines
    pub fn display_name(&self) -> String {
        self.name().unwrap_or_else(|| format!("<deleted {}>", self.id()))
    }
}

impl PartialEq for Launch {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Launch {}

impl std::fmt::Debug for Launch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launch")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("terminated", &self.is_terminated())
            .field("pid", &self.pid())
            .finish()
    }
}
