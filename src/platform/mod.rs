//! Platform-specific process signaling
//!
//! Unix uses signals directly. Everywhere else goes through `sysinfo`.

use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::core::HostError;

#[cfg(unix)]
mod unix;

/// Terminate a process gracefully
pub fn terminate_process(pid: u32) -> Result<(), HostError> {
    #[cfg(unix)]
    {
        unix::send_signal(pid, libc::SIGTERM)
    }
    #[cfg(not(unix))]
    {
        with_process(pid, |process| {
            // Not every platform supports a graceful signal.
            process
                .kill_with(sysinfo::Signal::Term)
                .unwrap_or_else(|| process.kill())
        })
    }
}

/// Force kill a process
pub fn kill_process(pid: u32) -> Result<(), HostError> {
    #[cfg(unix)]
    {
        unix::send_signal(pid, libc::SIGKILL)
    }
    #[cfg(not(unix))]
    {
        with_process(pid, |process| process.kill())
    }
}

/// Check if a process is running
pub fn is_process_running(pid: u32) -> bool {
    let mut system = System::new();
    let pid = Pid::from_u32(pid);
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}

#[cfg(not(unix))]
fn with_process(
    pid: u32,
    signal: impl FnOnce(&sysinfo::Process) -> bool,
) -> Result<(), HostError> {
    let mut system = System::new();
    let sys_pid = Pid::from_u32(pid);
    system.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);
    let process = system
        .process(sys_pid)
        .ok_or(HostError::ProcessNotFound { pid })?;
    if signal(process) {
        Ok(())
    } else {
        Err(HostError::Signal {
            pid,
            source: std::io::Error::last_os_error(),
        })
    }
}
