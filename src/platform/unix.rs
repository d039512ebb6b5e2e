//! Unix signal delivery

use crate::core::HostError;

/// Send `signal` to `pid`
pub fn send_signal(pid: u32, signal: libc::c_int) -> Result<(), HostError> {
    let Ok(raw_pid) = libc::pid_t::try_from(pid) else {
        return Err(HostError::ProcessNotFound { pid });
    };
    // SAFETY: kill(2) has no memory-safety preconditions.
    let result = unsafe { libc::kill(raw_pid, signal) };
    if result == 0 {
        return Ok(());
    }
    let error = std::io::Error::last_os_error();
    if error.raw_os_error() == Some(libc::ESRCH) {
        Err(HostError::ProcessNotFound { pid })
    } else {
        Err(HostError::Signal { pid, source: error })
    }
}
