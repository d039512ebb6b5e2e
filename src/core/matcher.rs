//! Matching a new launch against the launches already known to the host

use super::launch::Launch;

/// Find a running launch equivalent to `new_launch`.
///
/// Equivalent means: a different launch (by identity), not terminated, whose
/// configuration name equals the new launch's. If several qualify, the last
/// one in `known` order wins. A new launch without a resolvable name never
/// matches anything.
pub fn find_equivalent_running(new_launch: &Launch, known: &[Launch]) -> Option<Launch> {
    let name = new_launch.name()?;
    known
        .iter()
        .filter(|other| *other != new_launch)
        .filter(|other| !other.is_terminated())
        .filter(|other| other.name().as_deref() == Some(name.as_str()))
        .last()
        .cloned()
}
