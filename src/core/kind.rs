//! Launch kind predicate

use super::error::EliminationError;
use super::launch::Launch;

/// Kind identifier of the launches that are checked for duplicates
pub const MANAGED_LAUNCH_KIND: &str = "org.eclipse.pde.ui.EquinoxLauncher";

/// Whether `launch` takes part in duplicate elimination.
///
/// A launch whose configuration is gone is not eligible. A configuration
/// whose kind cannot be looked up is a host error.
pub fn is_eligible(launch: &Launch) -> Result<bool, EliminationError> {
    let Ok(config) = launch.resolve_configuration() else {
        return Ok(false);
    };
    match config.kind.as_deref() {
        Some(kind) => Ok(kind == MANAGED_LAUNCH_KIND),
        None => Err(EliminationError::KindLookup {
            config: config.name,
        }),
    }
}
