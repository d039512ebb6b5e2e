//! Launch eliminator - Terminates a running duplicate whenever a managed
//! launch is added

use std::sync::Arc;

use tracing::{debug, info};

use super::error::EliminationError;
use super::kind::is_eligible;
use super::launch::Launch;
use super::matcher::find_equivalent_running;
use super::terminator::SynchronousTerminator;
use super::traits::{DiagnosticSink, LaunchListener, LaunchRegistry};

/// What happened to one "launch added" notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a managed launch
    Ignored,
    /// No running duplicate
    NoDuplicate,
    /// The duplicate was terminated and the termination confirmed
    Eliminated(Launch),
}

/// Orchestrates kind check, matching and synchronous termination.
///
/// Holds no state between notifications. Failures are reported to the
/// diagnostic sink and never reach the code that added the launch.
pub struct LaunchEliminator {
    registry: Arc<dyn LaunchRegistry>,
    terminator: SynchronousTerminator,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl LaunchEliminator {
    pub fn new(
        registry: Arc<dyn LaunchRegistry>,
        terminator: SynchronousTerminator,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            registry,
            terminator,
            diagnostics,
        }
    }

    pub fn terminator(&self) -> &SynchronousTerminator {
        &self.terminator
    }

    /// Run one elimination for `launch`, returning errors instead of
    /// reporting them
    pub fn eliminate(&self, launch: &Launch) -> Result<Outcome, EliminationError> {
        if !is_eligible(launch)? {
            return Ok(Outcome::Ignored);
        }

        let snapshot = self.registry.launches();
        let Some(running) = find_equivalent_running(launch, &snapshot) else {
            debug!("No running duplicate of '{}'", launch.display_name());
            return Ok(Outcome::NoDuplicate);
        };

        info!(
            "Launch '{}' duplicates running launch {}",
            launch.display_name(),
            running.id()
        );
        self.terminator.terminate_and_await(&running)?;
        Ok(Outcome::Eliminated(running))
    }

    /// Like [`LaunchEliminator::eliminate`], with failures reported once to
    /// the diagnostic sink
    pub fn handle_launch_added(&self, launch: &Launch) -> Option<Outcome> {
        match self.eliminate(launch) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.diagnostics.log_error(&format!(
                    "Could not eliminate running launch for '{}': {}",
                    launch.display_name(),
                    e
                ));
                None
            }
        }
    }
}

impl LaunchListener for LaunchEliminator {
    fn launch_added(&self, launch: &Launch) {
        self.handle_launch_added(launch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::HostError;
    use crate::core::test_support::{
        managed_launch, FakeControl, FakeEventChannel, FakeRegistry, RecordingSink,
    };
    use crate::core::{Interrupter, LaunchConfig, MANAGED_LAUNCH_KIND};

    struct Fixture {
        registry: Arc<FakeRegistry>,
        control: Arc<FakeControl>,
        sink: Arc<RecordingSink>,
        eliminator: LaunchEliminator,
    }

    fn fixture(channel: Arc<FakeEventChannel>, control: FakeControl) -> Fixture {
        let registry = Arc::new(FakeRegistry::default());
        let control = Arc::new(control);
        let sink = Arc::new(RecordingSink::default());
        let terminator = SynchronousTerminator::new(channel, control.clone(), Interrupter::new());
        let eliminator = LaunchEliminator::new(registry.clone(), terminator, sink.clone());
        Fixture {
            registry,
            control,
            sink,
            eliminator,
        }
    }

    fn confirming_fixture() -> Fixture {
        let channel = Arc::new(FakeEventChannel::default());
        fixture(channel.clone(), FakeControl::confirming(channel))
    }

    #[test]
    fn duplicate_is_terminated() {
        let f = confirming_fixture();
        let old = managed_launch("server");
        let new = managed_launch("server");
        f.registry.push(old.clone());
        f.registry.push(new.clone());

        let outcome = f.eliminator.eliminate(&new).unwrap();
        assert_eq!(outcome, Outcome::Eliminated(old.clone()));
        assert!(old.is_terminated());
        assert!(!new.is_terminated());
        assert_eq!(f.control.requests(), vec![old]);
        assert!(f.sink.messages().is_empty());
    }

    #[test]
    fn no_duplicate_means_no_request() {
        let f = confirming_fixture();
        let new = managed_launch("server");
        f.registry.push(managed_launch("client"));
        f.registry.push(new.clone());

        assert_eq!(f.eliminator.eliminate(&new).unwrap(), Outcome::NoDuplicate);
        assert!(f.control.requests().is_empty());
    }

    #[test]
    fn ineligible_kind_short_circuits() {
        let f = confirming_fixture();
        let java = "org.eclipse.jdt.launching.localJavaApplication";
        let old = Launch::new(LaunchConfig::new("server", java));
        let new = Launch::new(LaunchConfig::new("server", java));
        f.registry.push(old.clone());

        assert_eq!(f.eliminator.eliminate(&new).unwrap(), Outcome::Ignored);
        assert_eq!(f.registry.scans(), 0);
        assert!(f.control.requests().is_empty());
        assert!(!old.is_terminated());
    }

    #[test]
    fn deleted_configuration_is_ignored_silently() {
        let f = confirming_fixture();
        f.registry.push(managed_launch("server"));

        assert_eq!(
            f.eliminator.handle_launch_added(&Launch::detached()),
            Some(Outcome::Ignored)
        );
        assert_eq!(f.registry.scans(), 0);
        assert!(f.sink.messages().is_empty());
    }

    #[test]
    fn terminate_failure_logs_once() {
        let channel = Arc::new(FakeEventChannel::default());
        let control = FakeControl::new(|launch: &Launch| {
            Err(HostError::ProcessNotFound {
                pid: launch.pid().unwrap_or(0),
            })
        });
        let f = fixture(channel.clone(), control);
        f.registry.push(managed_launch("server"));
        let new = managed_launch("server");

        f.eliminator.launch_added(&new);

        assert_eq!(f.sink.messages().len(), 1);
        assert!(f.sink.messages()[0].contains("server"));
        assert_eq!(f.control.requests().len(), 1);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn kind_lookup_failure_logs_once() {
        let f = confirming_fixture();
        let new = Launch::new(LaunchConfig::new("server", MANAGED_LAUNCH_KIND).without_kind());

        assert_eq!(f.eliminator.handle_launch_added(&new), None);
        assert_eq!(f.sink.messages().len(), 1);
        assert_eq!(f.registry.scans(), 0);
    }

    #[test]
    fn interrupted_wait_logs_once() {
        let channel = Arc::new(FakeEventChannel::default());
        let f = fixture(channel, FakeControl::new(|_: &Launch| Ok(())));
        f.eliminator.terminator().interrupter().interrupt();
        f.registry.push(managed_launch("server"));

        let new = managed_launch("server");
        assert_eq!(f.eliminator.handle_launch_added(&new), None);
        assert_eq!(f.sink.messages().len(), 1);
        assert!(f.sink.messages()[0].contains("interrupted"));
    }

    #[test]
    fn registered_listener_runs_on_launch_added() {
        let channel = Arc::new(FakeEventChannel::default());
        let registry = Arc::new(FakeRegistry::default());
        let control = Arc::new(FakeControl::confirming(channel.clone()));
        let terminator = SynchronousTerminator::new(channel, control.clone(), Interrupter::new());
        let eliminator: Arc<dyn LaunchListener> = Arc::new(LaunchEliminator::new(
            registry.clone(),
            terminator,
            Arc::new(RecordingSink::default()),
        ));
        registry.add_launch_listener(eliminator.clone());

        let old = managed_launch("server");
        registry.add(old.clone());
        assert!(control.requests().is_empty());

        registry.add(managed_launch("server"));
        assert!(old.is_terminated());

        registry.remove_launch_listener(&eliminator);
        assert_eq!(registry.listener_count(), 0);
    }
}
