//! End-to-end elimination with real processes

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use launch_eliminator::host::LocalHost;
use launch_eliminator::persistence::{Database, DatabaseSink};
use launch_eliminator::{EliminatorPlugin, LaunchConfig, MANAGED_LAUNCH_KIND};

fn sleeper(name: &str, kind: &str) -> LaunchConfig {
    LaunchConfig::new(name, kind)
        .with_executable("sleep")
        .with_arguments(vec!["30".to_string()])
}

fn setup() -> (LocalHost, EliminatorPlugin, Arc<Database>) {
    let database = Database::open_in_memory().expect("database");
    database.initialize().expect("schema");
    let database = Arc::new(database);

    let host = LocalHost::new(Duration::from_millis(10)).expect("host");
    let mut plugin = EliminatorPlugin::new(
        host.manager.clone(),
        host.events.clone(),
        host.launcher.clone(),
        Arc::new(DatabaseSink::new(database.clone(), "test.plugin")),
    );
    plugin.start();
    (host, plugin, database)
}

#[test]
fn second_launch_replaces_first() {
    let (host, mut plugin, database) = setup();

    let first = host
        .launcher
        .launch(sleeper("server", MANAGED_LAUNCH_KIND))
        .expect("first launch");
    assert!(first.pid().is_some());

    let second = host
        .launcher
        .launch(sleeper("server", MANAGED_LAUNCH_KIND))
        .expect("second launch");

    // The old process is confirmed gone before the new one exists.
    assert!(first.is_terminated());
    assert!(!second.is_terminated());
    assert!(second.pid().is_some());
    assert_ne!(first.pid(), second.pid());
    assert_eq!(host.launcher.running_count(), 1);
    assert!(database.recent_diagnostics(10).unwrap().is_empty());

    plugin.stop();
    host.shutdown();
    assert!(second.is_terminated());
}

#[test]
fn different_names_and_unmanaged_kinds_coexist() {
    let (host, mut plugin, _database) = setup();

    let server = host
        .launcher
        .launch(sleeper("server", MANAGED_LAUNCH_KIND))
        .expect("server");
    let client = host
        .launcher
        .launch(sleeper("client", MANAGED_LAUNCH_KIND))
        .expect("client");
    let tool_a = host
        .launcher
        .launch(sleeper("tool", "org.eclipse.jdt.launching.localJavaApplication"))
        .expect("tool a");
    let tool_b = host
        .launcher
        .launch(sleeper("tool", "org.eclipse.jdt.launching.localJavaApplication"))
        .expect("tool b");

    for launch in [&server, &client, &tool_a, &tool_b] {
        assert!(!launch.is_terminated());
    }
    assert_eq!(host.launcher.running_count(), 4);

    plugin.stop();
    host.shutdown();
}

#[test]
fn stopped_plugin_no_longer_eliminates() {
    let (host, mut plugin, _database) = setup();
    plugin.stop();

    let first = host
        .launcher
        .launch(sleeper("server", MANAGED_LAUNCH_KIND))
        .expect("first");
    let second = host
        .launcher
        .launch(sleeper("server", MANAGED_LAUNCH_KIND))
        .expect("second");

    assert!(!first.is_terminated());
    assert!(!second.is_terminated());
    host.shutdown();
}
