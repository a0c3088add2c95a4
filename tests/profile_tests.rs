//! Integration tests for profile loading.
//!
//! Uses temporary files keyed by process id so parallel test runs never
//! collide.

use flightbridge::engine::{BindMode, LedTarget, LogicKind, OutputTarget, VJoyAxis};
use flightbridge::profile::Profile;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Returns a unique temporary file path for test isolation.
fn get_test_file_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "flightbridge_profile_test_{}_{}.toml",
        name,
        std::process::id()
    ));
    path
}

/// Removes a test file if it exists.
fn cleanup_test_file(path: &PathBuf) {
    let _ = fs::remove_file(path);
}

#[test]
fn test_profile_load_from_file() {
    let path = get_test_file_path("load");
    let text = r#"
        hz = 50

        [[bindings]]
        input = "x55.axis.0"
        target = "axis:AXIS_X"
        invert = true

        [[bindings]]
        id = "gear"
        inputs = ["flightpanel.switch.0", "flightpanel.switch.1"]
        logic = "all_same"
        target = "led:landing_gear"

        [[bindings]]
        input = "flightpanel.switch.5"
        target = "button:12"
        mode = "toggle"
        pulse_ms = 250
        trigger = "on_release"
    "#;
    fs::write(&path, text).expect("Failed to write test profile");

    let profile = Profile::load(&path).expect("Failed to load profile");
    cleanup_test_file(&path);

    assert_eq!(profile.hz, 50);
    assert_eq!(profile.cycle_period(), Duration::from_millis(20));
    assert_eq!(profile.bindings.len(), 3);
    assert_eq!(profile.bindings[0].target, OutputTarget::Axis(VJoyAxis::X));
    assert_eq!(profile.bindings[1].logic, LogicKind::AllSame);
    assert_eq!(
        profile.bindings[1].target,
        OutputTarget::Led(LedTarget::LandingGear)
    );
    assert_eq!(profile.bindings[2].mode, BindMode::Toggle);
    assert_eq!(
        profile.bindings[2].pulse_width,
        Some(Duration::from_millis(250))
    );
}

#[test]
fn test_missing_profile_file_is_an_error() {
    let path = get_test_file_path("missing");
    cleanup_test_file(&path);
    assert!(Profile::load(&path).is_err());
}

#[test]
fn test_invalid_binding_aborts_load() {
    let path = get_test_file_path("invalid");
    let text = r#"
        [[bindings]]
        input = "flightpanel.switch.0"
        target = "button:1"

        [[bindings]]
        input = "flightpanel.switch.1"
        target = "winch:1"
    "#;
    fs::write(&path, text).expect("Failed to write test profile");

    let result = Profile::load(&path);
    cleanup_test_file(&path);
    assert!(result.is_err(), "unknown target prefix must abort startup");
}

#[test]
fn test_binding_ids_default_to_document_order() {
    let path = get_test_file_path("ids");
    let text = r#"
        [[bindings]]
        input = "a.switch.0"
        target = "button:1"

        [[bindings]]
        input = "a.switch.1"
        target = "button:2"
    "#;
    fs::write(&path, text).expect("Failed to write test profile");

    let profile = Profile::load(&path).expect("Failed to load profile");
    cleanup_test_file(&path);

    assert_eq!(profile.bindings[0].id, "binding0");
    assert_eq!(profile.bindings[1].id, "binding1");
}
