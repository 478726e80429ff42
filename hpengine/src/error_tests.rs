//! Unit tests for error.rs
//!
//! Tests all Error variants, their trait implementations and the
//! engine_err! / engine_bail! macros.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_invalid_argument_display() {
    let err = Error::InvalidArgument("TripleBuffer needs 3 instances".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid argument"));
    assert!(display.contains("TripleBuffer needs 3 instances"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("octree size must be positive".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("octree size must be positive"));
}

#[test]
fn test_command_failed_display() {
    let err = Error::CommandFailed("entity vanished".to_string());
    assert_eq!(format!("{}", err), "Command failed: entity vanished");
}

#[test]
fn test_behavior_failed_display() {
    let err = Error::BehaviorFailed("spin".to_string());
    assert_eq!(format!("{}", err), "Behavior failed: spin");
}

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("device lost".to_string());
    assert_eq!(format!("{}", err), "Backend error: device lost");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::CommandFailed("x".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::InvalidArgument("a".to_string()));
    assert!(debug.contains("InvalidArgument"));

    let debug = format!("{:?}", Error::InitializationFailed("b".to_string()));
    assert!(debug.contains("InitializationFailed"));
}

#[test]
fn test_error_clone() {
    let err1 = Error::BehaviorFailed("test".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));
}

// ============================================================================
// MACROS
// ============================================================================

fn bail_if_negative(value: i32) -> Result<i32> {
    if value < 0 {
        crate::engine_bail!("hpengine::test", "negative value {}", value);
    }
    Ok(value)
}

#[test]
fn test_engine_err_builds_invalid_argument() {
    let err = crate::engine_err!("hpengine::test", "slot {} missing", 7);
    match err {
        Error::InvalidArgument(msg) => assert_eq!(msg, "slot 7 missing"),
        other => panic!("unexpected variant: {:?}", other),
    }
}

#[test]
fn test_engine_bail_returns_early() {
    assert_eq!(bail_if_negative(3).unwrap(), 3);
    let err = bail_if_negative(-1).unwrap_err();
    assert!(format!("{}", err).contains("negative value -1"));
}
