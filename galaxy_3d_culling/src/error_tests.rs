//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_invalid_operation_display() {
    let err = Error::InvalidOperation("cannot remove an internal node".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid operation"));
    assert!(display.contains("cannot remove an internal node"));
}

#[test]
fn test_invalid_handle_display() {
    let err = Error::InvalidHandle("node key is stale".to_string());
    assert_eq!(format!("{}", err), "Invalid handle: node key is stale");
}

#[test]
fn test_corrupt_tree_display() {
    let err = Error::CorruptTree("missing child".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Corrupt tree"));
    assert!(display.contains("missing child"));
}

#[test]
fn test_invalid_config_display() {
    let err = Error::InvalidConfig("fog density must be positive".to_string());
    assert!(format!("{}", err).starts_with("Invalid config"));
}

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("depth readback failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("depth readback failed"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::CorruptTree("x".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::InvalidOperation("x".to_string()));
    assert!(debug.contains("InvalidOperation"));

    let debug = format!("{:?}", Error::InvalidHandle("x".to_string()));
    assert!(debug.contains("InvalidHandle"));
}

#[test]
fn test_error_clone_and_eq() {
    let err1 = Error::InvalidConfig("bad".to_string());
    let err2 = err1.clone();
    assert_eq!(err1, err2);
    assert_ne!(err1, Error::InvalidConfig("other".to_string()));
}

// ============================================================================
// RESULT TYPE
// ============================================================================

#[test]
fn test_result_question_mark_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::InvalidHandle("gone".to_string()))
    }

    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }

    assert_eq!(outer(), Err(Error::InvalidHandle("gone".to_string())));
}
