//! Shared test utilities for the forecast-etl workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Feed payload fixtures and builders
//! - Synthetic multi-location feed generators
//! - Test data path helpers and scratch directories
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{require_test_file, fixtures};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_sample_feed() {
///     let path = require_test_file!("cwa_sample.json");
///     // Test code using path...
/// }
/// ```
///
/// If the file is not found, the test will print a skip message and return early.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Set TEST_DATA_DIR to its location.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Compare two numbers within `epsilon`, after widening both to `f64`.
///
/// ```ignore
/// assert_approx_eq!(record.avg_temp.unwrap(), 20.0, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($actual:expr, $expected:expr, $epsilon:expr) => {{
        let (actual, expected) = ($actual as f64, $expected as f64);
        let epsilon = $epsilon as f64;
        assert!(
            (actual - expected).abs() <= epsilon,
            "assertion failed: {} is not within {} of {}",
            actual,
            epsilon,
            expected
        );
    }};
}
