//! Test support for the radar workspace: synthetic Level II and Level III
//! builders, shared fixtures, broadcast event waits and test data paths.
//!
//! Real archives are not checked in. Tests that need one use
//! [`require_test_file!`] and skip when it is absent.

pub mod events;
pub mod fixtures;
pub mod generators;
pub mod paths;

pub use events::*;
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Path to a real archive or product, or skip the calling test.
///
/// ```ignore
/// let path = test_utils::require_test_file!("KTLX20240506_223045_V06");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: {} not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// Assert `left` and `right` differ by at most `epsilon`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_within_epsilon() {
        assert_approx_eq!(0.5f32, 0.5001, 1e-3);
        assert_approx_eq!(-97.2778, -97.2778f32, 1e-4);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_outside_epsilon() {
        assert_approx_eq!(1.5, 1.0, 0.1);
    }

    #[test]
    fn test_require_test_file_skips() {
        let _path = require_test_file!("no-such-volume_V06");
        panic!("missing file should skip");
    }
}
