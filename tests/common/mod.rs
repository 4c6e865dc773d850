//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use inputrec_rs::{SessionController, SessionState};
use std::time::{Duration, Instant};

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Poll until the controller reaches `state`, or panic after the test timeout
pub fn wait_for_state(controller: &SessionController, state: SessionState) {
    let deadline = Instant::now() + test_timeout();
    while controller.state() != state {
        assert!(
            Instant::now() < deadline,
            "controller stuck in {} waiting for {}",
            controller.state(),
            state
        );
        std::thread::sleep(Duration::from_millis(2));
    }
}
