//! Thread helpers.

use std::thread::{self, JoinHandle};

/// Runs `action` on a new named thread and returns its handle.
///
/// Joining the handle yields whatever `action` returned, so the test can
/// assert on the result of the call made from the other thread.
pub fn run_in_separate_thread<F, R>(action: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    thread::Builder::new()
        .name("indexguard-test-worker".into())
        .spawn(action)
        .expect("Failed to spawn test thread")
}
