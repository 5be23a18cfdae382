//! Progress hooks for the repository and record loops.
//!
//! Two loops report progress. The `harvest` command walks the configured
//! repositories, and the usage collector sends one statistics request per
//! record, which takes minutes on a large PANGAEA set. Both report through
//! [`ProgressCallback`] so the library crates never touch the terminal.

use std::sync::Arc;

/// Receives updates from a repository or record loop.
pub trait ProgressCallback: Send + Sync {
    /// Number of repositories or records the loop will visit.
    fn set_total(&self, total: u64);

    /// One more repository or record handled, whether it succeeded or not.
    fn advance(&self);

    /// Replaces the label shown next to the bar.
    fn set_message(&self, msg: String);

    /// Freezes the bar with a one-line outcome.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn advance(&self) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Progress sink for tests and callers without a terminal.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
