//! Cooperative run cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation handle for a run. Cloneable; all clones observe the same
/// flag. The orchestrator checks it between stages and the dispatcher checks
/// it before each task.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    cancelled: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the run
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let control = RunControl::new();
        let clone = control.clone();
        assert!(!clone.is_cancelled());

        control.cancel();
        assert!(clone.is_cancelled());
    }
}
