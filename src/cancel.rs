use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{MesherError, Result};

/// Cooperative cancellation signal shared between a caller and running
/// meshing work.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns [`MesherError::Cancelled`] if cancellation has been requested.
    ///
    /// # Errors
    ///
    /// Returns [`MesherError::Cancelled`] after [`cancel`](Self::cancel).
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MesherError::Cancelled)
        } else {
            Ok(())
        }
    }
}
