//! Best-effort product view counting off the request path

use sqlx::SqlitePool;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::repository::increment_views;

/// Bounded queue of view increments drained by one background task.
///
/// Increments are delivered at most once: a full or closed queue drops
/// them, and anything still queued is lost on shutdown.
#[derive(Clone, Debug)]
pub struct ViewCounter {
    tx: mpsc::Sender<i64>,
}

impl ViewCounter {
    /// Must be called from inside a tokio runtime
    pub fn spawn(db: SqlitePool, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<i64>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(product_id) = rx.recv().await {
                if let Err(e) = increment_views(&db, product_id).await {
                    warn!(product_id = product_id, error = %e, "Failed to record product view");
                }
            }
            debug!("View counter stopped");
        });

        Self { tx }
    }

    /// Queue one view. Returns `false` when the increment was dropped.
    pub fn record(&self, product_id: i64) -> bool {
        match self.tx.try_send(product_id) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!(product_id = product_id, "View counter queue full, dropping view");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(product_id = product_id, "View counter closed, dropping view");
                false
            }
        }
    }

    /// Counter without a worker, for observing the queue directly
    #[cfg(test)]
    pub(crate) fn unattended(capacity: usize) -> (Self, mpsc::Receiver<i64>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}
