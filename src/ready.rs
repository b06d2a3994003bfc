//! One-shot readiness coordination.
//!
//! Backend-specific startup (spawning simulators, opening buses, peer
//! coordination) signals completion exactly once through [`ReadySignal`];
//! any number of waiters block on it, each with its own optional bound.
//! A timed-out wait is reported distinctly from "signal never arrives".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use crate::error::{Result, RtuError};

/// Shared one-shot readiness signal.
///
/// Cloning yields another handle to the same signal. The signal is
/// normally set once; [`ReadySignal::clear`] exists so a stopped RTU can
/// return to the not-ready state.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ReadySignal {
    /// Create a signal in the not-ready state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Mark the RTU as ready. Idempotent.
    pub fn set(&self) {
        self.tx.send_replace(true);
    }

    /// Return the signal to the not-ready state.
    pub fn clear(&self) {
        self.tx.send_replace(false);
    }

    /// Check the current state without waiting.
    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal fires.
    ///
    /// With `limit` set, gives up after that duration and reports
    /// [`RtuError::ReadyTimeout`]; without one, waits indefinitely.
    pub async fn wait(&self, limit: Option<Duration>) -> Result<()> {
        let mut rx = self.tx.subscribe();
        let ready = rx.wait_for(|set| *set);
        match limit {
            Some(bound) => match timeout(bound, ready).await {
                Ok(result) => {
                    result.map_err(|_| {
                        RtuError::Internal("readiness channel closed".into())
                    })?;
                    Ok(())
                }
                Err(_) => Err(RtuError::ReadyTimeout),
            },
            None => {
                ready.await.map_err(|_| {
                    RtuError::Internal("readiness channel closed".into())
                })?;
                Ok(())
            }
        }
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}
