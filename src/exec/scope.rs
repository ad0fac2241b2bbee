// src/exec/scope.rs

//! Cancellation scope shared by every command of a run.
//!
//! A scope carries an optional deadline and an explicit cancellation flag.
//! Clones share the same flag, so cancelling any clone (e.g. from a Ctrl-C
//! handler) interrupts whichever command is currently waiting on the scope.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Why a scope ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeExit {
    DeadlineExceeded,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct RunScope {
    deadline: Option<Instant>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl RunScope {
    /// A scope that only ends through [`RunScope::cancel`].
    pub fn unbounded() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            deadline: None,
            cancel_tx: Arc::new(tx),
            cancel_rx: rx,
        }
    }

    /// A scope whose deadline is `timeout` from now.
    ///
    /// A timeout too large to represent as an instant has no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::unbounded(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::unbounded()
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel the scope and every clone of it.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Non-blocking check: has the scope already ended?
    pub fn exited(&self) -> Option<ScopeExit> {
        if self.is_cancelled() {
            return Some(ScopeExit::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ScopeExit::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the deadline passes or the scope is cancelled.
    pub async fn done(&self) -> ScopeExit {
        let mut rx = self.cancel_rx.clone();
        let cancelled = async move {
            // The sender lives in `self`, so the channel cannot close while we wait.
            let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = cancelled => ScopeExit::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ScopeExit::DeadlineExceeded,
            },
            None => {
                cancelled.await;
                ScopeExit::Cancelled
            }
        }
    }
}

impl Default for RunScope {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_elapses() {
        let scope = RunScope::with_timeout(Duration::from_millis(20));
        assert_eq!(scope.exited(), None);
        assert_eq!(scope.done().await, ScopeExit::DeadlineExceeded);
        assert_eq!(scope.exited(), Some(ScopeExit::DeadlineExceeded));
    }

    #[tokio::test]
    async fn unrepresentable_timeout_means_no_deadline() {
        let scope = RunScope::with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(scope.deadline(), None);
        assert_eq!(scope.exited(), None);

        assert!(RunScope::with_timeout(Duration::from_secs(60)).deadline().is_some());
    }

    #[tokio::test]
    async fn cancel_reaches_clones() {
        let scope = RunScope::with_timeout(Duration::from_secs(60));
        let clone = scope.clone();

        let waiter = tokio::spawn(async move { clone.done().await });
        scope.cancel();

        let exit = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("scope did not end after cancel")
            .unwrap();
        assert_eq!(exit, ScopeExit::Cancelled);
        assert!(scope.is_cancelled());
    }
}
