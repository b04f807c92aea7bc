// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cancellation scoped to a view's lifetime.
//!
//! A view creates a [`ViewScope`], runs its requests through it, and cancels
//! it (or drops the [`ScopeGuard`]) on teardown. Results of requests still in
//! flight are then discarded instead of being applied to a dead view.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct ViewScope {
    cancelled: Arc<watch::Sender<bool>>,
}

impl ViewScope {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            cancelled: Arc::new(tx),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Run `fut` until it completes or the scope is cancelled.
    ///
    /// Returns `None` if the scope was cancelled first (or already).
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut rx = self.cancelled.subscribe();
        if *rx.borrow_and_update() {
            return None;
        }

        tokio::select! {
            out = fut => (!self.is_cancelled()).then_some(out),
            _ = rx.wait_for(|c| *c) => {
                tracing::debug!("Request discarded, view scope cancelled");
                None
            }
        }
    }

    /// Guard that cancels the scope when dropped.
    pub fn guard(&self) -> ScopeGuard {
        ScopeGuard {
            scope: self.clone(),
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ScopeGuard {
    scope: ViewScope,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completed_future_passes_through() {
        let scope = ViewScope::new();
        assert_eq!(scope.run(async { 5 }).await, Some(5));
    }

    #[tokio::test]
    async fn test_cancel_discards_pending_result() {
        let scope = ViewScope::new();
        let canceller = scope.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let out = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                1
            })
            .await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_guard_cancels_on_drop() {
        let scope = ViewScope::new();
        drop(scope.guard());
        assert!(scope.is_cancelled());
        assert_eq!(scope.run(async { 1 }).await, None);
    }
}
