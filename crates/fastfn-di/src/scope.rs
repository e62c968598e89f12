//! Per-request teardown scope.

use std::fmt;
use std::panic::AssertUnwindSafe;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

struct Release {
    label: String,
    future: BoxFuture<'static, ()>,
}

/// Teardowns registered by cleanup-bearing dependencies during one request.
///
/// [`close`](Self::close) runs them in reverse registration order, each
/// exactly once. A scope dropped without being closed hands its pending
/// teardowns to the current Tokio runtime, or logs them when there is none.
#[derive(Default)]
pub struct ResourceScope {
    releases: Vec<Release>,
}

impl ResourceScope {
    /// An empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a teardown.
    pub fn push(&mut self, label: impl Into<String>, release: BoxFuture<'static, ()>) {
        self.releases.push(Release {
            label: label.into(),
            future: release,
        });
    }

    /// Number of pending teardowns.
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// True if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Run every pending teardown, last registered first.
    ///
    /// A panicking teardown is logged and does not stop the others.
    pub async fn close(mut self) {
        let releases = std::mem::take(&mut self.releases);
        run_releases(releases).await;
    }
}

async fn run_releases(mut releases: Vec<Release>) {
    while let Some(release) = releases.pop() {
        tracing::debug!(dependency = %release.label, "running dependency teardown");
        if AssertUnwindSafe(release.future).catch_unwind().await.is_err() {
            tracing::error!(dependency = %release.label, "dependency teardown panicked");
        }
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        if self.releases.is_empty() {
            return;
        }
        let releases = std::mem::take(&mut self.releases);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(pending = releases.len(), "resource scope dropped before close");
                handle.spawn(run_releases(releases));
            }
            Err(_) => {
                tracing::warn!(
                    pending = releases.len(),
                    "resource scope dropped outside a runtime; teardowns skipped"
                );
            }
        }
    }
}

impl fmt::Debug for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.releases.iter().map(|r| r.label.as_str()).collect();
        f.debug_struct("ResourceScope")
            .field("pending", &labels)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &str) -> BoxFuture<'static, ()> {
        let log = Arc::clone(log);
        let label = label.to_string();
        Box::pin(async move { log.lock().push(label) })
    }

    #[tokio::test]
    async fn test_close_runs_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scope = ResourceScope::new();
        scope.push("db", recorder(&log, "db"));
        scope.push("cache", recorder(&log, "cache"));
        assert_eq!(scope.len(), 2);

        scope.close().await;
        assert_eq!(*log.lock(), ["cache", "db"]);
    }

    #[tokio::test]
    async fn test_panicking_teardown_does_not_stop_others() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scope = ResourceScope::new();
        scope.push("first", recorder(&log, "first"));
        scope.push("boom", Box::pin(async { panic!("teardown failed") }));

        scope.close().await;
        assert_eq!(*log.lock(), ["first"]);
    }

    #[tokio::test]
    async fn test_drop_spawns_pending_teardowns() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        {
            let mut scope = ResourceScope::new();
            scope.push("db", recorder(&log, "db"));
            scope.push(
                "signal",
                Box::pin(async move {
                    let _ = tx.send(());
                }),
            );
        }
        rx.await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(*log.lock(), ["db"]);
    }

    #[test]
    fn test_drop_outside_runtime_is_safe() {
        let mut scope = ResourceScope::new();
        scope.push("db", Box::pin(async {}));
        drop(scope);
    }
}
