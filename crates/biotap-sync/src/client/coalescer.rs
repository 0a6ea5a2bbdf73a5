use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use biotap_core::{QueryKey, Result, SyncError};

/// Deduplicates concurrent fetches of the same query key
#[derive(Clone, Default)]
pub(crate) struct Coalescer {
    // Map key -> Broadcast channel sender
    // The sender transmits the outcome of the fetch
    inflight: Arc<DashMap<QueryKey, broadcast::Sender<Result<()>>>>,
    // Requests that joined a fetch already in flight
    joined: Arc<AtomicU64>,
}

/// Removes the in-flight marker even if the leader is cancelled
struct InflightGuard<'a> {
    inflight: &'a DashMap<QueryKey, broadcast::Sender<Result<()>>>,
    key: &'a QueryKey,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.inflight.remove(self.key);
    }
}

impl Coalescer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Execute a request with coalescing for the given key.
    /// If a request for this key is already running, wait for its result.
    /// Otherwise, run the request and broadcast the result.
    pub(crate) async fn do_request<F, Fut>(&self, key: &QueryKey, f: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        // Scope the entry so the shard lock is released before awaiting
        let action = {
            match self.inflight.entry(key.clone()) {
                dashmap::mapref::entry::Entry::Occupied(o) => Ok(o.get().subscribe()),
                dashmap::mapref::entry::Entry::Vacant(v) => {
                    let (tx, _rx) = broadcast::channel(1);
                    v.insert(tx.clone());
                    Err(tx)
                }
            }
        };

        match action {
            Ok(mut rx) => {
                self.joined.fetch_add(1, Ordering::Relaxed);
                rx.recv().await.unwrap_or_else(|_| {
                    Err(SyncError::Internal(format!(
                        "in-flight fetch for {} was dropped",
                        key
                    )))
                })
            }
            Err(tx) => {
                let guard = InflightGuard {
                    inflight: &self.inflight,
                    key,
                };
                let result = f().await;
                drop(guard);

                if tx.receiver_count() > 0 {
                    let _ = tx.send(result.clone());
                }
                result
            }
        }
    }

    /// Whether a fetch for `key` is running
    pub(crate) fn is_inflight(&self, key: &QueryKey) -> bool {
        self.inflight.contains_key(key)
    }

    /// Number of requests served by joining another fetch
    pub(crate) fn joined(&self) -> u64 {
        self.joined.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_share_one_call() {
        let coalescer = Coalescer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::links(7);

        let run = |calls: Arc<AtomicUsize>| {
            let coalescer = coalescer.clone();
            let key = key.clone();
            async move {
                coalescer
                    .do_request(&key, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(())
                    })
                    .await
            }
        };

        let (a, b) = tokio::join!(run(calls.clone()), run(calls.clone()));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coalescer.joined(), 1);
        assert!(!coalescer.is_inflight(&key));
    }

    #[tokio::test]
    async fn test_error_is_shared() {
        let coalescer = Coalescer::new();
        let key = QueryKey::links(7);
        let result = coalescer
            .do_request(&key, || async { Err(SyncError::Timeout) })
            .await;
        assert_eq!(result, Err(SyncError::Timeout));
        assert!(!coalescer.is_inflight(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_leader_releases_key() {
        let coalescer = Coalescer::new();
        let key = QueryKey::links(7);

        let leader = {
            let coalescer = coalescer.clone();
            let key = key.clone();
            tokio::spawn(async move {
                coalescer
                    .do_request(&key, || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert!(coalescer.is_inflight(&key));

        leader.abort();
        let _ = leader.await;
        assert!(!coalescer.is_inflight(&key));
    }
}
