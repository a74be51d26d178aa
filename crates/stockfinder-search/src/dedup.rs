//! Collapse concurrent identical requests into one upstream call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinError;

type InFlight<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;
type InFlightTable<T, E> = Arc<Mutex<HashMap<String, InFlight<T, E>>>>;

/// In-flight table keyed by request key.
///
/// While a call for a key is pending, later callers with the same key await
/// the same shared result instead of running their producer. Each call runs
/// on its own task, so it finishes and its entry is removed as soon as it
/// settles, success or failure, even when every caller has gone away.
pub struct RequestDeduplicator<T, E> {
    in_flight: InFlightTable<T, E>,
}

impl<T, E> RequestDeduplicator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<JoinError> + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `producer` for `key`, or join the call already in flight for it.
    ///
    /// `producer` is only invoked when no call for `key` is pending. Its
    /// future is spawned onto the current tokio runtime; a panic or
    /// cancellation of that task surfaces as `E::from(JoinError)`.
    pub async fn dedupe<F, Fut>(&self, key: &str, producer: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let shared = {
            let mut table = lock(&self.in_flight);
            if let Some(pending) = table.get(key) {
                tracing::debug!(key, "joining in-flight request");
                pending.clone()
            } else {
                let table_handle = Arc::clone(&self.in_flight);
                let owned_key = key.to_string();
                let call = producer();
                let task = tokio::spawn(async move {
                    let _entry = EntryGuard {
                        table: table_handle,
                        key: owned_key,
                    };
                    call.await
                });
                let pending = task
                    .map(|joined| joined.unwrap_or_else(|e| Err(E::from(e))))
                    .boxed()
                    .shared();
                table.insert(key.to_string(), pending.clone());
                pending
            }
        };
        shared.await
    }

    /// Number of keys with a call currently pending.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }
}

impl<T, E> Default for RequestDeduplicator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<JoinError> + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Removes its key from the table when the spawned call ends, including by
/// panic.
struct EntryGuard<T, E> {
    table: InFlightTable<T, E>,
    key: String,
}

impl<T, E> Drop for EntryGuard<T, E> {
    fn drop(&mut self) {
        lock(&self.table).remove(&self.key);
    }
}

fn lock<T, E>(table: &InFlightTable<T, E>) -> MutexGuard<'_, HashMap<String, InFlight<T, E>>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}
