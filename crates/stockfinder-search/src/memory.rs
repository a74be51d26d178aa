use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::{self, BoxFuture, FutureExt};
use stockfinder_core::{PersistenceError, PersistentKeyValueStore};

/// Process-local key-value store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistentKeyValueStore for MemoryKeyValueStore {
    fn read<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, PersistenceError>> {
        let value = self.values().get(key).cloned();
        future::ready(Ok(value)).boxed()
    }

    fn write<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        self.values().insert(key.to_string(), value.to_string());
        future::ready(Ok(())).boxed()
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), PersistenceError>> {
        self.values().remove(key);
        future::ready(Ok(())).boxed()
    }
}
