use super::{ChatStore, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, VecDeque};

#[derive(Default)]
struct Collections {
    logs: HashMap<String, VecDeque<String>>,
    sets: HashMap<String, BTreeSet<String>>,
}

/// In-process store with the same ordering semantics as [`super::RedisStore`].
///
/// Nothing survives a restart. `fail_with` makes every subsequent command
/// return the given error, which lets callers exercise store outages.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    failure: Mutex<Option<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject (`Some`) or clear (`None`) a failure for all commands.
    pub fn fail_with(&self, failure: Option<StoreError>) {
        *self.failure.lock() = failure;
    }

    fn check(&self) -> StoreResult<()> {
        match self.failure.lock().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn append_to_log(&self, log: &str, entry: String) -> StoreResult<()> {
        self.check()?;
        self.collections
            .lock()
            .logs
            .entry(log.to_string())
            .or_default()
            .push_front(entry);
        Ok(())
    }

    async fn read_log(&self, log: &str) -> StoreResult<Vec<String>> {
        self.check()?;
        let collections = self.collections.lock();
        Ok(collections
            .logs
            .get(log)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_to_set(&self, set: &str, member: &str) -> StoreResult<bool> {
        self.check()?;
        Ok(self
            .collections
            .lock()
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn read_set(&self, set: &str) -> StoreResult<Vec<String>> {
        self.check()?;
        let collections = self.collections.lock();
        Ok(collections
            .sets
            .get(set)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}
