use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{Storage, StorageError, TransactionHandle, TransactionStatus};
use crate::cancel::Cancellation;

const DEFAULT_BEGIN_POLL: Duration = Duration::from_millis(10);

struct Shared {
    data: RwLock<HashMap<String, Vec<u8>>>,
    /// `true` while a transaction holds the writer slot.
    writer: Mutex<bool>,
    released: Condvar,
    next_id: AtomicU64,
}

impl Shared {
    fn release_writer(&self) {
        let mut busy = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        *busy = false;
        self.released.notify_one();
    }
}

/// In-memory transactional key/value store.
///
/// Transactions are serialized: `begin` blocks while another transaction is
/// open and wakes up when it commits, rolls back or is dropped. Waiting
/// honours the caller's `Cancellation`, checked every `begin_poll` interval.
///
/// Cloning creates another handle to the same storage.
///
/// ## Example
///
/// ```
/// use sourced_uow::cancel::Cancellation;
/// use sourced_uow::storage::{HashMapStorage, Storage, TransactionHandle};
///
/// let storage = HashMapStorage::new();
/// let tx = storage.begin(&Cancellation::new()).unwrap();
/// tx.put("greeting", b"hello".to_vec()).unwrap();
/// assert_eq!(storage.get("greeting"), None);
///
/// tx.commit().unwrap();
/// assert_eq!(storage.get("greeting"), Some(b"hello".to_vec()));
/// ```
#[derive(Clone)]
pub struct HashMapStorage {
    shared: Arc<Shared>,
    begin_poll: Duration,
}

impl Default for HashMapStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl HashMapStorage {
    pub fn new() -> Self {
        HashMapStorage {
            shared: Arc::new(Shared {
                data: RwLock::new(HashMap::new()),
                writer: Mutex::new(false),
                released: Condvar::new(),
                next_id: AtomicU64::new(1),
            }),
            begin_poll: DEFAULT_BEGIN_POLL,
        }
    }

    /// Set how often a blocked `begin` re-checks its cancellation token.
    pub fn with_begin_poll(mut self, interval: Duration) -> Self {
        self.begin_poll = interval.max(Duration::from_millis(1));
        self
    }

    /// Read a committed value.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.shared
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Read and deserialize a committed JSON value.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key) {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Committed keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let data = self
            .shared
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = data.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.shared
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a transaction currently holds the writer slot.
    pub fn is_busy(&self) -> bool {
        *self
            .shared
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for HashMapStorage {
    type Transaction = HashMapTransaction;

    fn begin(&self, cancel: &Cancellation) -> Result<HashMapTransaction, StorageError> {
        cancel.check()?;

        let mut busy = self
            .shared
            .writer
            .lock()
            .map_err(|_| StorageError::LockPoisoned("begin"))?;
        while *busy {
            cancel.check()?;
            busy = match self.shared.released.wait_timeout(busy, self.begin_poll) {
                Ok((guard, _)) => guard,
                Err(_) => return Err(StorageError::LockPoisoned("begin")),
            };
        }
        // The slot may have been released after the token was cancelled.
        if let Err(reason) = cancel.check() {
            drop(busy);
            self.shared.released.notify_one();
            return Err(reason.into());
        }
        *busy = true;
        drop(busy);

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(transaction = id, "transaction started");

        Ok(HashMapTransaction {
            id,
            shared: Arc::clone(&self.shared),
            state: Mutex::new(TxState {
                status: TransactionStatus::Open,
                staged: HashMap::new(),
            }),
        })
    }
}

struct TxState {
    status: TransactionStatus,
    /// `None` marks a staged delete.
    staged: HashMap<String, Option<Vec<u8>>>,
}

impl TxState {
    fn ensure_open(&self) -> Result<(), StorageError> {
        match self.status {
            TransactionStatus::Open => Ok(()),
            status => Err(StorageError::Closed(status)),
        }
    }
}

/// A transaction on a `HashMapStorage`.
///
/// Writes are staged and visible only to this transaction until `commit`.
/// Dropping an open transaction rolls it back.
pub struct HashMapTransaction {
    id: u64,
    shared: Arc<Shared>,
    state: Mutex<TxState>,
}

impl HashMapTransaction {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> TransactionStatus {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    /// Read a value, seeing this transaction's own staged writes.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StorageError::LockPoisoned("transaction read"))?;
        state.ensure_open()?;

        if let Some(staged) = state.staged.get(key) {
            return Ok(staged.clone());
        }

        let data = self
            .shared
            .data
            .read()
            .map_err(|_| StorageError::LockPoisoned("read"))?;
        Ok(data.get(key).cloned())
    }

    pub fn put(&self, key: impl Into<String>, value: Vec<u8>) -> Result<(), StorageError> {
        self.stage(key.into(), Some(value))
    }

    pub fn delete(&self, key: impl Into<String>) -> Result<(), StorageError> {
        self.stage(key.into(), None)
    }

    /// Serialize `value` as JSON and stage it under `key`.
    pub fn put_json<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        self.put(key, bytes)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of staged writes and deletes.
    pub fn pending_writes(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .staged
            .len()
    }

    fn stage(&self, key: String, value: Option<Vec<u8>>) -> Result<(), StorageError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StorageError::LockPoisoned("transaction write"))?;
        state.ensure_open()?;
        state.staged.insert(key, value);
        Ok(())
    }
}

impl TransactionHandle for HashMapTransaction {
    fn commit(&self) -> Result<(), StorageError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StorageError::LockPoisoned("commit"))?;
        state.ensure_open()?;

        {
            let mut data = self
                .shared
                .data
                .write()
                .map_err(|_| StorageError::LockPoisoned("commit"))?;
            for (key, value) in state.staged.drain() {
                match value {
                    Some(bytes) => {
                        data.insert(key, bytes);
                    }
                    None => {
                        data.remove(&key);
                    }
                }
            }
        }

        state.status = TransactionStatus::Committed;
        drop(state);
        self.shared.release_writer();
        debug!(transaction = self.id, "transaction committed");
        Ok(())
    }

    fn rollback(&self) -> Result<(), StorageError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StorageError::LockPoisoned("rollback"))?;
        state.ensure_open()?;

        let discarded = state.staged.len();
        state.staged.clear();
        state.status = TransactionStatus::RolledBack;
        drop(state);
        self.shared.release_writer();
        debug!(transaction = self.id, discarded, "transaction rolled back");
        Ok(())
    }
}

impl Drop for HashMapTransaction {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state.status == TransactionStatus::Open {
            state.staged.clear();
            state.status = TransactionStatus::RolledBack;
            self.shared.release_writer();
            debug!(transaction = self.id, "open transaction dropped, rolled back");
        }
    }
}
