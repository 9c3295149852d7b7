use std::sync::Arc;

use parley_types::ChannelTable;
use tracing::error;

use crate::backend::{BackendError, StorageBackend};

/// Storage key for the whole channel table. Matches the key used by the
/// original browser build so existing persisted data stays readable.
pub const STORAGE_KEY: &str = "sibers_chat_channels";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("persisted channel table is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to serialize channel table: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Durable mapping from one fixed key to the serialized [`ChannelTable`].
///
/// The table is the sole unit of durability: every mutation reads the whole
/// document, changes one entry, and rewrites the whole document.
pub struct ChannelStore {
    backend: Arc<dyn StorageBackend>,
}

impl ChannelStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Load the table, distinguishing "nothing persisted yet" (`Ok` with an
    /// empty table) from backend failure and corrupt JSON.
    pub fn try_load(&self) -> Result<ChannelTable, StoreError> {
        match self.backend.get(STORAGE_KEY)? {
            Some(blob) => serde_json::from_str(&blob).map_err(StoreError::Corrupt),
            None => Ok(ChannelTable::new()),
        }
    }

    /// Fail-soft load: any failure is logged and masked as an empty table.
    /// Never errors, never panics.
    pub fn load(&self) -> ChannelTable {
        match self.try_load() {
            Ok(table) => table,
            Err(e) => {
                error!("Error reading channels from storage: {}", e);
                ChannelTable::new()
            }
        }
    }

    pub fn try_save(&self, table: &ChannelTable) -> Result<(), StoreError> {
        let blob = serde_json::to_string(table).map_err(StoreError::Serialize)?;
        self.backend.set(STORAGE_KEY, &blob)?;
        Ok(())
    }

    /// Fail-silent save: on error the failure is logged and swallowed. The
    /// caller proceeds as if the write succeeded; the mutation is simply
    /// not durable.
    pub fn save(&self, table: &ChannelTable) {
        if let Err(e) = self.try_save(table) {
            error!("Error writing channels to storage: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use parley_types::Channel;

    /// Backend whose every operation fails, for exercising the fail-soft
    /// and fail-silent paths.
    struct FailingBackend;

    impl StorageBackend for FailingBackend {
        fn get(&self, _key: &str) -> Result<Option<String>, BackendError> {
            Err(BackendError::Io(std::io::Error::other("disk on fire")))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), BackendError> {
            Err(BackendError::Io(std::io::Error::other("disk on fire")))
        }

        fn remove(&self, _key: &str) -> Result<(), BackendError> {
            Err(BackendError::Io(std::io::Error::other("disk on fire")))
        }
    }

    fn memory_store() -> (Arc<MemoryBackend>, ChannelStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = ChannelStore::new(backend.clone());
        (backend, store)
    }

    fn sample_table() -> ChannelTable {
        let mut table = ChannelTable::new();
        table.insert(
            "c1".into(),
            Channel {
                id: "c1".into(),
                name: "General".into(),
                creator_id: "u1".into(),
                participants: vec!["u1".into()],
                messages: vec![],
                created_at: 1,
            },
        );
        table
    }

    #[test]
    fn load_of_empty_storage_is_empty_table() {
        let (_, store) = memory_store();
        assert!(store.load().is_empty());
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_, store) = memory_store();
        let table = sample_table();

        store.save(&table);
        assert_eq!(store.load(), table);
    }

    #[test]
    fn corrupt_blob_masks_as_empty_table() {
        let (backend, store) = memory_store();
        backend.set(STORAGE_KEY, "{not json").unwrap();

        assert!(matches!(store.try_load(), Err(StoreError::Corrupt(_))));
        assert!(store.load().is_empty());
    }

    #[test]
    fn backend_read_failure_masks_as_empty_table() {
        let store = ChannelStore::new(Arc::new(FailingBackend));

        assert!(matches!(store.try_load(), Err(StoreError::Backend(_))));
        assert!(store.load().is_empty());
    }

    #[test]
    fn backend_write_failure_is_swallowed() {
        let store = ChannelStore::new(Arc::new(FailingBackend));

        // no panic, no error surfaced to the caller
        store.save(&sample_table());
        assert!(matches!(
            store.try_save(&sample_table()),
            Err(StoreError::Backend(_))
        ));
    }
}
