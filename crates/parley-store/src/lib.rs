pub mod backend;
pub mod repository;
pub mod store;

pub use backend::{BackendError, FileBackend, MemoryBackend, StorageBackend};
pub use repository::ChannelRepository;
pub use store::{ChannelStore, StoreError, STORAGE_KEY};
