//! Persistence layer.
//!
//! Stores are byte-level; the blob format lives in `persist`.

pub mod persist;

pub use persist::{
    FileStore, MemoryStore, PersistedBlob, Store, StorageError,
    load_state, save_state, BLOB_VERSION,
};
