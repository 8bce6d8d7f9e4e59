pub mod debounce;
pub mod gateway;

pub use debounce::{DebouncedSaver, DEFAULT_FLUSH_DELAY};
pub use gateway::{load_store, to_blob, FileGateway, PersistError, PersistenceGateway};
