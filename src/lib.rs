pub mod command;
pub mod config;
pub mod logger;
pub mod vfs;

pub use config::{Config, StorageBackend};
pub use vfs::{StorageAdapter, StorageFacade, VfsError, VfsResult};
