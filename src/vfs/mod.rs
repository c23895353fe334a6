pub mod directory;
pub mod manager;
pub mod model;
pub mod path_normalizer;
pub mod search;
pub mod storage;
pub mod upload;

pub use directory::VirtualDirectory;
pub use manager::StorageFacade;
pub use model::{Entry, EntryKind, FileInfo, RemoteResponse, VfsError, VfsResult};
pub use path_normalizer::PathScrubber;
pub use search::SearchFilter;
pub use storage::{
    BlobAdapter, LocalAdapter, MemoryObjectStore, ObjectStoreAdapter, ObjectStoreClient,
    StorageAdapter,
};
pub use upload::{UploadFields, UploadPayload};
