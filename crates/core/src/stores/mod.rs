pub mod supermemory;
pub mod supermemory_files;

pub use supermemory::SupermemoryStore;
pub use supermemory_files::SupermemoryFileStore;

pub(crate) const BACKEND: &str = "supermemory";
