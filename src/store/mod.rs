//! Persistence layer: key-value port, its backends, and tour records.

pub mod file;
pub mod memory;
pub mod tour_store;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use tour_store::TourStore;
pub use traits::KeyValueStore;
