pub mod error;
pub mod jobs;
pub mod search;

#[cfg(feature = "lancedb")]
pub mod lance;

pub use error::StoreError;
pub use jobs::{JobStore, MemoryJobStore};
pub use search::PrecedentSearch;

#[cfg(feature = "lancedb")]
pub use lance::LancePrecedentStore;
