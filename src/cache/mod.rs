//! Local breed cache for offline support and favourites.
//!
//! The cache is the single source of truth for the favourite flag:
//! - Stores breed records keyed by id, upserted after every remote fetch
//! - Keeps favourite flags across upserts (the catalog has no such concept)
//! - Serves listing, search and point lookups when the network is unavailable

mod error;
mod storage;
mod traits;

pub use error::StorageError;
pub use storage::SqliteStorage;
pub use traits::{BreedStore, CacheResult, CacheSource, LocalBreed};
