//! Remote breed catalog: wire types, HTTP client and the synchronizer that
//! reconciles it with the local cache.

pub mod api_types;
pub mod client;
pub mod error;
pub mod synchronizer;
pub mod transport;
pub mod types;

pub use client::CatalogClient;
pub use synchronizer::BreedSynchronizer;
pub use transport::ReqwestTransport;
pub use types::Breed;
