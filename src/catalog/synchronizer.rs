//! Breed synchronizer that reconciles the remote catalog with the local cache.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{BreedStore, CacheResult, LocalBreed, StorageError};

use super::api_types::BreedWire;
use super::client::BreedCatalog;
use super::error::RemoteError;
use super::types::Breed;

/// Error from an operation that needs both the catalog and the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
  #[error(transparent)]
  Remote(#[from] RemoteError),
  #[error(transparent)]
  Storage(#[from] StorageError),
}

/// Remote-first breed access with cache fallback.
///
/// Every read tries the catalog first. Fresh results get the cached
/// favourite flag overlaid and are written back to the cache; when the
/// catalog is unreachable the cache answers instead. Favourites never leave
/// the cache.
pub struct BreedSynchronizer<S: BreedStore, C: BreedCatalog> {
  storage: Arc<S>,
  catalog: Arc<C>,
}

impl<S: BreedStore, C: BreedCatalog> BreedSynchronizer<S, C> {
  pub fn new(storage: S, catalog: C) -> Self {
    Self {
      storage: Arc::new(storage),
      catalog: Arc::new(catalog),
    }
  }

  /// One page of breeds.
  ///
  /// Never fails: a catalog error falls back to the cached page at
  /// `page * limit`, and an unusable cache yields an empty list.
  pub async fn get_breeds(&self, page: u32, limit: u32) -> CacheResult<Vec<Breed>> {
    match self.catalog.list_breeds(page, limit).await {
      Ok(wires) => CacheResult::from_network(self.refresh(wires)),
      Err(e) => {
        debug!(page, limit, error = %e, "breed list fetch failed, reading cache");
        let offset = (page as usize).saturating_mul(limit as usize);
        let cached = self.storage.list(Some(limit as usize), Some(offset));
        CacheResult::offline(self.cached_or_empty(cached))
      }
    }
  }

  /// Breeds whose name matches `query`. Falls back like `get_breeds`.
  pub async fn search_breeds(&self, query: &str) -> CacheResult<Vec<Breed>> {
    match self.catalog.search_breeds(query).await {
      Ok(wires) => CacheResult::from_network(self.refresh(wires)),
      Err(e) => {
        debug!(query, error = %e, "breed search failed, reading cache");
        let cached = self.storage.search(query);
        CacheResult::offline(self.cached_or_empty(cached))
      }
    }
  }

  /// Search when `query` has content, otherwise list a page.
  pub async fn browse(&self, page: u32, limit: u32, query: Option<&str>) -> CacheResult<Vec<Breed>> {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
      Some(query) => self.search_breeds(query).await,
      None => self.get_breeds(page, limit).await,
    }
  }

  /// A single breed.
  ///
  /// If the catalog fails and the breed is not cached, the catalog's error
  /// is returned as is.
  pub async fn get_breed_detail(&self, id: &str) -> Result<CacheResult<Breed>, RemoteError> {
    match self.catalog.get_breed_detail(id).await {
      Ok(wire) => {
        let breed = self.overlay(wire);
        self.persist(std::slice::from_ref(&breed));
        Ok(CacheResult::from_network(breed))
      }
      Err(error) => match self.storage.get(id) {
        Ok(Some(local)) => {
          debug!(id, error = %error, "breed detail fetch failed, serving cache");
          Ok(CacheResult::offline(local.into()))
        }
        Ok(None) => Err(error),
        Err(storage_error) => {
          warn!(id, error = %storage_error, "cache lookup failed after breed detail fetch failed");
          Err(error)
        }
      },
    }
  }

  /// Set the local favourite flag. Returns false if the breed is not cached.
  pub fn set_favourite(&self, id: &str, value: bool) -> Result<bool, StorageError> {
    let updated = self.storage.set_favourite(id, value)?;
    debug!(id, value, updated, "set favourite");
    Ok(updated)
  }

  /// Flip the favourite flag, fetching the breed first if it is not cached.
  /// Returns the new value.
  pub async fn toggle_favourite(&self, id: &str) -> Result<bool, SyncError> {
    let current = match self.storage.get(id)? {
      Some(local) => local.is_favorite,
      None => self.get_breed_detail(id).await?.data.is_favourite,
    };

    let value = !current;
    if !self.set_favourite(id, value)? {
      return Err(StorageError::NotFound(id.to_string()).into());
    }
    Ok(value)
  }

  /// All favourite breeds, straight from the cache.
  pub fn get_favourite_breeds(&self) -> Result<CacheResult<Vec<Breed>>, StorageError> {
    let favourites = self.storage.list_favourites()?;
    Ok(CacheResult::local(
      favourites.into_iter().map(Breed::from).collect(),
    ))
  }

  /// Drop every cached breed, favourites included.
  pub fn clear_cache(&self) -> Result<usize, StorageError> {
    self.storage.clear()
  }

  /// Overlay favourites onto fresh records and write them back.
  fn refresh(&self, wires: Vec<BreedWire>) -> Vec<Breed> {
    let breeds: Vec<Breed> = wires.into_iter().map(|wire| self.overlay(wire)).collect();
    self.persist(&breeds);
    breeds
  }

  fn overlay(&self, wire: BreedWire) -> Breed {
    let is_favourite = match self.storage.get(&wire.id) {
      Ok(local) => local.is_some_and(|b| b.is_favorite),
      Err(e) => {
        warn!(id = %wire.id, error = %e, "favourite lookup failed, assuming not favourite");
        false
      }
    };
    wire.into_breed(is_favourite)
  }

  // Write failures are logged only; the caller already has fresh data.
  fn persist(&self, breeds: &[Breed]) {
    if breeds.is_empty() {
      return;
    }
    let now = Utc::now();
    let records: Vec<LocalBreed> = breeds
      .iter()
      .map(|breed| LocalBreed::from_breed(breed, now))
      .collect();

    if let Err(e) = self.storage.upsert_many(&records) {
      warn!(count = records.len(), error = %e, "failed to cache fetched breeds");
    }
  }

  fn cached_or_empty(&self, cached: Result<Vec<LocalBreed>, StorageError>) -> Vec<Breed> {
    match cached {
      Ok(breeds) => breeds.into_iter().map(Breed::from).collect(),
      Err(e) => {
        warn!(error = %e, "cache read failed, returning no breeds");
        Vec::new()
      }
    }
  }
}

impl<S: BreedStore, C: BreedCatalog> Clone for BreedSynchronizer<S, C> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      catalog: Arc::clone(&self.catalog),
    }
  }
}
