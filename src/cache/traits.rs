//! Core traits and types for the breed cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::StorageError;
use crate::catalog::types::Breed;

/// A breed record as persisted in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBreed {
  pub id: String,
  pub name: String,
  pub origin: String,
  pub temperament: String,
  pub description: String,
  pub image_url: Option<String>,
  pub is_favorite: bool,
  /// Time of the last persisted write to this record
  pub last_updated: DateTime<Utc>,
}

impl LocalBreed {
  pub fn from_breed(breed: &Breed, last_updated: DateTime<Utc>) -> Self {
    Self {
      id: breed.id.clone(),
      name: breed.name.clone(),
      origin: breed.origin.clone(),
      temperament: breed.temperament.clone(),
      description: breed.description.clone(),
      image_url: breed.image_url.clone(),
      is_favorite: breed.is_favourite,
      last_updated,
    }
  }
}

/// Local persistence for breed records.
///
/// The store is the only writer of `is_favorite` and `last_updated`.
/// Implementations serialize writes internally.
pub trait BreedStore: Send + Sync {
  /// Insert or update records by id.
  ///
  /// Existing records keep their favourite flag; every other field is
  /// overwritten and `last_updated` is set to now.
  fn upsert_many(&self, breeds: &[LocalBreed]) -> Result<(), StorageError>;

  /// Records sorted by name (case-insensitive).
  fn list(&self, limit: Option<usize>, offset: Option<usize>)
    -> Result<Vec<LocalBreed>, StorageError>;

  fn get(&self, id: &str) -> Result<Option<LocalBreed>, StorageError>;

  /// Case-insensitive substring match on name, sorted by name.
  fn search(&self, query: &str) -> Result<Vec<LocalBreed>, StorageError>;

  fn list_favourites(&self) -> Result<Vec<LocalBreed>, StorageError>;

  /// Returns false if no record with `id` exists.
  fn set_favourite(&self, id: &str, value: bool) -> Result<bool, StorageError>;

  /// Remove every record. Returns how many were removed.
  fn clear(&self) -> Result<usize, StorageError>;
}

/// Result from a synchronizer read, including where the data came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Fresh data from the remote catalog.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Remote fetch failed, serving cached data.
  pub fn offline(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
    }
  }

  /// Local-only read, the network was never consulted.
  pub fn local(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Local,
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Network unavailable, serving cached data
  Offline,
  /// Data that only ever lives locally (favourites)
  Local,
}
