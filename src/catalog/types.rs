use serde::Serialize;

use crate::cache::LocalBreed;

/// A cat breed as shown to the user.
///
/// `is_favourite` is never provided by the remote catalog; it always comes
/// from the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breed {
  pub id: String,
  pub name: String,
  pub origin: String,
  pub temperament: String,
  pub description: String,
  pub image_url: Option<String>,
  pub is_favourite: bool,
}

impl From<LocalBreed> for Breed {
  fn from(local: LocalBreed) -> Self {
    Breed {
      id: local.id,
      name: local.name,
      origin: local.origin,
      temperament: local.temperament,
      description: local.description,
      image_url: local.image_url,
      is_favourite: local.is_favorite,
    }
  }
}
