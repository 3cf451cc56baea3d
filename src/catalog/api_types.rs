//! Serde-deserializable types matching the breed catalog responses.
//!
//! These types are separate from domain types so a payload can be decoded
//! before the locally-owned favourite flag is known.

use serde::Deserialize;

use super::types::Breed;

/// CDN location of a breed's reference image.
const IMAGE_URL_TEMPLATE: &str = "https://cdn2.thecatapi.com/images/{id}.jpg";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BreedWire {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub origin: Option<String>,
  #[serde(default)]
  pub temperament: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub reference_image_id: Option<String>,
}

impl BreedWire {
  pub fn image_url(&self) -> Option<String> {
    self
      .reference_image_id
      .as_deref()
      .filter(|id| !id.is_empty())
      .map(|id| IMAGE_URL_TEMPLATE.replace("{id}", id))
  }

  pub fn into_breed(self, is_favourite: bool) -> Breed {
    let image_url = self.image_url();
    Breed {
      id: self.id,
      name: self.name,
      origin: self.origin.unwrap_or_default(),
      temperament: self.temperament.unwrap_or_default(),
      description: self.description.unwrap_or_default(),
      image_url,
      is_favourite,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_optional_fields_default_to_empty() {
    let wire: BreedWire = serde_json::from_str(r#"{"id":"abys","name":"Abyssinian"}"#).unwrap();
    let breed = wire.into_breed(false);

    assert_eq!(breed.id, "abys");
    assert_eq!(breed.origin, "");
    assert_eq!(breed.temperament, "");
    assert_eq!(breed.description, "");
    assert_eq!(breed.image_url, None);
    assert!(!breed.is_favourite);
  }

  #[test]
  fn test_image_url_from_reference_image() {
    let wire: BreedWire = serde_json::from_str(
      r#"{"id":"beng","name":"Bengal","origin":"United States","reference_image_id":"O3btzLlsO"}"#,
    )
    .unwrap();

    assert_eq!(
      wire.image_url().as_deref(),
      Some("https://cdn2.thecatapi.com/images/O3btzLlsO.jpg")
    );
    assert_eq!(wire.into_breed(true).origin, "United States");
  }

  #[test]
  fn test_unknown_fields_are_ignored() {
    let wire: BreedWire = serde_json::from_str(
      r#"{"id":"beng","name":"Bengal","weight":{"metric":"3 - 7"},"life_span":"12 - 15"}"#,
    )
    .unwrap();
    assert_eq!(wire.name, "Bengal");
  }

  #[test]
  fn test_missing_name_is_rejected() {
    assert!(serde_json::from_str::<BreedWire>(r#"{"id":"beng"}"#).is_err());
  }
}
