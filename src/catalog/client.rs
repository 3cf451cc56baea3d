use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use super::api_types::BreedWire;
use super::error::RemoteError;
use super::transport::{HttpRequest, Transport};

/// Read access to the remote breed catalog.
#[async_trait]
pub trait BreedCatalog: Send + Sync {
  async fn list_breeds(&self, page: u32, limit: u32) -> Result<Vec<BreedWire>, RemoteError>;

  async fn search_breeds(&self, query: &str) -> Result<Vec<BreedWire>, RemoteError>;

  async fn get_breed_detail(&self, id: &str) -> Result<BreedWire, RemoteError>;
}

/// Catalog API client. Stateless apart from the base url and transport.
#[derive(Clone)]
pub struct CatalogClient<T: Transport> {
  base_url: Url,
  transport: T,
}

impl<T: Transport> CatalogClient<T> {
  pub fn new(base_url: &str, transport: T) -> Result<Self, RemoteError> {
    let base_url = Url::parse(base_url).map_err(|_| RemoteError::InvalidUrl(base_url.to_string()))?;
    if base_url.cannot_be_a_base() {
      return Err(RemoteError::InvalidUrl(base_url.to_string()));
    }
    Ok(Self {
      base_url,
      transport,
    })
  }

  /// `{base}/breeds?limit=&page=`
  pub fn breeds_url(&self, page: u32, limit: u32) -> Result<Url, RemoteError> {
    let mut url = self.endpoint(&["breeds"])?;
    url
      .query_pairs_mut()
      .append_pair("limit", &limit.to_string())
      .append_pair("page", &page.to_string());
    Ok(url)
  }

  /// `{base}/breeds/search?q=`
  pub fn search_url(&self, query: &str) -> Result<Url, RemoteError> {
    let mut url = self.endpoint(&["breeds", "search"])?;
    url.query_pairs_mut().append_pair("q", query);
    Ok(url)
  }

  /// `{base}/breeds/{id}`
  pub fn detail_url(&self, id: &str) -> Result<Url, RemoteError> {
    if id.is_empty() {
      return Err(RemoteError::InvalidUrl(format!("{}/breeds/", self.base_url)));
    }
    self.endpoint(&["breeds", id])
  }

  fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn get_json<R: DeserializeOwned>(&self, url: Url) -> Result<R, RemoteError> {
    let response = self.transport.request(HttpRequest::get(url.as_str())).await?;

    if !response.is_success() {
      return Err(RemoteError::ServerStatus(response.status));
    }
    if response.body.is_empty() {
      return Err(RemoteError::NoData);
    }

    serde_json::from_slice(&response.body).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
  }
}

#[async_trait]
impl<T: Transport> BreedCatalog for CatalogClient<T> {
  async fn list_breeds(&self, page: u32, limit: u32) -> Result<Vec<BreedWire>, RemoteError> {
    let url = self.breeds_url(page, limit)?;
    self.get_json(url).await
  }

  async fn search_breeds(&self, query: &str) -> Result<Vec<BreedWire>, RemoteError> {
    let url = self.search_url(query)?;
    self.get_json(url).await
  }

  async fn get_breed_detail(&self, id: &str) -> Result<BreedWire, RemoteError> {
    let url = self.detail_url(id)?;
    self.get_json(url).await
  }
}
