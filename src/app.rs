use crate::cache::{CacheResult, CacheSource, SqliteStorage};
use crate::catalog::{Breed, BreedSynchronizer, CatalogClient, ReqwestTransport};
use crate::config::Config;
use crate::Command;
use color_eyre::{eyre::eyre, Result};
use serde_json::json;
use tracing::info;

type Synchronizer = BreedSynchronizer<SqliteStorage, CatalogClient<ReqwestTransport>>;

/// Main application state
pub struct App {
  /// Breed synchronizer over the catalog API and the local cache
  sync: Synchronizer,

  /// Application configuration
  config: Config,

  /// Print JSON instead of text
  json: bool,
}

impl App {
  pub fn new(config: Config, json: bool) -> Result<Self> {
    let transport = ReqwestTransport::new(config.timeout(), Config::get_api_key().as_deref())?;
    let catalog = CatalogClient::new(&config.api.base_url, transport)?;

    let cache_path = config.cache_path()?;
    let storage = SqliteStorage::open(&cache_path)?;
    info!(base_url = %config.api.base_url, cache = %cache_path.display(), "initialized");

    Ok(Self {
      sync: BreedSynchronizer::new(storage, catalog),
      config,
      json,
    })
  }

  pub async fn run(&self, command: Command) -> Result<()> {
    match command {
      Command::List { page, limit, query } => {
        let limit = limit.unwrap_or(self.config.page_size);
        if limit == 0 {
          return Err(eyre!("--limit must be at least 1"));
        }
        let result = self.sync.browse(page, limit, query.as_deref()).await;
        self.print_breeds(&result);
      }
      Command::Search { query } => {
        let result = self.sync.search_breeds(&query).await;
        self.print_breeds(&result);
      }
      Command::Show { id } => {
        let result = self.sync.get_breed_detail(&id).await?;
        if self.json {
          println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "source": result.source, "breed": result.data }))?
          );
        } else {
          print!("{}", format_breed_detail(&result.data));
          print_source_note(result.source);
        }
      }
      Command::Favourite { id } => self.set_favourite(&id, true)?,
      Command::Unfavourite { id } => self.set_favourite(&id, false)?,
      Command::Toggle { id } => {
        let value = self.sync.toggle_favourite(&id).await?;
        self.print_favourite(&id, value);
      }
      Command::Favourites => {
        let result = self.sync.get_favourite_breeds()?;
        self.print_breeds(&result);
      }
      Command::ClearCache => {
        let removed = self.sync.clear_cache()?;
        if self.json {
          println!("{}", json!({ "removed": removed }));
        } else {
          println!("Removed {} cached breeds", removed);
        }
      }
    }
    Ok(())
  }

  fn set_favourite(&self, id: &str, value: bool) -> Result<()> {
    if !self.sync.set_favourite(id, value)? {
      return Err(eyre!(
        "Breed {} is not cached yet. Load it first with `cats show {}`",
        id,
        id
      ));
    }
    self.print_favourite(id, value);
    Ok(())
  }

  fn print_favourite(&self, id: &str, value: bool) {
    if self.json {
      println!("{}", json!({ "id": id, "is_favourite": value }));
    } else if value {
      println!("★ {} added to favourites", id);
    } else {
      println!("{} removed from favourites", id);
    }
  }

  fn print_breeds(&self, result: &CacheResult<Vec<Breed>>) {
    if self.json {
      println!(
        "{}",
        json!({ "source": result.source, "breeds": result.data })
      );
      return;
    }

    if result.data.is_empty() {
      println!("No breeds found");
    }
    for breed in &result.data {
      println!("{}", format_breed_line(breed));
    }
    print_source_note(result.source);
  }
}

fn print_source_note(source: CacheSource) {
  if source == CacheSource::Offline {
    eprintln!("(offline: showing cached breeds)");
  }
}

/// One-line summary used in lists.
fn format_breed_line(breed: &Breed) -> String {
  let marker = if breed.is_favourite { "★" } else { " " };
  if breed.origin.is_empty() {
    format!("{} {:<6} {}", marker, breed.id, breed.name)
  } else {
    format!("{} {:<6} {} ({})", marker, breed.id, breed.name, breed.origin)
  }
}

fn format_breed_detail(breed: &Breed) -> String {
  let mut out = format!("{}{}\n", breed.name, if breed.is_favourite { " ★" } else { "" });
  out.push_str(&format!("  id:          {}\n", breed.id));
  for (label, value) in [("origin", &breed.origin), ("temperament", &breed.temperament)] {
    if !value.is_empty() {
      out.push_str(&format!("  {:<12} {}\n", format!("{}:", label), value));
    }
  }
  if let Some(url) = &breed.image_url {
    out.push_str(&format!("  image:       {}\n", url));
  }
  if !breed.description.is_empty() {
    out.push('\n');
    out.push_str(&breed.description);
    out.push('\n');
  }
  out
}
