//! SQLite implementation of the breed store.

use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::error::StorageError;
use super::traits::{BreedStore, LocalBreed};

/// SQLite-based breed storage.
///
/// All access goes through a single connection behind a mutex, which
/// serializes writes.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

/// Schema for the breed cache.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS breeds (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    origin TEXT NOT NULL DEFAULT '',
    temperament TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    image_url TEXT,
    is_favorite INTEGER NOT NULL DEFAULT 0,
    last_updated TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_breeds_favorite ON breeds(is_favorite);
"#;

const SELECT_BREED: &str = "SELECT id, name, origin, temperament, description, image_url, is_favorite, last_updated FROM breeds";

/// Name ordering shared by every listing. SQLite's NOCASE only folds ASCII.
const BY_NAME: &str = "ORDER BY lower_unicode(name), id";

// Existing rows keep their is_favorite value.
const UPSERT_BREED: &str = r#"
INSERT INTO breeds (id, name, origin, temperament, description, image_url, is_favorite, last_updated)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    origin = excluded.origin,
    temperament = excluded.temperament,
    description = excluded.description,
    image_url = excluded.image_url,
    last_updated = excluded.last_updated
"#;

impl SqliteStorage {
  /// Open or create the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self, StorageError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| StorageError::Init(format!("failed to create cache directory: {}", e)))?;
    }

    let conn = Connection::open(path).map_err(|e| {
      StorageError::Init(format!(
        "failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::with_connection(conn)
  }

  /// Open a private in-memory cache.
  pub fn open_in_memory() -> Result<Self, StorageError> {
    let conn = Connection::open_in_memory()
      .map_err(|e| StorageError::Init(format!("failed to open in-memory cache: {}", e)))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self, StorageError> {
    register_functions(&conn)?;
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  fn run_migrations(&self) -> Result<(), StorageError> {
    self
      .conn()?
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| StorageError::Init(format!("failed to run cache migrations: {}", e)))
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
    self
      .conn
      .lock()
      .map_err(|_| StorageError::ContextUnavailable)
  }

  fn query_breeds<P: rusqlite::Params>(
    &self,
    sql: &str,
    params: P,
  ) -> Result<Vec<LocalBreed>, StorageError> {
    let conn = self.conn()?;
    let mut stmt = conn
      .prepare(sql)
      .map_err(|e| StorageError::Fetch(format!("failed to prepare query: {}", e)))?;

    let breeds = stmt
      .query_map(params, breed_from_row)
      .map_err(|e| StorageError::Fetch(format!("failed to query breeds: {}", e)))?
      .collect::<Result<Vec<_>, _>>()
      .map_err(|e| StorageError::Fetch(format!("failed to read breed row: {}", e)))?;

    Ok(breeds)
  }
}

impl BreedStore for SqliteStorage {
  fn upsert_many(&self, breeds: &[LocalBreed]) -> Result<(), StorageError> {
    let mut conn = self.conn()?;
    let now = timestamp(Utc::now());

    let tx = conn
      .transaction()
      .map_err(|e| StorageError::Save(format!("failed to begin transaction: {}", e)))?;

    {
      let mut stmt = tx
        .prepare(UPSERT_BREED)
        .map_err(|e| StorageError::Save(format!("failed to prepare upsert: {}", e)))?;

      for breed in breeds {
        stmt
          .execute(params![
            breed.id,
            breed.name,
            breed.origin,
            breed.temperament,
            breed.description,
            breed.image_url,
            breed.is_favorite,
            now,
          ])
          .map_err(|e| StorageError::Save(format!("failed to store breed {}: {}", breed.id, e)))?;
      }
    }

    tx.commit()
      .map_err(|e| StorageError::Save(format!("failed to commit transaction: {}", e)))?;

    debug!(count = breeds.len(), "cached breeds");
    Ok(())
  }

  fn list(
    &self,
    limit: Option<usize>,
    offset: Option<usize>,
  ) -> Result<Vec<LocalBreed>, StorageError> {
    // SQLite only accepts OFFSET together with LIMIT; -1 means unbounded.
    let limit = limit.map(to_sql_int).unwrap_or(-1);
    let offset = offset.map(to_sql_int).unwrap_or(0);

    self.query_breeds(
      &format!(
        "{} {} LIMIT ?1 OFFSET ?2",
        SELECT_BREED, BY_NAME
      ),
      params![limit, offset],
    )
  }

  fn get(&self, id: &str) -> Result<Option<LocalBreed>, StorageError> {
    let conn = self.conn()?;
    conn
      .query_row(
        &format!("{} WHERE id = ?1", SELECT_BREED),
        params![id],
        breed_from_row,
      )
      .optional()
      .map_err(|e| StorageError::Fetch(format!("failed to get breed {}: {}", id, e)))
  }

  fn search(&self, query: &str) -> Result<Vec<LocalBreed>, StorageError> {
    let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
    self.query_breeds(
      &format!(
        r"{} WHERE lower_unicode(name) LIKE ?1 ESCAPE '\' {}",
        SELECT_BREED, BY_NAME
      ),
      params![pattern],
    )
  }

  fn list_favourites(&self) -> Result<Vec<LocalBreed>, StorageError> {
    self.query_breeds(
      &format!(
        "{} WHERE is_favorite = 1 {}",
        SELECT_BREED, BY_NAME
      ),
      [],
    )
  }

  fn set_favourite(&self, id: &str, value: bool) -> Result<bool, StorageError> {
    let conn = self.conn()?;

    let current: Option<bool> = conn
      .query_row(
        "SELECT is_favorite FROM breeds WHERE id = ?1",
        params![id],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| StorageError::Fetch(format!("failed to get breed {}: {}", id, e)))?;

    match current {
      None => {
        debug!(id, "favourite change for uncached breed ignored");
        Ok(false)
      }
      Some(current) if current == value => Ok(true),
      Some(_) => {
        conn
          .execute(
            "UPDATE breeds SET is_favorite = ?1, last_updated = ?2 WHERE id = ?3",
            params![value, timestamp(Utc::now()), id],
          )
          .map_err(|e| StorageError::Save(format!("failed to update breed {}: {}", id, e)))?;
        Ok(true)
      }
    }
  }

  fn clear(&self) -> Result<usize, StorageError> {
    self
      .conn()?
      .execute("DELETE FROM breeds", [])
      .map_err(|e| StorageError::Delete(format!("failed to clear breeds: {}", e)))
  }
}

/// Unicode-aware `lower_unicode(text)`, used for name search and ordering.
fn register_functions(conn: &Connection) -> Result<(), StorageError> {
  conn
    .create_scalar_function(
      "lower_unicode",
      1,
      FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
      |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
    )
    .map_err(|e| StorageError::Init(format!("failed to register sql functions: {}", e)))
}

fn breed_from_row(row: &Row<'_>) -> rusqlite::Result<LocalBreed> {
  let last_updated: String = row.get(7)?;
  let last_updated = DateTime::parse_from_rfc3339(&last_updated)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

  Ok(LocalBreed {
    id: row.get(0)?,
    name: row.get(1)?,
    origin: row.get(2)?,
    temperament: row.get(3)?,
    description: row.get(4)?,
    image_url: row.get(5)?,
    is_favorite: row.get(6)?,
    last_updated,
  })
}

fn timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339()
}

fn to_sql_int(n: usize) -> i64 {
  i64::try_from(n).unwrap_or(i64::MAX)
}

/// Escape LIKE wildcards so the query matches literally.
fn escape_like(query: &str) -> String {
  let mut escaped = String::with_capacity(query.len());
  for c in query.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

#[cfg(test)]
mod tests {
  use super::*;

  fn breed(id: &str, name: &str, is_favorite: bool) -> LocalBreed {
    LocalBreed {
      id: id.to_string(),
      name: name.to_string(),
      origin: "Egypt".to_string(),
      temperament: "Active".to_string(),
      description: String::new(),
      image_url: None,
      is_favorite,
      last_updated: Utc::now(),
    }
  }

  fn names(breeds: &[LocalBreed]) -> Vec<&str> {
    breeds.iter().map(|b| b.name.as_str()).collect()
  }

  fn seeded() -> SqliteStorage {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage
      .upsert_many(&[
        breed("siam", "Siamese", false),
        breed("abys", "Abyssinian", false),
        breed("beng", "bengal", true),
        breed("mcoo", "Maine Coon", false),
      ])
      .unwrap();
    storage
  }

  #[test]
  fn test_list_sorted_case_insensitive() {
    let storage = seeded();
    let all = storage.list(None, None).unwrap();
    assert_eq!(names(&all), vec!["Abyssinian", "bengal", "Maine Coon", "Siamese"]);
  }

  #[test]
  fn test_list_limit_and_offset() {
    let storage = seeded();
    assert_eq!(
      names(&storage.list(Some(2), Some(1)).unwrap()),
      vec!["bengal", "Maine Coon"]
    );
    assert_eq!(names(&storage.list(None, Some(3)).unwrap()), vec!["Siamese"]);
    assert_eq!(names(&storage.list(Some(1), None).unwrap()), vec!["Abyssinian"]);
    assert!(storage.list(Some(10), Some(10)).unwrap().is_empty());
  }

  #[test]
  fn test_get() {
    let storage = seeded();
    let found = storage.get("beng").unwrap().unwrap();
    assert_eq!(found.name, "bengal");
    assert!(found.is_favorite);
    assert!(storage.get("nope").unwrap().is_none());
  }

  #[test]
  fn test_search_is_case_insensitive_substring() {
    let storage = seeded();
    assert_eq!(names(&storage.search("BENG").unwrap()), vec!["bengal"]);
    assert_eq!(
      names(&storage.search("a").unwrap()),
      vec!["Abyssinian", "bengal", "Maine Coon", "Siamese"]
    );
    assert!(storage.search("persian").unwrap().is_empty());

    storage
      .upsert_many(&[
        breed("emau", "Égyptian Mau", false),
        breed("eben", "ébène", false),
      ])
      .unwrap();
    assert_eq!(names(&storage.search("égyptian").unwrap()), vec!["Égyptian Mau"]);
    assert_eq!(names(&storage.search("ÉBÈNE").unwrap()), vec!["ébène"]);
  }

  #[test]
  fn test_list_sorts_non_ascii_names_case_insensitive() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage
      .upsert_many(&[
        breed("emau", "Égyptian Mau", false),
        breed("eben", "ébène", true),
        breed("ecla", "Éclair", true),
      ])
      .unwrap();

    let expected = vec!["ébène", "Éclair", "Égyptian Mau"];
    assert_eq!(names(&storage.list(None, None).unwrap()), expected);
    assert_eq!(names(&storage.search("É").unwrap()), expected);
    assert_eq!(
      names(&storage.list_favourites().unwrap()),
      vec!["ébène", "Éclair"]
    );
  }

  #[test]
  fn test_search_wildcards_match_literally() {
    let storage = seeded();
    assert!(storage.search("%").unwrap().is_empty());
    assert!(storage.search("_").unwrap().is_empty());
  }

  #[test]
  fn test_upsert_preserves_favourite() {
    let storage = seeded();

    let mut refreshed = breed("beng", "Bengal", false);
    refreshed.description = "Spotted".to_string();
    storage.upsert_many(&[refreshed]).unwrap();

    let stored = storage.get("beng").unwrap().unwrap();
    assert_eq!(stored.name, "Bengal");
    assert_eq!(stored.description, "Spotted");
    assert!(stored.is_favorite);
  }

  #[test]
  fn test_upsert_batch_is_all_or_nothing() {
    let storage = seeded();
    let before = storage.get("siam").unwrap().unwrap();
    storage
      .conn()
      .unwrap()
      .execute_batch(
        "CREATE TRIGGER reject_breed BEFORE INSERT ON breeds WHEN NEW.id = 'bad'
         BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
      )
      .unwrap();

    let mut changed = breed("siam", "Siamese Cat", true);
    changed.description = "Vocal".to_string();
    let result = storage.upsert_many(&[
      breed("pers", "Persian", false),
      changed,
      breed("bad", "Broken", false),
    ]);

    assert!(matches!(result, Err(StorageError::Save(_))));
    assert!(storage.get("pers").unwrap().is_none());
    assert_eq!(storage.get("siam").unwrap().unwrap(), before);
    assert_eq!(storage.list(None, None).unwrap().len(), 4);
  }

  #[test]
  fn test_upsert_inserts_with_given_flag() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.upsert_many(&[breed("pers", "Persian", true)]).unwrap();
    assert!(storage.get("pers").unwrap().unwrap().is_favorite);
  }

  #[test]
  fn test_upsert_sets_last_updated() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let mut old = breed("pers", "Persian", false);
    old.last_updated = DateTime::parse_from_rfc3339("2001-01-01T00:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let before = Utc::now() - chrono::Duration::seconds(1);

    storage.upsert_many(&[old]).unwrap();

    assert!(storage.get("pers").unwrap().unwrap().last_updated >= before);
  }

  #[test]
  fn test_list_favourites() {
    let storage = seeded();
    storage.set_favourite("siam", true).unwrap();
    assert_eq!(
      names(&storage.list_favourites().unwrap()),
      vec!["bengal", "Siamese"]
    );
  }

  #[test]
  fn test_set_favourite_missing_is_noop() {
    let storage = seeded();
    assert!(!storage.set_favourite("nope", true).unwrap());
    assert!(storage.get("nope").unwrap().is_none());
    assert_eq!(storage.list_favourites().unwrap().len(), 1);
  }

  #[test]
  fn test_set_favourite_same_value_changes_nothing() {
    let storage = seeded();
    let before = storage.get("beng").unwrap().unwrap();

    assert!(storage.set_favourite("beng", true).unwrap());

    assert_eq!(storage.get("beng").unwrap().unwrap(), before);
  }

  #[test]
  fn test_clear() {
    let storage = seeded();
    assert_eq!(storage.clear().unwrap(), 4);
    assert!(storage.list(None, None).unwrap().is_empty());
  }

  #[test]
  fn test_open_creates_file() {
    let dir = std::env::temp_dir().join(format!("cats-cache-test-{}", std::process::id()));
    let path = dir.join("nested").join("cache.db");

    {
      let storage = SqliteStorage::open(&path).unwrap();
      storage.upsert_many(&[breed("abys", "Abyssinian", true)]).unwrap();
    }
    let reopened = SqliteStorage::open(&path).unwrap();
    assert!(reopened.get("abys").unwrap().unwrap().is_favorite);

    let _ = std::fs::remove_dir_all(&dir);
  }
}
