//! User document store
//!
//! Every write is a `$set` with upsert: named fields are replaced, all
//! other fields of an existing document are kept, and a missing document
//! is created. A profile refresh therefore never erases languages written
//! by an earlier stats update, and vice versa.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use osstrends_core::{LanguageStats, UserProfile, total_code_size};
use serde_json::{Map, Value};

use crate::aggregate::LocationAggregate;
use crate::error::StoreError;
use crate::record::{StoredUser, fields};
use crate::snapshot::{self, Documents};

/// Operations the ingestion pipeline and the query commands need.
///
/// Implementations must tolerate concurrent calls from many workers.
pub trait UserStore: Send + Sync {
    /// Remove every user document.
    fn reset_all(&self) -> Result<(), StoreError>;

    /// Set all profile fields plus `location_normalized`.
    fn upsert_user(&self, profile: &UserProfile, normalized_location: &str)
    -> Result<(), StoreError>;

    /// Set `languages` to `stats` and `total_code_size` to their sum.
    fn upsert_language_stats(&self, login: &str, stats: &LanguageStats) -> Result<(), StoreError>;

    /// Users matching both optional filters, ordered by login.
    ///
    /// `location` compares `location_normalized` for equality; `language`
    /// requires at least one byte in that language.
    fn query_users(
        &self,
        location: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<StoredUser>, StoreError>;

    fn get_user(&self, login: &str) -> Result<Option<StoredUser>, StoreError>;

    /// Recomputed from the current documents on every call.
    fn location_aggregate(&self, normalized_location: &str) -> Result<LocationAggregate, StoreError> {
        let users = self.query_users(Some(normalized_location), None)?;
        Ok(LocationAggregate::from_users(&users))
    }

    /// Persist pending changes. No-op for stores without a backing file.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-process document store with optional JSON snapshot.
pub struct DocumentStore {
    docs: RwLock<Documents>,
    path: Option<PathBuf>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl DocumentStore {
    /// Store backed by the snapshot at `path`; loaded if it exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let docs = snapshot::read(path)?;
        log::debug!("store {}: {} users loaded", path.display(), docs.len());
        Ok(Self {
            docs: RwLock::new(docs),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            docs: RwLock::new(Documents::new()),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Documents> {
        self.docs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Documents> {
        self.docs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// `$set` `update` on the document for `login`, creating it if absent.
    fn set_fields(&self, login: &str, update: Map<String, Value>) {
        let mut docs = self.write();
        let doc = docs.entry(login.to_string()).or_insert_with(|| {
            let mut doc = Map::new();
            doc.insert(fields::LOGIN.to_string(), Value::String(login.to_string()));
            doc
        });
        doc.extend(update);
    }
}

fn matches_filters(doc: &Map<String, Value>, location: Option<&str>, language: Option<&str>) -> bool {
    if let Some(location) = location {
        if doc.get(fields::LOCATION_NORMALIZED).and_then(Value::as_str) != Some(location) {
            return false;
        }
    }
    if let Some(language) = language {
        let bytes = doc
            .get(fields::LANGUAGES)
            .and_then(|langs| langs.get(language))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if bytes == 0 {
            return false;
        }
    }
    true
}

impl UserStore for DocumentStore {
    fn reset_all(&self) -> Result<(), StoreError> {
        let mut docs = self.write();
        let removed = docs.len();
        docs.clear();
        log::info!("store reset: {removed} users removed");
        Ok(())
    }

    fn upsert_user(
        &self,
        profile: &UserProfile,
        normalized_location: &str,
    ) -> Result<(), StoreError> {
        let mut update = match serde_json::to_value(profile)? {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Corrupt {
                    path: self.path.clone().unwrap_or_default(),
                    message: format!("profile serialized to non-object {other}"),
                });
            }
        };
        // Stats fields are owned by upsert_language_stats
        update.remove(fields::LANGUAGES);
        update.remove(fields::TOTAL_CODE_SIZE);
        update.insert(
            fields::LOCATION_NORMALIZED.to_string(),
            Value::String(normalized_location.to_string()),
        );
        self.set_fields(&profile.login, update);
        Ok(())
    }

    fn upsert_language_stats(&self, login: &str, stats: &LanguageStats) -> Result<(), StoreError> {
        let mut update = Map::new();
        update.insert(fields::LANGUAGES.to_string(), serde_json::to_value(stats)?);
        update.insert(
            fields::TOTAL_CODE_SIZE.to_string(),
            Value::from(total_code_size(stats)),
        );
        self.set_fields(login, update);
        Ok(())
    }

    fn query_users(
        &self,
        location: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<StoredUser>, StoreError> {
        let docs = self.read();
        docs.values()
            .filter(|doc| matches_filters(doc, location, language))
            .map(|doc| StoredUser::from_document(doc).map_err(StoreError::from))
            .collect()
    }

    fn get_user(&self, login: &str) -> Result<Option<StoredUser>, StoreError> {
        let docs = self.read();
        docs.get(login)
            .map(StoredUser::from_document)
            .transpose()
            .map_err(StoreError::from)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let docs = self.read();
        snapshot::write(path, &docs)?;
        log::info!("store {}: {} users written", path.display(), docs.len());
        Ok(())
    }
}
