//! On-disk snapshot of the document store
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "saved_at": "2026-01-01T00:00:00Z",
//!   "users": [ { "login": ..., ... }, ... ]
//! }
//! ```
//!
//! Written to `{path}.tmp` then renamed over `{path}`, so readers never
//! see a partial file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::record::fields;

pub const CURRENT_FORMAT_VERSION: u32 = 1;

pub type Documents = BTreeMap<String, Map<String, Value>>;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    format_version: u32,
    saved_at: chrono::DateTime<chrono::Utc>,
    users: Vec<&'a Map<String, Value>>,
}

#[derive(Deserialize)]
struct SnapshotIn {
    format_version: u32,
    users: Vec<Map<String, Value>>,
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Load documents; a missing file is an empty store.
pub fn read(path: &Path) -> Result<Documents, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Documents::new()),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    let corrupt = |message: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        message,
    };

    let snapshot: SnapshotIn = serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;
    if snapshot.format_version != CURRENT_FORMAT_VERSION {
        return Err(corrupt(format!(
            "format_version {} != current {CURRENT_FORMAT_VERSION}",
            snapshot.format_version
        )));
    }

    let mut docs = Documents::new();
    for doc in snapshot.users {
        let login = match doc.get(fields::LOGIN) {
            Some(Value::String(login)) => login.clone(),
            _ => return Err(corrupt("document without a string login".into())),
        };
        if docs.insert(login.clone(), doc).is_some() {
            log::warn!("{}: duplicate login {login}, keeping last", path.display());
        }
    }
    Ok(docs)
}

/// Write all documents atomically.
pub fn write(path: &Path, docs: &Documents) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let snapshot = SnapshotOut {
        format_version: CURRENT_FORMAT_VERSION,
        saved_at: chrono::Utc::now(),
        users: docs.values().collect(),
    };
    let json = serde_json::to_vec_pretty(&snapshot)?;

    let tmp = tmp_path(path);
    fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}
