pub mod ingest;
pub mod stats;
pub mod users;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use osstrends_store::DocumentStore;

use crate::config::Config;

/// Table with the shared preset and a cyan header row.
pub(crate) fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    table
}

/// Store path from the flag, else the config file.
pub(crate) fn store_path(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.unwrap_or_else(|| config.store.path.clone())
}

/// Open an existing snapshot for queries.
pub(crate) fn open_store(path: &Path) -> Result<DocumentStore> {
    if !path.exists() {
        anyhow::bail!(
            "store {} does not exist. Run `osstrends ingest` first.",
            path.display()
        );
    }
    DocumentStore::open(path).with_context(|| format!("Failed to open store {}", path.display()))
}
