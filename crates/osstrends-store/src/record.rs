//! Typed view of a stored user document

use osstrends_core::LanguageStats;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document field names.
pub mod fields {
    pub const LOGIN: &str = "login";
    pub const LOCATION: &str = "location";
    pub const LOCATION_NORMALIZED: &str = "location_normalized";
    pub const LANGUAGES: &str = "languages";
    pub const TOTAL_CODE_SIZE: &str = "total_code_size";
}

/// A user document as read back from the store.
///
/// `location_normalized` is present only for users accepted by the
/// location matcher. A document created by a stats write alone has
/// languages but no profile fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    pub login: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub location_normalized: Option<String>,
    #[serde(default)]
    pub languages: LanguageStats,
    #[serde(default)]
    pub total_code_size: u64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl StoredUser {
    pub fn from_document(doc: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc.clone()))
    }

    /// Bytes written in `language`; 0 when absent.
    pub fn bytes_in(&self, language: &str) -> u64 {
        self.languages.get(language).copied().unwrap_or(0)
    }
}
