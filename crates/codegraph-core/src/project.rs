use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique by `name`. Created or upserted once per index run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub root_path: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: u64, name: impl Into<String>, root_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            root_path: root_path.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Unique by `name`. Enabled/disabled toggles whether discovery globs for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageRecord {
    pub id: u64,
    pub name: String,
    pub display_name: String,
    pub extensions: Vec<String>,
    pub enabled: bool,
}

/// One row per indexed file. `file_hash` and `last_parsed` back the
/// incremental gate: a file is re-parsed iff no record exists, the hash
/// differs, or `last_parsed` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub project_id: u64,
    pub file_path: String,
    pub language_id: u64,
    pub file_size: u64,
    pub file_hash: String,
    pub last_parsed: Option<DateTime<Utc>>,
    pub parse_duration_ms: Option<u64>,
    pub symbol_count: u32,
    pub relationship_count: u32,
    pub pattern_count: u32,
    pub has_errors: bool,
}

impl FileRecord {
    pub fn new(project_id: u64, file_path: impl Into<String>, language_id: u64, file_size: u64, file_hash: impl Into<String>) -> Self {
        Self {
            project_id,
            file_path: file_path.into(),
            language_id,
            file_size,
            file_hash: file_hash.into(),
            last_parsed: None,
            parse_duration_ms: None,
            symbol_count: 0,
            relationship_count: 0,
            pattern_count: 0,
            has_errors: false,
        }
    }

    /// True when this file must be (re)parsed given freshly computed
    /// `current_hash` for its on-disk content.
    pub fn needs_reparse(&self, current_hash: &str) -> bool {
        self.last_parsed.is_none() || self.file_hash != current_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsed_record_always_needs_reparse() {
        let rec = FileRecord::new(1, "a.rs", 1, 10, "abc");
        assert!(rec.needs_reparse("abc"));
    }

    #[test]
    fn matching_hash_and_parsed_record_skips_reparse() {
        let mut rec = FileRecord::new(1, "a.rs", 1, 10, "abc");
        rec.last_parsed = Some(Utc::now());
        assert!(!rec.needs_reparse("abc"));
        assert!(rec.needs_reparse("def"));
    }
}
