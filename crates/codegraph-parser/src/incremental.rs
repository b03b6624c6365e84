use codegraph_core::error::Result;
use codegraph_core::traits::SymbolStore;
use sha2::{Digest, Sha256};
use std::path::Path;

/// One file admitted past (or exempted from) the incremental gate.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub path: std::path::PathBuf,
    pub content_hash: String,
    pub needs_reparse: bool,
}

pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Filters `discovered` down to the set that must be (re)parsed: no file
/// record exists, the content hash differs from the stored one, or
/// `last_parsed` was never set. `force_reindex` bypasses the gate entirely.
pub async fn gate_files(
    store: &dyn SymbolStore,
    project_id: u64,
    discovered: &[std::path::PathBuf],
    force_reindex: bool,
) -> Result<Vec<WorkItem>> {
    let mut items = Vec::with_capacity(discovered.len());
    for path in discovered {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(_) => continue, // unreadable; parse phase will surface the error
        };
        let hash = content_hash(&content);
        let needs_reparse = if force_reindex {
            true
        } else {
            let record = store.get_file_record(project_id, &path.to_string_lossy()).await?;
            record.map(|r| r.needs_reparse(&hash)).unwrap_or(true)
        };
        items.push(WorkItem {
            path: path.clone(),
            content_hash: hash,
            needs_reparse,
        });
    }
    Ok(items)
}

/// Deletion sweep (the resolved Open Question from the incremental-gate
/// design): any file record in the store for this project that is not
/// present in the current `discovered` set is considered deleted and
/// removed, along with its symbols.
pub async fn sweep_deleted_files(
    store: &dyn SymbolStore,
    project_id: u64,
    discovered: &[std::path::PathBuf],
) -> Result<Vec<String>> {
    let discovered_set: std::collections::HashSet<String> =
        discovered.iter().map(|p| p.to_string_lossy().to_string()).collect();

    let known_paths = store.list_file_paths(project_id).await?;
    let mut removed = Vec::new();
    for path in known_paths {
        if !discovered_set.contains(&path) {
            store.delete_file(project_id, &path).await?;
            removed.push(path);
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_hashes_identically() {
        let a = content_hash("fn main() {}");
        let b = content_hash("fn main() {}");
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_hashes_differently() {
        let a = content_hash("fn main() {}");
        let b = content_hash("fn main() { println!(); }");
        assert_ne!(a, b);
    }
}
