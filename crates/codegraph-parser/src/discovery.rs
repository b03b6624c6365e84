use codegraph_core::config::DEFAULT_EXCLUDE_PATTERNS;
use codegraph_core::error::{IndexerError, Result};
use codegraph_core::types::Language;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// File discovery configuration. Mirrors the enumerated configuration
/// options `languages`, `file_patterns`, `exclude_patterns`, `max_files`.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub languages: Vec<Language>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_files: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            languages: Vec::new(),
            include_patterns: Vec::new(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            max_files: 0,
        }
    }
}

/// Walk `root` respecting `.gitignore`/hidden-file conventions (via
/// `ignore::WalkBuilder`) and the configured include/exclude globs,
/// returning every file whose extension matches one of the enabled
/// languages (or every file, if no languages were configured — used by the
/// toy reference adapters in tests).
pub fn discover_files(root: &Path, config: &DiscoveryConfig) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(IndexerError::Discovery(format!("project path does not exist: {}", root.display())));
    }

    let exclude_set = build_globset(&config.exclude_patterns)?;
    let include_set = if config.include_patterns.is_empty() {
        None
    } else {
        Some(build_globset(&config.include_patterns)?)
    };
    let extensions = extensions_for(&config.languages);

    let mut walker = WalkBuilder::new(root);
    walker.hidden(false).git_ignore(true).git_exclude(true).ignore(true);

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();

        if exclude_set.is_match(path) {
            continue;
        }
        if let Some(include) = &include_set {
            if !include.is_match(path) {
                continue;
            }
        }
        if !extensions.is_empty() {
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
                .unwrap_or(false);
            if !matches_ext {
                continue;
            }
        }

        files.push(path.to_path_buf());
        if config.max_files > 0 && files.len() >= config.max_files {
            break;
        }
    }

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| IndexerError::Discovery(e.to_string()))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| IndexerError::Discovery(e.to_string()))
}

fn extensions_for(languages: &[Language]) -> Vec<String> {
    languages
        .iter()
        .flat_map(|l| l.default_extensions().iter().map(|e| e.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovers_only_matching_extensions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("b.py"), "def f(): pass").unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/ignored.rs"), "fn x() {}").unwrap();

        let config = DiscoveryConfig {
            languages: vec![Language::Rust],
            ..Default::default()
        };
        let files = discover_files(dir.path(), &config).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.rs"));
    }

    #[test]
    fn max_files_caps_the_result() {
        let dir = tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{i}.rs")), "fn x() {}").unwrap();
        }
        let config = DiscoveryConfig {
            languages: vec![Language::Rust],
            max_files: 2,
            ..Default::default()
        };
        let files = discover_files(dir.path(), &config).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn missing_root_is_a_discovery_error() {
        let config = DiscoveryConfig::default();
        let result = discover_files(Path::new("/nonexistent/path/zzz"), &config);
        assert!(result.is_err());
    }
}
