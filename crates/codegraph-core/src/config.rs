use crate::error::{IndexerError, Result};
use crate::types::Language;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Progress callback invoked once per [`crate::progress::IndexProgress`]
/// emitted by the orchestrator. Not (de)serializable; constructed in code.
pub type ProgressCallback = Arc<dyn Fn(crate::progress::IndexProgress) + Send + Sync>;

/// Explicit configuration for one indexing run. There is exactly one
/// construction site, [`IndexerConfig::from_env`], plus [`IndexerConfig::builder`]
/// for programmatic callers (tests, the CLI) — no global/singleton config object.
#[derive(Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub project_path: PathBuf,
    pub project_name: Option<String>,
    pub languages: Vec<Language>,
    pub file_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub parallelism: usize,
    pub force_reindex: bool,
    pub enable_semantic_analysis: bool,
    pub enable_pattern_detection: bool,
    pub max_files: usize,
    pub debug_mode: bool,

    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for IndexerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexerConfig")
            .field("project_path", &self.project_path)
            .field("project_name", &self.project_name)
            .field("languages", &self.languages)
            .field("file_patterns", &self.file_patterns)
            .field("exclude_patterns", &self.exclude_patterns)
            .field("parallelism", &self.parallelism)
            .field("force_reindex", &self.force_reindex)
            .field("enable_semantic_analysis", &self.enable_semantic_analysis)
            .field("enable_pattern_detection", &self.enable_pattern_detection)
            .field("max_files", &self.max_files)
            .field("debug_mode", &self.debug_mode)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/target/**",
    "**/.git/**",
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/.next/**",
    "**/.nuxt/**",
    "**/coverage/**",
    "**/__pycache__/**",
    "**/.pytest_cache/**",
    "**/.codegraph-index/**",
];

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            project_path: PathBuf::from("."),
            project_name: None,
            languages: vec![Language::Cpp, Language::Python, Language::TypeScript, Language::JavaScript],
            file_patterns: Vec::new(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            parallelism: 4,
            force_reindex: false,
            enable_semantic_analysis: true,
            enable_pattern_detection: true,
            max_files: 0,
            debug_mode: false,
            progress_callback: None,
        }
    }
}

impl IndexerConfig {
    pub fn builder() -> IndexerConfigBuilder {
        IndexerConfigBuilder::default()
    }

    /// Load layered configuration: built-in defaults, then `default.toml`,
    /// then `{CODEGRAPH_ENV}.toml` if set, then environment variables with
    /// the `CODEGRAPH__` prefix (double underscore separates nested keys).
    pub fn from_env() -> Result<Self> {
        let env = std::env::var("CODEGRAPH_ENV").unwrap_or_else(|_| "development".to_string());
        debug!(env, "loading layered configuration");

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(config::Environment::with_prefix("CODEGRAPH").separator("__"));

        let loaded = builder
            .build()
            .map_err(|e| IndexerError::Configuration(e.to_string()))?;

        // Only the fields that make sense as scalar layered config are
        // merged here; project_path and the callback are always supplied
        // by the caller (CLI flags, test setup).
        let mut cfg = IndexerConfig::default();
        if let Ok(parallelism) = loaded.get_int("parallelism") {
            cfg.parallelism = parallelism.max(1) as usize;
        }
        if let Ok(force) = loaded.get_bool("force_reindex") {
            cfg.force_reindex = force;
        }
        if let Ok(semantic) = loaded.get_bool("enable_semantic_analysis") {
            cfg.enable_semantic_analysis = semantic;
        }
        if let Ok(patterns) = loaded.get_bool("enable_pattern_detection") {
            cfg.enable_pattern_detection = patterns;
        }
        if let Ok(max_files) = loaded.get_int("max_files") {
            cfg.max_files = max_files.max(0) as usize;
        }
        if let Ok(debug) = loaded.get_bool("debug_mode") {
            cfg.debug_mode = debug;
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(IndexerError::Validation("parallelism must be >= 1".into()));
        }
        if !self.project_path.exists() {
            return Err(IndexerError::Validation(format!(
                "project_path does not exist: {}",
                self.project_path.display()
            )));
        }
        Ok(())
    }

    pub fn resolved_project_name(&self) -> String {
        self.project_name.clone().unwrap_or_else(|| {
            self.project_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "project".to_string())
        })
    }
}

#[derive(Default)]
pub struct IndexerConfigBuilder {
    cfg: IndexerConfig,
}

impl IndexerConfigBuilder {
    pub fn project_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cfg.project_path = path.into();
        self
    }

    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.cfg.project_name = Some(name.into());
        self
    }

    pub fn languages(mut self, languages: Vec<Language>) -> Self {
        self.cfg.languages = languages;
        self
    }

    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.cfg.exclude_patterns = patterns;
        self
    }

    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.cfg.parallelism = parallelism;
        self
    }

    pub fn force_reindex(mut self, force: bool) -> Self {
        self.cfg.force_reindex = force;
        self
    }

    pub fn enable_semantic_analysis(mut self, enable: bool) -> Self {
        self.cfg.enable_semantic_analysis = enable;
        self
    }

    pub fn enable_pattern_detection(mut self, enable: bool) -> Self {
        self.cfg.enable_pattern_detection = enable;
        self
    }

    pub fn max_files(mut self, max_files: usize) -> Self {
        self.cfg.max_files = max_files;
        self
    }

    pub fn debug_mode(mut self, debug: bool) -> Self {
        self.cfg.debug_mode = debug;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.cfg.progress_callback = Some(cb);
        self
    }

    pub fn build(self) -> IndexerConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_parallelism() {
        let cfg = IndexerConfig::default();
        assert_eq!(cfg.parallelism, 4);
        assert_eq!(cfg.max_files, 0);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = IndexerConfig::builder()
            .project_path("/tmp/project")
            .parallelism(8)
            .force_reindex(true)
            .build();
        assert_eq!(cfg.parallelism, 8);
        assert!(cfg.force_reindex);
        assert_eq!(cfg.project_path, PathBuf::from("/tmp/project"));
    }

    #[test]
    fn resolved_project_name_defaults_to_basename() {
        let cfg = IndexerConfig::builder().project_path("/tmp/my-project").build();
        assert_eq!(cfg.resolved_project_name(), "my-project");
    }
}
