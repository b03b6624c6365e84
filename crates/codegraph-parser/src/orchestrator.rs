use crate::complexity;
use crate::dispatcher::ParallelParseDispatcher;
use crate::discovery::{discover_files, DiscoveryConfig};
use crate::incremental::{gate_files, sweep_deleted_files};
use crate::semantic_analysis;
use codegraph_cache::cache::{graph_edge_kind_for, SymbolResolutionCache};
use codegraph_core::config::IndexerConfig;
use codegraph_core::error::{IndexerError, Result};
use codegraph_core::ids::SymbolIdAllocator;
use codegraph_core::progress::{IndexProgress, IndexResult, Phase};
use codegraph_core::traits::{ParserAdapter, SymbolStore};
use codegraph_core::types::Language;
use codegraph_resolver::{synthesize_file_symbols, PendingRelationship, RelationshipResolver};
use codegraph_resolver::symbol_table::SymbolTable;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives one indexing run through the ordered phase sequence: project and
/// language upsert, discovery, deletion sweep, parse, symbol storage,
/// relationship resolution, optional semantic analysis, and statistics.
/// Owns the store for the duration of a run (single-writer, per the
/// concurrency model) and optionally keeps a [`SymbolResolutionCache`]
/// warm for readers once the run completes.
pub struct Indexer {
    config: IndexerConfig,
    store: Arc<dyn SymbolStore>,
    cache: Option<Arc<SymbolResolutionCache>>,
    by_extension: HashMap<String, (Language, Arc<dyn ParserAdapter>)>,
    cancel: CancellationToken,
}

impl Indexer {
    pub fn new(config: IndexerConfig, store: Arc<dyn SymbolStore>, adapters: Vec<Arc<dyn ParserAdapter>>) -> Self {
        let mut by_extension = HashMap::new();
        for adapter in &adapters {
            for language in adapter.supported_languages() {
                for ext in language.default_extensions() {
                    by_extension
                        .entry((*ext).to_string())
                        .or_insert_with(|| (language.clone(), Arc::clone(adapter)));
                }
            }
        }
        Self {
            config,
            store,
            cache: None,
            by_extension,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<SymbolResolutionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Cooperative cancel handle; cloning it and calling `cancel()` from
    /// another task stops the run at the next phase boundary or file
    /// completion, whichever comes first.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn language_for(&self, path: &Path) -> Option<(Language, Arc<dyn ParserAdapter>)> {
        let ext = path.extension()?.to_str()?;
        self.by_extension.get(ext).cloned()
    }

    pub async fn run(&self) -> Result<IndexResult> {
        self.config.validate()?;
        let start = Instant::now();
        let start_time = chrono::Utc::now();
        let allocator = SymbolIdAllocator::new();
        let mut errors: Vec<String> = Vec::new();

        // Phase 1: project & language upsert. Failures here are fatal.
        let project_name = self.config.resolved_project_name();
        let project_id = self
            .store
            .upsert_project(&project_name, &self.config.project_path.to_string_lossy())
            .await
            .map_err(|e| IndexerError::ProjectSetup(e.to_string()))?;
        for language in &self.config.languages {
            self.store
                .upsert_language(&language.to_string())
                .await
                .map_err(|e| IndexerError::ProjectSetup(e.to_string()))?;
        }
        self.emit_progress(Phase::ProjectUpsert, 0, 0, None, errors.len(), start_time);
        info!(project_id, project = %project_name, "project upserted");

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled_result(project_id, start));
        }

        // Phase 2: discovery. Failures here are fatal.
        let discovery_config = DiscoveryConfig {
            languages: self.config.languages.clone(),
            include_patterns: self.config.file_patterns.clone(),
            exclude_patterns: self.config.exclude_patterns.clone(),
            max_files: self.config.max_files,
        };
        let discovered = discover_files(&self.config.project_path, &discovery_config)?;
        self.emit_progress(Phase::Discovery, discovered.len(), 0, None, errors.len(), start_time);
        info!(files = discovered.len(), "discovery complete");

        if discovered.is_empty() {
            warn!("no files discovered; run will report success = false");
        }

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled_result(project_id, start));
        }

        // Phase 1.5: deletion sweep. Storage errors here are collected, not fatal.
        match sweep_deleted_files(self.store.as_ref(), project_id, &discovered).await {
            Ok(removed) => {
                if !removed.is_empty() {
                    info!(removed = removed.len(), "deletion sweep removed stale files");
                }
            }
            Err(e) => errors.push(format!("deletion sweep: {e}")),
        }
        self.emit_progress(Phase::DeletionSweep, discovered.len(), 0, None, errors.len(), start_time);

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled_result(project_id, start));
        }

        // Phase 3: incremental gate + parse.
        let work_items = match gate_files(self.store.as_ref(), project_id, &discovered, self.config.force_reindex).await {
            Ok(items) => items,
            Err(e) => {
                errors.push(format!("incremental gate: {e}"));
                Vec::new()
            }
        };
        let to_parse: Vec<_> = work_items.into_iter().filter(|item| item.needs_reparse).collect();
        info!(to_parse = to_parse.len(), total = discovered.len(), "incremental gate complete");

        let dispatcher = ParallelParseDispatcher::new(self.config.parallelism);
        let by_extension = self.by_extension.clone();
        let processed = Arc::new(AtomicUsize::new(0));
        let processed_for_progress = Arc::clone(&processed);
        let total_to_parse = to_parse.len();
        let parse_errors = Arc::new(std::sync::Mutex::new(Vec::new()));
        let parse_errors_for_progress = Arc::clone(&parse_errors);
        let progress_callback = self.config.progress_callback.clone();

        let results = dispatcher
            .run(
                to_parse,
                move |path| {
                    let ext = path.extension()?.to_str()?;
                    by_extension.get(ext).cloned()
                },
                move |result| {
                    let count = processed_for_progress.fetch_add(1, Ordering::SeqCst) + 1;
                    let mut file_errors = 0;
                    if let Err(e) = &result.outcome {
                        let mut guard = parse_errors_for_progress.lock().unwrap();
                        guard.push(format!("{}: {e}", result.path.display()));
                        file_errors = guard.len();
                    }
                    debug!(file = %result.path.display(), done = count, total = total_to_parse, "file parsed");
                    emit(
                        &progress_callback,
                        Phase::Parse,
                        total_to_parse,
                        count,
                        Some(result.path.display().to_string()),
                        file_errors,
                        start_time,
                    );
                },
            )
            .await;
        errors.extend(parse_errors.lock().unwrap().clone());
        self.emit_progress(Phase::Parse, total_to_parse, processed.load(Ordering::SeqCst), None, errors.len(), start_time);

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled_result(project_id, start));
        }

        // Phase 4: store symbols + control-flow-derived complexity. Per-file
        // storage errors are collected, not fatal.
        let mut files_indexed = 0usize;
        let mut pending_relationships = Vec::new();
        for result in &results {
            let Ok(output) = &result.outcome else { continue };
            let file_path = result.path.to_string_lossy().to_string();
            let language = self
                .language_for(&result.path)
                .map(|(lang, _)| lang)
                .unwrap_or(Language::Other("unknown".to_string()));

            if let Err(e) = self.store.clear_file_symbols(project_id, &file_path).await {
                errors.push(format!("clear symbols for {file_path}: {e}"));
                continue;
            }

            let content = tokio::fs::read_to_string(&result.path).await.unwrap_or_default();
            let mut symbols = Vec::with_capacity(output.symbols.len());
            for info in &output.symbols {
                let id = allocator.next_symbol_id();
                let mut symbol = info.clone().into_universal(id, project_id, language.clone());
                if symbol.kind.is_callable() {
                    let cfg = complexity::analyze_from_source(
                        &allocator,
                        symbol.id,
                        &function_slice(&content, symbol.line, symbol.end_line),
                        symbol.line,
                        symbol.end_line.max(symbol.line),
                    );
                    symbol.complexity = Some(cfg.complexity as f32);
                }
                symbols.push(symbol);
            }

            match self.store.store_symbols(symbols).await {
                Ok(count) => {
                    files_indexed += 1;
                    if let Some(cache) = &self.cache {
                        if let Ok(all) = self.store.all_symbols(project_id).await {
                            cache.add_batch(all.into_iter().filter(|s| s.file_path == file_path).collect());
                        }
                    }
                    let language_id = self.store.upsert_language(&language.to_string()).await.unwrap_or(0);
                    let mut record = codegraph_core::project::FileRecord::new(
                        project_id,
                        &file_path,
                        language_id,
                        content.len() as u64,
                        &result.content_hash,
                    );
                    record.last_parsed = Some(chrono::Utc::now());
                    record.symbol_count = count as u32;
                    if let Err(e) = self.store.upsert_file_record(record).await {
                        errors.push(format!("store file record for {file_path}: {e}"));
                    }
                }
                Err(e) => errors.push(format!("store symbols for {file_path}: {e}")),
            }

            for info in &output.relationships {
                pending_relationships.push(PendingRelationship {
                    file_path: file_path.clone(),
                    language: language.clone(),
                    info: info.clone(),
                });
            }
        }
        self.emit_progress(Phase::StoreSymbols, total_to_parse, files_indexed, None, errors.len(), start_time);

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled_result(project_id, start));
        }

        // Synthesize one `file` symbol per discovered file so every `imports`
        // edge always has a concrete origin, then seed stdlib sentinels once
        // (only on a project's first run, so repeated runs don't churn ids).
        let discovered_with_language: Vec<(String, Language)> = discovered
            .iter()
            .map(|path| {
                let language = self.language_for(path).map(|(lang, _)| lang).unwrap_or(Language::Other("unknown".to_string()));
                (path.to_string_lossy().to_string(), language)
            })
            .collect();
        let file_symbols = synthesize_file_symbols(&allocator, project_id, &discovered_with_language);
        if let Err(e) = self.store.store_symbols(file_symbols).await {
            errors.push(format!("store file symbols: {e}"));
        }

        let existing = self.store.all_symbols(project_id).await.unwrap_or_default();
        if existing.iter().all(|s| s.namespace.as_deref() != Some("stdlib")) {
            let resolver = RelationshipResolver::new();
            let sentinels = resolver.seed_symbols(&allocator, project_id);
            if let Err(e) = self.store.store_symbols(sentinels).await {
                errors.push(format!("seed stdlib sentinels: {e}"));
            }
        }

        // Phase 5: resolve relationships.
        let all_symbols = self.store.all_symbols(project_id).await.unwrap_or_default();
        let table = SymbolTable::build(all_symbols);
        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(project_id, &allocator, &table, &pending_relationships);
        if let Err(e) = self.store.store_symbols(outcome.synthesized_symbols).await {
            errors.push(format!("store synthesized symbols: {e}"));
        }
        if let Err(e) = self.store.store_relationships(outcome.relationships).await {
            errors.push(format!("store relationships: {e}"));
        }
        if let Some(cache) = &self.cache {
            if let Ok(all) = self.store.all_relationships(project_id).await {
                for rel in &all {
                    if let Some(kind) = graph_edge_kind_for(rel.relationship_type) {
                        cache.add_relationship(rel.from_symbol_id, rel.to_symbol_id, kind);
                    }
                }
            }
        }
        self.emit_progress(Phase::ResolveRelationships, total_to_parse, files_indexed, None, errors.len(), start_time);

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled_result(project_id, start));
        }

        // Phase 6: semantic analysis (optional). Never fails the run.
        let mut patterns_found = 0usize;
        if self.config.enable_semantic_analysis || self.config.enable_pattern_detection {
            let all_symbols = self.store.all_symbols(project_id).await.unwrap_or_default();
            let all_relationships = self.store.all_relationships(project_id).await.unwrap_or_default();
            let outcome = semantic_analysis::analyze(
                &allocator,
                project_id,
                &all_symbols,
                &all_relationships,
                self.config.enable_semantic_analysis,
                self.config.enable_pattern_detection,
            );
            if let Err(e) = self.store.store_relationships(outcome.derived_relationships).await {
                errors.push(format!("store derived relationships: {e}"));
            }
            match self.store.store_patterns(outcome.patterns).await {
                Ok(count) => patterns_found = count,
                Err(e) => errors.push(format!("store patterns: {e}")),
            }
            errors.extend(outcome.errors);
            info!(
                mean_complexity = outcome.complexity_summary.mean,
                max_complexity = outcome.complexity_summary.max,
                high_complexity_count = outcome.complexity_summary.high_complexity_count,
                "semantic analysis complete"
            );
        }
        self.emit_progress(Phase::SemanticAnalysis, total_to_parse, files_indexed, None, errors.len(), start_time);

        // Phase 7: statistics. Whole-project counts, not this run's insert deltas,
        // so a no-op rerun reports the same totals as the run that produced them.
        let final_symbols = self.store.all_symbols(project_id).await.unwrap_or_default();
        let symbols_found = final_symbols.len();
        let relationships_found = self.store.all_relationships(project_id).await.unwrap_or_default().len();
        let confidence = average_confidence(&final_symbols);
        let duration_ms = start.elapsed().as_millis() as u64;
        self.emit_progress(Phase::Statistics, total_to_parse, files_indexed, None, errors.len(), start_time);

        let success = !discovered.is_empty();
        info!(success, symbols_found, relationships_found, patterns_found, duration_ms, "indexing run complete");

        Ok(IndexResult {
            success,
            project_id,
            files_indexed,
            symbols_found,
            relationships_found,
            patterns_found,
            errors,
            duration_ms,
            confidence,
        })
    }

    fn emit_progress(&self, phase: Phase, total_files: usize, processed_files: usize, current_file: Option<String>, errors: usize, start_time: chrono::DateTime<chrono::Utc>) {
        emit(&self.config.progress_callback, phase, total_files, processed_files, current_file, errors, start_time);
    }

    fn cancelled_result(&self, project_id: u64, start: Instant) -> IndexResult {
        warn!("indexing run cancelled");
        IndexResult {
            success: false,
            project_id,
            files_indexed: 0,
            symbols_found: 0,
            relationships_found: 0,
            patterns_found: 0,
            errors: vec!["run cancelled".to_string()],
            duration_ms: start.elapsed().as_millis() as u64,
            confidence: 0.0,
        }
    }
}

fn emit(
    callback: &Option<codegraph_core::config::ProgressCallback>,
    phase: Phase,
    total_files: usize,
    processed_files: usize,
    current_file: Option<String>,
    errors: usize,
    start_time: chrono::DateTime<chrono::Utc>,
) {
    if let Some(callback) = callback {
        let mut progress = IndexProgress::new(phase, total_files, start_time);
        progress.processed_files = processed_files;
        progress.current_file = current_file;
        progress.errors = errors;
        progress.estimated_time_remaining_ms = estimate_remaining(&progress);
        callback(progress);
    }
}

/// ETR from a moving average of per-file cost so far this run: elapsed time
/// divided by files processed, multiplied by files remaining.
fn estimate_remaining(progress: &IndexProgress) -> Option<u64> {
    if progress.processed_files == 0 || progress.total_files == 0 {
        return None;
    }
    let elapsed_ms = (chrono::Utc::now() - progress.start_time).num_milliseconds().max(0) as u64;
    let per_file = elapsed_ms / progress.processed_files as u64;
    let remaining = progress.total_files.saturating_sub(progress.processed_files) as u64;
    Some(per_file * remaining)
}

fn average_confidence(symbols: &[codegraph_core::symbol::UniversalSymbol]) -> f32 {
    if symbols.is_empty() {
        return 1.0;
    }
    symbols.iter().map(|s| s.confidence).sum::<f32>() / symbols.len() as f32
}

fn function_slice(content: &str, start_line: u32, end_line: u32) -> String {
    let start = start_line.saturating_sub(1) as usize;
    let end = end_line.max(start_line) as usize;
    content
        .lines()
        .skip(start)
        .take(end.saturating_sub(start).max(1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_adapters::{CLikeReferenceAdapter, PythonLikeReferenceAdapter};
    use codegraph_core::store::InMemorySymbolStore;
    use codegraph_core::traits::ParserAdapter;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn adapters() -> Vec<Arc<dyn ParserAdapter>> {
        let mut c_like = CLikeReferenceAdapter::default();
        c_like.initialize().unwrap();
        let mut py_like = PythonLikeReferenceAdapter::default();
        py_like.initialize().unwrap();
        vec![Arc::new(c_like), Arc::new(py_like)]
    }

    #[tokio::test]
    async fn full_run_discovers_parses_and_resolves_a_small_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.ts"),
            "export function foo() {\n  bar();\n}\n\nfunction bar() {\n  return 1;\n}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("b.py"), "def main():\n    helper()\n").unwrap();

        let config = IndexerConfig::builder()
            .project_path(dir.path())
            .languages(vec![Language::TypeScript, Language::JavaScript, Language::Python])
            .parallelism(2)
            .build();
        let store: Arc<dyn SymbolStore> = Arc::new(InMemorySymbolStore::new());
        let indexer = Indexer::new(config, store, adapters());

        let result = indexer.run().await.unwrap();
        assert!(result.success);
        assert_eq!(result.files_indexed, 2);
        assert!(result.symbols_found >= 3, "expected foo, bar and main to be stored, got {}", result.symbols_found);
        assert!(result.relationships_found >= 1);
        assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    }

    #[tokio::test]
    async fn empty_project_reports_failure_without_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let config = IndexerConfig::builder().project_path(dir.path()).build();
        let store: Arc<dyn SymbolStore> = Arc::new(InMemorySymbolStore::new());
        let indexer = Indexer::new(config, store, adapters());

        let result = indexer.run().await.unwrap();
        assert!(!result.success);
        assert_eq!(result.files_indexed, 0);
    }

    #[tokio::test]
    async fn progress_callback_observes_every_phase_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def main():\n    pass\n").unwrap();

        let phases: Arc<std::sync::Mutex<Vec<Phase>>> = Arc::new(std::sync::Mutex::new(Vec::new()));
        let phases_for_cb = Arc::clone(&phases);
        let config = IndexerConfig::builder()
            .project_path(dir.path())
            .languages(vec![Language::Python])
            .progress_callback(Arc::new(move |progress: IndexProgress| {
                phases_for_cb.lock().unwrap().push(progress.phase);
            }))
            .build();
        let store: Arc<dyn SymbolStore> = Arc::new(InMemorySymbolStore::new());
        let indexer = Indexer::new(config, store, adapters());

        indexer.run().await.unwrap();
        let seen = phases.lock().unwrap();
        assert!(seen.contains(&Phase::ProjectUpsert));
        assert!(seen.contains(&Phase::Discovery));
        assert!(seen.contains(&Phase::Parse));
        assert!(seen.contains(&Phase::StoreSymbols));
        assert!(seen.contains(&Phase::ResolveRelationships));
        assert!(seen.contains(&Phase::Statistics));
    }

    #[tokio::test]
    async fn cancellation_before_discovery_short_circuits_the_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def main():\n    pass\n").unwrap();
        let config = IndexerConfig::builder().project_path(dir.path()).build();
        let store: Arc<dyn SymbolStore> = Arc::new(InMemorySymbolStore::new());
        let indexer = Indexer::new(config, store, adapters());
        indexer.cancellation_token().cancel();

        let result = indexer.run().await.unwrap();
        assert!(!result.success);
        assert_eq!(result.errors, vec!["run cancelled".to_string()]);
    }

    #[tokio::test]
    async fn incremental_second_run_skips_unchanged_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def main():\n    pass\n").unwrap();
        let store: Arc<dyn SymbolStore> = Arc::new(InMemorySymbolStore::new());

        let config = IndexerConfig::builder().project_path(dir.path()).languages(vec![Language::Python]).build();
        let indexer = Indexer::new(config.clone(), Arc::clone(&store), adapters());
        let first = indexer.run().await.unwrap();
        assert_eq!(first.files_indexed, 1);

        let reparsed = Arc::new(AtomicUsize::new(0));
        let reparsed_for_cb = Arc::clone(&reparsed);
        let config2 = IndexerConfig::builder()
            .project_path(dir.path())
            .languages(vec![Language::Python])
            .progress_callback(Arc::new(move |progress: IndexProgress| {
                if progress.phase == Phase::Parse {
                    reparsed_for_cb.fetch_add(progress.processed_files, AtomicOrdering::SeqCst);
                }
            }))
            .build();
        let indexer2 = Indexer::new(config2, store, adapters());
        let second = indexer2.run().await.unwrap();
        assert_eq!(second.files_indexed, 0, "unchanged file should not be reparsed");
    }
}

