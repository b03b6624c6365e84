use crate::incremental::WorkItem;
use codegraph_core::traits::{ParseOutput, ParserAdapter};
use codegraph_core::types::Language;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of dispatching one file to its language's parser adapter.
pub struct FileParseResult {
    pub path: PathBuf,
    pub content_hash: String,
    pub outcome: Result<ParseOutput, String>,
}

/// Bounded-concurrency fan-out of files to parser adapters, grounded on the
/// `Semaphore` + `buffer_unordered` pattern used for directory-wide parsing.
/// There is no ordering guarantee across files; the dispatcher does not
/// retry — a per-file timeout or adapter error is reported and the file is
/// skipped without aborting the batch.
pub struct ParallelParseDispatcher {
    parallelism: usize,
    file_timeout: Duration,
}

impl ParallelParseDispatcher {
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
            file_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_file_timeout(mut self, timeout: Duration) -> Self {
        self.file_timeout = timeout;
        self
    }

    /// Dispatches every work item needing reparse, using `resolve_adapter`
    /// to pick the parser adapter for a file's language. Progress callback
    /// is invoked once per completed file (success or failure), in whatever
    /// order completions arrive.
    pub async fn run<F>(
        &self,
        items: Vec<WorkItem>,
        resolve_adapter: impl Fn(&std::path::Path) -> Option<(Language, Arc<dyn ParserAdapter>)> + Send + Sync + 'static,
        mut on_progress: F,
    ) -> Vec<FileParseResult>
    where
        F: FnMut(&FileParseResult) + Send,
    {
        let resolve_adapter = Arc::new(resolve_adapter);
        let timeout = self.file_timeout;

        let futures_iter = items.into_iter().map(|item| {
            let resolve_adapter = Arc::clone(&resolve_adapter);
            async move {
                let adapter = resolve_adapter(&item.path);
                let outcome = match adapter {
                    None => Err(format!("no parser adapter for {}", item.path.display())),
                    Some((_, adapter)) => {
                        let path = item.path.clone();
                        let read = tokio::fs::read_to_string(&path).await;
                        match read {
                            Err(e) => Err(format!("failed to read {}: {e}", path.display())),
                            Ok(content) => {
                                match tokio::time::timeout(timeout, adapter.parse(&path, &content)).await {
                                    Err(_) => Err(format!("parse timed out after {:?}: {}", timeout, path.display())),
                                    Ok(Err(e)) => Err(e.to_string()),
                                    Ok(Ok(output)) => Ok(output),
                                }
                            }
                        }
                    }
                };
                FileParseResult {
                    path: item.path,
                    content_hash: item.content_hash,
                    outcome,
                }
            }
        });

        let mut results = Vec::new();
        let mut completed = stream::iter(futures_iter).buffer_unordered(self.parallelism);
        while let Some(result) = completed.next().await {
            on_progress(&result);
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codegraph_core::error::Result as CoreResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoopAdapter;

    #[async_trait]
    impl ParserAdapter for NoopAdapter {
        fn initialize(&mut self) -> CoreResult<()> {
            Ok(())
        }

        fn supported_languages(&self) -> &[Language] {
            &[]
        }

        async fn parse(&self, _file_path: &std::path::Path, _content: &str) -> CoreResult<ParseOutput> {
            Ok(ParseOutput::default())
        }
    }

    #[tokio::test]
    async fn dispatches_every_item_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut items = Vec::new();
        for i in 0..5 {
            let path = dir.path().join(format!("f{i}.rs"));
            std::fs::write(&path, "fn x() {}").unwrap();
            items.push(WorkItem {
                path,
                content_hash: "h".into(),
                needs_reparse: true,
            });
        }

        let dispatcher = ParallelParseDispatcher::new(2);
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let results = dispatcher
            .run(
                items,
                |_path| Some((Language::Rust, Arc::new(NoopAdapter) as Arc<dyn ParserAdapter>)),
                move |_r| {
                    count_clone.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        assert_eq!(results.len(), 5);
        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert!(results.iter().all(|r| r.outcome.is_ok()));
    }

    #[tokio::test]
    async fn missing_adapter_is_reported_as_error_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.rs");
        std::fs::write(&path, "fn x() {}").unwrap();
        let items = vec![WorkItem {
            path,
            content_hash: "h".into(),
            needs_reparse: true,
        }];

        let dispatcher = ParallelParseDispatcher::new(1);
        let results = dispatcher.run(items, |_| None, |_| {}).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].outcome.is_err());
    }
}
