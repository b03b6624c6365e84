use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codegraph_cache::cache::SymbolResolutionCache;
use codegraph_core::config::IndexerConfig;
use codegraph_core::store::InMemorySymbolStore;
use codegraph_core::traits::{ParserAdapter, SymbolStore};
use codegraph_core::types::Language;
use codegraph_parser::orchestrator::Indexer;
use codegraph_parser::reference_adapters::{CLikeReferenceAdapter, PythonLikeReferenceAdapter};
use colored::Colorize;
use std::str::FromStr;
use std::sync::Arc;

/// CLI entry point. A thin driver over the indexing pipeline: wires a
/// [`codegraph_core::config::IndexerConfig`], the reference parser adapters,
/// and an in-memory store together and prints the result.
#[derive(Parser)]
#[command(name = "codegraph")]
#[command(about = "Multi-language source indexer and cross-reference engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit progress events and debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a project directory
    Index {
        /// Root directory to index
        project_path: std::path::PathBuf,

        /// Enabled languages (default: typescript, javascript, python)
        #[arg(short, long, value_delimiter = ',')]
        languages: Vec<String>,

        /// Max concurrent parse tasks
        #[arg(short, long, default_value_t = 4)]
        parallelism: usize,

        /// Ignore the incremental gate and re-parse every discovered file
        #[arg(long)]
        force_reindex: bool,

        /// Cap the number of files considered (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        max_files: usize,

        /// Disable semantic analysis and pattern detection
        #[arg(long)]
        no_semantic_analysis: bool,

        /// Emit JSON instead of a human-readable summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("codegraph=debug,info").init();
    } else {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    match cli.command {
        Commands::Index {
            project_path,
            languages,
            parallelism,
            force_reindex,
            max_files,
            no_semantic_analysis,
            json,
        } => {
            let languages = if languages.is_empty() {
                vec![Language::TypeScript, Language::JavaScript, Language::Python]
            } else {
                languages
                    .iter()
                    .map(|s| Language::from_str(s).unwrap())
                    .collect()
            };

            let verbose = cli.verbose;
            let config = IndexerConfig::builder()
                .project_path(project_path)
                .languages(languages)
                .parallelism(parallelism)
                .force_reindex(force_reindex)
                .max_files(max_files)
                .enable_semantic_analysis(!no_semantic_analysis)
                .enable_pattern_detection(!no_semantic_analysis)
                .progress_callback(Arc::new(move |progress| {
                    if verbose {
                        eprintln!(
                            "{:?}: {}/{} files ({} errors)",
                            progress.phase, progress.processed_files, progress.total_files, progress.errors
                        );
                    }
                }))
                .build();

            let store: Arc<dyn SymbolStore> = Arc::new(InMemorySymbolStore::new());
            let cache = Arc::new(SymbolResolutionCache::new(100_000));
            let indexer = Indexer::new(config, Arc::clone(&store), adapters()).with_cache(Arc::clone(&cache));

            let result = indexer.run().await.context("indexing run failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }

            if !result.success {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn adapters() -> Vec<Arc<dyn ParserAdapter>> {
    let mut c_like = CLikeReferenceAdapter::default();
    c_like.initialize().expect("reference adapter initialization is infallible");
    let mut py_like = PythonLikeReferenceAdapter::default();
    py_like.initialize().expect("reference adapter initialization is infallible");
    vec![Arc::new(c_like), Arc::new(py_like)]
}

fn print_summary(result: &codegraph_core::progress::IndexResult) {
    let status = if result.success { "ok".green() } else { "failed".red() };
    println!("{} {}", "status:".cyan().bold(), status);
    println!("{} {}", "project_id:".cyan().bold(), result.project_id);
    println!("{} {}", "files_indexed:".cyan().bold(), result.files_indexed);
    println!("{} {}", "symbols_found:".cyan().bold(), result.symbols_found);
    println!("{} {}", "relationships_found:".cyan().bold(), result.relationships_found);
    println!("{} {}", "patterns_found:".cyan().bold(), result.patterns_found);
    println!("{} {:.3}", "confidence:".cyan().bold(), result.confidence);
    println!("{} {}ms", "duration:".cyan().bold(), result.duration_ms);
    if !result.errors.is_empty() {
        println!("{}", "errors:".red().bold());
        for error in &result.errors {
            println!("  - {error}");
        }
    }
}
