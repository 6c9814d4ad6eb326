//! Dev harness binary for `retrieval-core`.
//!
//! `retrieval-core-dev` exercises the engine end-to-end against a local
//! SQLite store and local files, standing in for the HTTP ingress layer
//! and the real Document/Repository Service clients described in
//! `SPEC_FULL.md` §11. It is not the product surface.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};
use retrieval_core::core::{
    ArtifactClass, DocumentAttachment, DocumentMetadata, QueryRequest, RepositoryBranch, RepositoryMetadata,
};
use retrieval_core::embedding::create_embedder;
use retrieval_core::index::{DocumentIndexer, RepositoryIndexer};
use retrieval_core::overview::OverviewBuilder;
use retrieval_core::rerank::create_cross_encoder;
use retrieval_core::retrieve::{MultiStageRetriever, RetrieverConfig};
use retrieval_core::service::{DocumentService, RepositoryService};
use retrieval_core::store::VectorStore;
use retrieval_core::summarize::{AbstractiveSummarizer, ExtractiveSummarizer, HierarchicalSummarizer, HybridSummarizer};
use retrieval_core::tool::{InvokeRequest, ToolRegistry};
use retrieval_core::{io, Error, LocalArtifactSource, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// `retrieval-core-dev`: local dev harness for the hierarchical semantic
/// retrieval engine.
#[derive(Parser)]
#[command(name = "retrieval-core-dev", version, about)]
struct Cli {
    /// Path to the SQLite-backed vector store.
    #[arg(long, global = true, default_value = "./retrieval.sqlite3")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a single document attachment from a local file.
    IndexDocument {
        /// Document artifact id.
        #[arg(long)]
        document_id: String,
        /// Path to the file to index.
        #[arg(long)]
        file: PathBuf,
        /// MIME type of the file. Inferred from the extension if omitted.
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// Index a repository archive (zip) from a local file.
    IndexRepository {
        /// Repository artifact id.
        #[arg(long)]
        repository_id: String,
        /// Branch name this archive represents.
        #[arg(long, default_value = "main")]
        branch: String,
        /// Path to the zip archive.
        #[arg(long)]
        archive: PathBuf,
    },
    /// Run an overview-level query against documents or repositories.
    OverviewQuery {
        /// Artifact class to query.
        #[arg(long, value_enum)]
        class: ClassArg,
        /// Query text.
        #[arg(long)]
        query: String,
        /// Maximum number of hits.
        #[arg(long)]
        top_k: Option<usize>,
        /// Restrict to these artifact ids.
        #[arg(long = "artifact-id")]
        artifact_ids: Vec<String>,
    },
    /// Run a chunk-level query against documents or repositories.
    ChunkQuery {
        /// Artifact class to query.
        #[arg(long, value_enum)]
        class: ClassArg,
        /// Query text.
        #[arg(long)]
        query: String,
        /// Maximum number of hits.
        #[arg(long)]
        top_k: Option<usize>,
        /// Restrict to these artifact ids.
        #[arg(long = "artifact-id")]
        artifact_ids: Vec<String>,
    },
    /// Dispatch a query through the Tool Dispatcher by tool id.
    InvokeTool {
        /// One of `documentOverviewQuery`, `documentChunkQuery`,
        /// `repositoryOverviewQuery`, `repositoryChunkQuery`.
        #[arg(long)]
        tool_id: String,
        /// Query text.
        #[arg(long)]
        query: String,
        /// Maximum number of hits.
        #[arg(long)]
        top_k: Option<usize>,
        /// Restrict to these artifact ids.
        #[arg(long = "artifact-id")]
        artifact_ids: Vec<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ClassArg {
    Document,
    Repository,
}

impl From<ClassArg> for ArtifactClass {
    fn from(value: ClassArg) -> Self {
        match value {
            ClassArg::Document => Self::Document,
            ClassArg::Repository => Self::Repository,
        }
    }
}

/// Builds the default embedder, falling back to the deterministic
/// hash-based embedder if the feature-gated backend fails to load (e.g.
/// missing model weights).
fn embedder() -> Arc<dyn retrieval_core::Embedder> {
    create_embedder().map_or_else(
        |_| Arc::new(retrieval_core::FallbackEmbedder::new(retrieval_core::DEFAULT_DIMENSIONS)) as Arc<_>,
        Arc::from,
    )
}

fn overview_builder() -> OverviewBuilder {
    let embedder = embedder();
    OverviewBuilder::new(HierarchicalSummarizer::new(
        ExtractiveSummarizer::new(Arc::clone(&embedder), 5),
        hybrid_summarizer(embedder),
    ))
}

fn hybrid_summarizer(embedder: Arc<dyn retrieval_core::Embedder>) -> HybridSummarizer {
    HybridSummarizer::new(
        ExtractiveSummarizer::new(embedder, 5),
        abstractive_summarizer(),
    )
}

#[cfg(feature = "abstractive-bert")]
fn abstractive_summarizer() -> AbstractiveSummarizer {
    AbstractiveSummarizer::new(
        Arc::new(retrieval_core::summarize::RustBertAbstractiveModel::new()),
        150,
        30,
    )
}

#[cfg(not(feature = "abstractive-bert"))]
fn abstractive_summarizer() -> AbstractiveSummarizer {
    AbstractiveSummarizer::with_truncating_fallback()
}

fn open_store(path: &PathBuf) -> Result<Arc<VectorStore>> {
    Ok(Arc::new(VectorStore::open(path, embedder())?))
}

fn retriever(class: ArtifactClass, store: Arc<VectorStore>, config: RetrieverConfig) -> MultiStageRetriever {
    MultiStageRetriever::new(
        class,
        store,
        Arc::from(create_cross_encoder()),
        hybrid_summarizer(embedder()),
        config,
    )
}

fn document_service(store: Arc<VectorStore>, retriever_config: RetrieverConfig) -> DocumentService {
    DocumentService::new(
        Arc::new(LocalArtifactSource::new()),
        DocumentIndexer::new(overview_builder(), Arc::clone(&store)),
        retriever(ArtifactClass::Document, store, retriever_config),
    )
}

fn repository_service(store: Arc<VectorStore>, retriever_config: RetrieverConfig) -> RepositoryService {
    RepositoryService::new(
        Arc::new(LocalArtifactSource::new()),
        RepositoryIndexer::new(overview_builder(), Arc::clone(&store)),
        retriever(ArtifactClass::Repository, store, retriever_config),
    )
}

async fn index_document(store: Arc<VectorStore>, document_id: String, file: PathBuf, mime_type: Option<String>) -> Result<String> {
    let bytes = io::read_file(&file)?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| document_id.clone());
    let mime_type = mime_type.unwrap_or_else(|| mime_guess::from_path(&file).first_or_octet_stream().to_string());

    let source = Arc::new(LocalArtifactSource::new());
    source.seed_document(
        DocumentMetadata {
            document_id: document_id.clone(),
            attachments: vec![DocumentAttachment {
                file_path: file.to_string_lossy().into_owned(),
                file_name,
                mime_type,
                order: 0,
            }],
        },
        [(file.to_string_lossy().into_owned(), bytes)],
    );

    let service = DocumentService::new(
        source,
        DocumentIndexer::new(overview_builder(), Arc::clone(&store)),
        retriever(ArtifactClass::Document, store, RetrieverConfig::default()),
    );
    let result = service.add(&document_id).await?;
    serde_json::to_string_pretty(&result).map_err(|e| Error::validation(e.to_string()))
}

async fn index_repository(store: Arc<VectorStore>, repository_id: String, branch: String, archive: PathBuf) -> Result<String> {
    let bytes = io::read_file(&archive)?;

    let source = Arc::new(LocalArtifactSource::new());
    source.seed_repository(
        RepositoryMetadata {
            repository_id: repository_id.clone(),
            branches: vec![RepositoryBranch {
                name: branch.clone(),
                default_branch: true,
            }],
        },
        branch,
        bytes,
    );

    let service = RepositoryService::new(
        source,
        RepositoryIndexer::new(overview_builder(), Arc::clone(&store)),
        retriever(ArtifactClass::Repository, store, RetrieverConfig::default()),
    );
    let result = service.add(&repository_id, None).await?;
    serde_json::to_string_pretty(&result).map_err(|e| Error::validation(e.to_string()))
}

fn build_query(query: String, top_k: Option<usize>, artifact_ids: Vec<String>) -> QueryRequest {
    let mut req = QueryRequest::new(query);
    if let Some(top_k) = top_k {
        req = req.with_top_k(top_k);
    }
    if !artifact_ids.is_empty() {
        req = req.with_artifact_ids(artifact_ids);
    }
    req
}

fn run() -> Result<String> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::validation(e.to_string()))?;

    match cli.command {
        Commands::IndexDocument {
            document_id,
            file,
            mime_type,
        } => {
            let store = open_store(&cli.store)?;
            runtime.block_on(index_document(store, document_id, file, mime_type))
        }
        Commands::IndexRepository {
            repository_id,
            branch,
            archive,
        } => {
            let store = open_store(&cli.store)?;
            runtime.block_on(index_repository(store, repository_id, branch, archive))
        }
        Commands::OverviewQuery {
            class,
            query,
            top_k,
            artifact_ids,
        } => {
            let store = open_store(&cli.store)?;
            let req = build_query(query, top_k, artifact_ids);
            let retriever = retriever(class.into(), store, RetrieverConfig::default());
            let response = retriever.overview_query(&req)?;
            serde_json::to_string_pretty(&response).map_err(|e| Error::validation(e.to_string()))
        }
        Commands::ChunkQuery {
            class,
            query,
            top_k,
            artifact_ids,
        } => {
            let store = open_store(&cli.store)?;
            let req = build_query(query, top_k, artifact_ids);
            let retriever = retriever(class.into(), store, RetrieverConfig::default());
            let response = retriever.chunk_query(&req)?;
            serde_json::to_string_pretty(&response).map_err(|e| Error::validation(e.to_string()))
        }
        Commands::InvokeTool {
            tool_id,
            query,
            top_k,
            artifact_ids,
        } => {
            let store = open_store(&cli.store)?;
            let req = build_query(query, top_k, artifact_ids);
            let document_service = Arc::new(document_service(Arc::clone(&store), RetrieverConfig::default()));
            let repository_service = Arc::new(repository_service(store, RetrieverConfig::default()));
            let registry = ToolRegistry::new(document_service, repository_service);
            let response = registry.invoke(&InvokeRequest::new(tool_id, req));
            serde_json::to_string_pretty(&response).map_err(|e| Error::validation(e.to_string()))
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    match run() {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
