//! Integration tests for retrieval-core.

#![allow(clippy::expect_used)]

use retrieval_core::clients::LocalArtifactSource;
use retrieval_core::embedding::FallbackEmbedder;
use retrieval_core::index::{DocumentIndexer, RepositoryIndexer};
use retrieval_core::overview::OverviewBuilder;
use retrieval_core::rerank::LexicalOverlapReranker;
use retrieval_core::retrieve::{MultiStageRetriever, RetrieverConfig};
use retrieval_core::service::{DocumentService, RepositoryService};
use retrieval_core::store::VectorStore;
use retrieval_core::summarize::{AbstractiveSummarizer, ExtractiveSummarizer, HierarchicalSummarizer, HybridSummarizer};
use retrieval_core::tool::{InvokeRequest, ToolRegistry, DOCUMENT_CHUNK_QUERY, DOCUMENT_OVERVIEW_QUERY};
use retrieval_core::{ArtifactClass, DocumentAttachment, DocumentMetadata, QueryRequest, RepositoryBranch, RepositoryMetadata};
use std::io::Write as _;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use zip::write::SimpleFileOptions;

fn overview_builder() -> OverviewBuilder {
    OverviewBuilder::new(HierarchicalSummarizer::new(
        ExtractiveSummarizer::new(Arc::new(FallbackEmbedder::new(32)), 3),
        HybridSummarizer::new(
            ExtractiveSummarizer::new(Arc::new(FallbackEmbedder::new(32)), 3),
            AbstractiveSummarizer::with_truncating_fallback(),
        ),
    ))
}

fn hybrid_summarizer() -> HybridSummarizer {
    HybridSummarizer::new(
        ExtractiveSummarizer::new(Arc::new(FallbackEmbedder::new(32)), 3),
        AbstractiveSummarizer::with_truncating_fallback(),
    )
}

fn store() -> Arc<VectorStore> {
    Arc::new(VectorStore::open_in_memory(Arc::new(FallbackEmbedder::new(32))).expect("open store"))
}

fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut buf);
        let mut writer = zip::ZipWriter::new(cursor);
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).expect("start_file");
            writer.write_all(content).expect("write entry");
        }
        writer.finish().expect("finish archive");
    }
    buf
}

fn write_temp_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write temp file");
    path
}

#[tokio::test]
async fn test_document_end_to_end_index_then_chunk_query() {
    let dir = tempdir().expect("tempdir");
    let file = write_temp_file(
        &dir,
        "guide.md",
        b"# Retrieval Guide\n\nThis document explains how chunking and embedding cooperate \
          to support semantic search over indexed documents.",
    );

    let source = Arc::new(LocalArtifactSource::new());
    source.seed_document(
        DocumentMetadata {
            document_id: "doc-1".to_string(),
            attachments: vec![DocumentAttachment {
                file_path: file.to_string_lossy().into_owned(),
                file_name: "guide.md".to_string(),
                mime_type: "text/markdown".to_string(),
                order: 0,
            }],
        },
        [(file.to_string_lossy().into_owned(), std::fs::read(&file).expect("read file"))],
    );

    let vector_store = store();
    let service = DocumentService::new(
        source,
        DocumentIndexer::new(overview_builder(), Arc::clone(&vector_store)),
        MultiStageRetriever::new(
            ArtifactClass::Document,
            vector_store,
            Arc::new(LexicalOverlapReranker::new()),
            hybrid_summarizer(),
            RetrieverConfig::default(),
        ),
    );

    let indexed = service.add("doc-1").await.expect("index document");
    assert_eq!(indexed.artifact_id, "doc-1");
    assert!(indexed.chunk_count > 0);

    let response = service
        .chunk_query(&QueryRequest::new("semantic search over documents"))
        .expect("chunk query");
    assert!(!response.hits.is_empty());
    assert!(!response.final_summary.is_empty());
    assert!(response.hits.iter().all(|h| h.artifact_id() == Some("doc-1")));
}

#[tokio::test]
async fn test_repository_end_to_end_index_then_overview_and_chunk_query() {
    let archive_bytes = build_zip(&[
        ("README.md", b"# demo-repo\n\nA small demo repository used for retrieval testing."),
        ("src/lib.rs", b"pub fn add(a: i32, b: i32) -> i32 { a + b }"),
        ("src/main.rs", b"fn main() { println!(\"hello\"); }"),
    ]);

    let source = Arc::new(LocalArtifactSource::new());
    source.seed_repository(
        RepositoryMetadata {
            repository_id: "repo-1".to_string(),
            branches: vec![RepositoryBranch {
                name: "main".to_string(),
                default_branch: true,
            }],
        },
        "main".to_string(),
        archive_bytes,
    );

    let vector_store = store();
    let service = RepositoryService::new(
        source,
        RepositoryIndexer::new(overview_builder(), Arc::clone(&vector_store)),
        MultiStageRetriever::new(
            ArtifactClass::Repository,
            vector_store,
            Arc::new(LexicalOverlapReranker::new()),
            hybrid_summarizer(),
            RetrieverConfig::default(),
        ),
    );

    let indexed = service.add("repo-1", None).await.expect("index repository");
    assert_eq!(indexed.name, "repo-1");
    assert!(indexed.indexed_files.iter().any(|f| f.path == "src/lib.rs"));

    let overview_response = service
        .overview_query(&QueryRequest::new("demo repository"))
        .expect("overview query");
    assert!(!overview_response.hits.is_empty());

    let chunk_response = service.chunk_query(&QueryRequest::new("add function")).expect("chunk query");
    assert!(!chunk_response.hits.is_empty());
}

#[tokio::test]
async fn test_tool_dispatcher_wraps_service_facade_end_to_end() {
    let file_dir = tempdir().expect("tempdir");
    let file = write_temp_file(&file_dir, "notes.txt", b"Notes about rust error handling and retrieval pipelines.");

    let document_source = Arc::new(LocalArtifactSource::new());
    document_source.seed_document(
        DocumentMetadata {
            document_id: "doc-2".to_string(),
            attachments: vec![DocumentAttachment {
                file_path: file.to_string_lossy().into_owned(),
                file_name: "notes.txt".to_string(),
                mime_type: "text/plain".to_string(),
                order: 0,
            }],
        },
        [(file.to_string_lossy().into_owned(), std::fs::read(&file).expect("read file"))],
    );

    let document_store = store();
    let document_service = Arc::new(DocumentService::new(
        document_source,
        DocumentIndexer::new(overview_builder(), Arc::clone(&document_store)),
        MultiStageRetriever::new(
            ArtifactClass::Document,
            document_store,
            Arc::new(LexicalOverlapReranker::new()),
            hybrid_summarizer(),
            RetrieverConfig::default(),
        ),
    ));
    document_service.add("doc-2").await.expect("index document");

    let repository_store = store();
    let repository_service = Arc::new(RepositoryService::new(
        Arc::new(LocalArtifactSource::new()),
        RepositoryIndexer::new(overview_builder(), Arc::clone(&repository_store)),
        MultiStageRetriever::new(
            ArtifactClass::Repository,
            repository_store,
            Arc::new(LexicalOverlapReranker::new()),
            hybrid_summarizer(),
            RetrieverConfig::default(),
        ),
    ));

    let registry = ToolRegistry::new(document_service, repository_service);

    let overview_resp = registry.invoke(&InvokeRequest::new(DOCUMENT_OVERVIEW_QUERY, QueryRequest::new("error handling notes")));
    assert!(overview_resp.error.is_none());

    let chunk_resp = registry.invoke(&InvokeRequest::new(DOCUMENT_CHUNK_QUERY, QueryRequest::new("retrieval pipelines")));
    assert!(chunk_resp.error.is_none());
    assert!(chunk_resp.result.expect("result present").get("hits").is_some());

    let unknown_resp = registry.invoke(&InvokeRequest::new("not-a-real-tool", QueryRequest::new("x")));
    assert!(unknown_resp.error.is_some());
}

mod cli {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::io::Write as _;
    use tempfile::tempdir;

    #[test]
    fn test_index_document_then_chunk_query_via_cli() {
        let dir = tempdir().expect("tempdir");
        let db_path = dir.path().join("retrieval.sqlite3");
        let doc_path = dir.path().join("doc.md");
        std::fs::File::create(&doc_path)
            .expect("create doc")
            .write_all(b"# CLI Test\n\nThis file is indexed through the dev harness binary.")
            .expect("write doc");

        Command::cargo_bin("retrieval-core-dev")
            .expect("binary built")
            .args([
                "--store",
                db_path.to_str().expect("utf8 path"),
                "index-document",
                "--document-id",
                "cli-doc-1",
                "--file",
                doc_path.to_str().expect("utf8 path"),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("cli-doc-1"));

        Command::cargo_bin("retrieval-core-dev")
            .expect("binary built")
            .args([
                "--store",
                db_path.to_str().expect("utf8 path"),
                "chunk-query",
                "--class",
                "document",
                "--query",
                "dev harness binary",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("finalSummary"));
    }
}
