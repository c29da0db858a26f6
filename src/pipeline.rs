// pipeline.rs — Driver loop: one JSON file per patent, normalized, embedded and written in turn.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::embeddings::embedder::{ChunkEmbedder, ChunkSource};
use crate::error::{IngestError, StoreError};
use crate::graph::search::SimilaritySearch;
use crate::graph::writer::GraphWriter;
use crate::graph::{GraphStats, GraphStore, SimilarEvidence};
use crate::record;

/// Counters reported at the end of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub attempted: usize,
    pub processed: usize,
    pub failed: usize,
    pub failures: BTreeMap<&'static str, usize>,
}

impl RunStats {
    fn record_failure(&mut self, err: &IngestError) {
        self.failed += 1;
        *self.failures.entry(err.kind()).or_insert(0) += 1;
    }
}

/// State for one run: the store connection, the embedder and the counters.
/// The store is opened by the caller and released by [`RunContext::finish`].
pub struct RunContext {
    store: Box<dyn GraphStore>,
    embedder: Option<ChunkEmbedder>,
    stats: RunStats,
}

impl RunContext {
    pub fn new(store: Box<dyn GraphStore>, embedder: Option<ChunkEmbedder>) -> Self {
        match &embedder {
            Some(e) => log::info!(
                "Run context: {} store, {} embeddings ({} dims)",
                store.backend(),
                e.provider_name(),
                e.dimensions()
            ),
            None => log::info!("Run context: {} store, read-only", store.backend()),
        }
        Self { store, embedder, stats: RunStats::default() }
    }

    /// Ingest every `*.json` file in `dir` (sorted by name, at most `max_files`).
    /// Per-file failures are logged and counted; only a bad directory aborts.
    pub fn ingest_dir(
        &mut self,
        dir: &Path,
        max_files: Option<usize>,
    ) -> Result<&RunStats, IngestError> {
        let files = discover_files(dir, max_files)?;
        log::info!("Ingesting {} file(s) from {}", files.len(), dir.display());

        for path in files {
            self.stats.attempted += 1;
            match self.ingest_file(&path) {
                Ok(app) => {
                    self.stats.processed += 1;
                    log::info!(
                        "[{}/{}] {} -> {}",
                        self.stats.processed,
                        self.stats.attempted,
                        path.display(),
                        app
                    );
                }
                Err(e) => {
                    self.stats.record_failure(&e);
                    log::error!("Skipping {} ({}): {}", path.display(), e.kind(), e);
                }
            }
        }

        log::info!(
            "Ingestion finished: attempted={} processed={} failed={}",
            self.stats.attempted,
            self.stats.processed,
            self.stats.failed
        );
        Ok(&self.stats)
    }

    /// Normalize, embed and write one file. Returns the application number.
    pub fn ingest_file(&mut self, path: &Path) -> Result<String, IngestError> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| IngestError::Config("ingestion needs an embedding provider".into()))?;

        let bytes = std::fs::read(path)
            .map_err(|e| IngestError::MalformedInput(format!("read {}: {e}", path.display())))?;
        let rec = record::parse_record(&bytes)?;

        let mut chunks = embedder.embed_field(ChunkSource::Abstract, rec.abstract_text.as_deref())?;
        chunks.extend(embedder.embed_field(ChunkSource::Summary, rec.summary.as_deref())?);
        log::debug!("{}: {} chunks", rec.application_number, chunks.len());

        GraphWriter::write(self.store.as_mut(), &rec, chunks)?;
        Ok(rec.application_number)
    }

    pub fn find_similar_evidence(
        &mut self,
        application_number: &str,
        top_k: i64,
    ) -> Result<Vec<SimilarEvidence>, IngestError> {
        SimilaritySearch::find_similar_evidence(self.store.as_mut(), application_number, top_k)
    }

    pub fn graph_stats(&mut self) -> Result<GraphStats, IngestError> {
        Ok(self.store.stats()?)
    }

    /// Release the store. Consumes the context so it cannot be used afterwards.
    pub fn finish(self) -> Result<RunStats, StoreError> {
        let backend = self.store.backend();
        self.store.close()?;
        log::info!("Closed {} store", backend);
        Ok(self.stats)
    }
}

/// `*.json` files directly inside `dir`, sorted by file name.
pub fn discover_files(dir: &Path, max_files: Option<usize>) -> Result<Vec<PathBuf>, IngestError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| IngestError::Config(format!("cannot read input directory {}: {e}", dir.display())))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if let Some(max) = max_files {
        files.truncate(max);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::embeddings::embedder::tests::fake_embedder;
    use crate::graph::sqlite::SqliteGraphStore;
    use crate::graph::{NodeKind, RelKind};
    use crate::record::tests::sample_patent_json;

    fn context() -> RunContext {
        let mut store = SqliteGraphStore::open_in_memory().unwrap();
        store.ensure_schema(8).unwrap();
        RunContext::new(Box::new(store), Some(fake_embedder(8, 20, 5)))
    }

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn patent(app: &str, cpc: &str) -> String {
        let mut doc = sample_patent_json();
        doc["application_number"] = json!(app);
        doc["main_cpc_label"] = json!(cpc);
        doc["cpc_labels"] = json!([cpc]);
        doc.to_string()
    }

    #[test]
    fn test_discover_sorted_and_capped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.json", "{}");
        write(tmp.path(), "a.json", "{}");
        write(tmp.path(), "c.json", "{}");
        write(tmp.path(), "notes.txt", "skip me");

        let names = |files: Vec<PathBuf>| -> Vec<String> {
            files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect()
        };
        assert_eq!(names(discover_files(tmp.path(), None).unwrap()), vec!["a.json", "b.json", "c.json"]);
        assert_eq!(names(discover_files(tmp.path(), Some(2)).unwrap()), vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let err = discover_files(&tmp.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    fn test_malformed_file_is_counted_and_later_files_still_run() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "01.json", &patent("100", "A61M51723"));
        write(tmp.path(), "02.json", "{ not json");
        write(tmp.path(), "03.json", r#"{"title": "no application number"}"#);
        write(tmp.path(), "04.json", &patent("200", "A61M51723"));

        let mut ctx = context();
        let stats = ctx.ingest_dir(tmp.path(), None).unwrap().clone();
        assert_eq!(stats.attempted, 4);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.failures.get("malformed_input"), Some(&2));

        let graph = ctx.graph_stats().unwrap();
        assert_eq!(graph.node_count(NodeKind::Patent), 2);
        // Shared CPC label across both patents.
        assert_eq!(graph.node_count(NodeKind::Cpc), 1);
        assert_eq!(graph.rel_count(RelKind::HasCpc), 2);

        let final_stats = ctx.finish().unwrap();
        assert_eq!(final_stats, stats);
    }

    #[test]
    fn test_reingest_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "one.json", &patent("100", "A61M51723"));

        let mut ctx = context();
        ctx.ingest_dir(tmp.path(), None).unwrap();
        let first = ctx.graph_stats().unwrap();
        assert!(first.node_count(NodeKind::Evidence) > 0);

        let run = ctx.ingest_dir(tmp.path(), None).unwrap().clone();
        let second = ctx.graph_stats().unwrap();
        assert_eq!(first, second);
        assert_eq!(run.attempted, 2);
        assert_eq!(run.processed, 2);
    }

    #[test]
    fn test_similar_after_ingest() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "one.json", &patent("100", "A61M51723"));
        write(tmp.path(), "two.json", &patent("200", "A61M15002"));

        let mut ctx = context();
        ctx.ingest_dir(tmp.path(), None).unwrap();

        let hits = ctx.find_similar_evidence("100", 5).unwrap();
        assert!(!hits.is_empty() && hits.len() <= 5);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(ctx.find_similar_evidence("999", 5).unwrap().is_empty());
    }

    #[test]
    fn test_ingest_without_embedder_is_config_error() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let mut ctx = RunContext::new(Box::new(store), None);
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "one.json", &patent("100", "A61M51723"));
        let run = ctx.ingest_dir(tmp.path(), None).unwrap();
        assert_eq!(run.failures.get("config"), Some(&1));
    }
}
