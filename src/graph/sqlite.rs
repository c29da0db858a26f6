// sqlite.rs — Embedded property-graph backend.
//
// Nodes live in one table keyed by (label, natural key), relationships in an edge table,
// and Evidence embeddings in a sqlite-vec `vec0` table whose rowid is the Evidence node id.

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde_json::{json, Value};
use zerocopy::IntoBytes;

use crate::config;
use crate::error::StoreError;
use crate::graph::search::cosine_distance_to_score;
use crate::graph::{GraphOp, GraphStats, GraphStore, NodeKind, RelKind, SimilarEvidence};

static VEC_EXTENSION: Once = Once::new();

/// Register sqlite-vec as an auto-extension so every connection opened
/// afterwards has `vec0`. Safe to call repeatedly.
pub fn register_vec_extension() {
    VEC_EXTENSION.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    });
}

pub struct SqliteGraphStore {
    conn: Connection,
    path: Option<PathBuf>,
    dims: Option<usize>,
}

impl SqliteGraphStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        register_vec_extension();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
        }

        log::info!("Opening SQLite graph store at {}", path.display());
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        conn.execute_batch(&format!(
            "\
PRAGMA journal_mode = WAL;\n\
PRAGMA synchronous = NORMAL;\n\
PRAGMA cache_size = {cache_size};\n\
PRAGMA mmap_size = {mmap_size};\n\
PRAGMA busy_timeout = {busy_timeout};\n\
",
            cache_size = config::sqlite::PRAGMA_CACHE_SIZE_KIB_NEG,
            mmap_size = config::sqlite::PRAGMA_MMAP_SIZE_BYTES,
            busy_timeout = config::sqlite::PRAGMA_BUSY_TIMEOUT_MS,
        ))?;
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        register_vec_extension();
        let conn = Connection::open_in_memory().context("open in-memory db")?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> anyhow::Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS graph_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER PRIMARY KEY,
                label TEXT NOT NULL,
                key TEXT NOT NULL,
                props TEXT NOT NULL DEFAULT '{}',
                UNIQUE (label, key)
            );

            CREATE TABLE IF NOT EXISTS edges (
                src INTEGER NOT NULL REFERENCES nodes(id),
                rel TEXT NOT NULL,
                dst INTEGER NOT NULL REFERENCES nodes(id),
                PRIMARY KEY (src, rel, dst)
            );

            CREATE INDEX IF NOT EXISTS edges_by_dst ON edges (dst, rel);
            "#,
        )
        .context("create graph schema")?;
        Ok(Self { conn, path, dims: None })
    }
}

impl GraphStore for SqliteGraphStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn ensure_schema(&mut self, dims: usize) -> Result<(), StoreError> {
        let stored: Option<String> = self
            .conn
            .query_row("SELECT value FROM graph_meta WHERE key = 'embedding_dims'", [], |r| r.get(0))
            .optional()?;

        if let Some(stored) = stored {
            let stored_dims: usize = stored
                .parse()
                .map_err(|_| StoreError::Protocol(format!("corrupt embedding_dims value '{stored}'")))?;
            if stored_dims != dims {
                return Err(StoreError::Config(format!(
                    "graph store was created for {stored_dims}-dim embeddings, configured dimension is {dims}"
                )));
            }
        }

        // vec0 column sizes cannot be bound as parameters; dims is a validated integer.
        self.conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS evidence_vec USING vec0(embedding float[{dims}] distance_metric=cosine);"
        ))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO graph_meta (key, value) VALUES ('embedding_dims', ?1)",
            params![dims.to_string()],
        )?;
        self.dims = Some(dims);
        log::info!("SQLite graph schema ready (Evidence vector index: {} dims, cosine)", dims);
        Ok(())
    }

    fn apply(&mut self, ops: &[GraphOp]) -> Result<(), StoreError> {
        let dims = self.dims;
        let tx = self.conn.transaction()?;
        for op in ops {
            apply_op(&tx, op, dims)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn nearest_evidence(
        &mut self,
        application_number: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarEvidence>, StoreError> {
        if self.dims.is_none() {
            return Err(StoreError::Config("vector index not initialized; call ensure_schema first".into()));
        }

        let reference: Option<Vec<u8>> = self
            .conn
            .query_row(
                r#"
                SELECT v.embedding
                FROM nodes ev
                JOIN edges e ON e.src = ev.id AND e.rel = ?2
                JOIN nodes p ON p.id = e.dst AND p.label = ?3 AND p.key = ?1
                JOIN evidence_vec v ON v.rowid = ev.id
                WHERE ev.label = ?4
                ORDER BY json_extract(ev.props, '$.source'), json_extract(ev.props, '$.position')
                LIMIT 1
                "#,
                params![
                    application_number,
                    RelKind::EvidenceOf.rel_type(),
                    NodeKind::Patent.label(),
                    NodeKind::Evidence.label()
                ],
                |r| r.get(0),
            )
            .optional()?;

        let Some(reference) = reference else {
            log::info!("No Evidence for {}, nothing to compare", application_number);
            return Ok(vec![]);
        };

        let mut stmt = self.conn.prepare(
            r#"
            WITH knn AS (
                SELECT rowid, distance
                FROM evidence_vec
                WHERE embedding MATCH ?1 AND k = ?2
            )
            SELECT json_extract(n.props, '$.chunk_id'), json_extract(n.props, '$.content'), knn.distance
            FROM knn
            JOIN nodes n ON n.id = knn.rowid
            ORDER BY knn.distance ASC
            "#,
        )?;
        let rows = stmt.query_map(params![reference, top_k as i64], |r| {
            let chunk_id: String = r.get(0)?;
            let content: String = r.get(1)?;
            let distance: f64 = r.get(2)?;
            Ok(SimilarEvidence {
                chunk_id,
                content,
                score: cosine_distance_to_score(distance),
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn stats(&mut self) -> Result<GraphStats, StoreError> {
        let mut stats = GraphStats::default();
        for kind in NodeKind::ALL {
            let n: i64 = self
                .conn
                .query_row("SELECT COUNT(*) FROM nodes WHERE label = ?1", params![kind.label()], |r| r.get(0))?;
            stats.nodes.insert(kind.label(), n);
        }
        for kind in RelKind::ALL {
            let n: i64 = self
                .conn
                .query_row("SELECT COUNT(*) FROM edges WHERE rel = ?1", params![kind.rel_type()], |r| r.get(0))?;
            stats.relationships.insert(kind.rel_type(), n);
        }
        Ok(stats)
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        match &self.path {
            Some(p) => log::info!("Closing SQLite graph store {}", p.display()),
            None => log::info!("Closing in-memory SQLite graph store"),
        }
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }
}

fn apply_op(tx: &Transaction<'_>, op: &GraphOp, dims: Option<usize>) -> Result<(), StoreError> {
    match op {
        GraphOp::MergePatent { application_number, props } => {
            let mut props = props.clone();
            props.insert("application_number".into(), Value::String(application_number.clone()));
            upsert_node(tx, NodeKind::Patent, application_number, &Value::Object(props))?;
        }
        GraphOp::MergeDecision { application_number, label } => {
            let patent = patent_id(tx, application_number)?;
            let decision = upsert_node(tx, NodeKind::DecisionGroup, label, &json!({ "label": label }))?;
            link(tx, patent, RelKind::HasDecision, decision)?;
        }
        GraphOp::MergeExaminer {
            application_number,
            examiner_id,
            first_name,
            middle_name,
            last_name,
        } => {
            let patent = patent_id(tx, application_number)?;
            let props = json!({
                "examiner_id": examiner_id,
                "first_name": first_name,
                "middle_name": middle_name,
                "last_name": last_name,
            });
            let examiner = upsert_node(tx, NodeKind::Examiner, examiner_id, &props)?;
            link(tx, examiner, RelKind::Examined, patent)?;
        }
        GraphOp::MergeClassification { application_number, scheme, label } => {
            let patent = patent_id(tx, application_number)?;
            let node = upsert_node(tx, scheme.node_kind(), label, &json!({ "label": label }))?;
            link(tx, patent, scheme.rel_kind(), node)?;
        }
        GraphOp::MergeInventor { application_number, inventor } => {
            let patent = patent_id(tx, application_number)?;
            let key = json!([
                inventor.name_first,
                inventor.name_last,
                inventor.city,
                inventor.state,
                inventor.country
            ])
            .to_string();
            let props = json!({
                "first_name": inventor.name_first,
                "last_name": inventor.name_last,
                "city": inventor.city,
                "state": inventor.state,
                "country": inventor.country,
            });
            let node = upsert_node(tx, NodeKind::Inventor, &key, &props)?;
            link(tx, node, RelKind::Invented, patent)?;
        }
        GraphOp::UpsertEvidence { application_number, chunk, created_at } => {
            let Some(dims) = dims else {
                return Err(StoreError::Config("vector index not initialized; call ensure_schema first".into()));
            };
            if chunk.embedding.len() != dims {
                return Err(StoreError::Config(format!(
                    "{}: {}-dim embedding does not fit the {}-dim vector index",
                    chunk.chunk_id,
                    chunk.embedding.len(),
                    dims
                )));
            }
            let patent = patent_id(tx, application_number)?;
            // Evidence is scoped to its patent: chunk ids repeat across patents.
            let key = json!([application_number, chunk.chunk_id]).to_string();
            let props = json!({
                "chunk_id": chunk.chunk_id,
                "content": chunk.content,
                "source": chunk.source.as_str(),
                "position": chunk.position,
                "created_at": created_at.to_rfc3339(),
            });
            let node = upsert_node(tx, NodeKind::Evidence, &key, &props)?;
            link(tx, node, RelKind::EvidenceOf, patent)?;

            tx.execute("DELETE FROM evidence_vec WHERE rowid = ?1", params![node])?;
            tx.execute(
                "INSERT INTO evidence_vec (rowid, embedding) VALUES (?1, ?2)",
                params![node, chunk.embedding.as_slice().as_bytes()],
            )?;
        }
        GraphOp::PruneEvidence { application_number, keep } => {
            let patent = patent_id(tx, application_number)?;
            let mut stmt = tx.prepare(
                r#"
                SELECT ev.id, json_extract(ev.props, '$.chunk_id')
                FROM nodes ev
                JOIN edges e ON e.src = ev.id AND e.rel = ?2 AND e.dst = ?1
                WHERE ev.label = ?3
                "#,
            )?;
            let stale: Vec<i64> = stmt
                .query_map(
                    params![patent, RelKind::EvidenceOf.rel_type(), NodeKind::Evidence.label()],
                    |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)),
                )?
                .filter_map(|row| match row {
                    Ok((id, chunk_id)) if !keep.contains(&chunk_id) => Some(Ok(id)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
                .collect::<Result<_, _>>()?;

            for id in &stale {
                tx.execute("DELETE FROM evidence_vec WHERE rowid = ?1", params![id])?;
                tx.execute("DELETE FROM edges WHERE src = ?1 OR dst = ?1", params![id])?;
                tx.execute("DELETE FROM nodes WHERE id = ?1", params![id])?;
            }
            if !stale.is_empty() {
                log::debug!("{}: pruned {} stale Evidence node(s)", application_number, stale.len());
            }
        }
    }
    Ok(())
}

/// Insert or overwrite the node's properties; returns its id either way.
fn upsert_node(
    tx: &Transaction<'_>,
    kind: NodeKind,
    key: &str,
    props: &Value,
) -> Result<i64, StoreError> {
    Ok(tx.query_row(
        r#"
        INSERT INTO nodes (label, key, props) VALUES (?1, ?2, ?3)
        ON CONFLICT (label, key) DO UPDATE SET props = excluded.props
        RETURNING id
        "#,
        params![kind.label(), key, props.to_string()],
        |r| r.get(0),
    )?)
}

fn patent_id(tx: &Transaction<'_>, application_number: &str) -> Result<i64, StoreError> {
    tx.query_row(
        "SELECT id FROM nodes WHERE label = ?1 AND key = ?2",
        params![NodeKind::Patent.label(), application_number],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| StoreError::MissingPatent(application_number.to_string()))
}

fn link(tx: &Transaction<'_>, src: i64, rel: RelKind, dst: i64) -> Result<(), StoreError> {
    tx.execute(
        "INSERT OR IGNORE INTO edges (src, rel, dst) VALUES (?1, ?2, ?3)",
        params![src, rel.rel_type(), dst],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::embeddings::embedder::tests::{fake_embedder, fake_vector};
    use crate::embeddings::embedder::{ChunkSource, EmbeddedChunk};
    use crate::graph::writer::GraphWriter;
    use crate::record::tests::sample_patent;
    use crate::record::{Inventor, PatentRecord};

    const DIMS: usize = 8;

    fn store() -> SqliteGraphStore {
        let mut s = SqliteGraphStore::open_in_memory().unwrap();
        s.ensure_schema(DIMS).unwrap();
        s
    }

    fn ingest(store: &mut SqliteGraphStore, rec: &PatentRecord) {
        let embedder = fake_embedder(DIMS, 6, 2);
        let mut chunks = embedder.embed_field(ChunkSource::Abstract, rec.abstract_text.as_deref()).unwrap();
        chunks.extend(embedder.embed_field(ChunkSource::Summary, rec.summary.as_deref()).unwrap());
        GraphWriter::write(store, rec, chunks).unwrap();
    }

    fn patent_props(store: &SqliteGraphStore, app: &str) -> Value {
        let raw: String = store
            .conn
            .query_row("SELECT props FROM nodes WHERE label = 'Patent' AND key = ?1", params![app], |r| r.get(0))
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    fn edges_touching(store: &SqliteGraphStore, label: &str, rel: RelKind) -> Vec<i64> {
        let mut stmt = store
            .conn
            .prepare(
                "SELECT COUNT(e.rel) FROM nodes n LEFT JOIN edges e ON (e.src = n.id OR e.dst = n.id) AND e.rel = ?2 \
                 WHERE n.label = ?1 GROUP BY n.id ORDER BY n.id",
            )
            .unwrap();
        let rows = stmt.query_map(params![label, rel.rel_type()], |r| r.get(0)).unwrap();
        rows.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_sample_patent_graph_shape() {
        let mut s = store();
        ingest(&mut s, &sample_patent());

        let stats = s.stats().unwrap();
        assert_eq!(stats.node_count(NodeKind::Patent), 1);
        assert_eq!(stats.node_count(NodeKind::Cpc), 1);
        assert_eq!(stats.rel_count(RelKind::HasCpc), 1);
        assert_eq!(stats.node_count(NodeKind::Inventor), 5);
        assert_eq!(stats.rel_count(RelKind::Invented), 5);
        assert_eq!(edges_touching(&s, "Inventor", RelKind::Invented), vec![1; 5]);
        assert_eq!(edges_touching(&s, "CPC", RelKind::HasCpc), vec![1]);
        assert_eq!(stats.node_count(NodeKind::DecisionGroup), 1);
        assert_eq!(stats.node_count(NodeKind::Examiner), 1);
        assert_eq!(stats.rel_count(RelKind::Examined), 1);
        assert!(stats.node_count(NodeKind::Evidence) >= 2);
        assert_eq!(stats.node_count(NodeKind::Evidence), stats.rel_count(RelKind::EvidenceOf));
    }

    #[test]
    fn test_reingest_is_idempotent_and_last_write_wins() {
        let mut s = store();
        let mut rec = sample_patent();
        ingest(&mut s, &rec);
        let first = s.stats().unwrap();

        rec.title = Some("Revised title".into());
        rec.abandon_date = Some("20200101".into());
        ingest(&mut s, &rec);

        let second = s.stats().unwrap();
        assert_eq!(first, second);
        let props = patent_props(&s, "13817165");
        assert_eq!(props["title"], "Revised title");
        assert_eq!(props["abandon_date"], "20200101");
        assert_eq!(props["application_number"], "13817165");
    }

    #[test]
    fn test_shared_keys_dedupe_across_patents() {
        let mut s = store();
        let a = sample_patent();
        let mut b = sample_patent();
        b.application_number = "99999999".into();
        b.inventor_list.truncate(2);
        b.inventor_list.push(Inventor {
            name_first: "New".into(),
            name_last: "Person".into(),
            city: "Tampa".into(),
            state: "FL".into(),
            country: "US".into(),
        });
        ingest(&mut s, &a);
        ingest(&mut s, &b);

        let stats = s.stats().unwrap();
        assert_eq!(stats.node_count(NodeKind::Patent), 2);
        assert_eq!(stats.node_count(NodeKind::Cpc), 1);
        assert_eq!(stats.node_count(NodeKind::Ipcr), 1);
        assert_eq!(stats.node_count(NodeKind::DecisionGroup), 1);
        assert_eq!(stats.node_count(NodeKind::Examiner), 1);
        assert_eq!(stats.node_count(NodeKind::Inventor), 6);
        assert_eq!(stats.rel_count(RelKind::HasCpc), 2);
        assert_eq!(stats.rel_count(RelKind::Invented), 8);
        assert_eq!(edges_touching(&s, "CPC", RelKind::HasCpc), vec![2]);
    }

    #[test]
    fn test_missing_patent_rolls_back_whole_write() {
        let mut s = store();
        let ops = vec![
            GraphOp::MergeClassification {
                application_number: "1".into(),
                scheme: crate::graph::Classification::Cpc,
                label: "A01B".into(),
            },
        ];
        // The CPC merge needs a Patent that was never written.
        let err = s.apply(&ops).unwrap_err();
        assert!(matches!(err, StoreError::MissingPatent(ref a) if a == "1"));

        let mut rec = sample_patent();
        rec.application_number = "2".into();
        let mut ops = GraphWriter::plan(&rec, vec![], Utc::now());
        ops.push(GraphOp::MergeDecision { application_number: "3".into(), label: "REJECTED".into() });
        assert!(s.apply(&ops).is_err());

        let stats = s.stats().unwrap();
        assert_eq!(stats.nodes.values().sum::<i64>(), 0);
        assert_eq!(stats.relationships.values().sum::<i64>(), 0);
    }

    #[test]
    fn test_nearest_evidence_without_evidence_is_empty() {
        let mut s = store();
        let mut rec = sample_patent();
        rec.abstract_text = None;
        rec.summary = Some("   ".into());
        ingest(&mut s, &rec);

        assert!(s.nearest_evidence("13817165", 5).unwrap().is_empty());
        assert!(s.nearest_evidence("unknown", 5).unwrap().is_empty());
    }

    #[test]
    fn test_nearest_evidence_orders_by_score() {
        let mut s = store();
        let mut rec = sample_patent();
        rec.summary = Some(
            "the system measures drug levels in breath and adjusts infusion rates based on \
             pharmacokinetic models and sensor feedback from the patient over time"
                .into(),
        );
        ingest(&mut s, &rec);

        let hits = s.nearest_evidence("13817165", 5).unwrap();
        assert!(!hits.is_empty());
        assert!(hits.len() <= 5);
        assert_eq!(hits[0].chunk_id, "abstract_chunk_001");
        assert!((hits[0].score - 1.0).abs() < 1e-4);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    fn vec_rows(store: &SqliteGraphStore) -> i64 {
        store.conn.query_row("SELECT COUNT(*) FROM evidence_vec", [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn test_reingest_with_fewer_chunks_prunes_stale_evidence() {
        let mut s = store();
        let mut rec = sample_patent();
        rec.summary = None;
        rec.abstract_text = Some("one two three four five six seven eight nine ten".into());

        let embedder = fake_embedder(DIMS, 4, 1);
        let chunks = embedder.embed_field(ChunkSource::Abstract, rec.abstract_text.as_deref()).unwrap();
        assert_eq!(chunks.len(), 3);
        GraphWriter::write(&mut s, &rec, chunks).unwrap();
        assert_eq!(s.stats().unwrap().node_count(NodeKind::Evidence), 3);

        rec.abstract_text = Some("short".into());
        let chunks = embedder.embed_field(ChunkSource::Abstract, rec.abstract_text.as_deref()).unwrap();
        GraphWriter::write(&mut s, &rec, chunks).unwrap();

        let stats = s.stats().unwrap();
        assert_eq!(stats.node_count(NodeKind::Evidence), 1);
        assert_eq!(stats.rel_count(RelKind::EvidenceOf), 1);
        assert_eq!(vec_rows(&s), 1);
        let hits = s.nearest_evidence("13817165", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "short");
    }

    #[test]
    fn test_prune_leaves_other_patents_alone() {
        let mut s = store();
        let a = sample_patent();
        let mut b = sample_patent();
        b.application_number = "99999999".into();
        ingest(&mut s, &a);
        ingest(&mut s, &b);
        let before = s.stats().unwrap().node_count(NodeKind::Evidence);

        let mut emptied = a.clone();
        emptied.abstract_text = None;
        emptied.summary = None;
        ingest(&mut s, &emptied);

        let after = s.stats().unwrap().node_count(NodeKind::Evidence);
        assert_eq!(after, before / 2);
        assert!(s.nearest_evidence("13817165", 5).unwrap().is_empty());
        assert!(!s.nearest_evidence("99999999", 5).unwrap().is_empty());
    }

    #[test]
    fn test_reference_chunk_follows_numeric_position() {
        let mut s = store();
        let rec = sample_patent();
        let chunk = |position: usize, text: &str| EmbeddedChunk {
            chunk_id: crate::embeddings::embedder::chunk_id(ChunkSource::Abstract, position),
            source: ChunkSource::Abstract,
            position,
            content: text.into(),
            embedding: fake_vector(text, DIMS),
        };
        // "abstract_chunk_1000" sorts before "abstract_chunk_002" as text.
        let chunks = vec![chunk(2, "second window of text"), chunk(1000, "zzzz far later window")];
        GraphWriter::write(&mut s, &rec, chunks).unwrap();

        let hits = s.nearest_evidence("13817165", 2).unwrap();
        assert_eq!(hits[0].chunk_id, "abstract_chunk_002");
        assert!((hits[0].score - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_dimension_mismatch_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        {
            let mut s = SqliteGraphStore::open(&path).unwrap();
            s.ensure_schema(DIMS).unwrap();
        }
        let mut s = SqliteGraphStore::open(&path).unwrap();
        assert!(matches!(s.ensure_schema(DIMS + 1), Err(StoreError::Config(_))));
        assert!(s.ensure_schema(DIMS).is_ok());
    }
}
