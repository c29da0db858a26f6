// neo4j.rs — Neo4j backend over the HTTP transactional Cypher API.
//
// A record is written inside one explicit transaction: begin, run every statement in a single
// request, check that each MATCH-based statement found its Patent, then commit or roll back.

use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config;
use crate::error::StoreError;
use crate::graph::{Classification, GraphOp, GraphStats, GraphStore, NodeKind, RelKind, SimilarEvidence};

// Every statement returns `matched`: the number of Patent rows it attached to.
const MERGE_PATENT: &str = "\
MERGE (p:Patent {application_number: $application_number})
SET p += $props
RETURN count(p) AS matched";

const MERGE_DECISION: &str = "\
MATCH (p:Patent {application_number: $application_number})
MERGE (d:DecisionGroup {label: $label})
MERGE (p)-[:HAS_DECISION]->(d)
RETURN count(p) AS matched";

const MERGE_EXAMINER: &str = "\
MATCH (p:Patent {application_number: $application_number})
MERGE (e:Examiner {examiner_id: $examiner_id})
SET e.first_name = $first_name, e.middle_name = $middle_name, e.last_name = $last_name
MERGE (e)-[:EXAMINED]->(p)
RETURN count(p) AS matched";

const MERGE_CPC: &str = "\
MATCH (p:Patent {application_number: $application_number})
MERGE (c:CPC {label: $label})
MERGE (p)-[:HAS_CPC]->(c)
RETURN count(p) AS matched";

const MERGE_IPCR: &str = "\
MATCH (p:Patent {application_number: $application_number})
MERGE (i:IPCR {label: $label})
MERGE (p)-[:HAS_IPCR]->(i)
RETURN count(p) AS matched";

const MERGE_INVENTOR: &str = "\
MATCH (p:Patent {application_number: $application_number})
MERGE (i:Inventor {first_name: $first_name, last_name: $last_name, city: $city, state: $state, country: $country})
MERGE (i)-[:INVENTED]->(p)
RETURN count(p) AS matched";

const UPSERT_EVIDENCE: &str = "\
MATCH (p:Patent {application_number: $application_number})
MERGE (e:Evidence {application_number: $application_number, chunk_id: $chunk_id})
SET e.content = $content, e.embedding = $embedding, e.source = $source, e.position = $position,
    e.created_at = datetime($created_at)
MERGE (e)-[:EVIDENCE_OF]->(p)
RETURN count(p) AS matched";

const PRUNE_EVIDENCE: &str = "\
MATCH (p:Patent {application_number: $application_number})
OPTIONAL MATCH (p)<-[:EVIDENCE_OF]-(e:Evidence)
WHERE NOT e.chunk_id IN $keep
DETACH DELETE e
RETURN count(DISTINCT p) AS matched";

const NEAREST_EVIDENCE: &str = "\
MATCH (:Patent {application_number: $application_number})<-[:EVIDENCE_OF]-(ref:Evidence)
WITH ref ORDER BY ref.source, ref.position LIMIT 1
CALL db.index.vector.queryNodes($index_name, $top_k, ref.embedding) YIELD node, score
RETURN node.chunk_id AS chunk_id, node.content AS content, score
ORDER BY score DESC";

const SHOW_VECTOR_INDEX: &str = "\
SHOW INDEXES YIELD name, options
WHERE name = $index_name
RETURN options";

const NODE_COUNTS: &str = "MATCH (n) UNWIND labels(n) AS label RETURN label, count(*) AS n";
const REL_COUNTS: &str = "MATCH ()-[r]->() RETURN type(r) AS rel, count(*) AS n";

const CONSTRAINTS: [&str; 6] = [
    "CREATE CONSTRAINT patent_application_number IF NOT EXISTS FOR (p:Patent) REQUIRE p.application_number IS UNIQUE",
    "CREATE CONSTRAINT examiner_id IF NOT EXISTS FOR (e:Examiner) REQUIRE e.examiner_id IS UNIQUE",
    "CREATE CONSTRAINT cpc_label IF NOT EXISTS FOR (c:CPC) REQUIRE c.label IS UNIQUE",
    "CREATE CONSTRAINT ipcr_label IF NOT EXISTS FOR (i:IPCR) REQUIRE i.label IS UNIQUE",
    "CREATE CONSTRAINT decision_group_label IF NOT EXISTS FOR (d:DecisionGroup) REQUIRE d.label IS UNIQUE",
    "CREATE INDEX evidence_chunk IF NOT EXISTS FOR (e:Evidence) ON (e.application_number, e.chunk_id)",
];

/// Connection parameters for a Neo4j database.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone)]
struct Statement {
    statement: String,
    parameters: Value,
}

impl Statement {
    fn new(statement: &str, parameters: Value) -> Self {
        Self { statement: statement.to_string(), parameters }
    }

    fn to_json(&self) -> Value {
        json!({ "statement": self.statement, "parameters": self.parameters })
    }
}

#[derive(Debug, Default, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
    #[serde(default)]
    commit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResult {
    #[serde(default)]
    data: Vec<DataRow>,
}

#[derive(Debug, Deserialize)]
struct DataRow {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

pub struct Neo4jHttpStore {
    agent: ureq::Agent,
    tx_endpoint: String,
    authorization: String,
}

impl Neo4jHttpStore {
    pub fn new(cfg: Neo4jConfig) -> Result<Self, StoreError> {
        let base = cfg.uri.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(StoreError::Config(format!(
                "Neo4j URI '{}' is not an http(s) endpoint; the HTTP API listens on port 7474 by default",
                cfg.uri
            )));
        }
        if cfg.password.is_empty() {
            return Err(StoreError::Config("Neo4j password is empty".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config::neo4j::REQUEST_TIMEOUT_SECS))
            .build();
        let credentials = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", cfg.user, cfg.password));
        let tx_endpoint = format!("{}/db/{}/tx", base, cfg.database);
        log::info!("Neo4j store: {} (user {})", tx_endpoint, cfg.user);

        Ok(Self {
            agent,
            tx_endpoint,
            authorization: format!("Basic {credentials}"),
        })
    }

    /// POST statements to `url`. Cypher errors come back in the body, not the status.
    fn post(
        &self,
        url: &str,
        statements: &[Statement],
    ) -> Result<(TxResponse, Option<String>), StoreError> {
        let body = json!({ "statements": statements.iter().map(Statement::to_json).collect::<Vec<_>>() });
        let resp = match self
            .agent
            .post(url)
            .set("Authorization", &self.authorization)
            .set("Accept", "application/json")
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
        {
            Ok(r) => r,
            Err(ureq::Error::Status(code, r)) => {
                let detail = r.into_string().unwrap_or_default();
                return Err(StoreError::Http(format!("HTTP {code} from {url}: {}", detail.trim())));
            }
            Err(e) => return Err(StoreError::Http(format!("request to {url} failed: {e}"))),
        };

        let location = resp.header("Location").map(str::to_string);
        let parsed: TxResponse = serde_json::from_reader(resp.into_reader())
            .map_err(|e| StoreError::Protocol(format!("invalid Neo4j response from {url}: {e}")))?;

        if let Some(err) = parsed.errors.into_iter().next() {
            return Err(StoreError::Neo4j { code: err.code, message: err.message });
        }
        Ok((
            TxResponse {
                results: parsed.results,
                errors: vec![],
                commit: parsed.commit,
            },
            location,
        ))
    }

    /// Run statements in their own auto-committed transaction.
    fn run_autocommit(&self, statements: &[Statement]) -> Result<Vec<QueryResult>, StoreError> {
        let url = format!("{}/commit", self.tx_endpoint);
        Ok(self.post(&url, statements)?.0.results)
    }

    fn begin(&self) -> Result<String, StoreError> {
        let (resp, location) = self.post(&self.tx_endpoint, &[])?;
        location
            .or_else(|| resp.commit.map(|c| c.trim_end_matches("/commit").to_string()))
            .ok_or_else(|| StoreError::Protocol("Neo4j did not return a transaction location".into()))
    }

    fn commit(&self, tx_url: &str) -> Result<(), StoreError> {
        self.post(&format!("{tx_url}/commit"), &[])?;
        Ok(())
    }

    fn rollback(&self, tx_url: &str) {
        match self.agent.delete(tx_url).set("Authorization", &self.authorization).call() {
            Ok(_) => log::warn!("Rolled back transaction {}", tx_url),
            // Neo4j already discards a transaction after a statement error.
            Err(e) => log::debug!("Rollback of {} returned: {}", tx_url, e),
        }
    }

    fn run_checked(
        &self,
        tx_url: &str,
        ops: &[GraphOp],
        statements: &[Statement],
    ) -> Result<(), StoreError> {
        let (resp, _) = self.post(tx_url, statements)?;
        if resp.results.len() != statements.len() {
            return Err(StoreError::Protocol(format!(
                "sent {} statements, got {} results",
                statements.len(),
                resp.results.len()
            )));
        }
        for (op, result) in ops.iter().zip(&resp.results) {
            let matched = result
                .data
                .first()
                .and_then(|d| d.row.first())
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            if matched < 1 {
                return Err(StoreError::MissingPatent(op.application_number().to_string()));
            }
        }
        Ok(())
    }

    fn existing_vector_dims(&self) -> Result<Option<usize>, StoreError> {
        let results = self.run_autocommit(&[Statement::new(
            SHOW_VECTOR_INDEX,
            json!({ "index_name": config::neo4j::VECTOR_INDEX_NAME }),
        )])?;
        Ok(results
            .first()
            .and_then(|r| r.data.first())
            .and_then(|d| d.row.first())
            .and_then(|options| options.pointer("/indexConfig/vector.dimensions"))
            .and_then(|v| v.as_u64())
            .map(|d| d as usize))
    }
}

/// The fixed Cypher template for an operation, with its parameters.
fn statement_for(op: &GraphOp) -> Statement {
    match op {
        GraphOp::MergePatent { application_number, props } => Statement::new(
            MERGE_PATENT,
            json!({ "application_number": application_number, "props": props }),
        ),
        GraphOp::MergeDecision { application_number, label } => Statement::new(
            MERGE_DECISION,
            json!({ "application_number": application_number, "label": label }),
        ),
        GraphOp::MergeExaminer {
            application_number,
            examiner_id,
            first_name,
            middle_name,
            last_name,
        } => Statement::new(
            MERGE_EXAMINER,
            json!({
                "application_number": application_number,
                "examiner_id": examiner_id,
                "first_name": first_name,
                "middle_name": middle_name,
                "last_name": last_name,
            }),
        ),
        GraphOp::MergeClassification { application_number, scheme, label } => {
            let template = match scheme {
                Classification::Cpc => MERGE_CPC,
                Classification::Ipcr => MERGE_IPCR,
            };
            Statement::new(template, json!({ "application_number": application_number, "label": label }))
        }
        GraphOp::MergeInventor { application_number, inventor } => Statement::new(
            MERGE_INVENTOR,
            json!({
                "application_number": application_number,
                "first_name": inventor.name_first,
                "last_name": inventor.name_last,
                "city": inventor.city,
                "state": inventor.state,
                "country": inventor.country,
            }),
        ),
        GraphOp::UpsertEvidence { application_number, chunk, created_at } => Statement::new(
            UPSERT_EVIDENCE,
            json!({
                "application_number": application_number,
                "chunk_id": chunk.chunk_id,
                "content": chunk.content,
                "embedding": chunk.embedding,
                "source": chunk.source.as_str(),
                "position": chunk.position,
                "created_at": created_at.to_rfc3339(),
            }),
        ),
        GraphOp::PruneEvidence { application_number, keep } => Statement::new(
            PRUNE_EVIDENCE,
            json!({ "application_number": application_number, "keep": keep }),
        ),
    }
}

impl GraphStore for Neo4jHttpStore {
    fn backend(&self) -> &'static str {
        "neo4j"
    }

    fn ensure_schema(&mut self, dims: usize) -> Result<(), StoreError> {
        if let Some(existing) = self.existing_vector_dims()? {
            if existing != dims {
                return Err(StoreError::Config(format!(
                    "vector index {} has {existing} dimensions, configured dimension is {dims}",
                    config::neo4j::VECTOR_INDEX_NAME
                )));
            }
        }

        // Schema statements cannot share a transaction with each other's data; run one per request.
        for ddl in CONSTRAINTS {
            self.run_autocommit(&[Statement::new(ddl, json!({}))])?;
        }
        // Index options must be literals; dims is a validated integer.
        let vector_index = format!(
            "CREATE VECTOR INDEX {name} IF NOT EXISTS FOR (e:Evidence) ON (e.embedding) \
             OPTIONS {{indexConfig: {{`vector.dimensions`: {dims}, `vector.similarity_function`: 'cosine'}}}}",
            name = config::neo4j::VECTOR_INDEX_NAME,
        );
        self.run_autocommit(&[Statement::new(&vector_index, json!({}))])?;
        log::info!("Neo4j schema ready (vector index {}: {} dims)", config::neo4j::VECTOR_INDEX_NAME, dims);
        Ok(())
    }

    fn apply(&mut self, ops: &[GraphOp]) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }
        let statements: Vec<Statement> = ops.iter().map(statement_for).collect();

        let tx_url = self.begin()?;
        if let Err(e) = self.run_checked(&tx_url, ops, &statements) {
            self.rollback(&tx_url);
            return Err(e);
        }
        self.commit(&tx_url)
    }

    fn nearest_evidence(
        &mut self,
        application_number: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarEvidence>, StoreError> {
        let results = self.run_autocommit(&[Statement::new(
            NEAREST_EVIDENCE,
            json!({
                "application_number": application_number,
                "index_name": config::neo4j::VECTOR_INDEX_NAME,
                "top_k": top_k,
            }),
        )])?;

        let rows = results.into_iter().next().map(|r| r.data).unwrap_or_default();
        rows.into_iter()
            .map(|d| match d.row.as_slice() {
                [chunk_id, content, score] => Ok(SimilarEvidence {
                    chunk_id: chunk_id.as_str().unwrap_or_default().to_string(),
                    content: content.as_str().unwrap_or_default().to_string(),
                    score: score.as_f64().unwrap_or(0.0),
                }),
                other => Err(StoreError::Protocol(format!("unexpected similarity row: {other:?}"))),
            })
            .collect()
    }

    fn stats(&mut self) -> Result<GraphStats, StoreError> {
        let results = self.run_autocommit(&[
            Statement::new(NODE_COUNTS, json!({})),
            Statement::new(REL_COUNTS, json!({})),
        ])?;
        let counts = |idx: usize| -> Vec<(String, i64)> {
            results
                .get(idx)
                .map(|r| {
                    r.data
                        .iter()
                        .filter_map(|d| Some((d.row.first()?.as_str()?.to_string(), d.row.get(1)?.as_i64()?)))
                        .collect()
                })
                .unwrap_or_default()
        };
        let nodes = counts(0);
        let rels = counts(1);

        let mut stats = GraphStats::default();
        for kind in NodeKind::ALL {
            let n = nodes.iter().find(|(l, _)| l == kind.label()).map(|(_, n)| *n).unwrap_or(0);
            stats.nodes.insert(kind.label(), n);
        }
        for kind in RelKind::ALL {
            let n = rels.iter().find(|(r, _)| r == kind.rel_type()).map(|(_, n)| *n).unwrap_or(0);
            stats.relationships.insert(kind.rel_type(), n);
        }
        Ok(stats)
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        log::info!("Closing Neo4j store ({})", self.tx_endpoint);
        Ok(())
    }
}
