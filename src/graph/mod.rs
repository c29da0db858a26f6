// graph/ — Patent property graph: operation model, store backends, writer and similarity search.
//
// Node labels and relationship types form a closed set. Backends map every GraphOp variant to
// one fixed parameterized statement; nothing from an input document is spliced into a query.

pub mod neo4j;
pub mod search;
pub mod sqlite;
pub mod writer;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::embeddings::embedder::EmbeddedChunk;
use crate::error::StoreError;
use crate::record::Inventor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Patent,
    Examiner,
    Cpc,
    Ipcr,
    Inventor,
    DecisionGroup,
    Evidence,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::Patent,
        NodeKind::Examiner,
        NodeKind::Cpc,
        NodeKind::Ipcr,
        NodeKind::Inventor,
        NodeKind::DecisionGroup,
        NodeKind::Evidence,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Patent => "Patent",
            NodeKind::Examiner => "Examiner",
            NodeKind::Cpc => "CPC",
            NodeKind::Ipcr => "IPCR",
            NodeKind::Inventor => "Inventor",
            NodeKind::DecisionGroup => "DecisionGroup",
            NodeKind::Evidence => "Evidence",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelKind {
    Examined,
    HasCpc,
    HasIpcr,
    Invented,
    HasDecision,
    EvidenceOf,
}

impl RelKind {
    pub const ALL: [RelKind; 6] = [
        RelKind::Examined,
        RelKind::HasCpc,
        RelKind::HasIpcr,
        RelKind::Invented,
        RelKind::HasDecision,
        RelKind::EvidenceOf,
    ];

    pub fn rel_type(self) -> &'static str {
        match self {
            RelKind::Examined => "EXAMINED",
            RelKind::HasCpc => "HAS_CPC",
            RelKind::HasIpcr => "HAS_IPCR",
            RelKind::Invented => "INVENTED",
            RelKind::HasDecision => "HAS_DECISION",
            RelKind::EvidenceOf => "EVIDENCE_OF",
        }
    }
}

/// Classification scheme of a label node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Cpc,
    Ipcr,
}

impl Classification {
    pub fn node_kind(self) -> NodeKind {
        match self {
            Classification::Cpc => NodeKind::Cpc,
            Classification::Ipcr => NodeKind::Ipcr,
        }
    }

    pub fn rel_kind(self) -> RelKind {
        match self {
            Classification::Cpc => RelKind::HasCpc,
            Classification::Ipcr => RelKind::HasIpcr,
        }
    }
}

/// One idempotent write against the graph. Everything except `MergePatent`
/// attaches to the Patent matched by `application_number`.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    MergePatent {
        application_number: String,
        props: Map<String, Value>,
    },
    MergeDecision {
        application_number: String,
        label: String,
    },
    MergeExaminer {
        application_number: String,
        examiner_id: String,
        first_name: Option<String>,
        middle_name: Option<String>,
        last_name: Option<String>,
    },
    MergeClassification {
        application_number: String,
        scheme: Classification,
        label: String,
    },
    MergeInventor {
        application_number: String,
        inventor: Inventor,
    },
    UpsertEvidence {
        application_number: String,
        chunk: EmbeddedChunk,
        created_at: DateTime<Utc>,
    },
    /// Delete the patent's Evidence whose chunk_id is not in `keep`, with its edges
    /// and vector. Follows the upserts so a shrunken field leaves no stale chunks.
    PruneEvidence {
        application_number: String,
        keep: Vec<String>,
    },
}

impl GraphOp {
    pub fn application_number(&self) -> &str {
        match self {
            GraphOp::MergePatent { application_number, .. }
            | GraphOp::MergeDecision { application_number, .. }
            | GraphOp::MergeExaminer { application_number, .. }
            | GraphOp::MergeClassification { application_number, .. }
            | GraphOp::MergeInventor { application_number, .. }
            | GraphOp::UpsertEvidence { application_number, .. }
            | GraphOp::PruneEvidence { application_number, .. } => application_number,
        }
    }
}

/// One nearest-neighbour hit from the Evidence vector index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarEvidence {
    pub chunk_id: String,
    pub content: String,
    pub score: f64,
}

/// Node and relationship counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: BTreeMap<&'static str, i64>,
    pub relationships: BTreeMap<&'static str, i64>,
}

impl GraphStats {
    pub fn node_count(&self, kind: NodeKind) -> i64 {
        self.nodes.get(kind.label()).copied().unwrap_or(0)
    }

    pub fn rel_count(&self, kind: RelKind) -> i64 {
        self.relationships.get(kind.rel_type()).copied().unwrap_or(0)
    }
}

/// A graph database the pipeline can write patents into and search.
pub trait GraphStore {
    fn backend(&self) -> &'static str;

    /// Create constraints and the Evidence vector index for `dims`-long embeddings.
    fn ensure_schema(&mut self, dims: usize) -> Result<(), StoreError>;

    /// Apply `ops` in order as one transaction: either all land or none do.
    fn apply(&mut self, ops: &[GraphOp]) -> Result<(), StoreError>;

    /// Up to `top_k` Evidence nodes nearest to the patent's first Evidence
    /// embedding, best first. Empty when the patent has no Evidence.
    fn nearest_evidence(
        &mut self,
        application_number: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarEvidence>, StoreError>;

    fn stats(&mut self) -> Result<GraphStats, StoreError>;

    /// Release the connection. Called once at the end of a run.
    fn close(self: Box<Self>) -> Result<(), StoreError>;
}
