// writer.rs — Turns one normalized patent plus its embedded chunks into graph operations.

use chrono::{DateTime, Utc};

use crate::embeddings::embedder::EmbeddedChunk;
use crate::error::IngestError;
use crate::graph::{Classification, GraphOp, GraphStore};
use crate::record::PatentRecord;

/// Stateless: everything needed for a write travels in its arguments.
pub struct GraphWriter;

impl GraphWriter {
    /// Ordered operations for one patent: Patent first, then everything that
    /// attaches to it, Evidence last, then removal of Evidence the record no longer has.
    pub fn plan(
        record: &PatentRecord,
        chunks: Vec<EmbeddedChunk>,
        created_at: DateTime<Utc>,
    ) -> Vec<GraphOp> {
        let app = &record.application_number;
        let mut ops = Vec::with_capacity(
            4 + record.cpc_labels.len() + record.ipcr_labels.len() + record.inventor_list.len() + chunks.len(),
        );

        ops.push(GraphOp::MergePatent {
            application_number: app.clone(),
            props: record.patent_properties(),
        });

        if let Some(label) = non_blank(record.decision.as_deref()) {
            ops.push(GraphOp::MergeDecision {
                application_number: app.clone(),
                label: label.to_string(),
            });
        }

        match non_blank(record.examiner_id.as_deref()) {
            Some(examiner_id) => ops.push(GraphOp::MergeExaminer {
                application_number: app.clone(),
                examiner_id: examiner_id.to_string(),
                first_name: record.examiner_name_first.clone(),
                middle_name: record.examiner_name_middle.clone(),
                last_name: record.examiner_name_last.clone(),
            }),
            None => log::debug!("{}: no examiner_id, skipping Examiner", app),
        }

        for label in &record.cpc_labels {
            ops.push(GraphOp::MergeClassification {
                application_number: app.clone(),
                scheme: Classification::Cpc,
                label: label.clone(),
            });
        }
        for label in &record.ipcr_labels {
            ops.push(GraphOp::MergeClassification {
                application_number: app.clone(),
                scheme: Classification::Ipcr,
                label: label.clone(),
            });
        }

        for inventor in &record.inventor_list {
            ops.push(GraphOp::MergeInventor {
                application_number: app.clone(),
                inventor: inventor.clone(),
            });
        }

        let keep: Vec<String> = chunks.iter().map(|c| c.chunk_id.clone()).collect();
        for chunk in chunks {
            ops.push(GraphOp::UpsertEvidence {
                application_number: app.clone(),
                chunk,
                created_at,
            });
        }
        ops.push(GraphOp::PruneEvidence {
            application_number: app.clone(),
            keep,
        });

        ops
    }

    /// Persist one patent and its chunks as a single transaction.
    pub fn write(
        store: &mut dyn GraphStore,
        record: &PatentRecord,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<(), IngestError> {
        let ops = Self::plan(record, chunks, Utc::now());
        log::debug!("{}: applying {} graph operations", record.application_number, ops.len());
        store.apply(&ops)?;
        Ok(())
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}
