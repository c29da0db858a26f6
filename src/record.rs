// record.rs — Maps raw patent JSON documents onto the canonical record consumed by the graph writer.
//
// Input documents come in two namings: the bulk dataset layout (examiner_name_first,
// inventor_list[].inventor_name_first, ...) and the short layout (examiner_first,
// inventors[].first_name, ...). Both are accepted.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::IngestError;

/// Canonical patent record. Every field except `application_number` is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatentRecord {
    pub application_number: String,
    pub publication_number: Option<String>,
    pub title: Option<String>,
    pub decision: Option<String>,
    pub date_produced: Option<String>,
    pub date_published: Option<String>,
    pub patent_number: Option<String>,
    pub filing_date: Option<String>,
    pub patent_issue_date: Option<String>,
    pub abandon_date: Option<String>,
    pub uspc_class: Option<String>,
    pub uspc_subclass: Option<String>,
    pub main_cpc_label: Option<String>,
    pub main_ipcr_label: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub summary: Option<String>,
    pub cpc_labels: Vec<String>,
    pub ipcr_labels: Vec<String>,
    pub examiner_id: Option<String>,
    pub examiner_name_first: Option<String>,
    pub examiner_name_middle: Option<String>,
    pub examiner_name_last: Option<String>,
    pub inventor_list: Vec<Inventor>,
}

/// Inventor identity. All five fields form the merge key, so absent values are
/// normalized to "" rather than null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Inventor {
    pub name_first: String,
    pub name_last: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl PatentRecord {
    /// Non-key Patent attributes, in the shape written onto the Patent node.
    /// Absent values stay `null` so a re-ingest clears them (last write wins).
    pub fn patent_properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        let fields: [(&str, &Option<String>); 15] = [
            ("publication_number", &self.publication_number),
            ("title", &self.title),
            ("decision", &self.decision),
            ("date_produced", &self.date_produced),
            ("date_published", &self.date_published),
            ("patent_number", &self.patent_number),
            ("filing_date", &self.filing_date),
            ("patent_issue_date", &self.patent_issue_date),
            ("abandon_date", &self.abandon_date),
            ("uspc_class", &self.uspc_class),
            ("uspc_subclass", &self.uspc_subclass),
            ("main_cpc_label", &self.main_cpc_label),
            ("main_ipcr_label", &self.main_ipcr_label),
            ("abstract", &self.abstract_text),
            ("summary", &self.summary),
        ];
        for (name, value) in fields {
            props.insert(
                name.to_string(),
                value.as_ref().map(|v| Value::String(v.clone())).unwrap_or(Value::Null),
            );
        }
        props
    }
}

/// Parse raw bytes of one input file and normalize it.
pub fn parse_record(bytes: &[u8]) -> Result<PatentRecord, IngestError> {
    let raw: Value = serde_json::from_slice(bytes)
        .map_err(|e| IngestError::MalformedInput(format!("invalid JSON: {e}")))?;
    normalize(&raw)
}

/// Normalize a raw JSON document into a [`PatentRecord`].
///
/// Fails only when the document is not an object or has no usable
/// `application_number`; every other field is passed through as `None` when
/// absent or null.
pub fn normalize(raw: &Value) -> Result<PatentRecord, IngestError> {
    let Some(row) = raw.as_object() else {
        return Err(IngestError::MalformedInput(format!(
            "expected a JSON object, got {}",
            json_type_name(raw)
        )));
    };

    let application_number = field_str(row, &["application_number"])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(IngestError::MissingField("application_number"))?;

    let main_cpc_label = field_str(row, &["main_cpc_label"]);
    let main_ipcr_label = field_str(row, &["main_ipcr_label"]);
    let cpc_labels = label_set(main_cpc_label.as_deref(), row.get("cpc_labels"));
    let ipcr_labels = label_set(main_ipcr_label.as_deref(), row.get("ipcr_labels"));

    let inventor_list = row
        .get("inventor_list")
        .or_else(|| row.get("inventors"))
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|v| v.as_object()).map(inventor).collect())
        .unwrap_or_default();

    Ok(PatentRecord {
        application_number,
        publication_number: field_str(row, &["publication_number"]),
        title: field_str(row, &["title"]),
        decision: field_str(row, &["decision"]),
        date_produced: field_str(row, &["date_produced"]),
        date_published: field_str(row, &["date_published"]),
        patent_number: field_str(row, &["patent_number"]),
        filing_date: field_str(row, &["filing_date"]),
        patent_issue_date: field_str(row, &["patent_issue_date"]),
        abandon_date: field_str(row, &["abandon_date"]),
        uspc_class: field_str(row, &["uspc_class"]),
        uspc_subclass: field_str(row, &["uspc_subclass"]),
        main_cpc_label,
        main_ipcr_label,
        abstract_text: field_str(row, &["abstract"]),
        summary: field_str(row, &["summary"]),
        cpc_labels,
        ipcr_labels,
        examiner_id: field_str(row, &["examiner_id"]),
        examiner_name_first: field_str(row, &["examiner_name_first", "examiner_first"]),
        examiner_name_middle: field_str(row, &["examiner_name_middle", "examiner_middle"]),
        examiner_name_last: field_str(row, &["examiner_name_last", "examiner_last"]),
        inventor_list,
    })
}

fn inventor(row: &Map<String, Value>) -> Inventor {
    let get = |keys: &[&str]| field_str(row, keys).unwrap_or_default();
    Inventor {
        name_first: get(&["inventor_name_first", "name_first", "first_name"]),
        name_last: get(&["inventor_name_last", "name_last", "last_name"]),
        city: get(&["inventor_city", "city"]),
        state: get(&["inventor_state", "state"]),
        country: get(&["inventor_country", "country"]),
    }
}

/// First alias that holds a string or number. Numbers are rendered as written
/// in the source (examiner ids arrive as `74715.0`).
fn field_str(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match row.get(*k) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Main label first, then the list; blanks dropped, duplicates removed in order.
fn label_set(main: Option<&str>, list: Option<&Value>) -> Vec<String> {
    let listed = list
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str());

    let mut out: Vec<String> = Vec::new();
    for label in main.into_iter().chain(listed) {
        let label = label.trim();
        if label.is_empty() || out.iter().any(|l| l == label) {
            continue;
        }
        out.push(label.to_string());
    }
    out
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
