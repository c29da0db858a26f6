//! End-to-end tests for the `patent-graph` binary against the SQLite backend,
//! with Ollama played by a mockito server.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use mockito::{Server, ServerGuard};
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const DIMS: usize = 8;

/// Answers `/api/embed` with one deterministic vector per input text.
fn ollama_mock(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/api/embed")
        .with_header("content-type", "application/json")
        .with_body_from_request(|req| {
            let body: Value = serde_json::from_slice(req.body().unwrap()).unwrap();
            let embeddings: Vec<Vec<f32>> = body["input"]
                .as_array()
                .unwrap()
                .iter()
                .map(|text| {
                    let mut v = vec![0.0f32; DIMS];
                    for (i, b) in text.as_str().unwrap().bytes().enumerate() {
                        v[i % DIMS] += b as f32 / 255.0;
                    }
                    v[0] += 1.0;
                    v
                })
                .collect();
            serde_json::to_vec(&json!({ "model": "nomic-embed-text", "embeddings": embeddings })).unwrap()
        })
        .create()
}

fn patent_doc(app: &str) -> String {
    json!({
        "application_number": app,
        "title": "Intelligent Drug and/or Fluid Delivery System",
        "decision": "ACCEPTED",
        "main_cpc_label": "A61M51723",
        "cpc_labels": ["A61M51723"],
        "main_ipcr_label": "A61M5172",
        "examiner_id": 74715.0,
        "examiner_first": "DEANNA",
        "examiner_last": "HALL",
        "inventors": [
            {"first_name": "Richard J.", "last_name": "Melker", "city": "Gainesville", "state": "FL", "country": "US"}
        ],
        "abstract": "A pharmacodynamic and pharmacokinetic based drug delivery system.",
        "summary": "The system monitors drug concentration in exhaled breath."
    })
    .to_string()
}

fn cmd(work: &Path, ollama_url: &str) -> Command {
    let mut cmd = Command::cargo_bin("patent-graph").unwrap();
    cmd.env_clear()
        .current_dir(work)
        .env("GRAPH_BACKEND", "sqlite")
        .env("SQLITE_PATH", work.join("graph.db"))
        .env("EMBEDDER", "ollama")
        .env("OLLAMA_BASE_URL", ollama_url)
        .env("EMBEDDING_DIM", DIMS.to_string())
        .env("APPROXIMATE_TOKENS", "true")
        .env("PATENT_GRAPH_LOG_DIR", work.join("logs"));
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("patent-graph")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("similar"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn test_ingest_missing_directory_fails() {
    let work = TempDir::new().unwrap();
    cmd(work.path(), "http://127.0.0.1:9")
        .arg("ingest")
        .arg(work.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read input directory"));
}

#[test]
fn test_neo4j_without_password_fails() {
    let work = TempDir::new().unwrap();
    cmd(work.path(), "http://127.0.0.1:9")
        .env("GRAPH_BACKEND", "neo4j")
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NEO4J_PASSWORD"));
}

#[test]
fn test_ingest_then_similar_and_stats() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("input");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("a.json"), patent_doc("13817165")).unwrap();
    fs::write(input.join("b.json"), "{ this is not json").unwrap();
    fs::write(input.join("c.json"), patent_doc("13817166")).unwrap();

    let mut server = Server::new();
    let embed = ollama_mock(&mut server);

    let output = cmd(work.path(), &server.url()).arg("ingest").arg(&input).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let summary = stdout_json(&output);
    assert_eq!(summary["attempted"], 3);
    assert_eq!(summary["processed"], 2);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["failures"]["malformed_input"], 1);
    embed.assert();

    let output = cmd(work.path(), &server.url()).arg("stats").output().unwrap();
    assert!(output.status.success());
    let stats = stdout_json(&output);
    assert_eq!(stats["backend"], "sqlite");
    assert_eq!(stats["nodes"]["Patent"], 2);
    assert_eq!(stats["nodes"]["CPC"], 1);
    assert_eq!(stats["nodes"]["Examiner"], 1);
    assert_eq!(stats["nodes"]["Evidence"], 4);
    assert_eq!(stats["relationships"]["HAS_CPC"], 2);

    let output = cmd(work.path(), &server.url())
        .args(["similar", "13817165", "--top-k", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let similar = stdout_json(&output);
    let results = similar["results"].as_array().unwrap();
    assert!(!results.is_empty() && results.len() <= 3);
    let scores: Vec<f64> = results.iter().map(|r| r["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_max_files_limits_ingestion() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("input");
    fs::create_dir(&input).unwrap();
    for (name, app) in [("1.json", "100"), ("2.json", "200"), ("3.json", "300")] {
        fs::write(input.join(name), patent_doc(app)).unwrap();
    }

    let mut server = Server::new();
    let _embed = ollama_mock(&mut server);

    let output = cmd(work.path(), &server.url())
        .arg("ingest")
        .arg(&input)
        .args(["--max-files", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary = stdout_json(&output);
    assert_eq!(summary["attempted"], 2);
    assert_eq!(summary["processed"], 2);
}

#[test]
fn test_similar_rejects_non_positive_top_k() {
    let work = TempDir::new().unwrap();
    cmd(work.path(), "http://127.0.0.1:9")
        .args(["similar", "13817165", "--top-k", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("top_k must be positive"));
}

#[test]
fn test_provider_outage_counts_records_as_failed() {
    let work = TempDir::new().unwrap();
    let input = work.path().join("input");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("a.json"), patent_doc("13817165")).unwrap();

    let mut server = Server::new();
    let _down = server.mock("POST", "/api/embed").with_status(500).with_body("model not loaded").create();

    let output = cmd(work.path(), &server.url()).arg("ingest").arg(&input).output().unwrap();
    assert!(output.status.success());
    let summary = stdout_json(&output);
    assert_eq!(summary["processed"], 0);
    assert_eq!(summary["failures"]["provider"], 1);
}

#[test]
fn test_ollama_without_tokenizer_fails() {
    let work = TempDir::new().unwrap();
    cmd(work.path(), "http://127.0.0.1:9")
        .env_remove("APPROXIMATE_TOKENS")
        .arg("ingest")
        .arg(work.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("TOKENIZER_PATH"));
}

#[test]
fn test_malformed_dotenv_fails() {
    let work = TempDir::new().unwrap();
    fs::write(work.path().join(".env"), "GRAPH_BACKEND=sqlite\nBAD LINE WITHOUT EQUALS\n").unwrap();
    cmd(work.path(), "http://127.0.0.1:9")
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains(".env"));
}

#[test]
fn test_missing_dotenv_is_fine() {
    let work = TempDir::new().unwrap();
    cmd(work.path(), "http://127.0.0.1:9").arg("stats").assert().success();
}
