// download.rs — Local model files, fetched on first use and verified by SHA256.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use sha2::{Digest, Sha256};

use crate::config;

/// A file the local provider needs, with its pinned digest.
struct ModelFile {
    name: &'static str,
    sha256: &'static str,
}

const MODEL_FILES: [ModelFile; 3] = [
    ModelFile { name: "model.safetensors", sha256: config::embedding::MODEL_SAFETENSORS_SHA256 },
    ModelFile { name: "tokenizer.json", sha256: config::embedding::TOKENIZER_JSON_SHA256 },
    ModelFile { name: "config.json", sha256: config::embedding::CONFIG_JSON_SHA256 },
];

/// Default model directory (~/.patent-graph/models/all-MiniLM-L6-v2/).
pub fn default_model_dir() -> anyhow::Result<PathBuf> {
    let home = crate::logging::home_dir().context("cannot determine home directory for model files")?;
    Ok(home.join(config::embedding::MODEL_DIR_REL))
}

pub fn model_files_exist(dir: &Path) -> bool {
    MODEL_FILES.iter().all(|f| dir.join(f.name).exists())
}

/// Download any missing model file into `dir`. Returns `dir`.
pub fn ensure_model_files(dir: &Path) -> anyhow::Result<PathBuf> {
    if model_files_exist(dir) {
        log::info!("Model files already cached at {}", dir.display());
        return Ok(dir.to_path_buf());
    }

    log::info!("Downloading embedding model to {}", dir.display());
    fs::create_dir_all(dir).with_context(|| format!("failed to create model dir {}", dir.display()))?;

    for file in &MODEL_FILES {
        let dest = dir.join(file.name);
        if dest.exists() {
            continue;
        }
        let url = format!("{}/{}", config::embedding::MODEL_CDN_BASE, file.name);
        download_and_verify(&url, &dest, file.sha256)?;
    }

    log::info!("Model download complete");
    Ok(dir.to_path_buf())
}

fn download_and_verify(url: &str, dest: &Path, expected_sha256: &str) -> anyhow::Result<()> {
    let filename = dest.file_name().unwrap_or_default().to_string_lossy();
    log::info!("Downloading {} from {}", filename, url);

    let resp = ureq::get(url)
        .timeout(std::time::Duration::from_secs(config::embedding::DOWNLOAD_TIMEOUT_SECS))
        .call()
        .with_context(|| format!("failed to download {url}"))?;

    let mut body = Vec::new();
    resp.into_reader()
        .read_to_end(&mut body)
        .with_context(|| format!("failed to read response body for {url}"))?;

    let actual = sha256_hex(&body);
    if actual != expected_sha256 {
        bail!("SHA256 mismatch for {filename}: expected {expected_sha256}, got {actual}");
    }
    log::info!("SHA256 verified for {} ({})", filename, &actual[..12]);

    // Write to .tmp then rename, so a partial download never looks cached.
    let tmp_path = dest.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path).with_context(|| format!("failed to create {}", tmp_path.display()))?;
    file.write_all(&body)?;
    file.flush()?;
    drop(file);

    fs::rename(&tmp_path, dest)
        .with_context(|| format!("failed to rename {} -> {}", tmp_path.display(), dest.display()))?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
