// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-backed embedding providers.
//!
//! [`FastEmbedder`] runs sentence-transformers/all-MiniLM-L6-v2 in process.
//! [`CommandProvider`] shells out to an external embedder, writing
//! `{"model", "texts"}` as JSON on stdin and reading the vectors back from
//! stdout; the child is killed once the configured timeout elapses.

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use serde_json::Value;
use std::borrow::Cow;
use std::env;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::EmbeddingProvider;
use crate::errors::{Error, Result};

const DEFAULT_FASTEMBED_MODEL: &str = "minilm";
const DEFAULT_FASTEMBED_BATCH_SIZE: usize = 256;
const MAX_FASTEMBED_BATCH_SIZE: usize = 1024;
const DEFAULT_FASTEMBED_MAX_CHARS: usize = 2000;
const DEFAULT_COMMAND_BATCH_SIZE: usize = 64;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for the in-process provider.
#[derive(Debug, Clone)]
pub struct EmbeddingProviderConfig {
    #[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
    pub model: EmbeddingModel,
    pub batch_size: usize,
    pub max_chars: usize,
    pub normalize: bool,
}

impl EmbeddingProviderConfig {
    pub fn from_env() -> Result<Self> {
        let mut batch_size = parse_usize_env("FASTEMBED_BATCH_SIZE", DEFAULT_FASTEMBED_BATCH_SIZE)?;
        if batch_size == 0 {
            batch_size = DEFAULT_FASTEMBED_BATCH_SIZE;
        }
        if batch_size > MAX_FASTEMBED_BATCH_SIZE {
            warn!(
                batch_size,
                max = MAX_FASTEMBED_BATCH_SIZE,
                "FASTEMBED_BATCH_SIZE exceeds max; clamping"
            );
            batch_size = MAX_FASTEMBED_BATCH_SIZE;
        }

        let mut max_chars = parse_usize_env("FASTEMBED_MAX_CHARS", DEFAULT_FASTEMBED_MAX_CHARS)?;
        if max_chars == 0 {
            max_chars = DEFAULT_FASTEMBED_MAX_CHARS;
        }

        let normalize = parse_bool_env("FASTEMBED_NORMALIZE", true)?;

        Ok(Self {
            #[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
            model: parse_model(
                &env::var("FASTEMBED_MODEL").unwrap_or_else(|_| DEFAULT_FASTEMBED_MODEL.to_string()),
            )?,
            batch_size,
            max_chars,
            normalize,
        })
    }

    pub fn has_env_overrides() -> bool {
        env::var_os("FASTEMBED_MODEL").is_some()
            || env::var_os("FASTEMBED_BATCH_SIZE").is_some()
            || env::var_os("FASTEMBED_MAX_CHARS").is_some()
            || env::var_os("FASTEMBED_NORMALIZE").is_some()
    }
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self {
            #[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
            model: EmbeddingModel::AllMiniLML6V2,
            batch_size: DEFAULT_FASTEMBED_BATCH_SIZE,
            max_chars: DEFAULT_FASTEMBED_MAX_CHARS,
            normalize: true,
        }
    }
}

/// FastEmbed provider using sentence-transformers/all-MiniLM-L6-v2.
#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
pub struct FastEmbedder {
    embedder: TextEmbedding,
    config: EmbeddingProviderConfig,
    model_id: String,
}

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
impl FastEmbedder {
    pub fn new(config: EmbeddingProviderConfig) -> Result<Self> {
        let model = config.model.clone();
        let model_id = model.to_string();
        let embedder = TextEmbedding::try_new(InitOptions::new(model))
            .map_err(|e| Error::Embedding(format!("failed to initialize fastembed model: {}", e)))?;

        Ok(Self {
            embedder,
            config,
            model_id,
        })
    }
}

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
impl EmbeddingProvider for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prepared = truncate_texts(texts, self.config.max_chars);
        let mut embeddings = self
            .embedder
            .embed(&prepared, Some(self.config.batch_size))
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if self.config.normalize {
            for embedding in embeddings.iter_mut() {
                l2_normalize(embedding);
            }
        }

        Ok(embeddings)
    }
}

/// Command provider that shells out to an external process.
pub struct CommandProvider {
    command: String,
    model: String,
    batch_size: usize,
    timeout: Duration,
}

impl CommandProvider {
    pub fn new(command: String, model: String, timeout: Duration) -> Self {
        Self {
            command,
            model,
            batch_size: DEFAULT_COMMAND_BATCH_SIZE,
            timeout,
        }
    }

    fn run_command(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let payload = serde_json::json!({
            "model": self.model,
            "texts": texts,
        })
        .to_string();

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::Embedding(format!("failed to spawn embedding command {}: {}", self.command, e))
            })?;

        // Pipes are drained on their own threads so a chatty child cannot block
        // on a full pipe while we wait for it.
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // A child that exits without reading closes the pipe; its exit
                // status is reported instead.
                let _ = stdin.write_all(payload.as_bytes());
            }
        });
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                warn!(command = %self.command, timeout = ?self.timeout, "embedding command timed out");
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::EmbeddingTimeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let _ = writer.join();
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(Error::Embedding(format!(
                "embedding command failed (status {}): {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        let vectors = parse_vectors(String::from_utf8_lossy(&stdout).trim())?;
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "embedding command returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        debug!(count = vectors.len(), "embedded texts with command provider");
        Ok(vectors)
    }
}

impl EmbeddingProvider for CommandProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run_command(texts)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Accepts a bare array of vectors or an object carrying one under
/// `embeddings`, `vectors` or `data`.
fn parse_vectors(output: &str) -> Result<Vec<Vec<f32>>> {
    let parsed: Value = serde_json::from_str(output)?;

    let embeddings_value = match parsed {
        Value::Array(arr) => Value::Array(arr),
        Value::Object(mut obj) => ["embeddings", "vectors", "data"]
            .iter()
            .find_map(|key| obj.remove(*key))
            .ok_or_else(|| {
                Error::Embedding("embedding command output missing 'embeddings' field".to_string())
            })?,
        _ => {
            return Err(Error::Embedding(
                "embedding command output must be a JSON array or object".to_string(),
            ))
        }
    };

    embeddings_value
        .as_array()
        .ok_or_else(|| Error::Embedding("embeddings output must be a JSON array".to_string()))?
        .iter()
        .map(|row| {
            row.as_array()
                .ok_or_else(|| Error::Embedding("embedding row must be an array".to_string()))?
                .iter()
                .map(|value| {
                    value
                        .as_f64()
                        .map(|v| v as f32)
                        .ok_or_else(|| Error::Embedding("embedding value must be a number".to_string()))
                })
                .collect::<Result<Vec<f32>>>()
        })
        .collect()
}

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
fn truncate_texts(texts: &[String], max_chars: usize) -> Vec<Cow<'_, str>> {
    texts
        .iter()
        .map(|text| truncate_to_chars(text.as_str(), max_chars))
        .collect()
}

fn truncate_to_chars(input: &str, max_chars: usize) -> Cow<'_, str> {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => Cow::Owned(input[..idx].to_string()),
        None => Cow::Borrowed(input),
    }
}

pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
pub(crate) fn parse_model(raw: &str) -> Result<EmbeddingModel> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(EmbeddingModel::AllMiniLML6V2);
    }

    match value.to_lowercase().as_str() {
        "minilm"
        | "all-minilm-l6-v2"
        | "allminilm-l6-v2"
        | "sentence-transformers/all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        other => Err(Error::InvalidConfig(format!(
            "unsupported embedding model '{}'; supported value: {}",
            other, DEFAULT_FASTEMBED_MODEL
        ))),
    }
}

fn parse_usize_env(name: &str, default: usize) -> Result<usize> {
    match env::var(name) {
        Ok(raw) => {
            let value = raw.trim();
            if value.is_empty() {
                Ok(default)
            } else {
                value
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidConfig(format!("invalid {} value: {}", name, value)))
            }
        }
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(Error::InvalidConfig(format!("failed to read {}: {}", name, err))),
    }
}

fn parse_bool_env(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => {
            let value = raw.trim().to_lowercase();
            if value.is_empty() {
                return Ok(default);
            }
            match value.as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                other => Err(Error::InvalidConfig(format!("invalid {} value: {}", name, other))),
            }
        }
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(Error::InvalidConfig(format!("failed to read {}: {}", name, err))),
    }
}
