// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding providers.
//!
//! The index and retrieval layers only see the [`EmbeddingProvider`] trait:
//! an opaque text to vector oracle. Providers are built once from the
//! `[embeddings]` configuration section via [`provider_from_config`].

pub mod hashing;
pub mod provider;

use std::time::Duration;

use crate::config::{EmbeddingConfig, EmbeddingProviderType};
use crate::errors::{Error, Result};

pub use hashing::HashingProvider;
pub use provider::{CommandProvider, EmbeddingProviderConfig};
#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
pub use provider::FastEmbedder;

/// Default embedding dimension for sentence-transformers/all-MiniLM-L6-v2.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Text to vector oracle.
pub trait EmbeddingProvider: Send {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Returns the batch size used by the provider.
    fn batch_size(&self) -> usize;

    /// Generates embeddings for the given texts, one vector per text.
    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generates an embedding for a single text.
    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut result = self.embed_texts(&[text.to_string()])?;
        result
            .pop()
            .ok_or_else(|| Error::Embedding("no embedding returned".to_string()))
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn batch_size(&self) -> usize {
        (**self).batch_size()
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_texts(texts)
    }
}

/// Builds the configured provider.
pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider() {
        EmbeddingProviderType::Hashing => Ok(Box::new(HashingProvider::new(config.dimension()))),
        EmbeddingProviderType::Command => Ok(Box::new(CommandProvider::new(
            config.command().to_string(),
            config.model().to_string(),
            Duration::from_secs(config.timeout_secs()),
        ))),
        EmbeddingProviderType::Builtin => builtin_provider(config),
    }
}

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
fn builtin_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let mut provider_config = if EmbeddingProviderConfig::has_env_overrides() {
        EmbeddingProviderConfig::from_env()?
    } else {
        EmbeddingProviderConfig::default()
    };
    if let Some(model) = config.model.as_deref() {
        provider_config.model = provider::parse_model(model)?;
    }
    Ok(Box::new(FastEmbedder::new(provider_config)?))
}

#[cfg(all(target_os = "macos", target_arch = "x86_64"))]
fn builtin_provider(_config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    Err(Error::Embedding(
        "the builtin provider is not available on this platform; use provider = \"command\" or \"hashing\"".to_string(),
    ))
}
