// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector store contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::filter::MetadataFilter;
use crate::chunk::ChunkRecord;
use crate::errors::{Error, Result};

/// Distance between a query vector and a stored vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`
    #[default]
    Cosine,
    /// Squared euclidean distance
    L2,
    /// `1 - a·b`
    Ip,
}

impl DistanceMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::L2 => "l2",
            DistanceMetric::Ip => "ip",
        }
    }

    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
            DistanceMetric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            DistanceMetric::Ip => 1.0 - dot(a, b),
        }
    }

    /// Converts a distance back into a similarity score.
    pub fn similarity(self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Cosine | DistanceMetric::Ip => 1.0 - distance,
            DistanceMetric::L2 => 1.0 / (1.0 + distance),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "l2" => Ok(DistanceMetric::L2),
            "ip" => Ok(DistanceMetric::Ip),
            other => Err(Error::InvalidConfig(format!(
                "unknown distance metric '{}' (expected cosine, l2 or ip)",
                other
            ))),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

/// A record written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

/// A nearest-neighbor candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub distance: f32,
}

/// Persistent vector collection.
///
/// Writes take `&mut self`; a backend applies each call atomically.
pub trait VectorStore: Send {
    fn metric(&self) -> DistanceMetric;

    /// Inserts new ids and overwrites existing ones.
    fn upsert(&mut self, records: &[VectorRecord]) -> Result<usize>;

    /// Up to `k` matches ordered by ascending distance.
    fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>>;

    fn delete(&mut self, filter: &MetadataFilter) -> Result<usize>;

    fn delete_ids(&mut self, ids: &[String]) -> Result<usize>;

    /// Records for the ids that exist, in the order requested.
    fn get(&self, ids: &[String]) -> Result<Vec<ChunkRecord>>;

    /// Records in insertion order.
    fn scan(&self, filter: Option<&MetadataFilter>, limit: Option<usize>)
        -> Result<Vec<ChunkRecord>>;

    fn count(&self) -> Result<usize>;

    fn reset(&mut self) -> Result<()>;
}
