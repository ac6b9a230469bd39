// SPDX-License-Identifier: MIT OR Apache-2.0

//! Codebase scanning and indexing.

pub mod pipeline;
pub mod scanner;

pub use pipeline::{
    relative_path, IndexObserver, IndexPipeline, IndexingStats, NullObserver, TracingObserver,
};
pub use scanner::FileScanner;
