// SPDX-License-Identifier: MIT OR Apache-2.0

//! Codebase indexing.
//!
//! A producer thread chunks files in parallel on the global rayon pool and
//! sends them over a bounded channel to the calling thread, which groups
//! chunks into complete batches and hands each one to [`IndexStore::add`].
//! The consumer never waits on a rayon worker, so indexing also completes
//! when called from inside a single-threaded pool. Read and parse failures
//! are counted and reported; a store failure stops all further writes and is
//! returned once the workers have drained.

use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::scanner::FileScanner;
use crate::chunk::CodeChunk;
use crate::chunker::{CodeChunker, FileChunks};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::store::IndexStore;

/// Receives progress events from an indexing run.
///
/// All callbacks are made from the thread that started the run, in file
/// completion order.
pub trait IndexObserver: Sync {
    /// Called once with the number of files about to be processed.
    fn on_start(&self, _total_files: usize) {}

    fn on_file_processed(&self, _path: &str, _chunks: usize) {}

    fn on_error(&self, _path: &str, _error: &Error) {}

    fn on_batch_added(&self, _batch_index: usize, _size: usize) {}
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl IndexObserver for NullObserver {}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl IndexObserver for TracingObserver {
    fn on_start(&self, total_files: usize) {
        info!(files = total_files, "indexing started");
    }

    fn on_file_processed(&self, path: &str, chunks: usize) {
        debug!(file = path, chunks, "file processed");
    }

    fn on_error(&self, path: &str, error: &Error) {
        warn!(file = path, error = %error, "file failed");
    }

    fn on_batch_added(&self, batch_index: usize, size: usize) {
        debug!(batch = batch_index, size, "batch added");
    }
}

/// Counters for one indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexingStats {
    pub files_processed: usize,
    /// Files chunked with text windows
    pub files_fallback: usize,
    /// Files skipped as too large or binary
    pub files_skipped: usize,
    pub chunks_created: usize,
    pub chunks_rejected: usize,
    pub chunks_added: usize,
    /// Read failures plus parse failures
    pub errors: usize,
    pub duration_ms: u64,
}

impl IndexingStats {
    /// Adds the counters of another run.
    pub fn merge(&mut self, other: &IndexingStats) {
        self.files_processed += other.files_processed;
        self.files_fallback += other.files_fallback;
        self.files_skipped += other.files_skipped;
        self.chunks_created += other.chunks_created;
        self.chunks_rejected += other.chunks_rejected;
        self.chunks_added += other.chunks_added;
        self.errors += other.errors;
        self.duration_ms += other.duration_ms;
    }
}

enum ProcessedFile {
    Chunked { path: String, result: FileChunks },
    ReadError { path: String, error: Error },
}

/// Scans, chunks and stores a codebase.
pub struct IndexPipeline {
    chunker: CodeChunker,
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
    batch_size: Option<usize>,
}

impl IndexPipeline {
    pub fn new(chunker: CodeChunker) -> Self {
        Self {
            chunker,
            extensions: Vec::new(),
            exclude_dirs: Vec::new(),
            batch_size: None,
        }
    }

    /// Pipeline with the chunking and `[index]` settings of `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let chunker = CodeChunker::new(config.chunker_config()?)?;
        Ok(Self::new(chunker)
            .with_extensions(config.index().extensions())
            .with_exclude_dirs(config.index().exclude_dirs()))
    }

    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions.to_vec();
        self
    }

    pub fn with_exclude_dirs(mut self, dirs: &[String]) -> Self {
        self.exclude_dirs = dirs.to_vec();
        self
    }

    /// Overrides the store's batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size.max(1));
        self
    }

    pub fn chunker(&self) -> &CodeChunker {
        &self.chunker
    }

    /// Files under `root` that would be indexed.
    pub fn scan(&self, root: &Path) -> Vec<PathBuf> {
        FileScanner::new(root)
            .with_extensions(&self.extensions)
            .with_exclude_dirs(&self.exclude_dirs)
            .list_files()
    }

    /// Indexes every matching file under `root`.
    pub fn index_directory(
        &self,
        root: &Path,
        index: &mut IndexStore,
        observer: &dyn IndexObserver,
    ) -> Result<IndexingStats> {
        let files = self.scan(root);
        self.index_files(root, &files, index, observer)
    }

    /// Indexes the given files. Chunk file paths are recorded relative to
    /// `root` with `/` separators.
    pub fn index_files(
        &self,
        root: &Path,
        files: &[PathBuf],
        index: &mut IndexStore,
        observer: &dyn IndexObserver,
    ) -> Result<IndexingStats> {
        let started = Instant::now();
        let batch_size = self.batch_size.unwrap_or_else(|| index.batch_size());
        let mut stats = IndexingStats::default();
        let mut pending: Vec<CodeChunk> = Vec::new();
        let mut batch_index = 0usize;
        let mut store_error: Option<Error> = None;

        observer.on_start(files.len());

        let (tx, rx) = mpsc::sync_channel::<ProcessedFile>(64);
        let chunker = &self.chunker;

        std::thread::scope(|s| {
            s.spawn(move || {
                files.par_iter().for_each_with(tx, |tx, path| {
                    let full_path = if path.is_absolute() {
                        path.clone()
                    } else {
                        root.join(path)
                    };
                    let rel = relative_path(root, &full_path);
                    let message = match chunker.chunk_file_as(&full_path, &rel) {
                        Ok(result) => ProcessedFile::Chunked { path: rel, result },
                        Err(error) => ProcessedFile::ReadError { path: rel, error },
                    };
                    let _ = tx.send(message);
                });
            });

            for msg in rx {
                match msg {
                    ProcessedFile::Chunked { path, result } => {
                        if result.skipped {
                            stats.files_skipped += 1;
                            observer.on_file_processed(&path, 0);
                            continue;
                        }
                        stats.files_processed += 1;
                        stats.chunks_created += result.chunks.len();
                        stats.chunks_rejected += result.rejected;
                        if result.fallback {
                            stats.files_fallback += 1;
                        }
                        if let Some(error) = &result.parse_error {
                            stats.errors += 1;
                            observer.on_error(&path, error);
                        }
                        observer.on_file_processed(&path, result.chunks.len());

                        if store_error.is_some() {
                            continue;
                        }
                        pending.extend(result.chunks);
                        while pending.len() >= batch_size {
                            let batch: Vec<CodeChunk> = pending.drain(..batch_size).collect();
                            match add_batch(index, &batch, batch_index, observer) {
                                Ok(added) => {
                                    stats.chunks_added += added;
                                    batch_index += 1;
                                }
                                Err(e) => {
                                    store_error = Some(e);
                                    pending.clear();
                                    break;
                                }
                            }
                        }
                    }
                    ProcessedFile::ReadError { path, error } => {
                        stats.errors += 1;
                        warn!(file = %path, error = %error, "failed to read file");
                        observer.on_error(&path, &error);
                    }
                }
            }
        });

        if let Some(error) = store_error {
            return Err(error);
        }
        if !pending.is_empty() {
            stats.chunks_added += add_batch(index, &pending, batch_index, observer)?;
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            files = stats.files_processed,
            fallback = stats.files_fallback,
            skipped = stats.files_skipped,
            chunks = stats.chunks_added,
            rejected = stats.chunks_rejected,
            errors = stats.errors,
            elapsed_ms = stats.duration_ms,
            "indexing finished"
        );
        Ok(stats)
    }

    /// Replaces the stored chunks of one file: deletes everything recorded
    /// under its path, then indexes it again.
    pub fn reindex_file(
        &self,
        root: &Path,
        path: &Path,
        index: &mut IndexStore,
        observer: &dyn IndexObserver,
    ) -> Result<IndexingStats> {
        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        let rel = relative_path(root, &full_path);
        let removed = index.delete_by_file(&rel)?;
        debug!(file = %rel, removed, "removed stale chunks");
        self.index_files(root, &[full_path], index, observer)
    }
}

fn add_batch(
    index: &mut IndexStore,
    batch: &[CodeChunk],
    batch_index: usize,
    observer: &dyn IndexObserver,
) -> Result<usize> {
    let added = index.add(batch, batch.len())?;
    observer.on_batch_added(batch_index, batch.len());
    Ok(added)
}

/// `path` relative to `root`, `/`-separated; the full path when outside `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkerConfig;
    use crate::embedding::HashingProvider;
    use crate::store::{DistanceMetric, MetadataFilter, SqliteVectorStore};
    use std::fs;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn memory_index(batch_size: usize) -> IndexStore {
        let store = SqliteVectorStore::open_in_memory("test", DistanceMetric::Cosine).unwrap();
        IndexStore::new(Box::new(store), Box::new(HashingProvider::new(256)), "test", batch_size)
    }

    fn pipeline() -> IndexPipeline {
        IndexPipeline::new(CodeChunker::new(ChunkerConfig::default()).unwrap())
    }

    #[derive(Default)]
    struct Recorder {
        files: Mutex<Vec<(String, usize)>>,
        errors: Mutex<Vec<String>>,
        batches: Mutex<Vec<(usize, usize)>>,
    }

    impl IndexObserver for Recorder {
        fn on_file_processed(&self, path: &str, chunks: usize) {
            self.files.lock().unwrap().push((path.to_string(), chunks));
        }

        fn on_error(&self, path: &str, _error: &Error) {
            self.errors.lock().unwrap().push(path.to_string());
        }

        fn on_batch_added(&self, batch_index: usize, size: usize) {
            self.batches.lock().unwrap().push((batch_index, size));
        }
    }

    const FUNCTIONS: &str = "def first(values):\n    return [v * 2 for v in values if v]\n\n\
def second(values):\n    return sorted(values, key=lambda v: -v)\n\n\
def third(values):\n    return {v: str(v) for v in values}\n";

    #[test]
    fn test_index_directory_batches_and_reports() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/funcs.py"), FUNCTIONS).unwrap();

        let mut index = memory_index(2);
        let recorder = Recorder::default();
        let stats = pipeline()
            .index_directory(dir.path(), &mut index, &recorder)
            .unwrap();

        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.chunks_created, 3);
        assert_eq!(stats.chunks_added, 3);
        assert_eq!(stats.errors, 0);
        assert_eq!(index.count().unwrap(), 3);
        assert_eq!(*recorder.files.lock().unwrap(), vec![("pkg/funcs.py".to_string(), 3)]);
        assert_eq!(*recorder.batches.lock().unwrap(), vec![(0, 2), (1, 1)]);

        let stored = index
            .delete_by_filter(&MetadataFilter::by_file("pkg/funcs.py"))
            .unwrap();
        assert_eq!(stored, 3);
    }

    #[test]
    fn test_parse_failure_counts_as_error_and_falls_back() {
        let dir = TempDir::new().unwrap();
        let broken = format!("def broken(:\n{}\n", "    value = compute() + other()\n".repeat(3));
        fs::write(dir.path().join("broken.py"), broken).unwrap();

        let mut index = memory_index(100);
        let recorder = Recorder::default();
        let stats = pipeline()
            .index_directory(dir.path(), &mut index, &recorder)
            .unwrap();

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.files_fallback, 1);
        assert_eq!(*recorder.errors.lock().unwrap(), vec!["broken.py".to_string()]);
        assert_eq!(index.count().unwrap(), stats.chunks_added);
    }

    #[test]
    fn test_missing_file_is_reported_and_run_continues() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("funcs.py"), FUNCTIONS).unwrap();

        let files = vec![PathBuf::from("missing.py"), PathBuf::from("funcs.py")];
        let mut index = memory_index(100);
        let recorder = Recorder::default();
        let stats = pipeline()
            .index_files(dir.path(), &files, &mut index, &recorder)
            .unwrap();

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.chunks_added, 3);
        assert_eq!(*recorder.errors.lock().unwrap(), vec!["missing.py".to_string()]);
    }

    #[test]
    fn test_reindex_file_replaces_stale_chunks() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("funcs.py");
        fs::write(&file, FUNCTIONS).unwrap();

        let pipeline = pipeline();
        let mut index = memory_index(100);
        pipeline
            .index_directory(dir.path(), &mut index, &NullObserver)
            .unwrap();
        assert_eq!(index.count().unwrap(), 3);

        let shifted = format!("# header comment\n{}", FUNCTIONS);
        fs::write(&file, shifted).unwrap();
        pipeline
            .reindex_file(dir.path(), &file, &mut index, &NullObserver)
            .unwrap();
        assert_eq!(index.count().unwrap(), 3);
    }

    #[test]
    fn test_index_completes_inside_single_thread_pool() {
        let dir = TempDir::new().unwrap();
        for i in 0..4 {
            fs::write(dir.path().join(format!("funcs_{i}.py")), FUNCTIONS).unwrap();
        }

        let (done_tx, done_rx) = mpsc::channel();
        let root = dir.path().to_path_buf();
        thread::spawn(move || {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
            let mut index = memory_index(2);
            let stats = pool.install(|| pipeline().index_directory(&root, &mut index, &NullObserver));
            let _ = done_tx.send(stats.map(|s| s.chunks_added));
        });

        let added = done_rx
            .recv_timeout(Duration::from_secs(30))
            .expect("indexing stalled inside a one-thread pool")
            .unwrap();
        assert_eq!(added, 12);
    }

    #[test]
    fn test_reindex_file_logs_relative_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        let file = dir.path().join("pkg/funcs.py");
        fs::write(&file, FUNCTIONS).unwrap();

        let mut index = memory_index(100);
        let stats = pipeline()
            .reindex_file(dir.path(), Path::new("pkg/funcs.py"), &mut index, &NullObserver)
            .unwrap();
        assert_eq!(stats.chunks_added, 3);
        assert_eq!(index.delete_by_file("pkg/funcs.py").unwrap(), 3);
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/repo");
        assert_eq!(relative_path(root, Path::new("/repo/src/a.py")), "src/a.py");
        assert_eq!(relative_path(root, Path::new("/other/b.py")), "/other/b.py");
    }
}
