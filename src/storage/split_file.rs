//! Time series split into fixed-length chunk files.
//!
//! Layout: `<directory>/<variable>/chunk_<n>.bin`, each file holding
//! `n_locations × n_time_per_file` little-endian `f32` values, location-major.
//! Chunk `n` covers the absolute native steps `[n * len, (n + 1) * len)`,
//! where the step of an instant is `seconds div dt`.

use lru::LruCache;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::TimeSeriesStore;
use crate::error::{PointcastError, Result};
use crate::time::TimeRange;

/// Cache key for chunks: (variable, chunk index)
type ChunkKey = (String, i64);

/// Chunk keys waiting for the prefetch worker
const PREFETCH_QUEUE: usize = 64;

/// Chunk geometry
#[derive(Debug, Clone)]
struct Layout {
    directory: PathBuf,
    n_locations: usize,
    n_time_per_file: usize,
}

impl Layout {
    fn chunk_path(&self, variable: &str, chunk: i64) -> PathBuf {
        self.directory
            .join(variable)
            .join(format!("chunk_{}.bin", chunk))
    }

    fn chunk_len(&self) -> usize {
        self.n_locations * self.n_time_per_file
    }

    /// Load a chunk from disk. `None` if the file does not exist.
    fn load_chunk(&self, variable: &str, chunk: i64) -> Result<Option<Vec<f32>>> {
        let path = self.chunk_path(variable, chunk);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PointcastError::Storage {
                    message: format!("Failed to read {}: {}", path.display(), e),
                })
            }
        };
        if bytes.len() != self.chunk_len() * 4 {
            return Err(PointcastError::DataIntegrity {
                message: format!(
                    "{} has {} bytes, expected {}",
                    path.display(),
                    bytes.len(),
                    self.chunk_len() * 4
                ),
            });
        }
        Ok(Some(
            bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        ))
    }
}

/// State shared between the store and its prefetch worker
struct Shared {
    layout: Layout,
    cache: Mutex<LruCache<ChunkKey, Arc<Vec<f32>>>>,
    /// Keys queued for or being loaded by the worker
    loading: Mutex<HashSet<ChunkKey>>,
    loaded: Condvar,
    loads: AtomicU64,
}

impl Shared {
    fn load(&self, variable: &str, chunk: i64) -> Result<Option<Vec<f32>>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.layout.load_chunk(variable, chunk)
    }

    /// Block until the worker is done with `key`
    fn wait_for_prefetch(&self, key: &ChunkKey) {
        let mut loading = self.loading.lock();
        while loading.contains(key) {
            self.loaded.wait(&mut loading);
        }
    }

    fn finish(&self, key: &ChunkKey) {
        self.loading.lock().remove(key);
        self.loaded.notify_all();
    }
}

/// Prefetch worker loop. Ends when the store drops its sender.
fn run_prefetch(shared: Arc<Shared>, keys: Receiver<ChunkKey>) {
    for key in keys {
        let start = Instant::now();
        if !shared.cache.lock().contains(&key) {
            match shared.load(&key.0, key.1) {
                Ok(Some(values)) => {
                    shared.cache.lock().put(key.clone(), Arc::new(values));
                }
                Ok(None) => {}
                Err(e) => warn!(
                    variable = %key.0,
                    chunk = key.1,
                    error = %e,
                    "Prefetch failed"
                ),
            }
        }
        shared.finish(&key);
        debug!(
            variable = %key.0,
            chunk = key.1,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Prefetch finished"
        );
    }
}

/// Store reading chunk files from one domain directory.
///
/// Loaded chunks are kept in an LRU cache. One background worker per store
/// serves `will_need` hints; a read of a chunk the worker is loading waits
/// for it instead of reading the file again.
pub struct SplitFileStore {
    shared: Arc<Shared>,
    dt_seconds: i64,
    prefetch: Option<SyncSender<ChunkKey>>,
}

impl std::fmt::Debug for SplitFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitFileStore")
            .field("layout", &self.shared.layout)
            .field("dt_seconds", &self.dt_seconds)
            .field("cache_chunks", &self.shared.cache.lock().cap())
            .finish_non_exhaustive()
    }
}

impl SplitFileStore {
    pub fn new(
        directory: impl Into<PathBuf>,
        n_locations: usize,
        n_time_per_file: usize,
        dt_seconds: i64,
        cache_chunks: usize,
    ) -> Result<Self> {
        if n_locations == 0 || n_time_per_file == 0 || dt_seconds <= 0 {
            return Err(PointcastError::Config {
                message: format!(
                    "Invalid chunk layout: {} locations, {} steps per file, {}s step",
                    n_locations, n_time_per_file, dt_seconds
                ),
            });
        }
        let capacity = NonZeroUsize::new(cache_chunks).ok_or_else(|| PointcastError::Config {
            message: "Chunk cache must hold at least one chunk".to_string(),
        })?;

        let shared = Arc::new(Shared {
            layout: Layout {
                directory: directory.into(),
                n_locations,
                n_time_per_file,
            },
            cache: Mutex::new(LruCache::new(capacity)),
            loading: Mutex::new(HashSet::new()),
            loaded: Condvar::new(),
            loads: AtomicU64::new(0),
        });

        let (sender, receiver) = sync_channel(PREFETCH_QUEUE);
        let worker_state = Arc::clone(&shared);
        let prefetch = match std::thread::Builder::new()
            .name("pointcast-prefetch".to_string())
            .spawn(move || run_prefetch(worker_state, receiver))
        {
            Ok(_) => Some(sender),
            Err(e) => {
                warn!(error = %e, "Could not start prefetch worker, hints are ignored");
                None
            }
        };
        info!(
            directory = %shared.layout.directory.display(),
            cache_chunks = cache_chunks,
            "Chunk store ready"
        );

        Ok(Self {
            shared,
            dt_seconds,
            prefetch,
        })
    }

    /// Chunk files read from disk so far, by reads and prefetches together
    pub fn chunk_loads(&self) -> u64 {
        self.shared.loads.load(Ordering::Relaxed)
    }

    /// Chunk index and offset within the chunk of an absolute native step
    fn split_step(&self, step: i64) -> (i64, usize) {
        let len = self.shared.layout.n_time_per_file as i64;
        (step.div_euclid(len), step.rem_euclid(len) as usize)
    }

    /// Chunks touched by a time range
    fn chunks_for(&self, time: &TimeRange) -> Vec<i64> {
        let mut chunks: Vec<i64> = time
            .iter()
            .map(|t| self.split_step(t.seconds().div_euclid(self.dt_seconds)).0)
            .collect();
        chunks.dedup();
        chunks
    }

    fn chunk(&self, variable: &str, chunk: i64) -> Result<Option<Arc<Vec<f32>>>> {
        let key = (variable.to_string(), chunk);
        self.shared.wait_for_prefetch(&key);
        if let Some(cached) = self.shared.cache.lock().get(&key) {
            return Ok(Some(Arc::clone(cached)));
        }
        debug!(variable = variable, chunk = chunk, "Chunk cache miss");
        let Some(values) = self.shared.load(variable, chunk)? else {
            return Ok(None);
        };
        let values = Arc::new(values);
        self.shared.cache.lock().put(key, Arc::clone(&values));
        Ok(Some(values))
    }

    /// Write one chunk, `n_locations × n_time_per_file` values location-major
    pub fn write_chunk(&self, variable: &str, chunk: i64, values: &[f32]) -> Result<()> {
        let layout = &self.shared.layout;
        if values.len() != layout.chunk_len() {
            return Err(PointcastError::DataIntegrity {
                message: format!(
                    "Chunk for {} needs {} values, got {}",
                    variable,
                    layout.chunk_len(),
                    values.len()
                ),
            });
        }
        let path = layout.chunk_path(variable, chunk);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let tmp = path.with_extension("bin.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;

        let key = (variable.to_string(), chunk);
        self.shared.wait_for_prefetch(&key);
        self.shared.cache.lock().pop(&key);
        Ok(())
    }
}

impl TimeSeriesStore for SplitFileStore {
    fn read(&self, variable: &str, location: usize, time: &TimeRange) -> Result<Vec<f32>> {
        let layout = &self.shared.layout;
        if location >= layout.n_locations {
            return Err(PointcastError::Storage {
                message: format!(
                    "Location {} out of range ({} locations)",
                    location, layout.n_locations
                ),
            });
        }
        if time.dt_seconds() != self.dt_seconds {
            return Err(PointcastError::Storage {
                message: format!(
                    "Store holds {}s steps, cannot read at {}s",
                    self.dt_seconds,
                    time.dt_seconds()
                ),
            });
        }

        let mut values = Vec::with_capacity(time.len());
        let mut current: Option<(i64, Option<Arc<Vec<f32>>>)> = None;
        for t in time {
            let (chunk, offset) = self.split_step(t.seconds().div_euclid(self.dt_seconds));
            if !matches!(&current, Some((loaded, _)) if *loaded == chunk) {
                current = Some((chunk, self.chunk(variable, chunk)?));
            }
            values.push(match current.as_ref().and_then(|(_, data)| data.as_ref()) {
                Some(data) => data[location * layout.n_time_per_file + offset],
                None => f32::NAN,
            });
        }
        Ok(values)
    }

    fn will_need(&self, variable: &str, _location: usize, time: &TimeRange) {
        let Some(sender) = &self.prefetch else {
            return;
        };
        for chunk in self.chunks_for(time) {
            let key = (variable.to_string(), chunk);
            if self.shared.cache.lock().contains(&key) {
                continue;
            }
            if !self.shared.loading.lock().insert(key.clone()) {
                continue;
            }
            if let Err(e) = sender.try_send(key.clone()) {
                let reason = match e {
                    TrySendError::Full(_) => "queue full",
                    TrySendError::Disconnected(_) => "worker stopped",
                };
                self.shared.finish(&key);
                debug!(variable = variable, chunk = chunk, reason = reason, "Prefetch hint dropped");
            }
        }
    }
}
