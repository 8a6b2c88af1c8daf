//! # Edit Store Module
//!
//! Persistence for player block edits. Generated terrain is never stored: a
//! chunk is regenerated from the seed when it loads and its edits are replayed
//! on top, in the order they were made.
//!
//! Two stores are provided:
//! - [`MemoryEditStore`] keeps everything in a hash map (tests, throwaway worlds)
//! - [`JsonEditStore`] keeps one JSON file per edited chunk in a directory, with
//!   the most recently used chunk edit lists cached in memory

use std::{
    collections::HashMap,
    fs,
    io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use cgmath::Point3;
use lru::LruCache;
use serde::{Deserialize, Serialize};

use super::block::block_type::BlockType;

/// Number of chunk edit lists the JSON store keeps in memory.
const EDIT_CACHE_CAPACITY: usize = 256;

/// One block edit inside a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEdit {
    /// Block position inside the chunk
    pub local: [u8; 3],
    /// The block written there
    pub block: BlockType,
}

impl BlockEdit {
    /// Creates an edit from a local position.
    pub fn new(local: Point3<i32>, block: BlockType) -> Self {
        BlockEdit {
            local: [local.x as u8, local.y as u8, local.z as u8],
            block,
        }
    }

    /// The local position as a point.
    pub fn local_position(&self) -> Point3<i32> {
        Point3::new(self.local[0] as i32, self.local[1] as i32, self.local[2] as i32)
    }
}

/// Errors raised by an [`EditStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("edit store I/O failed for {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// A stored edit list could not be parsed or serialized.
    #[error("malformed edit file {path}: {source}")]
    Malformed {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Load/save interface for block edits, keyed by chunk coordinate.
pub trait EditStore {
    /// All edits of a chunk in the order they were made. Chunks never edited
    /// return an empty list.
    fn load_edits(&mut self, chunk_position: Point3<i32>) -> Result<Vec<BlockEdit>, StoreError>;

    /// Records one edit.
    fn save_edit(&mut self, chunk_position: Point3<i32>, edit: BlockEdit) -> Result<(), StoreError>;
}

/// Appends `edit`, dropping any earlier edit of the same cell since replay
/// would overwrite it anyway.
fn record_edit(edits: &mut Vec<BlockEdit>, edit: BlockEdit) {
    edits.retain(|existing| existing.local != edit.local);
    edits.push(edit);
}

/// An edit store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryEditStore {
    edits: HashMap<Point3<i32>, Vec<BlockEdit>>,
}

impl MemoryEditStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks with at least one edit.
    pub fn edited_chunk_count(&self) -> usize {
        self.edits.len()
    }
}

impl EditStore for MemoryEditStore {
    fn load_edits(&mut self, chunk_position: Point3<i32>) -> Result<Vec<BlockEdit>, StoreError> {
        Ok(self.edits.get(&chunk_position).cloned().unwrap_or_default())
    }

    fn save_edit(&mut self, chunk_position: Point3<i32>, edit: BlockEdit) -> Result<(), StoreError> {
        record_edit(self.edits.entry(chunk_position).or_default(), edit);
        Ok(())
    }
}

/// An edit store writing one JSON file per edited chunk.
pub struct JsonEditStore {
    directory: PathBuf,
    cache: LruCache<Point3<i32>, Vec<BlockEdit>>,
}

impl JsonEditStore {
    /// Opens (and creates if needed) a store in `directory`.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self, StoreError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|source| StoreError::Io {
            path: directory.clone(),
            source,
        })?;
        log::info!("Block edits stored in {}", directory.display());

        Ok(JsonEditStore {
            directory,
            cache: LruCache::new(
                NonZeroUsize::new(EDIT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ),
        })
    }

    /// Path of the file holding a chunk's edits.
    pub fn chunk_path(&self, chunk_position: Point3<i32>) -> PathBuf {
        self.directory.join(format!(
            "chunk_{}_{}_{}.json",
            chunk_position.x, chunk_position.y, chunk_position.z
        ))
    }

    fn read_chunk(&self, chunk_position: Point3<i32>) -> Result<Vec<BlockEdit>, StoreError> {
        let path = self.chunk_path(chunk_position);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed { path, source })
    }

    fn cached_edits(&mut self, chunk_position: Point3<i32>) -> Result<&mut Vec<BlockEdit>, StoreError> {
        if !self.cache.contains(&chunk_position) {
            let edits = self.read_chunk(chunk_position)?;
            self.cache.put(chunk_position, edits);
        }
        Ok(self.cache.get_or_insert_mut(chunk_position, Vec::new))
    }
}

impl EditStore for JsonEditStore {
    fn load_edits(&mut self, chunk_position: Point3<i32>) -> Result<Vec<BlockEdit>, StoreError> {
        self.cached_edits(chunk_position).map(|edits| edits.clone())
    }

    fn save_edit(&mut self, chunk_position: Point3<i32>, edit: BlockEdit) -> Result<(), StoreError> {
        let path = self.chunk_path(chunk_position);
        let edits = self.cached_edits(chunk_position)?;
        record_edit(edits, edit);

        let bytes = serde_json::to_vec_pretty(&*edits).map_err(|source| StoreError::Malformed {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, bytes).map_err(|source| StoreError::Io { path, source })
    }
}

/// Opens the store a world is configured with: a [`JsonEditStore`] in
/// `directory` when one is given, otherwise a [`MemoryEditStore`].
pub fn open_store(directory: Option<&Path>) -> Result<Box<dyn EditStore>, StoreError> {
    match directory {
        Some(directory) => Ok(Box::new(JsonEditStore::open(directory)?)),
        None => Ok(Box::new(MemoryEditStore::new())),
    }
}
