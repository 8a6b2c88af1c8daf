//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which fills a freshly reserved
//! chunk with generated terrain on a worker thread. The chunk grid inserts the
//! placeholder chunk before publishing the task, so the task only needs the
//! chunk's own handle.

use std::sync::Arc;

use log::warn;

use crate::{
    core::MtResource,
    engine_state::{
        task_management::task::{Task, TaskContext, TaskResult},
        voxels::{chunk::Chunk, generation::WorldGenerator},
    },
};

/// A task that generates chunk data asynchronously.
///
/// This task is responsible for:
/// 1. Generating the blocks of the chunk at its position
/// 2. Writing them into the chunk's slot
/// 3. Replaying the chunk's persisted edits, from the result on the main thread
pub struct ChunkGenerationTask {
    /// The placeholder chunk to fill
    chunk: MtResource<Chunk>,
    /// The world generator shared by all generation tasks
    generator: Arc<WorldGenerator>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `chunk` - Handle to the reserved placeholder chunk
    /// * `generator` - The world generator
    pub fn new(chunk: MtResource<Chunk>, generator: Arc<WorldGenerator>) -> Self {
        ChunkGenerationTask { chunk, generator }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let position = self.chunk.get().position;
        // generate without holding the lock
        let blocks = self.generator.generate(position);
        self.chunk.get_mut().fill(blocks);

        Box::new(ChunkGenerationTaskResult {
            chunk: self.chunk.clone(),
        })
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    /// A thread-safe reference to the generated chunk
    chunk: MtResource<Chunk>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Replays the chunk's persisted block edits on top of the generated terrain.
    ///
    /// A store failure is logged and the chunk keeps its generated contents.
    fn handle_result(self: Box<Self>, context: &mut TaskContext) {
        let mut chunk = self.chunk.get_mut();
        let position = chunk.position;

        let edits = match context.edit_store.load_edits(position) {
            Ok(edits) => edits,
            Err(error) => {
                warn!("Could not load block edits of chunk {:?}: {}", position, error);
                return;
            }
        };

        for edit in &edits {
            let local = edit.local_position();
            if chunk.set_block(local.x, local.y, local.z, edit.block).is_none() {
                warn!("Ignoring out of range edit {:?} in chunk {:?}", edit, position);
            }
        }
        if !edits.is_empty() {
            log::debug!("Replayed {} edits into chunk {:?}", edits.len(), position);
        }
    }
}
