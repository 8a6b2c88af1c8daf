//! Task for building the face lists of a chunk on a worker thread.
//!
//! The task only ever takes read locks: it looks up the six neighbouring chunk
//! handles in the chunk map, reads their block arrays together with its own
//! chunk's, and returns the mesh. Storing the mesh, uploading it to the render
//! backend and marking the chunk baked happen in the result, on the main
//! thread, after the batch barrier.

use crate::{
    core::MtResource,
    engine_state::{
        rendering::meshing::{mesh_chunk, ChunkMesh, NeighborChunks},
        task_management::task::{Task, TaskContext, TaskResult},
        voxels::{block::block_side::BlockSide, chunk::Chunk, chunk_grid::ChunkMap},
    },
};

/// A task that meshes one chunk against its current neighbours.
pub struct ChunkMeshGenerationTask {
    /// Handle to the grid's chunk map, used to find the neighbours
    chunks: MtResource<ChunkMap>,
    /// The chunk that needs mesh generation
    chunk: MtResource<Chunk>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `chunks` - Handle to the chunk map the neighbours are looked up in
    /// * `chunk` - The chunk that needs mesh generation
    pub fn new(chunks: MtResource<ChunkMap>, chunk: MtResource<Chunk>) -> Self {
        ChunkMeshGenerationTask { chunks, chunk }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let position = self.chunk.get().position;

        let neighbor_handles: [Option<MtResource<Chunk>>; 6] = {
            let chunks = self.chunks.get();
            BlockSide::all().map(|side| chunks.get(&(position + side.normal())).cloned())
        };
        let neighbor_guards: Vec<_> = neighbor_handles
            .iter()
            .map(|handle| handle.as_ref().map(|handle| handle.get()))
            .collect();
        let neighbors: NeighborChunks = std::array::from_fn(|i| neighbor_guards[i].as_deref());

        let mesh = mesh_chunk(&self.chunk.get(), &neighbors);

        Box::new(ChunkMeshGenerationTaskResult {
            chunk: self.chunk.clone(),
            mesh,
        })
    }
}

/// The faces built by a [`ChunkMeshGenerationTask`].
pub struct ChunkMeshGenerationTaskResult {
    /// The meshed chunk
    chunk: MtResource<Chunk>,
    /// Its new face lists
    mesh: ChunkMesh,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    /// Stores the faces in the chunk, uploads them and marks the chunk baked.
    fn handle_result(self: Box<Self>, context: &mut TaskContext) {
        let ChunkMeshGenerationTaskResult { chunk, mesh } = *self;
        let mut chunk = chunk.get_mut();

        context.render_backend.upload_chunk(
            chunk.position,
            chunk.origin(),
            &mesh.opaque,
            &mesh.translucent,
        );
        chunk.set_mesh(mesh.opaque, mesh.translucent);
        chunk.mesh_baked = true;
    }
}
