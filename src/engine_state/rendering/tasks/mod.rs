//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: Builds the face lists of a chunk on a worker thread

pub mod chunk_mesh_generation_task;
