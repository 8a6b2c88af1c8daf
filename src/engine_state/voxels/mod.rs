//! # Voxel World
//!
//! Block data, terrain generation and the chunk window around the player.
//!
//! ## Architecture
//!
//! * **Block**: Block types, faces and atlas tiles
//! * **Chunk**: Fixed-size cubes of blocks, their coordinates and face lists
//! * **Generation**: Deterministic terrain from a seed
//! * **Chunk grid**: The resident chunks and the per-tick unload/load/bake steps
//! * **Edit store**: Persistence of player edits, replayed after generation
//! * **Tasks**: Chunk generation on the worker pool
//!
//! ## Data Flow
//!
//! 1. The grid reserves placeholder chunks near the player
//! 2. Generation tasks fill them and the persisted edits are replayed
//! 3. Meshing tasks turn them into face lists for the render backend
//! 4. Edits write through the grid, invalidate meshes and reach the edit store

pub mod block;
pub mod chunk;
pub mod chunk_grid;
pub mod edit_store;
pub mod generation;
pub mod tasks;
