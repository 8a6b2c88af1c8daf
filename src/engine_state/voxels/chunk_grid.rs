//! # Chunk Grid Module
//!
//! This module provides the `ChunkGrid`, which owns every resident chunk and
//! keeps a window of chunks loaded and baked around a moving viewpoint.
//!
//! ## Per-tick Pipeline
//!
//! Each tick the engine runs, in order:
//! 1. [`ChunkGrid::unload`]: evicts far chunks and refreshes `in_render`
//! 2. [`ChunkGrid::load`]: reserves and generates the nearest missing chunks
//! 3. [`ChunkGrid::bake`]: meshes the nearest unbaked chunks and uploads them
//!
//! Every step works within its per-tick budget, so a big viewpoint jump is
//! caught up over several ticks instead of stalling one.
//!
//! ## Concurrency
//!
//! Generation and meshing run on the worker pool. Each step reserves all the
//! map slots it needs synchronously, publishes one task per chunk with a cloned
//! chunk handle, and then waits for the whole batch before touching the map
//! again. Workers therefore never observe the map being resized, and by the
//! time `bake` runs every chunk loaded this tick is generated and has had its
//! edits replayed.

use std::{collections::HashMap, sync::Arc};

use cgmath::{Point3, Vector3};
use log::debug;

use crate::{
    core::MtResource,
    engine_state::{
        rendering::{tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask, RenderBackend},
        task_management::{task::TaskContext, TaskManager},
    },
};

use super::{
    block::{block_side::BlockSide, block_type::BlockType},
    chunk::{
        coordinates::{chebyshev_distance, squared_distance, world_to_chunk_coord, world_to_local},
        Chunk, CHUNK_DIMENSION,
    },
    edit_store::EditStore,
    generation::WorldGenerator,
    tasks::chunk_generation_task::ChunkGenerationTask,
};

/// Resident chunks keyed by chunk coordinate.
pub type ChunkMap = HashMap<Point3<i32>, MtResource<Chunk>>;

/// Distances and budgets the grid works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSettings {
    /// Chunks with every axis distance below this are drawn
    pub render_distance: i32,
    /// Chunks further than this (largest axis distance) are evicted
    pub load_distance: i32,
    /// Most chunks reserved per tick
    pub load_budget: usize,
    /// Most chunks evicted per tick
    pub unload_budget: usize,
    /// Most chunks meshed per tick
    pub bake_budget: usize,
    /// Number of chunk layers; valid chunk y coordinates are `0..world_height_chunks`
    pub world_height_chunks: i32,
}

impl Default for GridSettings {
    fn default() -> Self {
        GridSettings {
            render_distance: 4,
            load_distance: 5,
            load_budget: 16,
            unload_budget: 32,
            bake_budget: 8,
            world_height_chunks: 4,
        }
    }
}

/// Represents the loaded part of the voxel world.
pub struct ChunkGrid {
    /// A mapping from chunk coordinates to chunk data.
    chunks: MtResource<ChunkMap>,
    settings: GridSettings,
    generator: Arc<WorldGenerator>,
    task_manager: TaskManager,
}

impl ChunkGrid {
    /// Creates an empty grid.
    ///
    /// # Arguments
    /// * `settings` - Distances and budgets, assumed already validated
    /// * `generator` - Generator for new chunks
    /// * `worker_threads` - Size of the worker pool
    pub fn new(settings: GridSettings, generator: WorldGenerator, worker_threads: usize) -> Self {
        ChunkGrid {
            chunks: MtResource::new(HashMap::new()),
            settings,
            generator: Arc::new(generator),
            task_manager: TaskManager::new(worker_threads),
        }
    }

    /// The grid's settings.
    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    /// The world generator.
    pub fn generator(&self) -> &WorldGenerator {
        &self.generator
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.get().len()
    }

    /// Whether no chunk is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinates of every resident chunk, in no particular order.
    pub fn chunk_positions(&self) -> Vec<Point3<i32>> {
        self.chunks.get().keys().copied().collect()
    }

    /// Retrieves the chunk at the specified chunk coordinates.
    ///
    /// # Returns
    /// A clone of the chunk's handle, or `None` if it is not resident. A resident
    /// chunk may still be an ungenerated placeholder.
    pub fn chunk_at(&self, chunk_position: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.get().get(&chunk_position).cloned()
    }

    /// Inserts an already built chunk, replacing any chunk at its position.
    pub fn insert_chunk(&mut self, chunk: Chunk) -> MtResource<Chunk> {
        let position = chunk.position;
        let handle = MtResource::new(chunk);
        self.chunks.get_mut().insert(position, handle.clone());
        handle
    }

    /// Whether a chunk layer exists in the world.
    pub fn in_vertical_bounds(&self, chunk_y: i32) -> bool {
        (0..self.settings.world_height_chunks).contains(&chunk_y)
    }

    /// Height of the world in blocks. Valid block y coordinates are `0..height`.
    pub fn world_height_blocks(&self) -> i32 {
        self.settings.world_height_chunks * CHUNK_DIMENSION
    }

    /// Looks up a world block.
    ///
    /// # Returns
    /// `None` if the owning chunk is not resident; [`BlockType::INVALID`] if it
    /// is resident but not generated yet.
    pub fn block_at(&self, world: Point3<i32>) -> Option<BlockType> {
        let chunk = self.chunk_at(world_to_chunk_coord(world))?;
        let local = world_to_local(world);
        let block_type = chunk.get().get_block(local.x, local.y, local.z);
        Some(block_type)
    }

    /// Writes a world block and invalidates the meshes it affects: the owning
    /// chunk's, and each resident neighbour's whose face the block touches.
    ///
    /// # Returns
    /// The previous block, or `None` (and nothing written) if the owning chunk
    /// is not resident or not generated.
    pub fn set_block(&self, world: Point3<i32>, block_type: BlockType) -> Option<BlockType> {
        let chunk_position = world_to_chunk_coord(world);
        let local = world_to_local(world);
        let chunk = self.chunk_at(chunk_position)?;

        let previous = {
            let mut chunk = chunk.get_mut();
            if !chunk.generated {
                return None;
            }
            let previous = chunk.set_block(local.x, local.y, local.z, block_type)?;
            chunk.invalidate_mesh();
            previous
        };

        for side in BlockSide::all() {
            let offset = side.normal();
            let neighbor_local = local + offset;
            if Chunk::contains_local(neighbor_local.x, neighbor_local.y, neighbor_local.z) {
                continue;
            }
            if let Some(neighbor) = self.chunk_at(chunk_position + offset) {
                neighbor.get_mut().invalidate_mesh();
            }
        }

        Some(previous)
    }

    /// Whether every chunk overlapping the world block box `min..=max` that lies
    /// inside the world's vertical bounds is resident and generated.
    pub fn is_region_ready(&self, min: Point3<i32>, max: Point3<i32>) -> bool {
        let min_chunk = world_to_chunk_coord(min);
        let max_chunk = world_to_chunk_coord(max);
        let chunks = self.chunks.get();

        for y in min_chunk.y.max(0)..=max_chunk.y.min(self.settings.world_height_chunks - 1) {
            for z in min_chunk.z..=max_chunk.z {
                for x in min_chunk.x..=max_chunk.x {
                    match chunks.get(&Point3::new(x, y, z)) {
                        Some(chunk) if chunk.get().generated => {}
                        _ => return false,
                    }
                }
            }
        }
        true
    }

    /// Chunk coordinates within `radius` (largest axis distance) of `center`
    /// inside the vertical bounds, nearest first. Ties keep enumeration order.
    fn nearest_first(&self, center: Point3<i32>, radius: i32) -> Vec<Point3<i32>> {
        let mut positions = Vec::new();
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                for dz in -radius..=radius {
                    let position = center + Vector3::new(dx, dy, dz);
                    if self.in_vertical_bounds(position.y) {
                        positions.push(position);
                    }
                }
            }
        }
        positions.sort_by_key(|position| squared_distance(*position, center));
        positions
    }

    /// Evicts chunks far from the viewpoint and refreshes `in_render`.
    ///
    /// Every resident chunk gets `in_render` set to whether all three axis
    /// distances to `viewpoint` are below the render distance. Chunks outside
    /// the render window whose largest axis distance exceeds the load distance
    /// are evicted, farthest first, at most `unload_budget` of them, and their
    /// buffers are released from `render_backend`.
    ///
    /// # Returns
    /// The number of evicted chunks.
    pub fn unload(&mut self, viewpoint: Point3<i32>, render_backend: &mut dyn RenderBackend) -> usize {
        let render_distance = self.settings.render_distance;
        let mut candidates = Vec::new();

        for (position, chunk) in self.chunks.get().iter() {
            let offset = *position - viewpoint;
            let in_render = offset.x.abs() < render_distance
                && offset.y.abs() < render_distance
                && offset.z.abs() < render_distance;
            chunk.get_mut().in_render = in_render;

            let distance = chebyshev_distance(*position, viewpoint);
            if !in_render && distance > self.settings.load_distance {
                candidates.push((distance, *position));
            }
        }

        candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| (a.1.x, a.1.y, a.1.z).cmp(&(b.1.x, b.1.y, b.1.z))));
        candidates.truncate(self.settings.unload_budget);

        {
            let mut chunks = self.chunks.get_mut();
            for (_, position) in &candidates {
                chunks.remove(position);
                render_backend.release_chunk(*position);
            }
        }

        if !candidates.is_empty() {
            debug!("Unloaded {} chunks", candidates.len());
        }
        candidates.len()
    }

    /// Reserves and generates the nearest missing chunks around `viewpoint`.
    ///
    /// Up to `load_budget` missing coordinates within the load distance are
    /// reserved as placeholders before any task is published. The call returns
    /// once every generation task has finished and the chunks' persisted edits
    /// have been replayed.
    ///
    /// # Returns
    /// The number of chunks loaded.
    pub fn load(
        &mut self,
        viewpoint: Point3<i32>,
        edit_store: &mut dyn EditStore,
        render_backend: &mut dyn RenderBackend,
    ) -> usize {
        let new_positions: Vec<Point3<i32>> = {
            let chunks = self.chunks.get();
            self.nearest_first(viewpoint, self.settings.load_distance)
                .into_iter()
                .filter(|position| !chunks.contains_key(position))
                .take(self.settings.load_budget)
                .collect()
        };
        if new_positions.is_empty() {
            return 0;
        }

        let handles: Vec<MtResource<Chunk>> = {
            let mut chunks = self.chunks.get_mut();
            chunks.reserve(new_positions.len());
            new_positions
                .iter()
                .map(|position| {
                    let handle = MtResource::new(Chunk::new(*position));
                    chunks.insert(*position, handle.clone());
                    handle
                })
                .collect()
        };

        for handle in handles {
            self.task_manager.publish_task(Box::new(ChunkGenerationTask::new(
                handle,
                self.generator.clone(),
            )));
        }

        let mut context = TaskContext {
            edit_store,
            render_backend,
        };
        let loaded = self.task_manager.complete_batch(&mut context);
        debug!("Loaded {} chunks", loaded);
        loaded
    }

    /// Meshes and uploads the nearest unbaked chunks around `viewpoint`.
    ///
    /// Up to `bake_budget` resident, generated chunks inside the render window
    /// that are not baked yet are meshed on the worker pool. Once the batch is
    /// done each chunk's faces are uploaded to `render_backend` and the chunk
    /// is marked baked. Only the chunks of this batch are touched.
    ///
    /// # Returns
    /// The number of chunks baked.
    pub fn bake(
        &mut self,
        viewpoint: Point3<i32>,
        edit_store: &mut dyn EditStore,
        render_backend: &mut dyn RenderBackend,
    ) -> usize {
        let batch: Vec<MtResource<Chunk>> = {
            let chunks = self.chunks.get();
            self.nearest_first(viewpoint, self.settings.render_distance - 1)
                .into_iter()
                .filter_map(|position| chunks.get(&position).cloned())
                .filter(|chunk| {
                    let chunk = chunk.get();
                    chunk.generated && !chunk.mesh_baked
                })
                .take(self.settings.bake_budget)
                .collect()
        };
        if batch.is_empty() {
            return 0;
        }

        for chunk in batch {
            self.task_manager.publish_task(Box::new(ChunkMeshGenerationTask::new(
                self.chunks.clone(),
                chunk,
            )));
        }

        let mut context = TaskContext {
            edit_store,
            render_backend,
        };
        let baked = self.task_manager.complete_batch(&mut context);
        debug!("Baked {} chunks", baked);
        baked
    }
}
