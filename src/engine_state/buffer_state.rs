//! # Buffer State Module
//!
//! This module provides the in-process render backend: it receives the packed
//! face buffers of every baked chunk, keeps them per chunk and per pass, and
//! turns them into an ordered list of draw commands each frame.
//!
//! ## Key Features
//!
//! * One face buffer per chunk and render pass, replaced wholesale on re-bake
//! * Buffer usage analytics and memory tracking
//! * Frame planning: all opaque draws first, then translucent draws with
//!   back-face culling disabled
//!
//! ## Architecture
//!
//! `BufferState` implements [`RenderBackend`], the interface the chunk grid
//! bakes into. A GPU backend would upload the same bytes (`FaceRecord` words,
//! one per instance) and issue the same draws; this one keeps them in memory,
//! which is also what the engine's tests inspect.

use std::collections::HashMap;

use bytemuck::NoUninit;
use cgmath::Point3;

use super::rendering::{meshing::FaceRecord, RenderBackend};

/// Analytics data for a face buffer
///
/// Tracks memory allocation, usage, and write operations for a buffer
/// to help identify optimization opportunities.
#[derive(Debug, Default, Clone, Copy)]
struct BufferAnalytics {
    /// Largest size the buffer has had, in bytes
    pub allocated_memory: u64,
    /// Bytes of the current contents
    pub used_memory: u64,
    /// Number of times the buffer has been written to
    pub times_written: u64,
}

/// The two draw passes of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Opaque geometry, back faces culled
    Opaque,
    /// Translucent geometry, drawn after all opaque geometry
    Translucent,
}

/// Face buffer of one chunk for one pass.
#[derive(Debug, Clone)]
pub struct ChunkBuffer {
    /// World block position of the chunk's minimum corner
    pub origin: Point3<i32>,
    /// Packed faces, one instance each
    pub faces: Vec<FaceRecord>,
}

impl ChunkBuffer {
    /// The buffer contents as uploaded bytes.
    pub fn bytes(&self) -> &[u8] {
        self.faces.as_bytes()
    }
}

/// One instanced draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    /// Chunk being drawn
    pub chunk_position: Point3<i32>,
    /// Offset added to every face position
    pub origin: Point3<i32>,
    /// Pass the draw belongs to
    pub pass: RenderPass,
    /// Number of faces drawn
    pub instance_count: u32,
    /// Whether back faces are culled
    pub cull_back_faces: bool,
}

/// Central store of chunk face buffers.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_world::engine_state::buffer_state::BufferState;
/// use voxel_world::engine_state::rendering::RenderBackend;
///
/// let mut buffer_state = BufferState::new();
/// buffer_state.upload_chunk(Point3::new(0, 0, 0), Point3::new(0, 0, 0), &[], &[]);
/// assert_eq!(buffer_state.chunk_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct BufferState {
    buffers: HashMap<(Point3<i32>, RenderPass), ChunkBuffer>,
    buffer_analytics: HashMap<(Point3<i32>, RenderPass), BufferAnalytics>,
}

impl BufferState {
    /// Creates an empty buffer store.
    pub fn new() -> Self {
        Self::default()
    }

    fn write_buffer(
        &mut self,
        chunk_position: Point3<i32>,
        pass: RenderPass,
        origin: Point3<i32>,
        faces: &[FaceRecord],
    ) {
        let data_size = faces.as_bytes().len() as u64;
        let analytics = self
            .buffer_analytics
            .entry((chunk_position, pass))
            .or_default();
        analytics.allocated_memory = analytics.allocated_memory.max(data_size);
        analytics.used_memory = data_size;
        analytics.times_written += 1;

        self.buffers.insert(
            (chunk_position, pass),
            ChunkBuffer {
                origin,
                faces: faces.to_vec(),
            },
        );
    }

    /// The buffer of a chunk for one pass, if the chunk is uploaded.
    pub fn get_buffer(&self, chunk_position: Point3<i32>, pass: RenderPass) -> Option<&ChunkBuffer> {
        self.buffers.get(&(chunk_position, pass))
    }

    /// Whether a chunk currently has buffers.
    pub fn contains_chunk(&self, chunk_position: Point3<i32>) -> bool {
        self.buffers.contains_key(&(chunk_position, RenderPass::Opaque))
    }

    /// Number of chunks with uploaded buffers.
    pub fn chunk_count(&self) -> usize {
        self.buffers
            .keys()
            .filter(|(_, pass)| *pass == RenderPass::Opaque)
            .count()
    }

    /// How many times a chunk's opaque buffer has been written.
    pub fn times_written(&self, chunk_position: Point3<i32>) -> u64 {
        self.buffer_analytics
            .get(&(chunk_position, RenderPass::Opaque))
            .map_or(0, |analytics| analytics.times_written)
    }

    /// Total bytes ever reserved by live buffers.
    pub fn get_total_allocated_memory(&self) -> u64 {
        self.buffer_analytics
            .values()
            .fold(0, |acc, buffer_analytics| acc + buffer_analytics.allocated_memory)
    }

    /// Total bytes of current buffer contents.
    pub fn get_total_used_memory(&self) -> u64 {
        self.buffer_analytics
            .values()
            .fold(0, |acc, buffer_analytics| acc + buffer_analytics.used_memory)
    }

    /// Builds the draw list of a frame.
    ///
    /// Chunks for which `is_visible` is false are skipped, as are empty
    /// buffers. Every opaque draw comes before every translucent draw; within a
    /// pass draws are ordered by chunk coordinate so plans are reproducible.
    pub fn frame_plan(&self, is_visible: impl Fn(Point3<i32>) -> bool) -> Vec<DrawCommand> {
        let mut chunk_positions: Vec<Point3<i32>> = self
            .buffers
            .keys()
            .filter(|(_, pass)| *pass == RenderPass::Opaque)
            .map(|(chunk_position, _)| *chunk_position)
            .filter(|chunk_position| is_visible(*chunk_position))
            .collect();
        chunk_positions.sort_by_key(|p| (p.x, p.y, p.z));

        let mut commands = Vec::new();
        for pass in [RenderPass::Opaque, RenderPass::Translucent] {
            for chunk_position in &chunk_positions {
                let Some(buffer) = self.get_buffer(*chunk_position, pass) else {
                    continue;
                };
                if buffer.faces.is_empty() {
                    continue;
                }
                commands.push(DrawCommand {
                    chunk_position: *chunk_position,
                    origin: buffer.origin,
                    pass,
                    instance_count: buffer.faces.len() as u32,
                    cull_back_faces: pass == RenderPass::Opaque,
                });
            }
        }
        commands
    }
}

impl RenderBackend for BufferState {
    fn upload_chunk(
        &mut self,
        chunk_position: Point3<i32>,
        origin: Point3<i32>,
        opaque: &[FaceRecord],
        translucent: &[FaceRecord],
    ) {
        self.write_buffer(chunk_position, RenderPass::Opaque, origin, opaque);
        self.write_buffer(chunk_position, RenderPass::Translucent, origin, translucent);
    }

    fn release_chunk(&mut self, chunk_position: Point3<i32>) {
        for pass in [RenderPass::Opaque, RenderPass::Translucent] {
            self.buffers.remove(&(chunk_position, pass));
            self.buffer_analytics.remove(&(chunk_position, pass));
        }
    }
}

/// Types that can be viewed as the raw bytes uploaded to a buffer.
pub trait AsBytes {
    /// The raw bytes of the value.
    fn as_bytes(&self) -> &[u8];
}

impl<T> AsBytes for [T]
where
    T: NoUninit,
{
    fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self)
    }
}

impl<T> AsBytes for Vec<T>
where
    T: NoUninit,
{
    fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self)
    }
}
