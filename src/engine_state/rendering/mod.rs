//! Rendering side of the voxel engine.
//!
//! This module owns everything between a chunk's block array and the renderer:
//! the face-culling mesher and its packed face format, the meshing task run on
//! the worker pool, and the [`RenderBackend`] interface baked face buffers are
//! handed to.

use cgmath::Point3;

use meshing::FaceRecord;

pub mod meshing;
pub mod tasks;

/// Receiver of baked chunk geometry.
///
/// The backend draws every uploaded chunk with one instanced draw per face
/// buffer: the opaque buffer in the first pass, the translucent buffer in a
/// second pass after all opaque geometry, with back-face culling disabled.
pub trait RenderBackend {
    /// Replaces the face buffers of a chunk.
    ///
    /// # Arguments
    /// * `chunk_position` - Chunk coordinate, used as the buffer key
    /// * `origin` - World block position added to every face's local position
    /// * `opaque` - Faces of opaque blocks
    /// * `translucent` - Faces of translucent blocks
    fn upload_chunk(
        &mut self,
        chunk_position: Point3<i32>,
        origin: Point3<i32>,
        opaque: &[FaceRecord],
        translucent: &[FaceRecord],
    );

    /// Drops the buffers of an evicted chunk.
    fn release_chunk(&mut self, chunk_position: Point3<i32>);
}
