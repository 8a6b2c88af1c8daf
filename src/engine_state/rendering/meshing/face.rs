use bytemuck::{Pod, Zeroable};
use cgmath::Point3;

use crate::engine_state::voxels::block::{block_side::BlockSide, AtlasOffset};

const FACE_SHIFT: u32 = 28;
const X_SHIFT: u32 = 23;
const Y_SHIFT: u32 = 18;
const Z_SHIFT: u32 = 13;
const ATLAS_X_SHIFT: u32 = 9;
const ATLAS_Y_SHIFT: u32 = 5;

const FOUR_BITS: u32 = 0b1111;
const FIVE_BITS: u32 = 0b1_1111;

/// A single visible block face packed into one 32-bit word.
///
/// This is the instance format consumed by the render backend. From the most
/// significant bit down:
///
/// | bits  | field   | width |
/// |-------|---------|-------|
/// | 28-31 | face id | 4     |
/// | 23-27 | x       | 5     |
/// | 18-22 | y       | 5     |
/// | 13-17 | z       | 5     |
/// | 9-12  | atlas x | 4     |
/// | 5-8   | atlas y | 4     |
/// | 0-4   | unused  | 5     |
///
/// Positions are local to the owning chunk; the backend receives the chunk
/// origin separately.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct FaceRecord(pub u32);

impl FaceRecord {
    /// Packs one face.
    ///
    /// # Arguments
    /// * `side` - Which face of the block is visible
    /// * `local` - Block position inside the chunk, each component in 0-31
    /// * `atlas` - Atlas tile for this face, each component in 0-15
    ///
    /// # Panics
    /// Panics in debug builds if a component does not fit its field.
    pub fn pack(side: BlockSide, local: Point3<u8>, atlas: AtlasOffset) -> Self {
        debug_assert!(local.x < 32 && local.y < 32 && local.z < 32, "local position {local:?} out of range");
        debug_assert!(atlas.x < 16 && atlas.y < 16, "atlas offset {atlas:?} out of range");

        FaceRecord(
            (side as u32 & FOUR_BITS) << FACE_SHIFT
                | (local.x as u32 & FIVE_BITS) << X_SHIFT
                | (local.y as u32 & FIVE_BITS) << Y_SHIFT
                | (local.z as u32 & FIVE_BITS) << Z_SHIFT
                | (atlas.x as u32 & FOUR_BITS) << ATLAS_X_SHIFT
                | (atlas.y as u32 & FOUR_BITS) << ATLAS_Y_SHIFT,
        )
    }

    /// Raw face id (0-5 for records built by [`FaceRecord::pack`]).
    pub fn face_id(self) -> u8 {
        (self.0 >> FACE_SHIFT & FOUR_BITS) as u8
    }

    /// The face id decoded into a [`BlockSide`].
    pub fn side(self) -> Option<BlockSide> {
        BlockSide::from_id(self.face_id())
    }

    /// Block position inside the chunk.
    pub fn local(self) -> Point3<u8> {
        Point3::new(
            (self.0 >> X_SHIFT & FIVE_BITS) as u8,
            (self.0 >> Y_SHIFT & FIVE_BITS) as u8,
            (self.0 >> Z_SHIFT & FIVE_BITS) as u8,
        )
    }

    /// Atlas tile of the face.
    pub fn atlas(self) -> AtlasOffset {
        AtlasOffset {
            x: (self.0 >> ATLAS_X_SHIFT & FOUR_BITS) as u8,
            y: (self.0 >> ATLAS_Y_SHIFT & FOUR_BITS) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_survives_packing() {
        let tiles: Vec<AtlasOffset> = (0..16u8)
            .flat_map(|x| (0..16u8).map(move |y| AtlasOffset { x, y }))
            .collect();

        for side in BlockSide::all() {
            for x in 0..32u8 {
                for y in 0..32u8 {
                    for z in 0..32u8 {
                        let local = Point3::new(x, y, z);
                        for &atlas in &tiles {
                            let record = FaceRecord::pack(side, local, atlas);
                            assert_eq!(record.face_id(), side as u8);
                            assert_eq!(record.local(), local);
                            assert_eq!(record.atlas(), atlas);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn matches_the_documented_bit_layout() {
        let record = FaceRecord::pack(
            BlockSide::RIGHT,
            Point3::new(1, 2, 3),
            AtlasOffset { x: 4, y: 5 },
        );
        let expected = 5 << 28 | 1 << 23 | 2 << 18 | 3 << 13 | 4 << 9 | 5 << 5;
        assert_eq!(record.0, expected);
        assert_eq!(record.0 & 0b1_1111, 0);
    }

    #[test]
    fn records_cast_to_bytes() {
        let records = [FaceRecord(1), FaceRecord(u32::MAX)];
        let bytes: &[u8] = bytemuck::cast_slice(&records);
        assert_eq!(bytes.len(), 8);
    }
}
