//! The player controller: a physics body driven by [`PlayerInput`] with the
//! camera riding at eye height.

use cgmath::{InnerSpace, Point3, Rad, Vector3, Zero};

use crate::engine_state::{
    physics::{collision, raycast::Ray, Aabb, PhysicsBody},
    voxels::chunk_grid::ChunkGrid,
    PlayerInput,
};

use super::camera::Camera;

/// Width and depth of the player's box, in blocks
pub const PLAYER_WIDTH: f32 = 0.6;
/// Height of the player's box, in blocks
pub const PLAYER_HEIGHT: f32 = 1.8;
/// Height of the eyes above the feet
pub const EYE_HEIGHT: f32 = 1.62;
/// Horizontal speed while walking, in blocks per tick
pub const WALK_SPEED: f32 = 0.1;
/// Upward velocity given by a jump, in blocks per tick
pub const JUMP_IMPULSE: f32 = 0.42;
/// Radians turned per unit of view rotation input
pub const LOOK_SENSITIVITY: f32 = 0.004;

/// The player: a body that walks, jumps and falls, and the camera it carries.
#[derive(Debug, Clone, Copy)]
pub struct Player {
    /// The player's collision body
    pub body: PhysicsBody,
    /// The first-person camera, kept at eye height
    pub camera: Camera,
}

impl Player {
    /// Creates a player standing with the centre of its feet at `feet`.
    pub fn new(feet: Point3<f32>) -> Self {
        let min = feet - Vector3::new(PLAYER_WIDTH / 2.0, 0.0, PLAYER_WIDTH / 2.0);
        let body = PhysicsBody::new(min, Vector3::new(PLAYER_WIDTH, PLAYER_HEIGHT, PLAYER_WIDTH));
        let mut player = Player {
            body,
            camera: Camera::new(feet, Rad(0.0), Rad(0.0)),
        };
        player.follow_camera();
        player
    }

    /// Centre of the bottom face of the player's box.
    pub fn feet_position(&self) -> Point3<f32> {
        self.body.position() + Vector3::new(PLAYER_WIDTH / 2.0, 0.0, PLAYER_WIDTH / 2.0)
    }

    /// Where the camera sits.
    pub fn eye_position(&self) -> Point3<f32> {
        self.feet_position() + Vector3::new(0.0, EYE_HEIGHT, 0.0)
    }

    /// The player's collision box.
    pub fn bounds(&self) -> Aabb {
        self.body.bounds
    }

    /// Whether the player stood on ground at the end of the last step.
    pub fn grounded(&self) -> bool {
        self.body.grounded
    }

    /// The selection ray from the eyes along the view direction.
    pub fn view_ray(&self) -> Ray {
        self.camera.view_ray()
    }

    /// Turns the view and sets the velocity for the next step.
    ///
    /// Walking replaces the horizontal velocity. A jump only starts from the
    /// ground. Gravity is always applied.
    pub fn apply_input(&mut self, input: &PlayerInput) {
        if let Some((delta_x, delta_y)) = input.rotate_view {
            self.camera.rotate(
                Rad(delta_x as f32 * LOOK_SENSITIVITY),
                Rad(-delta_y as f32 * LOOK_SENSITIVITY),
            );
        }

        let forward = self.camera.horizontal_forward();
        let right = self.camera.right();
        let mut walk = Vector3::zero();
        if input.move_forward {
            walk += forward;
        }
        if input.move_backward {
            walk -= forward;
        }
        if input.move_right {
            walk += right;
        }
        if input.move_left {
            walk -= right;
        }
        if walk.magnitude2() > 0.0 {
            walk = walk.normalize() * WALK_SPEED;
        }
        self.body.velocity.x = walk.x;
        self.body.velocity.z = walk.z;

        if input.jump && self.body.grounded {
            self.body.velocity.y = JUMP_IMPULSE;
        }
        self.body.apply_gravity();
    }

    /// Moves the player by one tick against the grid and brings the camera along.
    ///
    /// # Returns
    /// Whether the player is standing on ground.
    pub fn step(&mut self, grid: &ChunkGrid) -> bool {
        let grounded = collision::resolve(&mut self.body, grid);
        self.follow_camera();
        grounded
    }

    fn follow_camera(&mut self) {
        self.camera.position = self.eye_position();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        buffer_state::BufferState,
        voxels::{
            chunk_grid::GridSettings,
            edit_store::MemoryEditStore,
            generation::{FlatTerrain, WorldGenerator},
        },
    };

    const GROUND: i32 = 40;

    fn flat_grid() -> ChunkGrid {
        let settings = GridSettings {
            render_distance: 1,
            load_distance: 1,
            load_budget: 100,
            world_height_chunks: 2,
            ..Default::default()
        };
        let mut grid = ChunkGrid::new(settings, WorldGenerator::new(FlatTerrain::new(GROUND)), 2);
        grid.load(Point3::new(0, 1, 0), &mut MemoryEditStore::new(), &mut BufferState::new());
        grid
    }

    fn spawn() -> Player {
        Player::new(Point3::new(16.5, GROUND as f32, 16.5))
    }

    #[test]
    fn standing_player_stays_grounded() {
        let grid = flat_grid();
        let mut player = spawn();
        for _ in 0..5 {
            player.apply_input(&PlayerInput::default());
            assert!(player.step(&grid));
        }
        assert_eq!(player.feet_position().y, GROUND as f32);
        assert!((player.camera.position.y - (GROUND as f32 + EYE_HEIGHT)).abs() < 1e-5);
    }

    #[test]
    fn walking_follows_the_view_direction() {
        let grid = flat_grid();
        let mut player = spawn();
        let input = PlayerInput {
            move_forward: true,
            ..Default::default()
        };
        for _ in 0..10 {
            player.apply_input(&input);
            player.step(&grid);
        }
        assert!(player.feet_position().x > 17.3);
        assert!((player.feet_position().z - 16.5).abs() < 1e-4);
        assert_eq!(player.feet_position().y, GROUND as f32);
    }

    #[test]
    fn jumps_start_only_from_the_ground() {
        let grid = flat_grid();
        let mut player = spawn();
        player.apply_input(&PlayerInput::default());
        player.step(&grid);

        let jump = PlayerInput {
            jump: true,
            ..Default::default()
        };
        player.apply_input(&jump);
        assert!(!player.step(&grid));
        assert!(player.feet_position().y > GROUND as f32);

        let rising = player.body.velocity.y;
        player.apply_input(&jump);
        assert!(player.body.velocity.y < rising);

        for _ in 0..60 {
            player.step(&grid);
            player.apply_input(&PlayerInput::default());
        }
        assert!(player.grounded());
        assert_eq!(player.feet_position().y, GROUND as f32);
    }
}
