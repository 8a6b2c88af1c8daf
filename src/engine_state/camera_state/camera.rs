//! # Camera Implementation
//!
//! A first-person camera: a world position plus yaw and pitch angles.
//!
//! Yaw rotates around the Y axis starting from +X, pitch tilts the view up
//! and down and is clamped just short of straight up and straight down.

use cgmath::*;
use std::f32::consts::FRAC_PI_2;

use crate::engine_state::physics::raycast::Ray;

/// Safe limit for pitch to prevent gimbal lock
const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Represents a first-person camera in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// The camera's position in world space
    pub position: Point3<f32>,
    /// Horizontal rotation (around Y axis) in radians
    pub yaw: Rad<f32>,
    /// Vertical rotation (around X axis) in radians
    pub pitch: Rad<f32>,
}

impl Camera {
    /// Creates a new camera with the specified position and orientation.
    ///
    /// # Arguments
    /// * `position` - Initial position of the camera in world space
    /// * `yaw` - Initial yaw; zero looks along positive X
    /// * `pitch` - Initial pitch; clamped like every later rotation
    ///
    /// # Example
    /// ```rust
    /// use cgmath::{Deg, Point3};
    /// use voxel_world::engine_state::camera_state::Camera;
    ///
    /// let camera = Camera::new(Point3::new(0.0, 40.0, 0.0), Deg(0.0), Deg(0.0));
    /// assert!((camera.forward().x - 1.0).abs() < 1e-6);
    /// ```
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: Rad(0.0),
        };
        camera.rotate(Rad(0.0), pitch.into());
        camera
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize()
    }

    /// Forward direction projected onto the ground plane.
    pub fn horizontal_forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        Vector3::new(yaw_cos, 0.0, yaw_sin)
    }

    /// Direction to the camera's right on the ground plane.
    pub fn right(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        Vector3::new(-yaw_sin, 0.0, yaw_cos)
    }

    /// Turns the camera, clamping pitch to avoid gimbal lock.
    pub fn rotate(&mut self, yaw_delta: Rad<f32>, pitch_delta: Rad<f32>) {
        self.yaw += yaw_delta;
        self.pitch += pitch_delta;

        if self.pitch < -Rad(SAFE_FRAC_PI_2) {
            self.pitch = -Rad(SAFE_FRAC_PI_2);
        } else if self.pitch > Rad(SAFE_FRAC_PI_2) {
            self.pitch = Rad(SAFE_FRAC_PI_2);
        }
    }

    /// Calculates the view matrix for this camera.
    ///
    /// The view matrix transforms world coordinates to view (camera) space.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }

    /// The ray through the centre of the view, used for block selection.
    pub fn view_ray(&self) -> Ray {
        Ray::new(self.position, self.forward())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_turns_the_view_around_y() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(90.0), Deg(0.0));
        let forward = camera.forward();
        assert!(forward.x.abs() < 1e-6);
        assert!((forward.z - 1.0).abs() < 1e-6);
        assert!((camera.right() - Vector3::new(-1.0, 0.0, 0.0)).magnitude() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        camera.rotate(Rad(0.0), Rad(10.0));
        assert_eq!(camera.pitch, Rad(SAFE_FRAC_PI_2));
        assert!(camera.forward().y > 0.999);
        camera.rotate(Rad(0.0), Rad(-20.0));
        assert_eq!(camera.pitch, -Rad(SAFE_FRAC_PI_2));
    }

    #[test]
    fn view_matrix_moves_the_camera_to_the_origin() {
        let camera = Camera::new(Point3::new(3.0, 40.0, -2.0), Deg(30.0), Deg(-10.0));
        let eye = camera.calc_matrix() * camera.position.to_homogeneous();
        assert!(eye.truncate().magnitude() < 1e-4);

        let ahead = camera.calc_matrix() * (camera.position + camera.forward()).to_homogeneous();
        // right handed view space looks down -Z
        assert!((ahead.z + 1.0).abs() < 1e-4);
    }
}
