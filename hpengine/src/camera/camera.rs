/// Camera: passive data container owned by the simulation thread.
///
/// The camera stores matrices and the frustum extracted from them. It is
/// cloned into every `RenderState`, so the render thread always sees the
/// camera that was used for culling that frame.

use glam::{Mat4, Vec3};
use crate::scene::AABB;
use super::frustum::{CullingVolume, Frustum, FrustumTest};

/// Low-level camera.
///
/// Setters store what they are given. The only derived value is the
/// frustum, which `set_view` / `set_projection` keep in sync with the
/// matrices unless a frustum is set explicitly afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    frustum: Frustum,
    position: Vec3,
}

impl Camera {
    /// Create a camera from explicit matrices and frustum.
    pub fn new(view: Mat4, projection: Mat4, frustum: Frustum) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            frustum,
            position: view.inverse().col(3).truncate(),
        }
    }

    /// Create a camera and extract its frustum from `projection * view`.
    pub fn from_matrices(view: Mat4, projection: Mat4) -> Self {
        let frustum = Frustum::from_view_projection(&(projection * view));
        Self::new(view, projection, frustum)
    }

    /// Right-handed perspective camera looking from `eye` at `target`.
    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let projection = Mat4::perspective_rh(fov_y_radians, aspect, near, far);
        Self::from_matrices(view, projection)
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum planes for culling.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    // ===== SETTERS =====

    /// Set the view matrix and refresh position and frustum.
    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
        self.position = matrix.inverse().col(3).truncate();
        self.refresh_frustum();
    }

    /// Set the projection matrix and refresh the frustum.
    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
        self.refresh_frustum();
    }

    /// Override the frustum (e.g. a frozen culling frustum for debugging).
    pub fn set_frustum(&mut self, frustum: Frustum) {
        self.frustum = frustum;
    }

    fn refresh_frustum(&mut self) {
        self.frustum = Frustum::from_view_projection(&self.view_projection_matrix());
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(
            Vec3::ZERO,
            Vec3::NEG_Z,
            std::f32::consts::FRAC_PI_3,
            16.0 / 9.0,
            0.1,
            5000.0,
        )
    }
}

impl CullingVolume for Camera {
    fn sphere_in_frustum(&self, center: Vec3, radius: f32) -> bool {
        self.frustum.sphere_in_frustum(center, radius)
    }

    fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        self.frustum.classify_aabb(aabb)
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
