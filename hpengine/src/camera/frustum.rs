/// Frustum: six clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes

use glam::{Mat4, Vec3, Vec4};
use crate::scene::AABB;

/// Result of a 3-way frustum/AABB classification.
///
/// Used by the octree for hierarchical culling:
/// - `Outside` → skip the entire subtree
/// - `Inside` → collect all entities without further testing
/// - `Partial` → take the node's entities and recurse into children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB partially overlaps the frustum
    Partial,
}

/// Anything the octree can cull against.
///
/// Implemented by `Frustum` and `Camera`; tests use ad-hoc volumes.
pub trait CullingVolume {
    /// Conservative sphere test. `false` means the sphere is entirely outside.
    fn sphere_in_frustum(&self, center: Vec3, radius: f32) -> bool;

    /// 3-way AABB classification.
    fn classify_aabb(&self, aabb: &AABB) -> FrustumTest;
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes for culling.
///
/// Each plane is (A, B, C, D) where Ax + By + Cz + D = 0.
/// Normal (A, B, C) points inward (toward the visible volume).
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Uses the Gribb & Hartmann method. Works for both perspective
    /// and orthographic projections.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        let mut planes = [
            // Left:   row3 + row0
            Vec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            Vec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            Vec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            Vec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row3 + row2
            Vec4::new(m[0][3] + m[0][2], m[1][3] + m[1][2], m[2][3] + m[2][2], m[3][3] + m[3][2]),
            // Far:    row3 - row2
            Vec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        for plane in &mut planes {
            let normal_len = Vec3::new(plane.x, plane.y, plane.z).length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Test a sphere against all six planes.
    ///
    /// Planes are normalized, so the signed plane distance can be compared
    /// directly against the radius.
    pub fn sphere_in_frustum(&self, center: Vec3, radius: f32) -> bool {
        self.planes.iter().all(|plane| {
            let normal = Vec3::new(plane.x, plane.y, plane.z);
            normal.dot(center) + plane.w >= -radius
        })
    }

    /// Test if an AABB intersects this frustum.
    ///
    /// Positive-vertex test: conservative, may return false positives,
    /// never false negatives.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.classify_aabb(aabb) != FrustumTest::Outside
    }

    /// Classify an AABB against the frustum (3-way test).
    ///
    /// - p-vertex outside any plane → `Outside` (early out)
    /// - n-vertex outside any plane → at least `Partial`
    /// - otherwise → `Inside`
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = Vec3::new(plane.x, plane.y, plane.z);

            let p_vertex = Vec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );

            if normal.dot(p_vertex) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            let n_vertex = Vec3::new(
                if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );

            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

impl CullingVolume for Frustum {
    fn sphere_in_frustum(&self, center: Vec3, radius: f32) -> bool {
        Frustum::sphere_in_frustum(self, center, radius)
    }

    fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        Frustum::classify_aabb(self, aabb)
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
