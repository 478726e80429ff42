/// Bounding volumes and the spatial contract entities expose to the octree.

use glam::{Mat4, Vec3};

// ===== AABB =====

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    /// Build from two corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Cube of edge length `size` centered on `center`.
    pub fn from_center_size(center: Vec3, size: f32) -> Self {
        let half = Vec3::splat(size * 0.5);
        Self { min: center - half, max: center + half }
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half extents along each axis.
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Radius of the bounding sphere centered on `center()`.
    pub fn bounding_radius(&self) -> f32 {
        self.half_extents().length()
    }

    /// Transform this local-space AABB by a matrix, returning a new AABB.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the AABB extents
    /// for an exact (tight) result without transforming all 8 corners.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }

    /// Test if this AABB fully contains another AABB (boundaries inclusive).
    pub fn contains(&self, other: &AABB) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Test if a point lies inside this AABB (boundaries inclusive).
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.min.x <= point.x && point.x <= self.max.x
        && self.min.y <= point.y && point.y <= self.max.y
        && self.min.z <= point.z && point.z <= self.max.z
    }

    /// Test if this AABB intersects (overlaps or touches) another AABB.
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Smallest AABB enclosing both.
    pub fn union(&self, other: &AABB) -> AABB {
        AABB { min: self.min.min(other.min), max: self.max.max(other.max) }
    }
}

// ===== SPATIAL =====

/// What the octree needs to know about an indexed object.
///
/// The identity is supplied separately as an `EntityKey`, so the same
/// trait works for arena entities, plain AABBs in tests, or any other
/// collaborator.
pub trait Spatial {
    /// World-space bounds.
    fn world_aabb(&self) -> AABB;

    /// World-space reference point. Defaults to the bounds center.
    fn world_center(&self) -> Vec3 {
        self.world_aabb().center()
    }
}

impl Spatial for AABB {
    fn world_aabb(&self) -> AABB {
        *self
    }
}

/// Bounds with an explicit center that may differ from the AABB center
/// (e.g. an entity whose pivot is at its feet).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityBounds {
    /// World-space bounds
    pub aabb: AABB,
    /// World-space pivot
    pub center: Vec3,
}

impl EntityBounds {
    /// Capture the spatial data of anything `Spatial`.
    pub fn of<S: Spatial + ?Sized>(spatial: &S) -> Self {
        Self { aabb: spatial.world_aabb(), center: spatial.world_center() }
    }
}

impl Spatial for EntityBounds {
    fn world_aabb(&self) -> AABB {
        self.aabb
    }

    fn world_center(&self) -> Vec3 {
        self.center
    }
}
