/// Entities and their components.
///
/// An entity is a name, a transform and local bounds stored in the
/// `World` arena. Rendering and lighting data attach as separate components
/// keyed by the same `EntityKey`; nothing inherits from a transform.

use glam::{Mat4, Quat, Vec3};
use slotmap::new_key_type;
use bitflags::bitflags;
use super::bounds::{AABB, Spatial};

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable identity of an entity within a World.
    ///
    /// Keys remain valid even after other entities are removed and are
    /// used as the octree's map key.
    pub struct EntityKey;
}

// ===== TRANSFORM =====

/// Translation / rotation / scale component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World-space translation (the entity's pivot)
    pub translation: Vec3,
    /// Orientation
    pub rotation: Quat,
    /// Non-uniform scale
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Pure translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    /// Model matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Move by `delta` in world space.
    pub fn translate(&mut self, delta: Vec3) {
        self.translation += delta;
    }

    /// Rotate around a world axis.
    pub fn rotate(&mut self, axis: Vec3, angle_radians: f32) {
        self.rotation = (Quat::from_axis_angle(axis.normalize_or_zero(), angle_radians)
            * self.rotation)
            .normalize();
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ===== ENTITY =====

/// Core entity data stored in the World arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    name: String,
    transform: Transform,
    local_aabb: AABB,
}

impl Entity {
    /// Create an entity with local-space bounds.
    pub fn new(name: impl Into<String>, transform: Transform, local_aabb: AABB) -> Self {
        Self {
            name: name.into(),
            transform,
            local_aabb,
        }
    }

    /// Entity name (not unique).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current transform.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable transform. Goes through `World::transform_mut` so the
    /// change is tracked for the spatial index.
    pub(crate) fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Local-space bounds.
    pub fn local_aabb(&self) -> &AABB {
        &self.local_aabb
    }
}

impl Spatial for Entity {
    fn world_aabb(&self) -> AABB {
        self.local_aabb.transformed(&self.transform.matrix())
    }

    fn world_center(&self) -> Vec3 {
        self.transform.translation
    }
}

// ===== COMPONENTS =====

bitflags! {
    /// Per-renderable draw flags, copied into each draw batch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        /// Drawn at all
        const VISIBLE        = 1 << 0;
        /// Rendered into shadow maps
        const CAST_SHADOW    = 1 << 1;
        /// Receives shadows
        const RECEIVE_SHADOW = 1 << 2;
        /// Skipped by culling (always submitted)
        const NEVER_CULL     = 1 << 3;
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        RenderFlags::VISIBLE | RenderFlags::CAST_SHADOW | RenderFlags::RECEIVE_SHADOW
    }
}

/// Handle to a mesh owned by the (external) geometry subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MeshHandle(pub u32);

/// Handle to a material owned by the (external) material subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MaterialHandle(pub u32);

/// Render component: what to draw for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Renderable {
    /// Geometry to draw
    pub mesh: MeshHandle,
    /// Material to bind
    pub material: MaterialHandle,
    /// Draw flags
    pub flags: RenderFlags,
}

impl Renderable {
    /// Visible renderable with default flags.
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self { mesh, material, flags: RenderFlags::default() }
    }
}

/// Point light component, positioned by the entity transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Influence radius (used for light culling)
    pub radius: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self { color: Vec3::ONE, intensity: 1.0, radius: 10.0 }
    }
}

/// Scene-wide directional light (sun). Not attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels (normalized on use)
    pub direction: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.3, -1.0, -0.2),
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}
