/// RenderState: the frame snapshot handed from the simulation thread to
/// the render thread through a `TripleBuffer`.
///
/// Batches and lights are plain values and are copied with the state. The
/// instance buffer (one `Mat4` per batch, in batch order) is immutable once
/// built and shared between copies through an `Arc`.

use std::ops::Range;
use std::sync::Arc;
use glam::{Mat4, Vec3};
use rdst::{RadixKey, RadixSort};
use crate::camera::Camera;
use crate::scene::{
    AABB, DirectionalLight, EntityKey, MaterialHandle, MeshHandle, PointLight, RenderFlags,
    Renderable,
};
use crate::sync::SwapPolicy;

// ===== DRAW BATCH =====

/// One visible renderable, ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawBatch {
    /// Entity the batch was built from
    pub entity: EntityKey,
    /// World matrix
    pub transform: Mat4,
    /// World-space bounds
    pub world_aabb: AABB,
    /// Geometry to draw
    pub mesh: MeshHandle,
    /// Material to bind
    pub material: MaterialHandle,
    /// Draw flags copied from the renderable
    pub flags: RenderFlags,
    /// Material in the high 32 bits, mesh in the low 32 bits
    pub sort_key: u64,
}

impl DrawBatch {
    /// Build a batch from a renderable component.
    pub fn new(entity: EntityKey, transform: Mat4, world_aabb: AABB, renderable: &Renderable) -> Self {
        Self {
            entity,
            transform,
            world_aabb,
            mesh: renderable.mesh,
            material: renderable.material,
            flags: renderable.flags,
            sort_key: Self::sort_key_for(renderable.material, renderable.mesh),
        }
    }

    /// Key grouping batches by material first, then by mesh.
    pub fn sort_key_for(material: MaterialHandle, mesh: MeshHandle) -> u64 {
        ((material.0 as u64) << 32) | mesh.0 as u64
    }
}

impl RadixKey for DrawBatch {
    const LEVELS: usize = 8;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        self.sort_key.get_level(level)
    }
}

/// Sort batches by `sort_key` so identical material/mesh pairs are adjacent.
pub fn sort_batches(batches: &mut Vec<DrawBatch>) {
    batches.radix_sort_unstable();
}

// ===== LIGHTS =====

/// A point light resolved to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightState {
    /// Owning entity
    pub entity: EntityKey,
    /// World-space position
    pub position: Vec3,
    /// Light parameters
    pub light: PointLight,
}

/// Lights submitted with a frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightState {
    pub directional: Option<DirectionalLight>,
    pub points: Vec<PointLightState>,
}

impl LightState {
    /// Directional light (if any) plus point lights.
    pub fn count(&self) -> usize {
        self.points.len() + usize::from(self.directional.is_some())
    }
}

// ===== RENDER STATE =====

/// Everything the render thread needs to draw one frame.
#[derive(Debug, Clone)]
pub struct RenderState {
    /// Simulation tick that produced this state. Never decreases on the reader side.
    pub cycle: i64,
    /// Camera used for culling this frame
    pub camera: Camera,
    /// Visible batches, sorted by `sort_key`
    pub batches: Vec<DrawBatch>,
    /// Lights for this frame
    pub lights: LightState,
    instances: Arc<[u8]>,
}

impl RenderState {
    /// Build a state from sorted batches. The instance buffer is derived
    /// from the batch transforms.
    pub fn new(cycle: i64, camera: Camera, batches: Vec<DrawBatch>, lights: LightState) -> Self {
        let matrices: Vec<Mat4> = batches.iter().map(|batch| batch.transform).collect();
        let instances: Arc<[u8]> = Arc::from(bytemuck::cast_slice::<Mat4, u8>(&matrices));
        Self { cycle, camera, batches, lights, instances }
    }

    /// Overwrite this state with `other`, reusing batch and light storage.
    /// The instance buffer is shared, not copied.
    pub fn copy_from(&mut self, other: &RenderState) {
        self.cycle = other.cycle;
        self.camera.clone_from(&other.camera);
        self.batches.clone_from(&other.batches);
        self.lights.clone_from(&other.lights);
        self.instances = Arc::clone(&other.instances);
    }

    /// Raw instance buffer bytes (column-major `Mat4`s).
    pub fn instance_bytes(&self) -> &[u8] {
        &self.instances
    }

    /// Shared handle to the instance buffer.
    pub fn instance_buffer(&self) -> Arc<[u8]> {
        Arc::clone(&self.instances)
    }

    /// Number of matrices in the instance buffer.
    pub fn instance_count(&self) -> usize {
        self.instances.len() / std::mem::size_of::<Mat4>()
    }

    /// Matrix `index` of the instance buffer.
    pub fn instance(&self, index: usize) -> Option<Mat4> {
        let stride = std::mem::size_of::<Mat4>();
        let start = index.checked_mul(stride)?;
        let end = start.checked_add(stride)?;
        let bytes = self.instances.get(start..end)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    /// Ranges of consecutive batches sharing a `sort_key`.
    ///
    /// Each range is one instanced draw: the batch indices double as
    /// indices into the instance buffer.
    pub fn instanced_runs(&self) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start = 0;
        for index in 1..=self.batches.len() {
            let run_ends = index == self.batches.len()
                || self.batches[index].sort_key != self.batches[start].sort_key;
            if run_ends {
                runs.push(start..index);
                start = index;
            }
        }
        runs
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(0, Camera::default(), Vec::new(), LightState::default())
    }
}

impl SwapPolicy for RenderState {
    fn should_not_swap(staging: &Self, read: &Self) -> bool {
        staging.cycle < read.cycle
    }
}

#[cfg(test)]
#[path = "render_state_tests.rs"]
mod tests;
