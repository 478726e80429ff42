/// Camera culling strategies.
///
/// A Culler determines which renderable entities are visible from a given
/// camera. Implementations range from brute-force (return all) to spatial
/// queries through a SceneIndex.

use rustc_hash::FxHashSet;
use crate::camera::Camera;
use super::entity::{EntityKey, RenderFlags};
use super::scene_index::SceneIndex;
use super::world::World;

/// Strategy for determining visible renderables from a camera.
///
/// Called once per tick by the simulation. Only entities carrying a
/// `Renderable` with `RenderFlags::VISIBLE` are returned; entities flagged
/// `NEVER_CULL` are always returned. `&mut self` allows implementations to
/// keep scratch buffers across frames.
pub trait Culler: Send {
    /// Cull the world against the camera and return visible renderables.
    fn cull(&mut self, world: &World, index: &dyn SceneIndex, camera: &Camera) -> Vec<EntityKey>;
}

fn is_drawable(world: &World, key: EntityKey) -> bool {
    !world.is_pending_removal(key)
        && world.renderable(key)
            .map_or(false, |r| r.flags.contains(RenderFlags::VISIBLE))
}

/// Brute-force culler: returns every visible-flagged renderable.
///
/// Ignores the SceneIndex and the camera entirely.
pub struct BruteForceCuller;

impl BruteForceCuller {
    pub fn new() -> Self {
        Self
    }
}

impl Culler for BruteForceCuller {
    fn cull(&mut self, world: &World, _index: &dyn SceneIndex, _camera: &Camera) -> Vec<EntityKey> {
        world.renderables()
            .map(|(key, _)| key)
            .filter(|&key| is_drawable(world, key))
            .collect()
    }
}

/// Frustum culler: queries the SceneIndex with the camera frustum.
pub struct FrustumCuller {
    scratch: Vec<EntityKey>,
}

impl FrustumCuller {
    pub fn new() -> Self {
        Self { scratch: Vec::new() }
    }
}

impl Culler for FrustumCuller {
    fn cull(&mut self, world: &World, index: &dyn SceneIndex, camera: &Camera) -> Vec<EntityKey> {
        self.scratch.clear();
        index.query_visible(camera, &mut self.scratch);

        let mut visible: Vec<EntityKey> = self.scratch.iter()
            .copied()
            .filter(|&key| is_drawable(world, key))
            .collect();

        let always = world.renderables()
            .filter(|(_, r)| r.flags.contains(RenderFlags::NEVER_CULL))
            .map(|(key, _)| key)
            .filter(|&key| is_drawable(world, key))
            .collect::<Vec<_>>();
        if !always.is_empty() {
            let seen: FxHashSet<EntityKey> = visible.iter().copied().collect();
            visible.extend(always.into_iter().filter(|key| !seen.contains(key)));
        }

        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use crate::scene::{AABB, Entity, MaterialHandle, MeshHandle, Octree, Renderable, Transform};

    fn populate() -> (World, Octree, EntityKey, EntityKey) {
        let mut world = World::new();
        let mut octree = Octree::new(Vec3::ZERO, 1000.0, 3);
        let unit = AABB::from_center_size(Vec3::ZERO, 1.0);

        let front = world.spawn(Entity::new("front", Transform::from_translation(Vec3::new(0.0, 0.0, -20.0)), unit));
        let behind = world.spawn(Entity::new("behind", Transform::from_translation(Vec3::new(0.0, 0.0, 300.0)), unit));
        for key in [front, behind] {
            world.set_renderable(key, Renderable::new(MeshHandle(1), MaterialHandle(1)));
            octree.insert(key, world.entity(key).unwrap());
        }
        (world, octree, front, behind)
    }

    #[test]
    fn test_frustum_culler_skips_entities_behind_camera() {
        let (world, octree, front, behind) = populate();
        let camera = Camera::default();

        let visible = FrustumCuller::new().cull(&world, &octree, &camera);

        assert!(visible.contains(&front));
        assert!(!visible.contains(&behind));
    }

    #[test]
    fn test_brute_force_returns_everything() {
        let (world, octree, front, behind) = populate();
        let camera = Camera::default();

        let mut visible = BruteForceCuller::new().cull(&world, &octree, &camera);
        visible.sort();
        let mut expected = vec![front, behind];
        expected.sort();

        assert_eq!(visible, expected);
    }

    #[test]
    fn test_never_cull_is_always_returned() {
        let (mut world, octree, _, behind) = populate();
        let mut renderable = *world.renderable(behind).unwrap();
        renderable.flags |= RenderFlags::NEVER_CULL;
        world.set_renderable(behind, renderable);

        let visible = FrustumCuller::new().cull(&world, &octree, &Camera::default());

        assert_eq!(visible.iter().filter(|&&k| k == behind).count(), 1);
    }

    #[test]
    fn test_hidden_and_non_renderable_are_skipped() {
        let (mut world, mut octree, front, _) = populate();
        let mut renderable = *world.renderable(front).unwrap();
        renderable.flags.remove(RenderFlags::VISIBLE);
        world.set_renderable(front, renderable);

        let lamp = world.spawn(Entity::new("lamp",
            Transform::from_translation(Vec3::new(1.0, 0.0, -20.0)),
            AABB::from_center_size(Vec3::ZERO, 1.0)));
        octree.insert(lamp, world.entity(lamp).unwrap());

        let visible = FrustumCuller::new().cull(&world, &octree, &Camera::default());

        assert!(!visible.contains(&front));
        assert!(!visible.contains(&lamp));
    }
}
