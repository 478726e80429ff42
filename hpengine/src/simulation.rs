/// Simulation: update-thread driver.
///
/// Owns the world, the octree and the camera. Each `tick()` runs behaviors,
/// brings the octree in line with the world's change sets, culls, builds a
/// `RenderState` and publishes it through the shared `TripleBuffer`. The
/// render thread only ever sees the published states.

use std::sync::Arc;
use parking_lot::Mutex;
use crate::camera::Camera;
use crate::context::EngineContext;
use crate::error::Result;
use crate::render::{DrawBatch, LightState, PointLightState, RenderState, sort_batches};
use crate::scene::{
    BehaviorPass, BruteForceCuller, Culler, EntityKey, FrustumCuller, Octree, Spatial, World,
};
use crate::sync::{Command, CommandFlush, TripleBuffer};

/// What one `tick()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStats {
    /// Cycle stamped on the published state
    pub cycle: i64,
    /// Behavior outcome
    pub behaviors: BehaviorPass,
    /// Entities added to the octree
    pub inserted: usize,
    /// Entities re-placed after a transform change
    pub moved: usize,
    /// Entities removed from the octree and the world
    pub removed: usize,
    /// Subtrees collapsed by `optimize()`
    pub collapsed: usize,
    /// Batches published
    pub visible: usize,
    /// Lights published (directional included)
    pub lights: usize,
    /// Replay of the publish command into the write copy
    pub publish: CommandFlush,
}

/// Change counts of one octree sync.
#[derive(Debug, Clone, Copy, Default)]
struct IndexSync {
    inserted: usize,
    moved: usize,
    removed: usize,
}

impl IndexSync {
    fn changed(&self) -> bool {
        self.inserted + self.moved + self.removed > 0
    }
}

pub struct Simulation {
    world: World,
    octree: Octree,
    camera: Camera,
    culler: Box<dyn Culler>,
    cull_lights: bool,
    buffer: Arc<TripleBuffer<RenderState>>,
    /// Newest published state, read by `sync_command` on replay
    latest: Arc<Mutex<Arc<RenderState>>>,
    sync_command: Command<RenderState>,
    cycle: i64,
}

impl Simulation {
    /// Create an empty simulation from a validated context.
    pub fn new(context: &EngineContext) -> Result<Self> {
        let config = context.config();
        let octree = Octree::from_config(&config.octree)?;
        let culler: Box<dyn Culler> = if config.use_frustum_culling {
            Box::new(FrustumCuller::new())
        } else {
            Box::new(BruteForceCuller::new())
        };

        let latest = Arc::new(Mutex::new(Arc::new(RenderState::default())));
        let sync_command: Command<RenderState> = {
            let latest = Arc::clone(&latest);
            Arc::new(move |slot: &mut RenderState| -> Result<()> {
                let state = Arc::clone(&*latest.lock());
                slot.copy_from(&state);
                Ok(())
            })
        };

        Ok(Self {
            world: World::new(),
            octree,
            camera: Camera::default(),
            culler,
            cull_lights: config.cull_lights,
            buffer: Arc::new(TripleBuffer::default()),
            latest,
            sync_command,
            cycle: 0,
        })
    }

    // ===== ACCESSORS =====

    /// Buffer to hand to the render thread.
    pub fn render_buffer(&self) -> Arc<TripleBuffer<RenderState>> {
        Arc::clone(&self.buffer)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world. Changes reach the octree on the next tick.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Replace the culling strategy.
    pub fn set_culler(&mut self, culler: Box<dyn Culler>) {
        self.culler = culler;
    }

    /// Cycle of the last published state.
    pub fn cycle(&self) -> i64 {
        self.cycle
    }

    // ===== TICK =====

    /// Advance the simulation by `delta_seconds` and publish a new state.
    pub fn tick(&mut self, delta_seconds: f32) -> TickStats {
        let behaviors = self.world.update_behaviors(delta_seconds);

        let sync = self.sync_index();
        let collapsed = if sync.changed() { self.octree.optimize() } else { 0 };

        let visible = self.culler.cull(&self.world, &self.octree, &self.camera);

        self.cycle += 1;
        let state = self.build_render_state(&visible);
        let (batches, lights) = (state.batches.len(), state.lights.count());
        let publish = self.publish(state);

        crate::engine_trace!("hpengine::Simulation",
            "Tick {}: {} inserted, {} moved, {} removed, {} visible",
            self.cycle, sync.inserted, sync.moved, sync.removed, batches);

        TickStats {
            cycle: self.cycle,
            behaviors,
            inserted: sync.inserted,
            moved: sync.moved,
            removed: sync.removed,
            collapsed,
            visible: batches,
            lights,
            publish,
        }
    }

    /// Swap in a new world (scene load) and rebuild the octree wholesale.
    ///
    /// The previous world is returned. Change sets recorded in the new
    /// world before the call are consumed by the rebuild.
    pub fn replace_world(&mut self, mut world: World) -> World {
        let removed = world.take_removed_entities();
        world.commit_removals(&removed);
        world.take_new_entities();
        world.take_dirty_transforms();

        self.octree.clear();
        let count = self.octree.insert_all(world.entities());
        crate::engine_info!("hpengine::Simulation",
            "World replaced ({} entities, {} nodes occupied)",
            count, self.octree.occupied_node_bounds().len());

        std::mem::replace(&mut self.world, world)
    }

    /// Drain the world's change sets into the octree.
    fn sync_index(&mut self) -> IndexSync {
        let mut sync = IndexSync::default();

        let removed = self.world.take_removed_entities();
        for &key in &removed {
            if self.octree.remove(key) {
                sync.removed += 1;
            }
        }
        self.world.commit_removals(&removed);

        let spawned = self.world.take_new_entities();
        for &key in &spawned {
            if let Some(bounds) = self.world.entity_bounds(key) {
                self.octree.insert_without_optimize(key, &bounds);
                sync.inserted += 1;
            }
        }

        let dirty = self.world.take_dirty_transforms();
        for key in dirty.difference(&spawned) {
            let bounds = match self.world.entity_bounds(*key) {
                Some(bounds) => bounds,
                None => continue,
            };
            if !self.octree.update(*key, &bounds) {
                self.octree.insert_without_optimize(*key, &bounds);
            }
            sync.moved += 1;
        }

        sync
    }

    fn build_render_state(&self, visible: &[EntityKey]) -> RenderState {
        let mut batches: Vec<DrawBatch> = visible.iter()
            .filter_map(|&key| {
                let entity = self.world.entity(key)?;
                let renderable = self.world.renderable(key)?;
                Some(DrawBatch::new(key, entity.transform().matrix(), entity.world_aabb(), renderable))
            })
            .collect();
        sort_batches(&mut batches);

        let frustum = self.camera.frustum();
        let points = self.world.point_lights()
            .filter_map(|(key, light)| {
                let position = self.world.transform(key)?.translation;
                if self.cull_lights && !frustum.sphere_in_frustum(position, light.radius) {
                    return None;
                }
                Some(PointLightState { entity: key, position, light: *light })
            })
            .collect();
        let lights = LightState {
            directional: self.world.directional_light().copied(),
            points,
        };

        RenderState::new(self.cycle, self.camera.clone(), batches, lights)
    }

    /// Make `state` the newest snapshot and rotate it into STAGING.
    ///
    /// Every copy replays the same sync command, which copies whatever is
    /// newest at replay time. A copy that missed several ticks catches up
    /// with a single copy.
    fn publish(&self, state: RenderState) -> CommandFlush {
        *self.latest.lock() = Arc::new(state);
        self.buffer.add_coalesced_command(&self.sync_command);
        self.buffer.update()
    }
}

#[cfg(test)]
#[path = "simulation_tests.rs"]
mod tests;
