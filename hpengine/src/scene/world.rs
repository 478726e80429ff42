/// World: entity arena with component storage and change tracking.
///
/// Entities live in a SlotMap; components are attached by key in
/// SecondaryMaps. Spawns, transform changes and despawns are recorded in
/// sets that the simulation drains each tick to keep the spatial index in
/// sync. Removal is deferred until `commit_removals`.

use rustc_hash::FxHashSet;
use slotmap::{SecondaryMap, SlotMap};
use crate::error::{Error, Result};
use super::behavior::Behavior;
use super::bounds::EntityBounds;
use super::entity::{DirectionalLight, Entity, EntityKey, PointLight, Renderable, Transform};

/// Outcome of one `World::update_behaviors` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BehaviorPass {
    /// Behaviors whose update returned Ok
    pub updated: usize,
    /// Behaviors whose update returned an error (logged, not propagated)
    pub failed: usize,
}

/// Entity arena plus components.
pub struct World {
    entities: SlotMap<EntityKey, Entity>,
    renderables: SecondaryMap<EntityKey, Renderable>,
    point_lights: SecondaryMap<EntityKey, PointLight>,
    behaviors: SecondaryMap<EntityKey, Box<dyn Behavior>>,
    directional_light: Option<DirectionalLight>,
    /// Entities whose transform changed since last take_dirty_transforms()
    dirty_transforms: FxHashSet<EntityKey>,
    /// Entities spawned since last take_new_entities()
    new_entities: FxHashSet<EntityKey>,
    /// Entities marked for deferred removal
    removed_entities: FxHashSet<EntityKey>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            renderables: SecondaryMap::new(),
            point_lights: SecondaryMap::new(),
            behaviors: SecondaryMap::new(),
            directional_light: None,
            dirty_transforms: FxHashSet::default(),
            new_entities: FxHashSet::default(),
            removed_entities: FxHashSet::default(),
        }
    }

    // ===== ENTITIES =====

    /// Add an entity. Returns a stable key valid until the entity is removed.
    pub fn spawn(&mut self, entity: Entity) -> EntityKey {
        let key = self.entities.insert(entity);
        self.new_entities.insert(key);
        key
    }

    /// Mark an entity for deferred removal.
    ///
    /// The entity stays readable until `commit_removals`. Returns false if
    /// the key is invalid.
    pub fn despawn(&mut self, key: EntityKey) -> bool {
        if self.entities.contains_key(key) {
            self.removed_entities.insert(key);
            self.dirty_transforms.remove(&key);
            self.new_entities.remove(&key);
            true
        } else {
            false
        }
    }

    /// Whether `despawn` was called and not yet committed.
    pub fn is_pending_removal(&self, key: EntityKey) -> bool {
        self.removed_entities.contains(&key)
    }

    /// Get an entity by key.
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Iterate over all entities (key, entity).
    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter()
    }

    /// Iterate over all entity keys.
    pub fn entity_keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.entities.keys()
    }

    /// Number of entities, including those pending removal.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// World-space bounds of an entity.
    pub fn entity_bounds(&self, key: EntityKey) -> Option<EntityBounds> {
        self.entities.get(key).map(EntityBounds::of)
    }

    // ===== TRANSFORMS =====

    /// Current transform.
    pub fn transform(&self, key: EntityKey) -> Option<&Transform> {
        self.entities.get(key).map(Entity::transform)
    }

    /// Mutable transform access. Marks the entity dirty.
    pub fn transform_mut(&mut self, key: EntityKey) -> Option<&mut Transform> {
        let entity = self.entities.get_mut(key)?;
        if !self.removed_entities.contains(&key) {
            self.dirty_transforms.insert(key);
        }
        Some(entity.transform_mut())
    }

    /// Replace a transform. Returns false if the key is invalid.
    pub fn set_transform(&mut self, key: EntityKey, transform: Transform) -> bool {
        match self.transform_mut(key) {
            Some(current) => {
                *current = transform;
                true
            }
            None => false,
        }
    }

    /// Get the set of entities with pending transform changes.
    pub fn dirty_transforms(&self) -> &FxHashSet<EntityKey> {
        &self.dirty_transforms
    }

    /// Take and clear the dirty transform set.
    pub fn take_dirty_transforms(&mut self) -> FxHashSet<EntityKey> {
        std::mem::take(&mut self.dirty_transforms)
    }

    /// Get the set of spawned entities not yet indexed.
    pub fn new_entities(&self) -> &FxHashSet<EntityKey> {
        &self.new_entities
    }

    /// Take and clear the new entities set.
    pub fn take_new_entities(&mut self) -> FxHashSet<EntityKey> {
        std::mem::take(&mut self.new_entities)
    }

    /// Take and clear the set of entities marked for removal.
    pub fn take_removed_entities(&mut self) -> FxHashSet<EntityKey> {
        std::mem::take(&mut self.removed_entities)
    }

    /// Actually remove entities and their components.
    ///
    /// Called by the simulation after draining removed entities and
    /// cleaning up the spatial index.
    pub(crate) fn commit_removals(&mut self, keys: &FxHashSet<EntityKey>) {
        for &key in keys {
            self.renderables.remove(key);
            self.point_lights.remove(key);
            self.behaviors.remove(key);
            self.entities.remove(key);
        }
    }

    // ===== COMPONENTS =====

    /// Attach or replace the render component. Returns false if the key is invalid.
    pub fn set_renderable(&mut self, key: EntityKey, renderable: Renderable) -> bool {
        if self.entities.contains_key(key) {
            self.renderables.insert(key, renderable);
            true
        } else {
            false
        }
    }

    /// Detach the render component.
    pub fn remove_renderable(&mut self, key: EntityKey) -> Option<Renderable> {
        self.renderables.remove(key)
    }

    /// Render component of an entity.
    pub fn renderable(&self, key: EntityKey) -> Option<&Renderable> {
        self.renderables.get(key)
    }

    /// Iterate over all render components.
    pub fn renderables(&self) -> impl Iterator<Item = (EntityKey, &Renderable)> {
        self.renderables.iter()
    }

    /// Attach or replace a point light. Returns false if the key is invalid.
    pub fn set_point_light(&mut self, key: EntityKey, light: PointLight) -> bool {
        if self.entities.contains_key(key) {
            self.point_lights.insert(key, light);
            true
        } else {
            false
        }
    }

    /// Detach a point light.
    pub fn remove_point_light(&mut self, key: EntityKey) -> Option<PointLight> {
        self.point_lights.remove(key)
    }

    /// Point light of an entity.
    pub fn point_light(&self, key: EntityKey) -> Option<&PointLight> {
        self.point_lights.get(key)
    }

    /// Iterate over all point lights.
    pub fn point_lights(&self) -> impl Iterator<Item = (EntityKey, &PointLight)> {
        self.point_lights.iter()
    }

    /// Scene sun.
    pub fn directional_light(&self) -> Option<&DirectionalLight> {
        self.directional_light.as_ref()
    }

    /// Set or clear the scene sun.
    pub fn set_directional_light(&mut self, light: Option<DirectionalLight>) {
        self.directional_light = light;
    }

    // ===== BEHAVIORS =====

    /// Attach a behavior and run its `init`.
    ///
    /// A failing `init` leaves the entity without a behavior and is
    /// reported as `Error::BehaviorFailed`.
    pub fn attach_behavior(&mut self, key: EntityKey, mut behavior: Box<dyn Behavior>) -> Result<()> {
        let entity = self.entities.get_mut(key)
            .ok_or_else(|| crate::engine_err!("hpengine::World",
                "Cannot attach behavior: unknown entity {:?}", key))?;

        let before = *entity.transform();
        behavior.init(key, entity.transform_mut())
            .map_err(|e| Error::BehaviorFailed(format!("init on '{}': {}", entity.name(), e)))?;
        if *entity.transform() != before {
            self.dirty_transforms.insert(key);
        }

        self.behaviors.insert(key, behavior);
        Ok(())
    }

    /// Detach a behavior.
    pub fn detach_behavior(&mut self, key: EntityKey) -> Option<Box<dyn Behavior>> {
        self.behaviors.remove(key)
    }

    /// Whether an entity has a behavior attached.
    pub fn has_behavior(&self, key: EntityKey) -> bool {
        self.behaviors.contains_key(key)
    }

    /// Run every behavior once.
    ///
    /// Entities pending removal are skipped. A failing behavior is logged
    /// and counted; the others still run. Transforms that changed are
    /// marked dirty.
    pub fn update_behaviors(&mut self, delta_seconds: f32) -> BehaviorPass {
        let mut pass = BehaviorPass::default();

        for (key, behavior) in self.behaviors.iter_mut() {
            if self.removed_entities.contains(&key) {
                continue;
            }
            let entity = match self.entities.get_mut(key) {
                Some(entity) => entity,
                None => continue,
            };

            let before = *entity.transform();
            match behavior.update(key, entity.transform_mut(), delta_seconds) {
                Ok(()) => pass.updated += 1,
                Err(e) => {
                    crate::engine_error!("hpengine::World",
                        "Behavior on '{}' failed: {}", entity.name(), e);
                    pass.failed += 1;
                }
            }
            if *entity.transform() != before {
                self.dirty_transforms.insert(key);
            }
        }

        pass
    }

    /// Remove everything, including pending change sets.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.renderables.clear();
        self.point_lights.clear();
        self.behaviors.clear();
        self.directional_light = None;
        self.dirty_transforms.clear();
        self.new_entities.clear();
        self.removed_entities.clear();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "world_tests.rs"]
mod tests;
