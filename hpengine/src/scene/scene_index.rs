/// Spatial acceleration structures for scene queries.
///
/// A SceneIndex indexes entities by their world-space bounds for frustum
/// culling. `Octree` is the engine's implementation.
///
/// Ownership: the simulation creates and owns the SceneIndex and passes it
/// by reference to the culler.

use crate::camera::CullingVolume;
use super::bounds::EntityBounds;
use super::entity::EntityKey;

/// Trait for spatial indexing of entities.
pub trait SceneIndex: Send + Sync {
    /// Insert (or move) an entity. Structure is left untouched until `optimize()`.
    fn insert(&mut self, key: EntityKey, bounds: &EntityBounds);

    /// Remove an entity. Returns whether it was indexed.
    fn remove(&mut self, key: EntityKey) -> bool;

    /// Re-place an entity after its bounds changed. Returns whether it was indexed.
    fn update(&mut self, key: EntityKey, bounds: &EntityBounds) -> bool;

    /// Restructure after a batch of changes.
    fn optimize(&mut self);

    /// Append every entity whose cell is visible from `volume`.
    fn query_visible(&self, volume: &dyn CullingVolume, results: &mut Vec<EntityKey>);

    /// Remove all entities.
    fn clear(&mut self);

    /// Number of indexed entities.
    fn len(&self) -> usize;

    /// Whether nothing is indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
