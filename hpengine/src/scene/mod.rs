//! Scene module
//!
//! Provides the entity world, behaviors, the octree spatial index and the
//! culling strategies built on it.

mod bounds;
mod entity;
mod behavior;
mod world;
mod scene_index;
mod octree;
mod culler;

pub use bounds::{AABB, EntityBounds, Spatial};
pub use entity::{
    EntityKey, Entity, Transform,
    Renderable, RenderFlags, MeshHandle, MaterialHandle,
    PointLight, DirectionalLight,
};
pub use behavior::{
    Behavior, BehaviorFactory, BehaviorParams, BehaviorRegistry,
    Spin, LinearMotion, Oscillate,
};
pub use world::{World, BehaviorPass};
pub use scene_index::SceneIndex;
pub use octree::{Octree, Node, NodeId, ROOT};
pub use culler::{Culler, BruteForceCuller, FrustumCuller};
