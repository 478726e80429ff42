//! Camera module: camera, frustum and the culling volume abstraction.
//!
//! Cameras are passive data owned by the simulation thread. A snapshot is
//! copied into each published `RenderState`.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{
    CullingVolume, Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
