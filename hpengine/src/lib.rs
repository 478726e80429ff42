/*!
# HPEngine

Simulation/render decoupling core of a real-time 3D engine.

The simulation thread owns the world and a loose octree, culls against the
camera every tick and publishes an immutable frame snapshot. The render
thread draws whatever snapshot is current without ever waiting on the
simulation. The two meet only at a multi-buffer.

## Architecture

- **Octree**: pre-spanned loose octree with frustum queries and subtree collapse
- **World**: entity arena with transform, render, light and behavior components
- **TripleBuffer / DoubleBuffer**: command-replay multi-buffers with rotating roles
- **RenderState**: camera, sorted draw batches, lights and a shared instance buffer
- **Simulation / RenderLoop**: the two thread drivers
- **EngineContext**: validated configuration and the behavior registry
*/

// Internal modules
mod error;
mod engine;
mod context;
mod simulation;
pub mod log;
pub mod config;
pub mod camera;
pub mod scene;
pub mod sync;
pub mod render;

// Main hpengine namespace module
pub mod hpengine {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Context and thread drivers
    pub use crate::context::EngineContext;
    pub use crate::simulation::{Simulation, TickStats};
    pub use crate::render::{FrameStats, RenderLoop};

    // Configuration
    pub use crate::config::{EngineConfig, MergePolicy, OctreeConfig, MAX_OCTREE_DEEPNESS};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod sync {
        pub use crate::sync::*;
    }

    pub mod render {
        pub use crate::render::*;
    }
}

// Re-export math library at crate root
pub use glam;
