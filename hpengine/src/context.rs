/// EngineContext: validated configuration plus the behavior registry.
///
/// Built once at startup and passed by reference to whatever needs it.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::scene::{Behavior, BehaviorParams, BehaviorRegistry, EntityKey, World};

pub struct EngineContext {
    config: EngineConfig,
    behaviors: BehaviorRegistry,
}

impl EngineContext {
    /// Validate `config` and create a context with the built-in behaviors.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_registry(config, BehaviorRegistry::with_builtins())
    }

    /// Validate `config` and use a caller-provided registry.
    pub fn with_registry(config: EngineConfig, behaviors: BehaviorRegistry) -> Result<Self> {
        if let Err(error) = config.validate() {
            crate::engine_error!("hpengine::EngineContext", "Invalid configuration: {}", error);
            return Err(error);
        }
        crate::engine_info!("hpengine::EngineContext",
            "Engine context ready (octree size {}, max deepness {}, frustum culling {})",
            config.octree.size, config.octree.max_deepness, config.use_frustum_culling);
        Ok(Self { config, behaviors })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    pub fn behaviors_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.behaviors
    }

    /// Instantiate a registered behavior by name.
    pub fn create_behavior(&self, name: &str, params: &BehaviorParams) -> Result<Box<dyn Behavior>> {
        self.behaviors.create(name, params)
    }

    /// Instantiate a registered behavior and attach it to `key`.
    pub fn attach_behavior(
        &self,
        world: &mut World,
        key: EntityKey,
        name: &str,
        params: &BehaviorParams,
    ) -> Result<()> {
        let behavior = self.create_behavior(name, params)?;
        world.attach_behavior(key, behavior)
    }
}
