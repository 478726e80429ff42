/// Per-entity behaviors.
///
/// A Behavior is user logic attached to an entity and driven once per
/// simulation tick. Behaviors are resolved by name through a
/// `BehaviorRegistry` of factories, so new behaviors plug in by
/// registration instead of recompiling the engine.

use glam::Vec3;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use super::entity::{EntityKey, Transform};

/// User-extensible per-entity logic.
///
/// `init` runs once when the behavior is attached, `update` once per tick.
/// Both receive the entity's transform; any change to it is picked up by
/// the spatial index on the same tick.
pub trait Behavior: Send {
    /// Called once when attached to `entity`.
    fn init(&mut self, _entity: EntityKey, _transform: &mut Transform) -> Result<()> {
        Ok(())
    }

    /// Called once per simulation tick.
    fn update(&mut self, entity: EntityKey, transform: &mut Transform, delta_seconds: f32) -> Result<()>;
}

/// Named numeric parameters handed to a behavior factory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BehaviorParams {
    values: FxHashMap<String, f32>,
}

impl BehaviorParams {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f32) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Value or `default` when absent.
    pub fn get_or(&self, name: &str, default: f32) -> f32 {
        self.values.get(name).copied().unwrap_or(default)
    }

    /// `{prefix}_x`, `{prefix}_y`, `{prefix}_z` as a vector.
    pub fn vec3_or(&self, prefix: &str, default: Vec3) -> Vec3 {
        Vec3::new(
            self.get_or(&format!("{}_x", prefix), default.x),
            self.get_or(&format!("{}_y", prefix), default.y),
            self.get_or(&format!("{}_z", prefix), default.z),
        )
    }
}

/// Factory creating a behavior instance from parameters.
pub type BehaviorFactory = Box<dyn Fn(&BehaviorParams) -> Result<Box<dyn Behavior>> + Send + Sync>;

/// Name → factory registry.
pub struct BehaviorRegistry {
    factories: FxHashMap<String, BehaviorFactory>,
}

impl BehaviorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self { factories: FxHashMap::default() }
    }

    /// Registry pre-populated with `spin`, `linear_motion` and `oscillate`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("spin", |params| {
            Ok(Box::new(Spin {
                axis: params.vec3_or("axis", Vec3::Y),
                radians_per_second: params.get_or("speed", 1.0),
            }) as Box<dyn Behavior>)
        });
        registry.register("linear_motion", |params| {
            Ok(Box::new(LinearMotion {
                velocity: params.vec3_or("velocity", Vec3::ZERO),
            }) as Box<dyn Behavior>)
        });
        registry.register("oscillate", |params| {
            let frequency = params.get_or("frequency", 1.0);
            if frequency <= 0.0 {
                return Err(Error::InvalidArgument(format!(
                    "oscillate frequency must be positive, got {}", frequency
                )));
            }
            Ok(Box::new(Oscillate {
                axis: params.vec3_or("axis", Vec3::Y),
                amplitude: params.get_or("amplitude", 1.0),
                frequency,
                origin: Vec3::ZERO,
                elapsed: 0.0,
            }) as Box<dyn Behavior>)
        });
        registry
    }

    /// Register (or replace) a factory under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BehaviorParams) -> Result<Box<dyn Behavior>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Box::new(factory)).is_some() {
            crate::engine_warn!("hpengine::BehaviorRegistry", "Behavior '{}' replaced", name);
        }
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the behavior registered under `name`.
    pub fn create(&self, name: &str, params: &BehaviorParams) -> Result<Box<dyn Behavior>> {
        let factory = self.factories.get(name)
            .ok_or_else(|| crate::engine_err!("hpengine::BehaviorRegistry",
                "Unknown behavior '{}'", name))?;
        factory(params)
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ===== BUILT-IN BEHAVIORS =====

/// Constant rotation around an axis.
pub struct Spin {
    /// Rotation axis (normalized on use)
    pub axis: Vec3,
    /// Angular speed
    pub radians_per_second: f32,
}

impl Behavior for Spin {
    fn update(&mut self, _entity: EntityKey, transform: &mut Transform, delta_seconds: f32) -> Result<()> {
        transform.rotate(self.axis, self.radians_per_second * delta_seconds);
        Ok(())
    }
}

/// Constant velocity.
pub struct LinearMotion {
    /// World units per second
    pub velocity: Vec3,
}

impl Behavior for LinearMotion {
    fn update(&mut self, _entity: EntityKey, transform: &mut Transform, delta_seconds: f32) -> Result<()> {
        transform.translate(self.velocity * delta_seconds);
        Ok(())
    }
}

/// Sinusoidal motion around the position the entity had at init.
pub struct Oscillate {
    axis: Vec3,
    amplitude: f32,
    frequency: f32,
    origin: Vec3,
    elapsed: f32,
}

impl Behavior for Oscillate {
    fn init(&mut self, _entity: EntityKey, transform: &mut Transform) -> Result<()> {
        self.origin = transform.translation;
        self.elapsed = 0.0;
        Ok(())
    }

    fn update(&mut self, _entity: EntityKey, transform: &mut Transform, delta_seconds: f32) -> Result<()> {
        self.elapsed += delta_seconds;
        let phase = self.elapsed * self.frequency * std::f32::consts::TAU;
        transform.translation = self.origin + self.axis.normalize_or_zero() * self.amplitude * phase.sin();
        Ok(())
    }
}
