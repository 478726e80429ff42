//! Engine configuration
//!
//! Plain data structs with sensible defaults. They are handed to
//! `EngineContext::new()`, which validates them once; nothing reads
//! configuration from global state afterwards.

use glam::Vec3;
use crate::error::{Error, Result};

/// Deepest octree the engine will span.
pub const MAX_OCTREE_DEEPNESS: u32 = 7;

/// Policy used by `Octree::optimize()` to decide when a subtree collapses
/// back into its parent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Collapse every non-root internal node that already holds at least one
    /// entity directly. Greedy; reproduces the historical behavior.
    DirectOccupancy,
    /// Collapse a non-root internal node when its whole subtree holds between
    /// 1 and `max_entities` entities.
    FillFactor {
        /// Largest subtree population that still collapses
        max_entities: usize,
    },
    /// Never collapse.
    Never,
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::DirectOccupancy
    }
}

/// Octree construction parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeConfig {
    /// World-space center of the root node
    pub center: Vec3,
    /// Edge length of the root node
    pub size: f32,
    /// Depth of the pre-built tree (root = 0)
    pub max_deepness: u32,
    /// Collapse heuristic applied by `optimize()`
    pub merge_policy: MergePolicy,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            size: 1000.0,
            max_deepness: 6,
            merge_policy: MergePolicy::default(),
        }
    }
}

impl OctreeConfig {
    /// Check the parameters can build a tree.
    pub fn validate(&self) -> Result<()> {
        if !(self.size > 0.0) || !self.size.is_finite() {
            return Err(Error::InitializationFailed(format!(
                "octree size must be a positive finite number, got {}", self.size
            )));
        }
        if !self.center.is_finite() {
            return Err(Error::InitializationFailed(format!(
                "octree center must be finite, got {}", self.center
            )));
        }
        if self.max_deepness > MAX_OCTREE_DEEPNESS {
            return Err(Error::InitializationFailed(format!(
                "octree max_deepness {} exceeds the limit of {}",
                self.max_deepness, MAX_OCTREE_DEEPNESS
            )));
        }
        if let MergePolicy::FillFactor { max_entities: 0 } = self.merge_policy {
            return Err(Error::InitializationFailed(
                "FillFactor merge policy needs max_entities >= 1".to_string()
            ));
        }
        Ok(())
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Spatial index parameters
    pub octree: OctreeConfig,
    /// Cull through the octree. When false every renderable is submitted.
    pub use_frustum_culling: bool,
    /// Cull point lights against the camera frustum
    pub cull_lights: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            octree: OctreeConfig::default(),
            use_frustum_culling: true,
            cull_lights: true,
        }
    }
}

impl EngineConfig {
    /// Validate every sub-configuration.
    pub fn validate(&self) -> Result<()> {
        self.octree.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.octree.size, 1000.0);
        assert_eq!(config.octree.max_deepness, 6);
        assert_eq!(config.octree.merge_policy, MergePolicy::DirectOccupancy);
    }

    #[test]
    fn test_rejects_non_positive_size() {
        let mut config = OctreeConfig::default();
        config.size = 0.0;
        assert!(matches!(config.validate(), Err(Error::InitializationFailed(_))));

        config.size = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_excessive_deepness() {
        let config = OctreeConfig { max_deepness: MAX_OCTREE_DEEPNESS + 1, ..Default::default() };
        assert!(config.validate().is_err());

        let config = OctreeConfig { max_deepness: MAX_OCTREE_DEEPNESS, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_fill_factor() {
        let config = OctreeConfig {
            merge_policy: MergePolicy::FillFactor { max_entities: 0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
