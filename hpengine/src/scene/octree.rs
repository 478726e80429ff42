/// Octree: loose spatial index for frustum culling.
///
/// The whole tree is spanned once at construction down to `max_deepness`
/// and stored as a flat, depth-first node array. Inserting never allocates
/// nodes: an entity descends into the child octant holding its center while
/// that child's *loose* AABB (twice the node size) contains its bounds min,
/// max and center, and is
/// mapped to the node where the descent stops. Each entity is mapped to
/// exactly one node.
///
/// `optimize()` collapses subtrees according to the `MergePolicy`: the
/// collapsed node takes over every descendant entity and stops exposing its
/// children. The nodes themselves are kept; `clear()` restores them.

use rustc_hash::FxHashMap;
use glam::Vec3;
use crate::camera::{CullingVolume, FrustumTest};
use crate::config::{MergePolicy, OctreeConfig, MAX_OCTREE_DEEPNESS};
use crate::error::Result;
use super::bounds::{AABB, EntityBounds, Spatial};
use super::entity::EntityKey;
use super::scene_index::SceneIndex;

/// Index of a node in the octree's node array.
pub type NodeId = usize;

/// Index of the root node in the flat node array.
pub const ROOT: NodeId = 0;

/// A single octree cell.
#[derive(Debug, Clone)]
pub struct Node {
    center: Vec3,
    size: f32,
    deepness: u32,
    aabb: AABB,
    loose_aabb: AABB,
    /// Index of the first child in the flat array (0 = spanned as a leaf)
    first_child: usize,
    has_children: bool,
    entities: Vec<EntityKey>,
}

impl Node {
    fn new(center: Vec3, size: f32, deepness: u32) -> Self {
        Self {
            center,
            size,
            deepness,
            aabb: AABB::from_center_size(center, size),
            loose_aabb: AABB::from_center_size(center, size * 2.0),
            first_child: 0,
            has_children: false,
            entities: Vec::new(),
        }
    }

    /// Cell center.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Full edge length.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Depth in the tree (root = 0).
    pub fn deepness(&self) -> u32 {
        self.deepness
    }

    /// Tight bounds: center ± size / 2.
    pub fn aabb(&self) -> &AABB {
        &self.aabb
    }

    /// Loose bounds: center ± size.
    pub fn loose_aabb(&self) -> &AABB {
        &self.loose_aabb
    }

    /// Whether the 8 children are currently part of the tree.
    pub fn has_children(&self) -> bool {
        self.has_children
    }

    /// Entities mapped directly to this node.
    pub fn entities(&self) -> &[EntityKey] {
        &self.entities
    }
}

/// Loose octree over `EntityKey`s.
pub struct Octree {
    /// Flat array of all nodes, depth-first
    nodes: Vec<Node>,
    max_deepness: u32,
    /// subtree_sizes[d] = node count of a subtree spanning d more levels
    subtree_sizes: Vec<usize>,
    /// Reverse lookup: entity → (node, bounds at insertion time)
    entity_nodes: FxHashMap<EntityKey, (NodeId, EntityBounds)>,
    merge_policy: MergePolicy,
}

impl Octree {
    /// Span a full tree of edge length `size` around `center`.
    ///
    /// Total nodes = (8^(d+1) - 1) / 7. `max_deepness` above
    /// `MAX_OCTREE_DEEPNESS` is clamped.
    pub fn new(center: Vec3, size: f32, max_deepness: u32) -> Self {
        let max_deepness = if max_deepness > MAX_OCTREE_DEEPNESS {
            crate::engine_warn!("hpengine::Octree",
                "max_deepness {} clamped to {}", max_deepness, MAX_OCTREE_DEEPNESS);
            MAX_OCTREE_DEEPNESS
        } else {
            max_deepness
        };

        let total_nodes = Self::total_node_count(max_deepness);
        let mut nodes = Vec::with_capacity(total_nodes);
        Self::span(&mut nodes, center, size, 0, max_deepness);
        debug_assert_eq!(nodes.len(), total_nodes);

        crate::engine_debug!("hpengine::Octree",
            "Spanned octree: size {}, deepness {}, {} nodes", size, max_deepness, total_nodes);

        Self {
            nodes,
            max_deepness,
            subtree_sizes: (0..=max_deepness).map(Self::total_node_count).collect(),
            entity_nodes: FxHashMap::default(),
            merge_policy: MergePolicy::default(),
        }
    }

    /// Build from a validated configuration.
    pub fn from_config(config: &OctreeConfig) -> Result<Self> {
        config.validate()?;
        let mut octree = Self::new(config.center, config.size, config.max_deepness);
        octree.merge_policy = config.merge_policy;
        Ok(octree)
    }

    /// Total number of nodes for a given depth: (8^(d+1) - 1) / 7
    fn total_node_count(max_deepness: u32) -> usize {
        let mut count = 0usize;
        let mut level_count = 1usize;
        for _ in 0..=max_deepness {
            count += level_count;
            level_count *= 8;
        }
        count
    }

    /// Recursively build the node array (depth-first).
    ///
    /// Octant bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = low, 1 = high).
    fn span(nodes: &mut Vec<Node>, center: Vec3, size: f32, deepness: u32, max_deepness: u32) {
        let node_index = nodes.len();
        nodes.push(Node::new(center, size, deepness));

        if deepness >= max_deepness {
            return;
        }

        nodes[node_index].first_child = nodes.len();
        nodes[node_index].has_children = true;

        let quarter = size * 0.25;
        for octant in 0..8u8 {
            let offset = Vec3::new(
                if octant & 1 == 0 { -quarter } else { quarter },
                if octant & 2 == 0 { -quarter } else { quarter },
                if octant & 4 == 0 { -quarter } else { quarter },
            );
            Self::span(nodes, center + offset, size * 0.5, deepness + 1, max_deepness);
        }
    }

    /// Ids of the 8 spanned children of an internal node, in octant order.
    fn child_ids(&self, id: NodeId) -> [NodeId; 8] {
        let node = &self.nodes[id];
        let stride = self.subtree_sizes[(self.max_deepness - node.deepness - 1) as usize];
        let first = node.first_child;
        std::array::from_fn(|octant| first + octant * stride)
    }

    /// Octant of `point` relative to a node center (same bit layout as `span`).
    fn octant_of(center: Vec3, point: Vec3) -> usize {
        (point.x >= center.x) as usize
            | ((point.y >= center.y) as usize) << 1
            | ((point.z >= center.z) as usize) << 2
    }

    /// Deepest node the bounds descend to.
    ///
    /// At each level only the child whose octant holds the entity center is
    /// a candidate; the descent stops when its loose bounds do not contain
    /// min, max and center.
    fn locate(&self, bounds: &EntityBounds) -> NodeId {
        let mut id = ROOT;
        loop {
            let node = &self.nodes[id];
            if !node.has_children {
                return id;
            }
            let child = self.child_ids(id)[Self::octant_of(node.center, bounds.center)];
            let loose = &self.nodes[child].loose_aabb;
            let fits = loose.contains_point(bounds.aabb.min)
                && loose.contains_point(bounds.aabb.max)
                && loose.contains_point(bounds.center);
            if !fits {
                return id;
            }
            id = child;
        }
    }

    /// Unmap an entity from whichever node holds it.
    fn detach(&mut self, key: EntityKey) -> Option<(NodeId, EntityBounds)> {
        let (id, bounds) = self.entity_nodes.remove(&key)?;
        let entities = &mut self.nodes[id].entities;
        if let Some(pos) = entities.iter().position(|&k| k == key) {
            entities.swap_remove(pos);
        }
        Some((id, bounds))
    }

    fn attach(&mut self, key: EntityKey, bounds: EntityBounds) -> NodeId {
        let id = self.locate(&bounds);
        self.nodes[id].entities.push(key);
        self.entity_nodes.insert(key, (id, bounds));
        id
    }

    // ===== MUTATION =====

    /// Insert (or move) an entity, then `optimize()`.
    pub fn insert<E: Spatial + ?Sized>(&mut self, key: EntityKey, entity: &E) {
        self.insert_without_optimize(key, entity);
        self.optimize();
    }

    /// Insert (or move) an entity without touching the tree structure.
    ///
    /// Returns the node the entity was mapped to. An already indexed key
    /// is moved, never duplicated.
    pub fn insert_without_optimize<E: Spatial + ?Sized>(&mut self, key: EntityKey, entity: &E) -> NodeId {
        self.detach(key);
        self.attach(key, EntityBounds::of(entity))
    }

    /// Insert a batch, then `optimize()` once. Returns the number inserted.
    pub fn insert_all<'a, I, E>(&mut self, entities: I) -> usize
    where
        I: IntoIterator<Item = (EntityKey, &'a E)>,
        E: Spatial + ?Sized + 'a,
    {
        let mut count = 0;
        for (key, entity) in entities {
            self.insert_without_optimize(key, entity);
            count += 1;
        }
        self.optimize();
        crate::engine_debug!("hpengine::Octree", "Batch inserted {} entities", count);
        count
    }

    /// Re-place an indexed entity after it moved.
    ///
    /// Returns `false` if the key is not indexed. Does not optimize.
    pub fn update<E: Spatial + ?Sized>(&mut self, key: EntityKey, entity: &E) -> bool {
        let bounds = EntityBounds::of(entity);
        let current = match self.entity_nodes.get(&key) {
            Some(&(id, _)) => id,
            None => return false,
        };

        let target = self.locate(&bounds);
        if target == current {
            if let Some(entry) = self.entity_nodes.get_mut(&key) {
                entry.1 = bounds;
            }
        } else {
            self.detach(key);
            self.nodes[target].entities.push(key);
            self.entity_nodes.insert(key, (target, bounds));
        }
        true
    }

    /// Remove an entity. Returns whether it was indexed.
    pub fn remove(&mut self, key: EntityKey) -> bool {
        self.detach(key).is_some()
    }

    /// Drop every entity and restore the full spanned structure.
    pub fn clear(&mut self) {
        for node in &mut self.nodes {
            node.entities.clear();
            node.has_children = node.first_child != 0;
        }
        self.entity_nodes.clear();
    }

    /// Restore the full structure and re-place every indexed entity from
    /// its stored bounds, then `optimize()`.
    pub fn rebuild(&mut self) {
        let entries: Vec<(EntityKey, EntityBounds)> = self.entity_nodes
            .drain()
            .map(|(key, (_, bounds))| (key, bounds))
            .collect();
        self.clear();
        for (key, bounds) in entries {
            self.attach(key, bounds);
        }
        self.optimize();
    }

    /// Collapse subtrees according to the merge policy.
    ///
    /// Top-down; the root is never collapsed. A collapsed node receives all
    /// descendant entities and stops exposing its children. Returns the
    /// number of nodes collapsed.
    pub fn optimize(&mut self) -> usize {
        if self.merge_policy == MergePolicy::Never || !self.nodes[ROOT].has_children {
            return 0;
        }

        let mut collapsed = 0;
        let mut stack: Vec<NodeId> = self.child_ids(ROOT).to_vec();
        while let Some(id) = stack.pop() {
            if !self.nodes[id].has_children {
                continue;
            }
            if self.should_collapse(id) {
                self.collapse(id);
                collapsed += 1;
            } else {
                stack.extend(self.child_ids(id));
            }
        }

        if collapsed > 0 {
            crate::engine_trace!("hpengine::Octree", "Optimize collapsed {} nodes", collapsed);
        }
        collapsed
    }

    fn should_collapse(&self, id: NodeId) -> bool {
        match self.merge_policy {
            MergePolicy::DirectOccupancy => !self.nodes[id].entities.is_empty(),
            MergePolicy::FillFactor { max_entities } => {
                let count = self.subtree_entity_count(id);
                count > 0 && count <= max_entities
            }
            MergePolicy::Never => false,
        }
    }

    fn subtree_entity_count(&self, id: NodeId) -> usize {
        let node = &self.nodes[id];
        let mut count = node.entities.len();
        if node.has_children {
            for child in self.child_ids(id) {
                count += self.subtree_entity_count(child);
            }
        }
        count
    }

    fn collapse(&mut self, id: NodeId) {
        let mut gathered = Vec::new();
        let mut stack: Vec<NodeId> = self.child_ids(id).to_vec();
        while let Some(child) = stack.pop() {
            gathered.append(&mut self.nodes[child].entities);
            if self.nodes[child].has_children {
                stack.extend(self.child_ids(child));
            }
        }

        for key in &gathered {
            if let Some(entry) = self.entity_nodes.get_mut(key) {
                entry.0 = id;
            }
        }

        let node = &mut self.nodes[id];
        node.entities.extend(gathered);
        node.has_children = false;
    }

    // ===== QUERIES =====

    /// Entities of every node whose loose bounds are visible.
    ///
    /// Each node is tested with a bounding-sphere check and then a 3-way
    /// AABB classification:
    /// - `Outside` → skip entire subtree
    /// - `Inside` → collect the whole subtree without further tests
    /// - `Partial` → take the node's entities, recurse into children
    pub fn get_visible<V: CullingVolume + ?Sized>(&self, volume: &V) -> Vec<EntityKey> {
        let mut results = Vec::new();
        self.get_visible_into(volume, &mut results);
        results
    }

    /// `get_visible` appending into a caller-owned buffer.
    pub fn get_visible_into<V: CullingVolume + ?Sized>(&self, volume: &V, results: &mut Vec<EntityKey>) {
        self.query_recursive(ROOT, volume, results);
    }

    fn query_recursive<V: CullingVolume + ?Sized>(
        &self,
        id: NodeId,
        volume: &V,
        results: &mut Vec<EntityKey>,
    ) {
        let node = &self.nodes[id];
        let loose = &node.loose_aabb;

        if !volume.sphere_in_frustum(loose.center(), loose.bounding_radius()) {
            return;
        }

        match volume.classify_aabb(loose) {
            FrustumTest::Outside => {}
            FrustumTest::Inside => self.collect_all(id, results),
            FrustumTest::Partial => {
                results.extend_from_slice(&node.entities);
                if node.has_children {
                    for child in self.child_ids(id) {
                        self.query_recursive(child, volume, results);
                    }
                }
            }
        }
    }

    /// Collect all entities from a node and its reachable subtree.
    fn collect_all(&self, id: NodeId, results: &mut Vec<EntityKey>) {
        let node = &self.nodes[id];
        results.extend_from_slice(&node.entities);
        if node.has_children {
            for child in self.child_ids(id) {
                self.collect_all(child, results);
            }
        }
    }

    /// Every entity reachable from the root.
    pub fn all_entities(&self) -> Vec<EntityKey> {
        let mut results = Vec::with_capacity(self.entity_nodes.len());
        self.collect_all(ROOT, &mut results);
        results
    }

    /// Node an entity is mapped to.
    pub fn node_of(&self, key: EntityKey) -> Option<NodeId> {
        self.entity_nodes.get(&key).map(|&(id, _)| id)
    }

    /// Bounds an entity was last inserted or updated with.
    pub fn bounds_of(&self, key: EntityKey) -> Option<&EntityBounds> {
        self.entity_nodes.get(&key).map(|(_, bounds)| bounds)
    }

    /// Whether the entity is indexed.
    pub fn contains(&self, key: EntityKey) -> bool {
        self.entity_nodes.contains_key(&key)
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Root node.
    pub fn root(&self) -> &Node {
        &self.nodes[ROOT]
    }

    /// Children of a node if they are currently part of the tree.
    pub fn children(&self, id: NodeId) -> Option<[NodeId; 8]> {
        match self.nodes.get(id) {
            Some(node) if node.has_children => Some(self.child_ids(id)),
            _ => None,
        }
    }

    /// Number of indexed entities.
    pub fn entity_count(&self) -> usize {
        self.entity_nodes.len()
    }

    /// Number of spanned nodes (independent of collapsing).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth the tree was spanned to.
    pub fn max_deepness(&self) -> u32 {
        self.max_deepness
    }

    /// Depth of the deepest node still reachable from the root.
    pub fn current_deepness(&self) -> u32 {
        let mut deepest = 0;
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            deepest = deepest.max(node.deepness);
            if node.has_children {
                stack.extend(self.child_ids(id));
            }
        }
        deepest
    }

    /// Tight bounds of every reachable node holding entities (debug boxes).
    pub fn occupied_node_bounds(&self) -> Vec<AABB> {
        let mut boxes = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.entities.is_empty() {
                boxes.push(node.aabb);
            }
            if node.has_children {
                stack.extend(self.child_ids(id));
            }
        }
        boxes
    }

    /// Collapse heuristic in use.
    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }

    /// Change the collapse heuristic. Takes effect on the next `optimize()`.
    pub fn set_merge_policy(&mut self, policy: MergePolicy) {
        self.merge_policy = policy;
    }
}

impl Default for Octree {
    fn default() -> Self {
        let config = OctreeConfig::default();
        Self::new(config.center, config.size, config.max_deepness)
    }
}

// ===== SCENE INDEX TRAIT =====

impl SceneIndex for Octree {
    fn insert(&mut self, key: EntityKey, bounds: &EntityBounds) {
        self.insert_without_optimize(key, bounds);
    }

    fn remove(&mut self, key: EntityKey) -> bool {
        Octree::remove(self, key)
    }

    fn update(&mut self, key: EntityKey, bounds: &EntityBounds) -> bool {
        Octree::update(self, key, bounds)
    }

    fn optimize(&mut self) {
        Octree::optimize(self);
    }

    fn query_visible(&self, volume: &dyn CullingVolume, results: &mut Vec<EntityKey>) {
        self.get_visible_into(volume, results);
    }

    fn clear(&mut self) {
        Octree::clear(self);
    }

    fn len(&self) -> usize {
        self.entity_count()
    }
}

#[cfg(test)]
#[path = "octree_tests.rs"]
mod tests;
