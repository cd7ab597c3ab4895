//! Screen-space intersection scanning over rendered landmark nodes
//!
//! The renderer is reached only through [`SceneGraph`]; parent links, frames
//! and anchor lookup are all injected, so the scan works against any scene
//! representation. [`SceneIndex`] is an explicit in-memory implementation.

use crate::algorithms::cluster_merge::merge_by_common_elements;
use crate::core::AnchorId;
use nalgebra::Vector2;
use std::collections::{BTreeSet, HashMap};

/// Reference to a renderer node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Axis-aligned rectangle in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub origin: Vector2<f64>,
    pub size: Vector2<f64>,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Vector2::new(x, y),
            size: Vector2::new(width, height),
        }
    }

    pub fn from_center(center: Vector2<f64>, size: Vector2<f64>) -> Self {
        Self {
            origin: center - size / 2.0,
            size,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.x
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.y
    }

    /// Overlap with positive area; rectangles sharing only an edge do not intersect
    pub fn intersects(&self, other: &ScreenRect) -> bool {
        self.min_x() < other.max_x()
            && self.max_x() > other.min_x()
            && self.min_y() < other.max_y()
            && self.max_y() > other.min_y()
    }
}

/// Boundary to the external renderer's node hierarchy
pub trait SceneGraph {
    /// Direct children of the scene root (generation 0)
    fn top_level_nodes(&self) -> Vec<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Parent of `node`; `None` for top-level nodes
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Frame of `node` projected into scene coordinates; `None` if not on screen
    fn frame_in_scene(&self, node: NodeId) -> Option<ScreenRect>;

    /// Anchor rendered by `node`, if it is an anchor root
    fn anchor_for(&self, node: NodeId) -> Option<AnchorId>;

    fn set_hidden(&mut self, node: NodeId, hidden: bool);

    /// Draw order; higher draws on top
    fn set_z_position(&mut self, node: NodeId, z_position: f64);

    /// Drop the nodes rendering `anchor` once its landmark is removed
    fn detach_anchor(&mut self, _anchor: AnchorId) {}
}

/// All nodes exactly `generation` levels below the scene root
pub fn nodes_at_generation<S: SceneGraph + ?Sized>(scene: &S, generation: u32) -> Vec<NodeId> {
    let mut nodes = scene.top_level_nodes();
    for _ in 0..generation {
        nodes = nodes.into_iter().flat_map(|node| scene.children(node)).collect();
    }
    nodes
}

/// Walk `generation` parent links up from `node`
pub fn ancestor_at<S: SceneGraph + ?Sized>(scene: &S, node: NodeId, generation: u32) -> Option<NodeId> {
    let mut current = Some(node);
    for _ in 0..generation {
        current = current.and_then(|n| scene.parent(n));
    }
    current
}

/// Anchor owning a node found at `generation` below its anchor root
pub fn anchor_for_node<S: SceneGraph + ?Sized>(scene: &S, node: NodeId, generation: u32) -> Option<AnchorId> {
    ancestor_at(scene, node, generation).and_then(|root| scene.anchor_for(root))
}

/// Outcome of one intersection scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intersections {
    /// Disjoint groups of transitively overlapping nodes
    pub groups: Vec<Vec<NodeId>>,
    /// Nodes overlapping nothing, in scan order
    pub independents: Vec<NodeId>,
    /// Generation the scan ran at
    pub generation: u32,
}

impl Intersections {
    pub fn node_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum::<usize>() + self.independents.len()
    }
}

/// Pairwise bounding-box scan at a fixed scene-graph generation
#[derive(Debug, Clone, Copy)]
pub struct IntersectionProbe {
    generation: u32,
}

impl IntersectionProbe {
    pub fn new(generation: u32) -> Self {
        Self { generation }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Collect overlapping pairs, merge them into groups and return the rest as independents
    pub fn scan<S: SceneGraph + ?Sized>(&self, scene: &S) -> Intersections {
        let nodes = nodes_at_generation(scene, self.generation);
        let frames: Vec<Option<ScreenRect>> = nodes.iter().map(|&node| scene.frame_in_scene(node)).collect();

        let mut pairs = Vec::new();
        for i in 0..nodes.len() {
            let Some(frame) = frames[i] else { continue };
            for j in (i + 1)..nodes.len() {
                if let Some(other) = frames[j] {
                    if frame.intersects(&other) {
                        pairs.push(BTreeSet::from([nodes[i], nodes[j]]));
                    }
                }
            }
        }

        let merged = merge_by_common_elements(pairs);
        let grouped: BTreeSet<NodeId> = merged.iter().flatten().copied().collect();
        let mut seen = BTreeSet::new();
        let independents = nodes
            .into_iter()
            .filter(|node| !grouped.contains(node) && seen.insert(*node))
            .collect();

        Intersections {
            groups: merged.into_iter().map(|group| group.into_iter().collect()).collect(),
            independents,
            generation: self.generation,
        }
    }
}

/// A node held by [`SceneIndex`]
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Center of the node in its parent's coordinate space
    pub position: Vector2<f64>,
    pub size: Vector2<f64>,
    pub anchor: Option<AnchorId>,
    pub hidden: bool,
    pub z_position: f64,
}

/// Explicit node index standing in for a renderer scene graph
#[derive(Debug, Clone, Default)]
pub struct SceneIndex {
    nodes: HashMap<NodeId, SceneNode>,
    top_level: Vec<NodeId>,
    next_id: u64,
}

impl SceneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zero-sized anchor root at a projected screen position
    pub fn add_anchor_node(&mut self, anchor: AnchorId, position: Vector2<f64>) -> NodeId {
        let node = self.insert(None, position, Vector2::zeros());
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.anchor = Some(anchor);
        }
        node
    }

    /// Add a node under `parent`, or at the top level when `parent` is `None`.
    /// Returns `None` when `parent` is unknown.
    pub fn add_node(&mut self, parent: Option<NodeId>, position: Vector2<f64>, size: Vector2<f64>) -> Option<NodeId> {
        if let Some(parent) = parent {
            if !self.nodes.contains_key(&parent) {
                return None;
            }
        }
        Some(self.insert(parent, position, size))
    }

    fn insert(&mut self, parent: Option<NodeId>, position: Vector2<f64>, size: Vector2<f64>) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            SceneNode {
                parent,
                children: Vec::new(),
                position,
                size,
                anchor: None,
                hidden: false,
                z_position: 0.0,
            },
        );
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent_node) => parent_node.children.push(id),
            None => self.top_level.push(id),
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_hidden(&self, id: NodeId) -> Option<bool> {
        self.nodes.get(&id).map(|node| node.hidden)
    }

    pub fn z_position(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(&id).map(|node| node.z_position)
    }

    /// Move a node within its parent's space
    pub fn set_position(&mut self, id: NodeId, position: Vector2<f64>) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Anchor root node for an anchor
    pub fn node_for_anchor(&self, anchor: AnchorId) -> Option<NodeId> {
        self.top_level
            .iter()
            .copied()
            .find(|id| self.nodes.get(id).and_then(|n| n.anchor) == Some(anchor))
    }

    /// Detach the anchor root for `anchor` together with all its descendants
    pub fn remove_anchor(&mut self, anchor: AnchorId) -> bool {
        match self.node_for_anchor(anchor) {
            Some(root) => {
                self.remove_subtree(root);
                true
            }
            None => false,
        }
    }

    /// Remove a node and every descendant
    pub fn remove_subtree(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else { return };
        match node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.top_level.retain(|top| *top != id),
        }

        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                stack.extend(removed.children);
            }
        }
    }

    fn scene_center(&self, id: NodeId) -> Option<Vector2<f64>> {
        let mut node = self.nodes.get(&id)?;
        let mut center = node.position;
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            center += node.position;
        }
        Some(center)
    }
}

impl SceneGraph for SceneIndex {
    fn top_level_nodes(&self) -> Vec<NodeId> {
        self.top_level.clone()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.get(&node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn frame_in_scene(&self, node: NodeId) -> Option<ScreenRect> {
        let size = self.nodes.get(&node)?.size;
        self.scene_center(node).map(|center| ScreenRect::from_center(center, size))
    }

    fn anchor_for(&self, node: NodeId) -> Option<AnchorId> {
        self.nodes.get(&node).and_then(|n| n.anchor)
    }

    fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.hidden = hidden;
        }
    }

    fn set_z_position(&mut self, node: NodeId, z_position: f64) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.z_position = z_position;
        }
    }

    fn detach_anchor(&mut self, anchor: AnchorId) {
        self.remove_anchor(anchor);
    }
}
