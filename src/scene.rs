//! Minimal scene graph: lights, line meshes and overlay anchors.
//!
//! Nodes are stored flat in a `BTreeMap` keyed by [`NodeId`] with parent/child links,
//! so traversal order is deterministic. GPU-side data is referenced by opaque
//! [`ResourceId`] handles owned by the render backend.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::DVec3;

/// Scene node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Handle of a GPU resource allocated by the render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Ambient { color: u32, intensity: f64 },
    Directional { color: u32, intensity: f64, position: DVec3 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub resource: ResourceId,
    pub color: [f32; 4],
    /// Textures referenced by this material. Released together with it.
    pub textures: Vec<ResourceId>,
}

/// A line-list mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: ResourceId,
    pub vertex_count: usize,
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Light(Light),
    Mesh(Mesh),
    /// Anchor of a DOM overlay element. Only the world position lives here; the
    /// element itself is owned by the overlay service.
    Overlay { position: DVec3 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Shared handle: the scene manager owns the scene, the overlay service reads it.
pub type SceneHandle = Rc<RefCell<Scene>>;

#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    roots: Vec<NodeId>,
    next_id: u64,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_handle(self) -> SceneHandle {
        Rc::new(RefCell::new(self))
    }

    /// Add a top-level node.
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        let id = self.alloc_id();
        self.nodes.insert(id, Node { kind, parent: None, children: Vec::new() });
        self.roots.push(id);
        id
    }

    /// Add a node under `parent`. `None` if the parent does not exist.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = self.alloc_id();
        self.nodes.insert(id, Node { kind, parent: Some(parent), children: Vec::new() });
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Some(id)
    }

    /// Detach `id` from its parent and drop it with its whole subtree.
    /// Returns `false` if the node was not in the scene.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        match node.parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&next) {
                stack.extend(removed.children);
            }
        }
        true
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first, pre-order walk over every node.
    #[must_use]
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                order.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// World position of an overlay anchor.
    #[must_use]
    pub fn overlay_position(&self, id: NodeId) -> Option<DVec3> {
        match self.nodes.get(&id)?.kind {
            NodeKind::Overlay { position } => Some(position),
            _ => None,
        }
    }

    /// Move an overlay anchor. Returns `false` if `id` is not an overlay node.
    pub fn set_overlay_position(&mut self, id: NodeId, new_position: DVec3) -> bool {
        match self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            Some(NodeKind::Overlay { position }) => {
                *position = new_position;
                true
            }
            _ => false,
        }
    }

    /// Overlay anchors in traversal order.
    #[must_use]
    pub fn overlays(&self) -> Vec<(NodeId, DVec3)> {
        self.traverse()
            .into_iter()
            .filter_map(|id| self.overlay_position(id).map(|p| (id, p)))
            .collect()
    }

    /// Meshes in traversal order.
    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> + '_ {
        self.traverse().into_iter().filter_map(move |id| match &self.nodes.get(&id)?.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        })
    }

    /// Every GPU resource referenced by the meshes: geometry, materials, and
    /// the textures those materials reference.
    #[must_use]
    pub fn gpu_resources(&self) -> Vec<ResourceId> {
        let mut out = Vec::new();
        for mesh in self.meshes() {
            out.push(mesh.geometry);
            for material in &mesh.materials {
                out.push(material.resource);
                out.extend(material.textures.iter().copied());
            }
        }
        out
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    fn alloc_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }
}

/// Line-list vertices (`x, y, z` triples) for a ground grid on the XZ plane.
///
/// `half_lines` lines are drawn on each side of the axes, spaced by `spacing_x`
/// along X and `spacing_z` along Z, at height `y`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_possible_wrap)]
pub fn ground_grid_vertices(spacing_x: f64, spacing_z: f64, half_lines: usize, y: f64) -> Vec<f32> {
    let n = half_lines as i64;
    let extent_x = spacing_x * half_lines as f64;
    let extent_z = spacing_z * half_lines as f64;
    let mut out = Vec::with_capacity((2 * half_lines + 1) * 2 * 2 * 3);
    for i in -n..=n {
        let x = i as f64 * spacing_x;
        out.extend([x, y, -extent_z, x, y, extent_z].map(|v| v as f32));
        let z = i as f64 * spacing_z;
        out.extend([-extent_x, y, z, extent_x, y, z].map(|v| v as f32));
    }
    out
}
