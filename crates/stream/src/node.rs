use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec3;
use terrastream_common::Aabb;
use terrastream_mesh::{Geometry, GeometryHandle, MeshRequest};

use crate::node_id::NodeId;

/// Strong handle to a node. The root map, a parent's child array and the pending
/// queue are the only holders.
pub type NodeHandle = Rc<RefCell<TerrainNode>>;

/// Non-owning back-reference to a parent node.
pub type WeakNode = Weak<RefCell<TerrainNode>>;

/// One cube of terrain at one level of detail.
#[derive(Debug)]
pub struct TerrainNode {
    id: NodeId,
    depth: u8,
    position: Vec3,
    size: Vec3,
    pub(crate) distance: f32,
    pub(crate) alpha: f32,
    pub(crate) visible: bool,
    children: Option<Box<[NodeHandle; 8]>>,
    parent: WeakNode,
    geometry: GeometryHandle,
}

impl TerrainNode {
    pub(crate) fn new(id: NodeId, bounds: Aabb, parent: WeakNode) -> Self {
        Self {
            id,
            depth: id.depth(),
            position: bounds.min,
            size: bounds.size(),
            distance: f32::INFINITY,
            alpha: 1.0,
            visible: false,
            children: None,
            parent,
            geometry: Geometry::new_handle(),
        }
    }

    pub(crate) fn into_handle(self) -> NodeHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// World-space minimum corner.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Vec3 {
        self.position + self.size * 0.5
    }

    /// Camera distance from the last LOD pass; infinite until the first one.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Crossfade factor in `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn is_split(&self) -> bool {
        self.children.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn children(&self) -> Option<&[NodeHandle; 8]> {
        self.children.as_deref()
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent.upgrade()
    }

    pub fn geometry(&self) -> &GeometryHandle {
        &self.geometry
    }

    pub fn is_ready(&self) -> bool {
        self.geometry.is_ready()
    }

    /// True when split and every child has ready geometry.
    pub fn children_ready(&self) -> bool {
        self.children()
            .is_some_and(|children| children.iter().all(|c| c.borrow().is_ready()))
    }

    pub fn mesh_request(&self) -> MeshRequest {
        MeshRequest {
            position: self.position,
            size: self.size,
            depth: self.depth,
        }
    }

    pub(crate) fn attach_children(&mut self, children: [NodeHandle; 8]) {
        assert!(self.is_leaf(), "node {} is already split", self.id);
        self.children = Some(Box::new(children));
    }

    pub(crate) fn detach_children(&mut self) -> Box<[NodeHandle; 8]> {
        match self.children.take() {
            Some(children) => children,
            None => panic!("node {} is not split", self.id),
        }
    }
}

/// Visit `node` and its whole subtree, parents before children.
pub fn walk(node: &NodeHandle, visit: &mut impl FnMut(&TerrainNode)) {
    let n = node.borrow();
    visit(&n);
    if let Some(children) = n.children() {
        for child in children {
            walk(child, visit);
        }
    }
}

/// Number of nodes in the subtree rooted at `node`, including itself.
pub fn subtree_len(node: &NodeHandle) -> usize {
    let mut count = 0;
    walk(node, &mut |_| count += 1);
    count
}
