use terrastream_common::Aabb;
use terrastream_stream::NodeHandle;

/// One wireframe box for the bounds debug view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxLine {
    pub bounds: Aabb,
    pub depth: u8,
    pub color: [f32; 4],
}

/// Debug colour of a level: red, green, blue, yellow, then red again.
pub fn depth_color(depth: u8) -> [f32; 4] {
    match depth {
        1 => [0.0, 1.0, 0.0, 1.0],
        2 => [0.0, 0.0, 1.0, 1.0],
        3 => [1.0, 1.0, 0.0, 1.0],
        _ => [1.0, 0.0, 0.0, 1.0],
    }
}

/// Append a box for every visible leaf under `node`.
pub fn collect_boxes(node: &NodeHandle, out: &mut Vec<BoxLine>) {
    let n = node.borrow();
    if !n.visible() {
        return;
    }
    match n.children() {
        Some(children) => {
            for child in children {
                collect_boxes(child, out);
            }
        }
        None => out.push(BoxLine {
            bounds: n.bounds(),
            depth: n.depth(),
            color: depth_color(n.depth()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::rc::Weak;
    use terrastream_common::Frustum;
    use terrastream_mesh::{MeshData, Vertex};
    use terrastream_stream::{
        DistanceMetric, LodBands, LodController, NodeId, PendingQueue, calculate_visibility,
    };

    #[test]
    fn colours_cycle_by_depth() {
        assert_eq!(depth_color(0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(depth_color(1), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(depth_color(3), [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(depth_color(4), depth_color(0));
    }

    #[test]
    fn only_visible_leaves_get_boxes() {
        let lod = LodController::new(LodBands::new(Vec3::splat(64.0), 1), DistanceMetric::Planar);
        let root = lod.create_node(NodeId::root(0, 0, 0), Weak::new());
        root.borrow().geometry().store(MeshData {
            vertices: vec![Vertex::default()],
            indices: vec![],
        });
        assert!(lod.split(&root, &mut PendingQueue::new()));

        let mut boxes = Vec::new();
        collect_boxes(&root, &mut boxes);
        assert!(boxes.is_empty());

        calculate_visibility(&root, &Frustum::unbounded());
        collect_boxes(&root, &mut boxes);
        assert_eq!(boxes.len(), 8);
        assert!(boxes.iter().all(|b| b.depth == 1 && b.color == depth_color(1)));
        assert!(boxes.iter().all(|b| b.bounds.size() == Vec3::splat(32.0)));
    }
}
