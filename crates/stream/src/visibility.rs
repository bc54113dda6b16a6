use terrastream_common::Frustum;

use crate::node::NodeHandle;

/// Frustum-test `node` and update the `visible` flags of its subtree.
///
/// Children of a visible node are tested individually. A culled node hides its whole
/// subtree without testing it, so no stale flag survives below a culled parent.
pub fn calculate_visibility(node: &NodeHandle, frustum: &Frustum) -> bool {
    let mut n = node.borrow_mut();
    let visible = frustum.intersects_aabb(&n.bounds());
    n.visible = visible;

    if let Some(children) = n.children() {
        for child in children {
            if visible {
                calculate_visibility(child, frustum);
            } else {
                hide_subtree(child);
            }
        }
    }
    visible
}

fn hide_subtree(node: &NodeHandle) {
    let mut n = node.borrow_mut();
    n.visible = false;
    if let Some(children) = n.children() {
        for child in children {
            hide_subtree(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceMetric;
    use crate::lod::{LodBands, LodController};
    use crate::node::walk;
    use crate::node_id::NodeId;
    use crate::queue::PendingQueue;
    use glam::{Mat4, Vec3};
    use std::rc::Weak;
    use terrastream_mesh::{MeshData, Vertex};

    fn split_root(lod: &LodController, x: i16) -> NodeHandle {
        let root = lod.create_node(NodeId::root(x, 0, 0), Weak::new());
        root.borrow().geometry().store(MeshData {
            vertices: vec![Vertex::default()],
            indices: vec![],
        });
        assert!(lod.split(&root, &mut PendingQueue::new()));
        root
    }

    /// Camera at (-10, 48, 48) looking down +X with a narrow field of view; it sees only
    /// the upper +Z quarter of the root at the origin.
    fn frustum_down_x() -> Frustum {
        let eye = Vec3::new(-10.0, 48.0, 48.0);
        let view = Mat4::look_at_rh(eye, eye + Vec3::X, Vec3::Y);
        let proj = Mat4::perspective_rh(20.0_f32.to_radians(), 1.0, 0.5, 1000.0);
        Frustum::from_view_projection(&(proj * view))
    }

    fn lod() -> LodController {
        LodController::new(LodBands::new(Vec3::splat(64.0), 2), DistanceMetric::Planar)
    }

    #[test]
    fn unbounded_frustum_marks_everything_visible() {
        let lod = lod();
        let root = split_root(&lod, 0);
        assert!(calculate_visibility(&root, &Frustum::unbounded()));
        walk(&root, &mut |n| assert!(n.visible()));
    }

    #[test]
    fn culled_parent_hides_subtree() {
        let lod = lod();
        // Behind the camera.
        let root = split_root(&lod, -3);
        for child in root.borrow().children().unwrap() {
            child.borrow_mut().visible = true;
        }

        assert!(!calculate_visibility(&root, &frustum_down_x()));
        walk(&root, &mut |n| assert!(!n.visible(), "{} left visible", n.id()));
    }

    #[test]
    fn children_are_tested_individually() {
        let lod = lod();
        let root = split_root(&lod, 0);
        assert!(calculate_visibility(&root, &frustum_down_x()));

        let r = root.borrow();
        let visible: Vec<bool> = r.children().unwrap().iter().map(|c| c.borrow().visible()).collect();
        assert!(visible.iter().any(|v| *v));
        assert!(visible.iter().any(|v| !*v));
    }
}
