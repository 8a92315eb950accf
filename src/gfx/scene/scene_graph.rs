//! Transform hierarchy
//!
//! Nodes are stored in a flat vector and referenced by index. A node can only
//! be added below a node that already exists, so every parent index is smaller
//! than its child's index and one forward pass over the vector visits parents
//! before children.

use cgmath::{Matrix4, SquareMatrix};

use super::mesh::MeshId;
use crate::error::{SceneError, SceneResult};

/// Index of a node in the scene graph
pub type NodeId = usize;

/// The root node; it always exists.
pub const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
pub struct SceneNode {
    id: NodeId,
    parent: NodeId,
    children: Vec<NodeId>,
    drawables: Vec<MeshId>,
    local: Matrix4<f32>,
    world: Matrix4<f32>,
    casts_shadow: bool,
}

impl SceneNode {
    fn new(id: NodeId, parent: NodeId, casts_shadow: bool, local: Matrix4<f32>) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            drawables: Vec::new(),
            local,
            world: local,
            casts_shadow,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The root is its own parent.
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Meshes drawn at this node, in attachment order
    pub fn drawables(&self) -> &[MeshId] {
        &self.drawables
    }

    pub fn local_transform(&self) -> Matrix4<f32> {
        self.local
    }

    /// World transform as of the last [`SceneGraph::propagate`]
    pub fn world_transform(&self) -> Matrix4<f32> {
        self.world
    }

    pub fn casts_shadow(&self) -> bool {
        self.casts_shadow
    }
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Creates a graph holding only the shadow-casting root with identity transform.
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode::new(ROOT, ROOT, true, Matrix4::identity())],
        }
    }

    /// Appends a node below `parent` and returns its index.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        casts_shadow: bool,
        local: Matrix4<f32>,
    ) -> SceneResult<NodeId> {
        if parent >= self.nodes.len() {
            return Err(SceneError::InvalidParent {
                parent,
                len: self.nodes.len(),
            });
        }

        let id = self.nodes.len();
        self.nodes.push(SceneNode::new(id, parent, casts_shadow, local));
        self.nodes[parent].children.push(id);
        log::trace!("Added node {} below {}", id, parent);
        Ok(id)
    }

    /// Appends `meshes` to an existing node.
    pub fn add_node_meshes(&mut self, node: NodeId, meshes: &[MeshId]) -> SceneResult<()> {
        let node = self.node_mut(node)?;
        node.drawables.extend_from_slice(meshes);
        Ok(())
    }

    pub fn attach_drawable(&mut self, node: NodeId, mesh: MeshId) -> SceneResult<()> {
        self.node_mut(node)?.drawables.push(mesh);
        Ok(())
    }

    /// Replaces a node's local transform. World transforms are stale until
    /// the next [`propagate`](Self::propagate).
    pub fn set_local_transform(&mut self, node: NodeId, local: Matrix4<f32>) -> SceneResult<()> {
        self.node_mut(node)?.local = local;
        Ok(())
    }

    /// Recomputes every world transform from the local transforms.
    pub fn propagate(&mut self) {
        self.nodes[ROOT].world = self.nodes[ROOT].local;
        for i in 1..self.nodes.len() {
            let parent_world = self.nodes[self.nodes[i].parent].world;
            self.nodes[i].world = parent_world * self.nodes[i].local;
        }
    }

    pub fn node(&self, node: NodeId) -> Option<&SceneNode> {
        self.nodes.get(node)
    }

    fn node_mut(&mut self, node: NodeId) -> SceneResult<&mut SceneNode> {
        self.nodes.get_mut(node).ok_or(SceneError::InvalidNode(node))
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true; the root always exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, Transform, Vector3};

    fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(x, y, z))
    }

    fn assert_world_invariant(graph: &SceneGraph) {
        let root = &graph.nodes()[ROOT];
        assert_eq!(root.world_transform(), root.local_transform());
        for node in &graph.nodes()[1..] {
            let parent = &graph.nodes()[node.parent()];
            let expected = parent.world_transform() * node.local_transform();
            assert_eq!(node.world_transform(), expected);
        }
    }

    #[test]
    fn test_root_exists() {
        let graph = SceneGraph::new();
        assert_eq!(graph.len(), 1);
        let root = graph.node(ROOT).unwrap();
        assert_eq!(root.parent(), ROOT);
        assert!(root.casts_shadow());
        assert_eq!(root.local_transform(), Matrix4::identity());
    }

    #[test]
    fn test_nested_translation() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node(ROOT, true, translation(1.0, 0.0, 0.0)).unwrap();
        let b = graph.add_node(a, true, translation(0.0, 2.0, 0.0)).unwrap();
        graph.propagate();

        let world = graph.node(b).unwrap().world_transform();
        let origin = world.transform_point(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(origin, Point3::new(1.0, 2.0, 0.0));
        assert_eq!(graph.node(a).unwrap().children(), &[b]);
    }

    #[test]
    fn test_propagate_invariant_holds_for_deep_tree() {
        let mut graph = SceneGraph::new();
        graph
            .set_local_transform(ROOT, Matrix4::from_scale(2.0))
            .unwrap();
        let mut parent = ROOT;
        for i in 0..10 {
            let rotation = Matrix4::from_angle_y(cgmath::Deg(10.0 * i as f32));
            parent = graph
                .add_node(parent, i % 2 == 0, rotation * translation(0.5, 0.0, 0.0))
                .unwrap();
            graph.add_node(parent, false, translation(0.0, 1.0, 0.0)).unwrap();
        }
        graph.propagate();
        assert_world_invariant(&graph);
    }

    #[test]
    fn test_local_change_needs_propagate() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node(ROOT, true, translation(1.0, 0.0, 0.0)).unwrap();
        let b = graph.add_node(a, true, Matrix4::identity()).unwrap();
        graph.propagate();

        graph.set_local_transform(a, translation(5.0, 0.0, 0.0)).unwrap();
        assert_eq!(graph.node(b).unwrap().world_transform(), translation(1.0, 0.0, 0.0));

        graph.propagate();
        assert_eq!(graph.node(b).unwrap().world_transform(), translation(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_unrelated_subtrees_unchanged() {
        let mut graph = SceneGraph::new();
        let left = graph.add_node(ROOT, true, translation(-1.0, 0.0, 0.0)).unwrap();
        let left_child = graph.add_node(left, true, translation(0.0, 0.0, 3.0)).unwrap();
        let right = graph.add_node(ROOT, true, translation(1.0, 0.0, 0.0)).unwrap();
        graph.propagate();
        let before = graph.node(left_child).unwrap().world_transform();

        let children: Vec<NodeId> = (0..3)
            .map(|i| graph.add_node(right, true, translation(0.0, i as f32, 0.0)).unwrap())
            .collect();
        graph.set_local_transform(right, translation(2.0, 0.0, 0.0)).unwrap();
        graph.propagate();

        assert_eq!(graph.node(left_child).unwrap().world_transform(), before);
        for (i, child) in children.into_iter().enumerate() {
            assert_eq!(
                graph.node(child).unwrap().world_transform(),
                translation(2.0, i as f32, 0.0)
            );
        }
    }

    #[test]
    fn test_invalid_parent_is_rejected() {
        let mut graph = SceneGraph::new();
        let result = graph.add_node(5, true, Matrix4::identity());
        assert!(matches!(result, Err(SceneError::InvalidParent { parent: 5, len: 1 })));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_drawables_keep_attachment_order() {
        let mut graph = SceneGraph::new();
        let node = graph.add_node(ROOT, false, Matrix4::identity()).unwrap();
        graph.attach_drawable(node, 3).unwrap();
        graph.add_node_meshes(node, &[1, 2]).unwrap();
        assert_eq!(graph.node(node).unwrap().drawables(), &[3, 1, 2]);
        assert!(!graph.node(node).unwrap().casts_shadow());

        assert!(matches!(graph.attach_drawable(9, 0), Err(SceneError::InvalidNode(9))));
        assert!(matches!(
            graph.set_local_transform(9, Matrix4::identity()),
            Err(SceneError::InvalidNode(9))
        ));
    }
}
