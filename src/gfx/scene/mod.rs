//! # Scene Management Module
//!
//! Scene content lives in two places:
//!
//! - [`SceneGraph`] - the node hierarchy with local and world transforms
//! - [`ResourceRegistry`] - owner of every [`Mesh`] and material
//!
//! Nodes refer to meshes by [`MeshId`] and meshes refer to materials by id, so
//! nothing in the graph owns GPU resources. [`Scene`] bundles both.
//!
//! ## Usage
//!
//! ```
//! use cgmath::{Matrix4, Point3, Transform, Vector3};
//! use point_shadow::gfx::scene::{SceneGraph, ROOT};
//!
//! let mut graph = SceneGraph::new();
//! let a = graph.add_node(ROOT, true, Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))).unwrap();
//! let b = graph.add_node(a, true, Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0))).unwrap();
//! graph.propagate();
//!
//! let world = graph.node(b).unwrap().world_transform();
//! assert_eq!(world.transform_point(Point3::new(0.0, 0.0, 0.0)), Point3::new(1.0, 2.0, 0.0));
//! ```

pub mod import;
pub mod light;
pub mod mesh;
pub mod registry;
pub mod scene;
pub mod scene_graph;
pub mod vertex;

// Re-export main types
pub use light::LightSource;
pub use mesh::{Mesh, MeshId};
pub use registry::ResourceRegistry;
pub use scene::Scene;
pub use scene_graph::{NodeId, SceneGraph, SceneNode, ROOT};
pub use vertex::Vertex3D;
