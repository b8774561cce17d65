//! Simulate force directed 3D graph layouts.
//!
//! Connected vertices pull together like springs while every vertex pushes
//! all others away with an inverse square force. The many-body repulsion is
//! approximated with a density adaptive Barnes-Hut octree, so one step stays
//! well below quadratic time on large graphs. The graph is fully mutable
//! between steps; the host drives [`LayoutGraph::update`](graph::LayoutGraph::update)
//! once per frame and drains the resulting events to move its visuals.
//!
//! # Example
//! ```
//! use layouter::prelude::*;
//!
//! let mut graph = LayoutGraph::builder()
//!     .damping(0.75)
//!     .delta_time(0.02)
//!     .build();
//!
//! let a = graph.add_vertex();
//! let b = graph.add_vertex();
//! let c = graph.add_vertex();
//! graph.add_edge(a, b);
//! graph.add_edge(b, c);
//!
//! for _ in 0..100 {
//!     graph.update();
//!     for _event in graph.drain_events() {
//!         // move the rendered meshes here
//!     }
//! }
//! ```

pub mod events;
pub mod forces;
pub mod graph;
pub mod octree;
pub mod properties;

/// Exports all the core types of the library.
pub mod prelude {
    pub use crate::events::LayoutEvent;
    pub use crate::graph::{Edge, EdgeId, LayoutGraph, LayoutGraphBuilder, Vertex, VertexId};
    pub use crate::octree::{Body, Octree};
    pub use crate::properties::SimulationProperties;
}
