//! Change notifications emitted towards the host.

use glam::Vec3;

use crate::graph::{EdgeId, VertexId};

/// One notification produced by a simulation step.
///
/// Every step buffers one `VertexUpdated` per vertex followed by one
/// `EdgeUpdated` per edge, all before [`update`](crate::graph::LayoutGraph::update)
/// returns. The host drains the buffer once per frame and moves its visual
/// representations accordingly. Edges carry no physical state of their own;
/// their event names the endpoints to dereference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayoutEvent {
    /// A vertex was moved by the integration step.
    VertexUpdated { id: VertexId, position: Vec3 },
    /// An edge's endpoints were moved; redraw it.
    EdgeUpdated {
        id: EdgeId,
        source: VertexId,
        target: VertexId,
    },
}
