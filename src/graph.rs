//! The layout graph and the vertex and edge entities it owns.
//!
//! Vertices and edges live in a stable arena keyed by id; edges reference
//! their endpoints by id and are resolved through the arena, so removing a
//! vertex can cascade to its incident edges without dangling references.
//! All mutation and stepping goes through `&mut self`, which keeps the
//! simulation step-synchronous under a single owner.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;
use log::debug;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Direction, EdgeType};
use rand::Rng;

use crate::events::LayoutEvent;
use crate::forces;
use crate::octree::{Body, Octree};
use crate::properties::SimulationProperties;

/// Stable identity of a vertex, unique within one graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub u32);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of an edge, unique within one graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A vertex and its physical state.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub id: VertexId,
    /// Current position in layout space.
    pub position: Vec3,
    pub velocity: Vec3,
    /// Net force accumulated during the current step; reset to zero once
    /// integrated.
    pub acceleration: Vec3,
    /// Random tie breaking priority assigned at spawn.
    pub priority: f32,
}

impl Vertex {
    fn spawn(id: VertexId, spawn_size: f32) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            id,
            position: Vec3::new(rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>())
                * spawn_size,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            priority: rng.gen(),
        }
    }
}

/// An edge between two vertices. Carries no physical state of its own; its
/// endpoints are topology resolved through the graph.
#[derive(Clone, Debug)]
pub struct Edge {
    pub id: EdgeId,
}

/// A dynamically mutable graph that computes its own 3D layout.
///
/// Connected vertices attract like springs, all vertices repel with an
/// inverse square force approximated through a Barnes-Hut octree. The host
/// calls [`update`](Self::update) once per frame and drains the resulting
/// [`LayoutEvent`]s to move its visual representations.
#[derive(Debug)]
pub struct LayoutGraph {
    graph: StableGraph<Vertex, Edge>,
    vertex_ids: HashMap<VertexId, NodeIndex>,
    edge_ids: HashMap<EdgeId, EdgeIndex>,
    next_vertex_id: u32,
    next_edge_id: u32,
    properties: SimulationProperties,
    events: Vec<LayoutEvent>,
}

impl LayoutGraph {
    pub fn builder() -> LayoutGraphBuilder {
        LayoutGraphBuilder::default()
    }

    /// Adds a vertex under a freshly generated id and returns that id.
    ///
    /// The vertex spawns at a pseudo-random point inside a cube of side
    /// [`spawn_size`](SimulationProperties::spawn_size) with zero velocity.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = VertexId(self.next_vertex_id);
        self.next_vertex_id += 1;
        self.insert_vertex(id);
        id
    }

    /// Adds a vertex under an explicit id. A duplicate id silently
    /// overwrites: the physical state is re-spawned, incident edges stay.
    ///
    /// Generated ids skip past explicit ones, so mixing the two keeps
    /// [`add_vertex`](Self::add_vertex) collision free.
    pub fn add_vertex_with_id(&mut self, id: VertexId) -> VertexId {
        self.next_vertex_id = self.next_vertex_id.max(id.0.wrapping_add(1));
        self.insert_vertex(id);
        id
    }

    fn insert_vertex(&mut self, id: VertexId) {
        let vertex = Vertex::spawn(id, self.properties.spawn_size);
        match self.vertex_ids.get(&id) {
            Some(&index) => self.graph[index] = vertex,
            None => {
                let index = self.graph.add_node(vertex);
                self.vertex_ids.insert(id, index);
            }
        }
    }

    /// Connects two vertices and returns the new edge's id.
    ///
    /// Returns `None` without mutating anything when either endpoint does
    /// not exist. Deliberately a no-op rather than an error: edges may
    /// arrive before their vertices during bulk construction, and callers
    /// that care check for the absence.
    pub fn add_edge(&mut self, source: VertexId, target: VertexId) -> Option<EdgeId> {
        let id = EdgeId(self.next_edge_id);
        let added = self.insert_edge(source, target, id)?;
        self.next_edge_id += 1;
        Some(added)
    }

    /// Connects two vertices under an explicit edge id. A duplicate id
    /// silently replaces the previous edge.
    pub fn add_edge_with_id(
        &mut self,
        source: VertexId,
        target: VertexId,
        id: EdgeId,
    ) -> Option<EdgeId> {
        let added = self.insert_edge(source, target, id)?;
        self.next_edge_id = self.next_edge_id.max(id.0.wrapping_add(1));
        Some(added)
    }

    fn insert_edge(&mut self, source: VertexId, target: VertexId, id: EdgeId) -> Option<EdgeId> {
        let (Some(&source_index), Some(&target_index)) =
            (self.vertex_ids.get(&source), self.vertex_ids.get(&target))
        else {
            debug!("[{source} -> {target}] edge skipped, missing endpoint");
            return None;
        };

        if self.edge_ids.contains_key(&id) {
            self.remove_edge(id);
        }
        let index = self.graph.add_edge(source_index, target_index, Edge { id });
        self.edge_ids.insert(id, index);
        Some(id)
    }

    /// Removes a vertex and every edge incident on it. Unknown ids are
    /// treated as already absent.
    pub fn remove_vertex(&mut self, id: VertexId) {
        let Some(index) = self.vertex_ids.remove(&id) else {
            return;
        };

        let incident: Vec<EdgeId> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|edge| edge.weight().id)
            .collect();
        for edge_id in &incident {
            self.edge_ids.remove(edge_id);
        }

        self.graph.remove_node(index);
        debug!("[{id}] vertex removed along with {} edges", incident.len());
    }

    /// Removes an edge, detaching it from both endpoints. Unknown ids are
    /// treated as already absent.
    pub fn remove_edge(&mut self, id: EdgeId) {
        let Some(index) = self.edge_ids.remove(&id) else {
            return;
        };
        self.graph.remove_edge(index);
    }

    /// Moves a vertex to an explicit position, e.g. while the host drags
    /// it. Velocity is left untouched. Unknown ids are ignored.
    pub fn set_position(&mut self, id: VertexId, position: Vec3) {
        if let Some(&index) = self.vertex_ids.get(&id) {
            self.graph[index].position = position;
        }
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertex_ids.get(&id).map(|&index| &self.graph[index])
    }

    /// Current position of a vertex.
    pub fn position(&self, id: VertexId) -> Option<Vec3> {
        self.vertex(id).map(|vertex| vertex.position)
    }

    /// Current endpoint ids of an edge.
    pub fn endpoints(&self, id: EdgeId) -> Option<(VertexId, VertexId)> {
        let &index = self.edge_ids.get(&id)?;
        let (source, target) = self.graph.edge_endpoints(index)?;
        Some((self.graph[source].id, self.graph[target].id))
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.node_weights()
    }

    /// Iterates over every edge as `(id, source, target)`.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, VertexId, VertexId)> + '_ {
        self.graph.edge_references().map(|edge| {
            (
                edge.weight().id,
                self.graph[edge.source()].id,
                self.graph[edge.target()].id,
            )
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn properties(&self) -> &SimulationProperties {
        &self.properties
    }

    /// Mutable access to the simulation constants, for hosts that tune the
    /// layout between steps.
    pub fn properties_mut(&mut self) -> &mut SimulationProperties {
        &mut self.properties
    }

    /// Drains the notifications buffered by the most recent
    /// [`update`](Self::update) call.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, LayoutEvent> {
        self.events.drain(..)
    }

    /// Performs one simulation step.
    ///
    /// Builds a fresh octree over the current vertex set, accumulates the
    /// approximated repulsion per vertex and the spring attraction per
    /// edge, then integrates every vertex and buffers one
    /// [`LayoutEvent`] per vertex followed by one per edge. Undrained
    /// events from the previous step are discarded.
    pub fn update(&mut self) {
        let properties = self.properties;
        self.events.clear();

        let mut octree = Octree::new(properties.inner_distance);
        for vertex in self.graph.node_weights() {
            octree.insert(Body::new(vertex.id, vertex.position));
        }

        let vertex_indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        for &index in &vertex_indices {
            let body = Body::new(self.graph[index].id, self.graph[index].position);
            let force = octree.estimate(body, properties.octree_theta, |on, from| {
                forces::repel_force(on, from, properties.repel_force, properties.epsilon)
            });
            self.graph[index].acceleration += force;
        }

        let edge_indices: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for &index in &edge_indices {
            let (source, target) = self.graph.edge_endpoints(index).unwrap();
            let force = forces::spring_force(
                self.graph[source].position,
                self.graph[target].position,
                properties.spring_stiffness,
                properties.epsilon,
            );
            self.graph[source].acceleration += force;
            self.graph[target].acceleration -= force;
        }

        for &index in &vertex_indices {
            let vertex = &mut self.graph[index];
            vertex.velocity += vertex.acceleration * properties.delta_time;
            vertex.velocity *= properties.damping;
            vertex.position += vertex.velocity * properties.delta_time;
            vertex.acceleration = Vec3::ZERO;

            let (id, position) = (vertex.id, vertex.position);
            self.events.push(LayoutEvent::VertexUpdated { id, position });
        }

        for &index in &edge_indices {
            let (source, target) = self.graph.edge_endpoints(index).unwrap();
            self.events.push(LayoutEvent::EdgeUpdated {
                id: self.graph[index].id,
                source: self.graph[source].id,
                target: self.graph[target].id,
            });
        }

        debug!(
            "step simulated: {} vertices, {} edges",
            vertex_indices.len(),
            edge_indices.len()
        );
    }
}

/// Builder for [`LayoutGraph`].
#[derive(Debug)]
pub struct LayoutGraphBuilder {
    properties: SimulationProperties,
}

impl LayoutGraphBuilder {
    /// Get an instance of `LayoutGraphBuilder` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// How strong the spring force between connected vertices should be.
    ///
    /// Default: `0.2`
    pub fn spring_stiffness(mut self, spring_stiffness: f32) -> Self {
        self.properties.spring_stiffness = spring_stiffness;
        self
    }

    /// How strong vertices should push others away.
    ///
    /// Default: `100.0`
    pub fn repel_force(mut self, repel_force: f32) -> Self {
        self.properties.repel_force = repel_force;
        self
    }

    /// Amount of damping that should be applied to the vertices' movement.
    ///
    /// Must lie strictly between `0.0` and `1.0`, otherwise the layout
    /// never settles. Panics when outside that range.
    ///
    /// Default: `0.75`
    pub fn damping(mut self, damping: f32) -> Self {
        if damping <= 0.0 || damping >= 1.0 {
            panic!("damping must lie strictly between 0 and 1!");
        }
        self.properties.damping = damping;
        self
    }

    /// How much time a simulation step should simulate. (euler method)
    ///
    /// Bigger time steps result in faster simulations, but less accurate or
    /// even wrong simulations.
    ///
    /// `delta_time` is in seconds.
    ///
    /// Panics when delta time is `0` or below.
    ///
    /// Default: `0.02`
    pub fn delta_time(mut self, delta_time: f32) -> Self {
        if delta_time <= 0.0 {
            panic!("delta_time may not be 0 or below!");
        }
        self.properties.delta_time = delta_time;
        self
    }

    /// Distance substituted when two vertices coincide exactly, keeping the
    /// force magnitudes finite.
    ///
    /// Default: `0.1`
    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.properties.epsilon = epsilon;
        self
    }

    /// How accurate the repulsion estimate should be.
    ///
    /// Octree clusters closer to a vertex than `theta` times their member
    /// count are resolved recursively; farther clusters are approximated as
    /// a single body. `0.0` approximates every outer cluster.
    ///
    /// Default: `0.5`
    pub fn simulation_accuracy(mut self, theta: f32) -> Self {
        self.properties.octree_theta = theta;
        self
    }

    /// Radius of an octree node's inner cluster. Vertices closer than this
    /// to the cluster's centroid are resolved individually.
    ///
    /// Default: `100.0`
    pub fn inner_distance(mut self, inner_distance: f32) -> Self {
        self.properties.inner_distance = inner_distance;
        self
    }

    /// Side length of the cube new vertices spawn in.
    ///
    /// Default: `5.0`
    pub fn spawn_size(mut self, spawn_size: f32) -> Self {
        self.properties.spawn_size = spawn_size;
        self
    }

    /// Constructs an empty [`LayoutGraph`].
    pub fn build(self) -> LayoutGraph {
        LayoutGraph {
            graph: StableGraph::default(),
            vertex_ids: HashMap::new(),
            edge_ids: HashMap::new(),
            next_vertex_id: 0,
            next_edge_id: 0,
            properties: self.properties,
            events: Vec::new(),
        }
    }

    /// Constructs a [`LayoutGraph`] seeded with the topology of an existing
    /// petgraph graph. Node and edge weights are ignored; vertices spawn at
    /// random positions like every other vertex.
    pub fn build_graph<N, E, Ty: EdgeType>(
        self,
        graph: &petgraph::Graph<N, E, Ty>,
    ) -> LayoutGraph {
        let mut layout = self.build();

        let mut ids: HashMap<NodeIndex, VertexId> = HashMap::with_capacity(graph.node_count());
        for index in graph.node_indices() {
            ids.insert(index, layout.add_vertex());
        }
        for edge in graph.edge_references() {
            layout.add_edge(ids[&edge.source()], ids[&edge.target()]);
        }

        layout
    }
}

impl Default for LayoutGraphBuilder {
    /// Get an instance of `LayoutGraphBuilder` with default values.
    fn default() -> Self {
        Self {
            properties: SimulationProperties::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_fixed_vertices(distance: f32) -> (LayoutGraph, VertexId, VertexId) {
        let mut graph = LayoutGraph::builder().build();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        graph.set_position(a, Vec3::ZERO);
        graph.set_position(b, Vec3::new(distance, 0.0, 0.0));
        (graph, a, b)
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut graph = LayoutGraph::builder().build();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        assert_ne!(a, b);
        assert_eq!(graph.vertex_count(), 2);
    }

    #[test]
    fn generated_ids_skip_explicit_ones() {
        let mut graph = LayoutGraph::builder().build();
        graph.add_vertex_with_id(VertexId(5));
        let generated = graph.add_vertex();
        assert_eq!(generated, VertexId(6));
        assert_eq!(graph.vertex_count(), 2);
    }

    #[test]
    fn duplicate_explicit_id_overwrites_but_keeps_edges() {
        let mut graph = LayoutGraph::builder().build();
        let a = graph.add_vertex_with_id(VertexId(0));
        let b = graph.add_vertex();
        let edge = graph.add_edge(a, b).unwrap();

        graph.add_vertex_with_id(VertexId(0));
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.endpoints(edge), Some((a, b)));
        assert_eq!(graph.vertex(a).unwrap().velocity, Vec3::ZERO);
    }

    #[test]
    fn add_edge_with_missing_endpoint_is_a_noop() {
        let mut graph = LayoutGraph::builder().build();
        let a = graph.add_vertex();

        assert_eq!(graph.add_edge(a, VertexId(99)), None);
        assert_eq!(graph.add_edge(VertexId(99), a), None);
        assert_eq!(graph.edge_count(), 0);
        let index = graph.vertex_ids[&a];
        assert_eq!(graph.graph.edges(index).count(), 0);
    }

    #[test]
    fn edge_endpoints_always_exist() {
        let mut graph = LayoutGraph::builder().build();
        let ids: Vec<VertexId> = (0..5).map(|_| graph.add_vertex()).collect();
        for window in ids.windows(2) {
            graph.add_edge(window[0], window[1]);
        }
        graph.remove_vertex(ids[2]);
        graph.add_edge(ids[0], ids[3]);
        graph.remove_edge(EdgeId(0));

        for (_, source, target) in graph.edges() {
            assert!(graph.vertex(source).is_some());
            assert!(graph.vertex(target).is_some());
        }
    }

    #[test]
    fn removing_a_vertex_cascades_to_incident_edges() {
        let mut graph = LayoutGraph::builder().build();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let c = graph.add_vertex();
        graph.add_edge(a, b);
        graph.add_edge(b, c);
        graph.add_edge(c, a);

        graph.remove_vertex(b);
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        for (_, source, target) in graph.edges() {
            assert_ne!(source, b);
            assert_ne!(target, b);
        }
    }

    #[test]
    fn removals_are_idempotent() {
        let mut graph = LayoutGraph::builder().build();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let edge = graph.add_edge(a, b).unwrap();

        graph.remove_edge(edge);
        graph.remove_edge(edge);
        assert_eq!(graph.edge_count(), 0);

        graph.remove_vertex(a);
        graph.remove_vertex(a);
        assert_eq!(graph.vertex_count(), 1);
    }

    #[test]
    fn repulsion_step_pushes_a_pair_apart() {
        // Scenario: unit separation along x, no edge. The repulsion
        // magnitude is 100 before damping and time step scaling, so the
        // velocity after one step is 100 * dt * damping = 1.5.
        let (mut graph, a, b) = two_fixed_vertices(1.0);
        graph.update();

        let va = graph.vertex(a).unwrap().velocity;
        let vb = graph.vertex(b).unwrap().velocity;
        assert!((va - Vec3::new(-1.5, 0.0, 0.0)).length() < 1e-3, "{va}");
        assert!((vb - Vec3::new(1.5, 0.0, 0.0)).length() < 1e-3, "{vb}");
        assert_eq!(graph.vertex(a).unwrap().acceleration, Vec3::ZERO);
    }

    #[test]
    fn pairwise_repulsion_is_conserved() {
        let (mut graph, a, b) = two_fixed_vertices(3.0);
        graph.update();

        let va = graph.vertex(a).unwrap().velocity;
        let vb = graph.vertex(b).unwrap().velocity;
        assert!((va + vb).length() < 1e-4, "{va} vs {vb}");
    }

    #[test]
    fn connected_pair_approaches_force_balance() {
        // Scenario: released at distance 10 with one edge. Attraction
        // (0.2 * 100 = 20) dominates repulsion (100 / 100 = 1), so the
        // distance shrinks monotonically at first and levels off around
        // the balance point f0 / d^2 = K * d^2.
        let (mut graph, a, b) = two_fixed_vertices(10.0);
        graph.add_edge(a, b).unwrap();

        let mut last = 10.0;
        for step in 0..400 {
            graph.update();
            let distance = graph
                .position(a)
                .unwrap()
                .distance(graph.position(b).unwrap());
            if step < 30 {
                assert!(distance < last, "step {step}: {distance} >= {last}");
            }
            last = distance;
        }

        assert!(last > 2.0 && last < 8.0, "final distance {last}");
    }

    #[test]
    fn update_emits_vertex_events_before_edge_events() {
        let mut graph = LayoutGraph::builder().build();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let _c = graph.add_vertex();
        let edge = graph.add_edge(a, b).unwrap();
        graph.update();

        let events: Vec<LayoutEvent> = graph.drain_events().collect();
        assert_eq!(events.len(), 4);
        assert!(events[..3]
            .iter()
            .all(|event| matches!(event, LayoutEvent::VertexUpdated { .. })));
        match events[3] {
            LayoutEvent::EdgeUpdated { id, source, target } => {
                assert_eq!(id, edge);
                assert_eq!((source, target), (a, b));
            }
            other => panic!("expected edge event, got {other:?}"),
        }

        // Drained once, the buffer is empty until the next step.
        assert_eq!(graph.drain_events().count(), 0);
    }

    #[test]
    fn update_discards_stale_events() {
        let mut graph = LayoutGraph::builder().build();
        graph.add_vertex();
        graph.update();
        graph.update();
        assert_eq!(graph.drain_events().count(), 1);
    }

    #[test]
    fn vertices_spawn_inside_the_configured_cube() {
        let mut graph = LayoutGraph::builder().spawn_size(5.0).build();
        for _ in 0..50 {
            let id = graph.add_vertex();
            let position = graph.position(id).unwrap();
            assert!(position.cmpge(Vec3::ZERO).all(), "{position}");
            assert!(position.cmple(Vec3::splat(5.0)).all(), "{position}");
        }
    }

    #[test]
    fn build_graph_seeds_topology_from_petgraph() {
        let mut source: petgraph::Graph<(), ()> = petgraph::Graph::new();
        let n0 = source.add_node(());
        let n1 = source.add_node(());
        let n2 = source.add_node(());
        source.add_edge(n0, n1, ());
        source.add_edge(n1, n2, ());

        let layout = LayoutGraph::builder().build_graph(&source);
        assert_eq!(layout.vertex_count(), 3);
        assert_eq!(layout.edge_count(), 2);
    }

    #[test]
    #[should_panic(expected = "delta_time may not be 0 or below!")]
    fn zero_delta_time_is_rejected() {
        LayoutGraph::builder().delta_time(0.0);
    }

    #[test]
    #[should_panic(expected = "damping must lie strictly between 0 and 1!")]
    fn damping_of_one_is_rejected() {
        LayoutGraph::builder().damping(1.0);
    }
}
