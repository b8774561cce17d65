//! Tunable constants of the simulation.

/// The constants driving one layout simulation.
///
/// Every field can be changed between steps through
/// [`LayoutGraph::properties_mut`](crate::graph::LayoutGraph::properties_mut);
/// the builder validates the values it sets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationProperties {
    /// How strong connected vertices pull on each other.
    pub spring_stiffness: f32,

    /// How strong vertices push others away.
    pub repel_force: f32,

    /// Amount of damping applied to a vertex's movement each step.
    ///
    /// Must stay strictly between `0.0` and `1.0` so the layout settles.
    pub damping: f32,

    /// How much time a simulation step should simulate, measured in seconds.
    pub delta_time: f32,

    /// Substitute distance used when two vertices coincide exactly.
    pub epsilon: f32,

    /// Octree acceptance threshold.
    ///
    /// A child cluster whose centroid is closer to the queried vertex than
    /// `octree_theta * cluster size` is resolved recursively instead of
    /// being approximated as a single body.
    pub octree_theta: f32,

    /// Vertices closer to a cluster's centroid than this are kept in the
    /// cluster and resolved individually.
    pub inner_distance: f32,

    /// Side length of the cube new vertices spawn in.
    pub spawn_size: f32,
}

impl Default for SimulationProperties {
    fn default() -> Self {
        Self {
            spring_stiffness: 0.2,
            repel_force: 100.0,
            damping: 0.75,
            delta_time: 0.02,
            epsilon: 0.1,
            octree_theta: 0.5,
            inner_distance: 100.0,
            spawn_size: 5.0,
        }
    }
}
