//! Density adaptive octree for approximating many-body repulsion
//! (Barnes-Hut).
//!
//! Unlike a classical Barnes-Hut tree this octree does not halve a fixed
//! bounding cube at every level. Each node keeps a flat *inner* cluster of
//! bodies that lie within [`inner_distance`](crate::properties::SimulationProperties::inner_distance)
//! of the cluster's centroid; bodies farther out are routed into one of 8
//! *outer* children keyed by comparing each axis against that moving
//! centroid. Dense regions therefore collapse into flat clusters and empty
//! space is never subdivided.

use glam::Vec3;

use crate::graph::VertexId;

/// A point body inserted into the octree.
///
/// Bodies are snapshots: the octree copies the position at insertion time
/// and is rebuilt once positions move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub id: VertexId,
    pub position: Vec3,
}

impl Body {
    pub fn new(id: VertexId, position: Vec3) -> Self {
        Self { id, position }
    }
}

/// One node of the density adaptive octree.
#[derive(Debug)]
pub struct Octree {
    inners: Vec<Body>,
    outers: [Option<Box<Octree>>; 8],
    /// Sum of every member position routed through this node.
    center_sum: Vec3,
    /// Sum of the inner cluster's positions only.
    inner_sum: Vec3,
    count: usize,
    inner_distance: f32,
}

impl Octree {
    /// Creates an empty octree. `inner_distance` is the cluster radius
    /// below which bodies are kept flat instead of being routed outward.
    pub fn new(inner_distance: f32) -> Self {
        Self {
            inners: Vec::new(),
            outers: [None, None, None, None, None, None, None, None],
            center_sum: Vec3::ZERO,
            inner_sum: Vec3::ZERO,
            count: 0,
            inner_distance,
        }
    }

    /// Total number of bodies in this subtree.
    ///
    /// Doubles as the coarse proxy for the subtree's spatial extent in the
    /// acceptance test of [`estimate`](Self::estimate).
    pub fn size(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Centroid of every body in this subtree.
    pub fn center(&self) -> Vec3 {
        if self.count == 0 {
            return Vec3::ZERO;
        }
        self.center_sum / self.count as f32
    }

    /// Centroid of the inner cluster alone. Routing decisions compare
    /// against this point.
    fn inner_center(&self) -> Vec3 {
        if self.inners.is_empty() {
            return Vec3::ZERO;
        }
        self.inner_sum / self.inners.len() as f32
    }

    /// Adds a body to the subtree.
    ///
    /// The first body always joins the inner cluster. Later bodies join it
    /// when they fall within `inner_distance` of the inner cluster's
    /// centroid and are otherwise routed into the octant child on the
    /// matching side of that centroid, creating the child lazily.
    pub fn insert(&mut self, body: Body) {
        self.count += 1;
        self.center_sum += body.position;

        if self.inners.is_empty() {
            self.place_inner(body);
        } else {
            let center = self.inner_center();
            if center.distance(body.position) < self.inner_distance {
                self.place_inner(body);
            } else {
                self.place_outer(body, center);
            }
        }
    }

    /// Removes the body with the given id, pruning any child that becomes
    /// empty. Returns the removed body's stored position, or `None` if the
    /// id is not present in the subtree.
    pub fn remove(&mut self, id: VertexId) -> Option<Vec3> {
        if let Some(index) = self.inners.iter().position(|body| body.id == id) {
            let body = self.inners.swap_remove(index);
            self.count -= 1;
            self.center_sum -= body.position;
            self.inner_sum -= body.position;
            return Some(body.position);
        }

        for slot in &mut self.outers {
            if let Some(child) = slot {
                if let Some(position) = child.remove(id) {
                    self.count -= 1;
                    self.center_sum -= position;
                    if child.is_empty() {
                        *slot = None;
                    }
                    return Some(position);
                }
            }
        }

        None
    }

    /// Estimates the net force acting on `body` from every other body in
    /// the subtree.
    ///
    /// If `body` is a member of this node's inner cluster the cluster is
    /// summed exactly, pair by pair; near-field neighbours are never
    /// approximated. Otherwise the whole inner cluster contributes as a
    /// single body at its centroid, scaled by the cluster's member count.
    ///
    /// Each outer child is then either recursed into (when its centroid is
    /// closer than `theta * child.size()`) or folded into a single
    /// aggregate body at its centroid, scaled by its member count.
    ///
    /// `force_fn(on, from)` must return the pairwise force acting on the
    /// first position.
    pub fn estimate<F>(&self, body: Body, theta: f32, force_fn: F) -> Vec3
    where
        F: Fn(Vec3, Vec3) -> Vec3 + Copy,
    {
        let mut force = Vec3::ZERO;

        if self.inners.iter().any(|inner| inner.id == body.id) {
            for inner in &self.inners {
                if inner.id != body.id {
                    force += force_fn(body.position, inner.position);
                }
            }
        } else if !self.inners.is_empty() {
            force += force_fn(body.position, self.inner_center()) * self.inners.len() as f32;
        }

        for child in self.outers.iter().flatten() {
            let distance = body.position.distance(child.center());
            if distance < theta * child.size() as f32 {
                force += child.estimate(body, theta, force_fn);
            } else {
                force += force_fn(body.position, child.center()) * child.size() as f32;
            }
        }

        force
    }

    fn place_inner(&mut self, body: Body) {
        self.inner_sum += body.position;
        self.inners.push(body);
    }

    fn place_outer(&mut self, body: Body, center: Vec3) {
        let octant = Self::octant(center, body.position);
        self.outers[octant]
            .get_or_insert_with(|| Box::new(Octree::new(self.inner_distance)))
            .insert(body);
    }

    /// Octant of `position` relative to `center`, one bit per axis.
    fn octant(center: Vec3, position: Vec3) -> usize {
        ((position.x > center.x) as usize)
            | (((position.y > center.y) as usize) << 1)
            | (((position.z > center.z) as usize) << 2)
    }
}
