//! The force functions of the physical model.
//!
//! Both forces act along the line between two points. Repulsion falls off
//! with the squared distance, attraction grows with it, so far apart
//! neighbours get pulled back strongly while close pairs are dominated by
//! repulsion.

use glam::Vec3;

/// Computes the repulsion force acting on the body at `pos1`, pushing it
/// away from `pos2`.
///
/// The magnitude is `repel_force / distance^2`. A distance of exactly zero
/// is substituted with `epsilon`; coincident points produce a zero force
/// vector since no direction can be derived.
pub fn repel_force(pos1: Vec3, pos2: Vec3, repel_force: f32, epsilon: f32) -> Vec3 {
    let dir_vec = pos1 - pos2;
    let mut distance = dir_vec.length();
    if distance == 0.0 {
        distance = epsilon;
    }

    dir_vec.normalize_or(Vec3::ZERO) * (repel_force / (distance * distance))
}

/// Computes the spring force acting on the vertex at `source`, pulling it
/// towards `target`.
///
/// The magnitude is `stiffness * distance^2`, so connected vertices that
/// drifted far apart get reeled back in strongly. The opposite force on the
/// target is the negation of the returned vector.
pub fn spring_force(source: Vec3, target: Vec3, stiffness: f32, epsilon: f32) -> Vec3 {
    let dir_vec = target - source;
    let mut distance = dir_vec.length();
    if distance == 0.0 {
        distance = epsilon;
    }

    dir_vec.normalize_or(Vec3::ZERO) * (stiffness * distance * distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    const F0: f32 = 100.0;
    const K: f32 = 0.2;
    const EPSILON: f32 = 0.1;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn repulsion_at_unit_distance() {
        let f = repel_force(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), F0, EPSILON);
        assert!(close(f, Vec3::new(-100.0, 0.0, 0.0)), "{f}");
    }

    #[test]
    fn repulsion_is_antisymmetric() {
        let a = Vec3::new(1.5, -2.0, 0.5);
        let b = Vec3::new(-3.0, 4.0, 1.0);
        let f_ab = repel_force(a, b, F0, EPSILON);
        let f_ba = repel_force(b, a, F0, EPSILON);
        assert!(close(f_ab, -f_ba), "{f_ab} vs {f_ba}");
    }

    #[test]
    fn repulsion_of_coincident_points_is_zero() {
        let p = Vec3::new(2.0, 2.0, 2.0);
        let f = repel_force(p, p, F0, EPSILON);
        assert_eq!(f, Vec3::ZERO);
        assert!(f.is_finite());
    }

    #[test]
    fn attraction_grows_with_squared_distance() {
        let f = spring_force(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), K, EPSILON);
        assert!(close(f, Vec3::new(20.0, 0.0, 0.0)), "{f}");
    }

    #[test]
    fn attraction_of_coincident_points_is_zero() {
        let p = Vec3::splat(1.0);
        assert_eq!(spring_force(p, p, K, EPSILON), Vec3::ZERO);
    }
}
