//! Pose and joint value types, plus rotation-vector / RPY conversions.
//!
//! The controller reports end-effector orientation as an axis-angle rotation
//! vector (direction = axis, magnitude = angle in radians). Tolerance
//! comparison and relative moves happen in roll-pitch-yaw space, so this
//! module provides the deterministic conversion pair between the two.
//!
//! The conversions go through a rotation matrix and are pure functions with
//! no side effects. They are not guaranteed to round-trip exactly for inputs
//! adjacent to the pitch = ±π/2 gimbal singularity; callers comparing against
//! a tolerance are unaffected, but exact-equality assumptions are not safe
//! there.

use nalgebra::{Rotation3, Vector3};

/// Ordered angles of the six joints, in radians, base to wrist.
///
/// The fixed-size array enforces the six-axis invariant at the type level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointState(pub [f64; 6]);

impl JointState {
    /// True when every joint is within `tol` radians of `target`.
    pub fn within(&self, target: &JointState, tol: f64) -> bool {
        self.0
            .iter()
            .zip(target.0.iter())
            .all(|(a, t)| (a - t).abs() < tol)
    }
}

/// Roll-pitch-yaw orientation triple, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rpy {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Rpy {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }
}

/// 6-DOF end-effector pose: position in meters plus an axis-angle rotation
/// vector in radians.
///
/// Orientation is deliberately kept in rotation-vector form, matching the
/// controller's wire representation; it is converted to [`Rpy`] only at
/// comparison points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose6D {
    pub position: Vector3<f64>,
    pub rotation: Vector3<f64>,
}

impl Pose6D {
    pub fn new(position: Vector3<f64>, rotation: Vector3<f64>) -> Self {
        Self { position, rotation }
    }

    /// Build from the controller's flat `[x, y, z, rx, ry, rz]` layout.
    pub fn from_array(v: [f64; 6]) -> Self {
        Self {
            position: Vector3::new(v[0], v[1], v[2]),
            rotation: Vector3::new(v[3], v[4], v[5]),
        }
    }

    /// Flatten to the controller's `[x, y, z, rx, ry, rz]` layout.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        ]
    }

    /// Orientation of this pose as roll-pitch-yaw.
    pub fn rpy(&self) -> Rpy {
        rotation_vector_to_rpy(self.rotation)
    }
}

/// Convert an axis-angle rotation vector to roll-pitch-yaw.
///
/// The all-zero vector (no rotation) maps to all-zero RPY; there is no
/// division by the rotation magnitude. Non-finite inputs propagate into the
/// output rather than being clamped, so they fail fast at the first tolerance
/// comparison downstream.
pub fn rotation_vector_to_rpy(rv: Vector3<f64>) -> Rpy {
    let (roll, pitch, yaw) = Rotation3::from_scaled_axis(rv).euler_angles();
    Rpy { roll, pitch, yaw }
}

/// Convert roll-pitch-yaw back to an axis-angle rotation vector.
pub fn rpy_to_rotation_vector(rpy: Rpy) -> Vector3<f64> {
    Rotation3::from_euler_angles(rpy.roll, rpy.pitch, rpy.yaw).scaled_axis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rotation_maps_to_zero_rpy() {
        let rpy = rotation_vector_to_rpy(Vector3::zeros());
        assert_eq!(rpy, Rpy::new(0.0, 0.0, 0.0));
        assert_eq!(rpy_to_rotation_vector(rpy), Vector3::zeros());
    }

    #[test]
    fn test_rotation_round_trip() {
        // Sample rotation vectors with magnitude < pi, away from the
        // pitch singularity.
        let samples = [
            [0.1, 0.0, 0.0],
            [0.0, -0.2, 0.0],
            [0.0, 0.0, 1.5],
            [0.5, -0.5, 0.5],
            [-2.2, -2.2, -0.003],
            [1.0, 0.7, -0.9],
            [-0.01, 0.02, -0.03],
        ];
        for s in samples {
            let rv = Vector3::new(s[0], s[1], s[2]);
            let back = rpy_to_rotation_vector(rotation_vector_to_rpy(rv));
            assert!(
                (back - rv).norm() < 1e-6,
                "round trip drifted for {rv:?}: got {back:?}"
            );
        }
    }

    #[test]
    fn test_single_axis_yaw() {
        let rpy = rotation_vector_to_rpy(Vector3::new(0.0, 0.0, 0.25));
        assert!(rpy.roll.abs() < 1e-12);
        assert!(rpy.pitch.abs() < 1e-12);
        assert!((rpy.yaw - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_joint_state_within() {
        let a = JointState([0.0, -1.57, 1.57, -1.57, -1.57, 0.0]);
        let b = JointState([0.005, -1.575, 1.565, -1.566, -1.574, 0.009]);
        assert!(b.within(&a, 0.01));
        assert!(!b.within(&a, 0.004));
    }

    #[test]
    fn test_pose_array_round_trip() {
        let pose = Pose6D::from_array([-0.567, -0.031, 0.124, -2.216, -2.222, -0.002]);
        assert_eq!(
            pose.to_array(),
            [-0.567, -0.031, 0.124, -2.216, -2.222, -0.002]
        );
    }
}
