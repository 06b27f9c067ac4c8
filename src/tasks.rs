//! Motion task catalogue.
//!
//! [`RobotArm`] wraps a [`CommandChannel`] with the named operations the
//! driving loop works in: homing, randomized initialization, single-axis
//! steps, wrist rotations, and the final insertion move. Every operation is
//! a fixed (velocity, acceleration, tolerance) profile plus one encoded
//! program, and every operation awaits convergence before returning, so a
//! call spans the network round trip, the physical motion, and the poll
//! loop.
//!
//! Direction mapping for the discrete steps is fixed: forward = −x,
//! back = +x, left = +y, right = −y, up = +z, down = −z. Clockwise rotates
//! the last joint positive, anticlockwise negative.

use nalgebra::Vector3;
use rand::Rng;

use crate::channel::CommandChannel;
use crate::converge::{self, ToleranceProfile, WaitOptions, DEFAULT_JOINT_TOLERANCE};
use crate::error::Result;
use crate::pose::{rotation_vector_to_rpy, rpy_to_rotation_vector, JointState, Pose6D, Rpy};
use crate::script::MotionCommand;

/// Home joint configuration, radians.
pub const HOME_JOINTS: JointState = JointState([
    0.00000744,
    -1.57083954,
    1.57082969,
    -1.57077511,
    -1.57079918,
    -0.00003463,
]);

/// Reference pose above the work target, perturbed by [`RobotArm::go_random_init`].
pub const REFERENCE_POSE: [f64; 6] = [
    -0.56758035,
    -0.03142121,
    0.12421664,
    -2.21667038,
    -2.22297235,
    -0.00275497,
];

/// Depth of the final insertion move, m.
pub const INSERT_DEPTH: f64 = 0.005;

// Joint-space profile (homing, wrist rotations).
const JOINT_VEL: f64 = 1.4;
const JOINT_ACCEL: f64 = 1.05;
const JOINT_BLEND: f64 = 0.02;

// Task-space profile (steps, insertion).
const LINEAR_VEL: f64 = 0.5;
const LINEAR_ACCEL: f64 = 0.2;

// Faster profile used only for the randomized initialization move.
const INIT_VEL: f64 = 1.2;
const INIT_ACCEL: f64 = 0.25;

/// The arm's semantic operations, routed through one channel.
pub struct RobotArm {
    channel: CommandChannel,
    wait: WaitOptions,
}

impl RobotArm {
    pub fn new(channel: CommandChannel) -> Self {
        Self {
            channel,
            wait: WaitOptions::default(),
        }
    }

    /// Replace the wait options used by every subsequent operation, e.g. to
    /// thread a cancellation token or timeout through the poll loops.
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    /// Latest reported joint positions.
    pub async fn current_joints(&self) -> Result<JointState> {
        self.channel.current_joints().await
    }

    /// Latest reported TCP pose.
    pub async fn current_pose(&self) -> Result<Pose6D> {
        self.channel.current_pose().await
    }

    /// Joint-space move, blocking until all joints are within tolerance.
    pub async fn move_joints(
        &self,
        target: JointState,
        vel: f64,
        accel: f64,
        blend: f64,
    ) -> Result<()> {
        self.channel
            .send_command(&MotionCommand::MoveJoint {
                target,
                accel,
                vel,
                blend,
            })
            .await?;
        converge::wait_for_joints(&self.channel, &target, DEFAULT_JOINT_TOLERANCE, &self.wait)
            .await
    }

    /// Linear task-space move, blocking until the pose is within tolerance.
    pub async fn move_linear(&self, target: Pose6D, vel: f64, accel: f64) -> Result<()> {
        self.channel
            .send_command(&MotionCommand::MoveLinear { target, accel, vel })
            .await?;
        converge::wait_for_pose(
            &self.channel,
            &target,
            &ToleranceProfile::default(),
            &self.wait,
        )
        .await
    }

    /// Constant joint velocities for `duration` seconds. Fire-and-forget:
    /// a velocity move has no target to converge on.
    pub async fn speed_joints(
        &self,
        velocities: [f64; 6],
        accel: f64,
        duration: f64,
    ) -> Result<()> {
        self.channel
            .send_command(&MotionCommand::SpeedJoint {
                velocities,
                accel,
                duration,
            })
            .await
    }

    /// Joint move to the fixed home configuration.
    pub async fn go_home(&self) -> Result<()> {
        tracing::info!("moving to home position");
        self.move_joints(HOME_JOINTS, JOINT_VEL, JOINT_ACCEL, JOINT_BLEND)
            .await
    }

    /// Linear move to the reference pose perturbed by independent uniform
    /// integer millimeter offsets: x in [-5, 5], y in [-5, 0], z in [0, 5].
    pub async fn go_random_init(&self) -> Result<()> {
        let mut target = Pose6D::from_array(REFERENCE_POSE);
        let mut rng = rand::rng();
        target.position.x += rng.random_range(-5..=5) as f64 / 1000.0;
        target.position.y += rng.random_range(-5..=0) as f64 / 1000.0;
        target.position.z += rng.random_range(0..=5) as f64 / 1000.0;
        tracing::info!(?target, "moving to randomized init pose");
        self.move_linear(target, INIT_VEL, INIT_ACCEL).await
    }

    /// Rotate the wrist by a uniform random integer angle in [-15°, 15°].
    pub async fn random_rotate(&self) -> Result<()> {
        let angle = rand::rng().random_range(-15..=15) as f64;
        tracing::info!(angle, "rotating randomly");
        self.rotate_wrist(angle).await
    }

    pub async fn step_forward(&self, length: f64) -> Result<()> {
        tracing::info!(length, "moving forward");
        self.step_position(Vector3::new(-length, 0.0, 0.0)).await
    }

    pub async fn step_back(&self, length: f64) -> Result<()> {
        tracing::info!(length, "moving backward");
        self.step_position(Vector3::new(length, 0.0, 0.0)).await
    }

    pub async fn step_left(&self, length: f64) -> Result<()> {
        tracing::info!(length, "moving left");
        self.step_position(Vector3::new(0.0, length, 0.0)).await
    }

    pub async fn step_right(&self, length: f64) -> Result<()> {
        tracing::info!(length, "moving right");
        self.step_position(Vector3::new(0.0, -length, 0.0)).await
    }

    pub async fn step_up(&self, length: f64) -> Result<()> {
        tracing::info!(length, "moving up");
        self.step_position(Vector3::new(0.0, 0.0, length)).await
    }

    pub async fn step_down(&self, length: f64) -> Result<()> {
        tracing::info!(length, "moving down");
        self.step_position(Vector3::new(0.0, 0.0, -length)).await
    }

    /// Rotate the last joint clockwise by `angle_deg` degrees.
    pub async fn step_clockwise(&self, angle_deg: f64) -> Result<()> {
        tracing::info!(angle_deg, "rotating clockwise");
        self.rotate_wrist(angle_deg).await
    }

    /// Rotate the last joint anticlockwise by `angle_deg` degrees.
    pub async fn step_anticlockwise(&self, angle_deg: f64) -> Result<()> {
        tracing::info!(angle_deg, "rotating anticlockwise");
        self.rotate_wrist(-angle_deg).await
    }

    /// Final insertion: lower z by the fixed [`INSERT_DEPTH`].
    pub async fn done(&self) -> Result<()> {
        tracing::info!("inserting");
        self.step_position(Vector3::new(0.0, 0.0, -INSERT_DEPTH))
            .await
    }

    /// Move relative to the current pose: `dpos` added to position, `drpy`
    /// added to the RPY decomposition of the current orientation.
    pub async fn relative_move(
        &self,
        dpos: Vector3<f64>,
        drpy: Rpy,
        vel: f64,
        accel: f64,
    ) -> Result<Pose6D> {
        let current = self.current_pose().await?;
        let target = relative_target(&current, dpos, drpy);
        self.move_linear(target, vel, accel).await?;
        Ok(target)
    }

    /// Offset one position axis of the current pose, standard step profile.
    async fn step_position(&self, delta: Vector3<f64>) -> Result<()> {
        let mut target = self.current_pose().await?;
        target.position += delta;
        self.move_linear(target, LINEAR_VEL, LINEAR_ACCEL).await
    }

    /// Offset the last joint by `angle_deg` degrees, all others held at the
    /// current reading.
    async fn rotate_wrist(&self, angle_deg: f64) -> Result<()> {
        let mut target = self.current_joints().await?;
        target.0[5] += angle_deg.to_radians();
        self.move_joints(target, JOINT_VEL, JOINT_ACCEL, JOINT_BLEND)
            .await
    }
}

/// Compute the absolute target of a relative move. Pure; exposed for the
/// correction and test paths that reason about targets without issuing I/O.
pub fn relative_target(current: &Pose6D, dpos: Vector3<f64>, drpy: Rpy) -> Pose6D {
    let rpy = rotation_vector_to_rpy(current.rotation);
    let target_rpy = Rpy::new(rpy.roll + drpy.roll, rpy.pitch + drpy.pitch, rpy.yaw + drpy.yaw);
    Pose6D {
        position: current.position + dpos,
        rotation: rpy_to_rotation_vector(target_rpy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_target_pure_translation() {
        let start = Pose6D::from_array([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let target = relative_target(&start, Vector3::new(0.01, 0.0, 0.0), Rpy::new(0.0, 0.0, 0.0));
        assert_eq!(target.position, Vector3::new(0.01, 0.0, 0.0));
        assert_eq!(target.rotation, Vector3::zeros());
    }

    #[test]
    fn test_relative_target_adds_rpy() {
        let start = Pose6D::from_array([0.1, 0.2, 0.3, 0.0, 0.0, 0.5]);
        let target = relative_target(&start, Vector3::zeros(), Rpy::new(0.0, 0.0, 0.25));
        let rpy = rotation_vector_to_rpy(target.rotation);
        assert!((rpy.yaw - 0.75).abs() < 1e-9);
        assert!(rpy.roll.abs() < 1e-9);
        assert!(rpy.pitch.abs() < 1e-9);
        assert_eq!(target.position, start.position);
    }
}
