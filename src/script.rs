//! Motion commands and their encoding to controller program text.
//!
//! The controller accepts small line-oriented programs of the shape
//!
//! ```text
//! def motion():
//!   movej([q0,q1,q2,q3,q4,q5], a=1.05, v=1.4, r=0.02)
//! end
//! ```
//!
//! with `movej` (joint-space move), `movel` (linear task-space move) or
//! `speedj` (joint velocity move) as the single primitive. Programs are sent
//! as one write with no acknowledgment; completion is confirmed separately by
//! polling state frames (see [`crate::converge`]).

use crate::pose::{JointState, Pose6D};

/// Program name used for every generated script. The controller only needs
/// the `def`/`end` wrapper; the name itself is not significant.
const PROGRAM_NAME: &str = "motion";

/// A single motion primitive, immutable once constructed.
///
/// Encoded to program text by [`MotionCommand::encode`] just before send.
#[derive(Clone, Debug, PartialEq)]
pub enum MotionCommand {
    /// Joint-space move to an absolute joint configuration.
    MoveJoint {
        target: JointState,
        /// Joint acceleration, rad/s^2.
        accel: f64,
        /// Joint velocity, rad/s.
        vel: f64,
        /// Blend radius, m.
        blend: f64,
    },
    /// Linear task-space move to an absolute pose.
    MoveLinear {
        target: Pose6D,
        /// Tool acceleration, m/s^2.
        accel: f64,
        /// Tool velocity, m/s.
        vel: f64,
    },
    /// Constant joint velocities held for a fixed duration.
    SpeedJoint {
        /// Per-joint velocities, rad/s.
        velocities: [f64; 6],
        /// Joint acceleration, rad/s^2.
        accel: f64,
        /// Duration, s.
        duration: f64,
    },
}

impl MotionCommand {
    /// Encode this command as a complete controller program.
    pub fn encode(&self) -> String {
        let body = match self {
            MotionCommand::MoveJoint {
                target,
                accel,
                vel,
                blend,
            } => format!(
                "movej([{}], a={accel}, v={vel}, r={blend})",
                join_scalars(&target.0)
            ),
            MotionCommand::MoveLinear { target, accel, vel } => format!(
                "movel(p[{}], a={accel}, v={vel}, t=0, r=0)",
                join_scalars(&target.to_array())
            ),
            MotionCommand::SpeedJoint {
                velocities,
                accel,
                duration,
            } => format!(
                "speedj([{}], a={accel}, t={duration})",
                join_scalars(velocities)
            ),
        };
        format!("def {PROGRAM_NAME}():\n  {body}\nend\n")
    }
}

fn join_scalars(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
