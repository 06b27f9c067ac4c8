//! Convergence polling.
//!
//! The protocol offers no completion acknowledgment for a motion: the only
//! signal is the reported state drifting toward the commanded target. These
//! waiters re-read state through a [`CommandChannel`] every poll interval
//! until every axis is inside tolerance at least once, then return. There is
//! no settling or velocity check beyond that, so "converged" means "was
//! within tolerance on one poll", matching the controller's practical
//! behavior for blended motions.
//!
//! By default a wait blocks indefinitely, exactly like the underlying
//! protocol. [`WaitOptions`] adds the two escape hatches a stalled
//! connection needs: an opt-in timeout and a cancellation token. Both cover
//! the state reads themselves, not just the pauses between polls, so a
//! connection the controller accepts but never writes a frame on still
//! aborts the wait.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::channel::CommandChannel;
use crate::error::{Result, RobotError};
use crate::pose::{rotation_vector_to_rpy, JointState, Pose6D};

/// Default joint-space tolerance, radians.
pub const DEFAULT_JOINT_TOLERANCE: f64 = 0.01;

/// Delay between state polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Per-axis tolerances for a task-space wait.
#[derive(Clone, Copy, Debug)]
pub struct ToleranceProfile {
    /// Position tolerance per axis, m.
    pub position: [f64; 3],
    /// Orientation tolerance per RPY component, rad.
    pub orientation: [f64; 3],
}

impl Default for ToleranceProfile {
    fn default() -> Self {
        Self {
            position: [0.001; 3],
            orientation: [0.05; 3],
        }
    }
}

/// Knobs for a single convergence wait.
#[derive(Clone, Debug, Default)]
pub struct WaitOptions {
    /// None keeps the default [`POLL_INTERVAL`].
    pub poll_interval: Option<Duration>,
    /// Abort with [`RobotError::ConvergenceTimeout`] after this long.
    /// None (the default) blocks until convergence or cancellation.
    pub timeout: Option<Duration>,
    /// Cooperative cancellation; a fresh, never-cancelled token by default.
    pub cancel: CancellationToken,
}

impl WaitOptions {
    fn interval(&self) -> Duration {
        self.poll_interval.unwrap_or(POLL_INTERVAL)
    }
}

/// Block until all six joints are within `tol` radians of `target`.
pub async fn wait_for_joints(
    channel: &CommandChannel,
    target: &JointState,
    tol: f64,
    opts: &WaitOptions,
) -> Result<()> {
    let start = Instant::now();
    loop {
        let actual = guarded_read(opts, start, channel.current_joints()).await?;
        if actual.within(target, tol) {
            return Ok(());
        }
        tracing::trace!(?actual, ?target, "joints not converged yet");
        pause(opts, start).await?;
    }
}

/// Block until position and orientation are both inside `tol`.
///
/// Orientation is compared in RPY space: both the reported and the target
/// rotation vectors are converted before differencing, per axis.
pub async fn wait_for_pose(
    channel: &CommandChannel,
    target: &Pose6D,
    tol: &ToleranceProfile,
    opts: &WaitOptions,
) -> Result<()> {
    let start = Instant::now();
    loop {
        let actual = guarded_read(opts, start, channel.current_pose()).await?;
        if pose_within(&actual, target, tol) {
            return Ok(());
        }
        tracing::trace!(?actual, ?target, "pose not converged yet");
        pause(opts, start).await?;
    }
}

/// Run one state read raced against cancellation and the remaining part of
/// the timeout. A read that never completes (the controller accepted the
/// connection but writes nothing) would otherwise block past both escape
/// hatches.
async fn guarded_read<T>(
    opts: &WaitOptions,
    start: Instant,
    read: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        _ = opts.cancel.cancelled() => Err(RobotError::Cancelled),
        result = async {
            match opts.timeout {
                Some(limit) => {
                    let remaining = limit
                        .checked_sub(start.elapsed())
                        .unwrap_or(Duration::ZERO);
                    tokio::time::timeout(remaining, read)
                        .await
                        .map_err(|_| RobotError::ConvergenceTimeout(limit))?
                }
                None => read.await,
            }
        } => result,
    }
}

/// One inter-poll pause, honoring cancellation and the optional timeout.
async fn pause(opts: &WaitOptions, start: Instant) -> Result<()> {
    if let Some(limit) = opts.timeout {
        if start.elapsed() >= limit {
            return Err(RobotError::ConvergenceTimeout(limit));
        }
    }
    tokio::select! {
        _ = opts.cancel.cancelled() => Err(RobotError::Cancelled),
        _ = tokio::time::sleep(opts.interval()) => Ok(()),
    }
}

/// Tolerance check for a task-space pose, orientation in RPY space.
pub fn pose_within(actual: &Pose6D, target: &Pose6D, tol: &ToleranceProfile) -> bool {
    let actual_rpy = rotation_vector_to_rpy(actual.rotation);
    let target_rpy = rotation_vector_to_rpy(target.rotation);
    let pos_ok = (0..3).all(|i| (actual.position[i] - target.position[i]).abs() < tol.position[i]);
    let rot = [
        actual_rpy.roll - target_rpy.roll,
        actual_rpy.pitch - target_rpy.pitch,
        actual_rpy.yaw - target_rpy.yaw,
    ];
    pos_ok && (0..3).all(|i| rot[i].abs() < tol.orientation[i])
}
