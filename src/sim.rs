//! In-process controller simulator.
//!
//! Drop-in stand-in for the real controller that doesn't need hardware:
//! accepts TCP connections, immediately pushes one framed state report (the
//! real controller streams state on connect; the client reads exactly one
//! frame), then consumes any program text the client sends and parses the
//! motion target out of it. A background tick advances the reported state
//! toward the active targets over time, so convergence polling behaves like
//! it does against a physical arm.
//!
//! Used by the `fake-controller` binary and by the integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::pose::{JointState, Pose6D};
use crate::state::encode_state_frame;

/// Simulated motion rates and starting state.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// State update period.
    pub tick: Duration,
    /// Linear speed of the simulated tool, m/s.
    pub linear_rate: f64,
    /// Angular speed of joints and rotation-vector components, rad/s.
    pub joint_rate: f64,
    pub start_joints: JointState,
    pub start_pose: Pose6D,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(5),
            linear_rate: 0.05,
            joint_rate: 1.0,
            start_joints: JointState([0.0; 6]),
            start_pose: Pose6D::from_array([0.0; 6]),
        }
    }
}

/// A command extracted from received program text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimCommand {
    MoveJoint(JointState),
    MoveLinear(Pose6D),
    /// Velocity moves have no target; the simulator ignores them.
    SpeedJoint,
}

/// Parse the first motion primitive out of a program.
///
/// Only the bracketed argument list matters here; velocities, accelerations
/// and blend radii don't affect the simulated target.
pub fn parse_program(text: &str) -> Option<SimCommand> {
    if let Some(args) = bracketed_list(text, "movej([", ']') {
        return Some(SimCommand::MoveJoint(JointState(args)));
    }
    if let Some(args) = bracketed_list(text, "movel(p[", ']') {
        return Some(SimCommand::MoveLinear(Pose6D::from_array(args)));
    }
    if text.contains("speedj([") {
        return Some(SimCommand::SpeedJoint);
    }
    None
}

fn bracketed_list(text: &str, open: &str, close: char) -> Option<[f64; 6]> {
    let start = text.find(open)? + open.len();
    let end = start + text[start..].find(close)?;
    let mut values = [0.0; 6];
    let mut count = 0;
    for part in text[start..end].split(',') {
        if count == 6 {
            return None;
        }
        values[count] = part.trim().parse().ok()?;
        count += 1;
    }
    (count == 6).then_some(values)
}

struct SimState {
    joints: JointState,
    pose: Pose6D,
    joint_target: JointState,
    pose_target: Pose6D,
    /// When set, state stops advancing; for exercising stalled motions.
    frozen: bool,
}

impl SimState {
    fn tick(&mut self, dt: f64, linear_rate: f64, joint_rate: f64) {
        if self.frozen {
            return;
        }
        for i in 0..6 {
            approach(&mut self.joints.0[i], self.joint_target.0[i], joint_rate * dt);
        }
        for i in 0..3 {
            approach(
                &mut self.pose.position[i],
                self.pose_target.position[i],
                linear_rate * dt,
            );
            approach(
                &mut self.pose.rotation[i],
                self.pose_target.rotation[i],
                joint_rate * dt,
            );
        }
    }
}

fn approach(value: &mut f64, target: f64, max_delta: f64) {
    let diff = target - *value;
    if diff.abs() <= max_delta {
        *value = target;
    } else {
        *value += max_delta * diff.signum();
    }
}

/// Handle to a running simulated controller.
pub struct SimController {
    state: Arc<Mutex<SimState>>,
    local_addr: SocketAddr,
    cancel: CancellationToken,
}

impl SimController {
    /// Bind and start serving. Use `"127.0.0.1:0"` for an ephemeral port.
    pub async fn bind(addr: &str, config: SimConfig) -> Result<SimController> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(SimState {
            joints: config.start_joints,
            pose: config.start_pose,
            joint_target: config.start_joints,
            pose_target: config.start_pose,
            frozen: false,
        }));
        let cancel = CancellationToken::new();

        tokio::spawn(motion_loop(
            Arc::clone(&state),
            config.clone(),
            cancel.clone(),
        ));
        tokio::spawn(accept_loop(listener, Arc::clone(&state), cancel.clone()));

        tracing::info!(%local_addr, "simulated controller listening");
        Ok(SimController {
            state,
            local_addr,
            cancel,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current reported state.
    pub fn snapshot(&self) -> (JointState, Pose6D) {
        let state = self.state.lock().unwrap();
        (state.joints, state.pose)
    }

    /// Stop advancing state toward targets (simulates a stalled arm).
    pub fn freeze(&self) {
        self.state.lock().unwrap().frozen = true;
    }

    pub fn unfreeze(&self) {
        self.state.lock().unwrap().frozen = false;
    }

    /// Stop serving. Idempotent; also triggered by drop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SimController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn motion_loop(state: Arc<Mutex<SimState>>, config: SimConfig, cancel: CancellationToken) {
    let dt = config.tick.as_secs_f64();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.tick) => {}
        }
        state
            .lock()
            .unwrap()
            .tick(dt, config.linear_rate, config.joint_rate);
    }
}

async fn accept_loop(listener: TcpListener, state: Arc<Mutex<SimState>>, cancel: CancellationToken) {
    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => return,
            accepted = listener.accept() => accepted,
        };
        let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("accept failed: {e}");
                continue;
            }
        };
        tracing::debug!(%peer, "client connected");
        let state = Arc::clone(&state);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state, cancel).await {
                tracing::warn!("connection error: {e}");
            }
        });
    }
}

/// Serve one client connection: push a state frame, then read program text
/// until the client closes its half.
async fn handle_connection(
    mut stream: TcpStream,
    state: Arc<Mutex<SimState>>,
    cancel: CancellationToken,
) -> Result<()> {
    let frame = {
        let state = state.lock().unwrap();
        encode_state_frame(&state.joints, &state.pose)
    };
    stream.write_all(&frame).await?;

    // The client writes fire-and-forget and may tear the connection down
    // (even with a reset) right after; program bytes that made it here
    // still count, so a read error is surfaced only after the parse.
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    let mut read_error = None;
    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = stream.read(&mut buf) => match read {
                Ok(n) => n,
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            },
        };
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
    }

    if !received.is_empty() {
        let text = String::from_utf8_lossy(&received);
        match parse_program(&text) {
            Some(SimCommand::MoveJoint(target)) => {
                tracing::debug!(?target, "movej received");
                state.lock().unwrap().joint_target = target;
            }
            Some(SimCommand::MoveLinear(target)) => {
                tracing::debug!(?target, "movel received");
                state.lock().unwrap().pose_target = target;
            }
            Some(SimCommand::SpeedJoint) => {
                tracing::debug!("speedj received, ignored");
            }
            None => {
                tracing::warn!(program = %text, "unrecognized program");
            }
        }
    }

    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
