//! Transient TCP transport to the robot controller.
//!
//! Every operation opens its own connection and closes it before returning.
//! That is deliberately wasteful: it isolates each command and each state
//! query from stale socket state, and it is the contract the rest of the
//! crate is built on. Connections are never pooled or shared. Closing on
//! every exit path, including errors, falls out of the stream being owned by
//! the operation's scope and dropped with it.
//!
//! Sending a program is fire-and-forget: the controller never acknowledges
//! it. Completion is confirmed by re-reading state frames through
//! [`crate::converge`], not by any reply to the write.
//!
//! # Example
//!
//! ```no_run
//! use armscript::channel::{ChannelConfig, CommandChannel};
//!
//! # async fn example() -> armscript::error::Result<()> {
//! let channel = CommandChannel::new(ChannelConfig::new("192.168.56.6", 30003));
//! let joints = channel.current_joints().await?;
//! println!("joints: {:?}", joints.0);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Result, RobotError};
use crate::pose::{JointState, Pose6D};
use crate::script::MotionCommand;
use crate::state;

/// Upper bound on an incoming frame, to reject garbage length prefixes
/// before allocating.
const MAX_FRAME_LEN: usize = 16 * 1024;

/// Connection parameters for the controller endpoint.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Controller hostname or IP.
    pub host: String,
    /// Controller script/state port.
    pub port: u16,
    /// Limit on establishing a single connection.
    pub connect_timeout: Duration,
}

impl ChannelConfig {
    /// Create a config with the default connect timeout.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            connect_timeout: Duration::from_secs(2),
        }
    }
}

/// Handle for issuing one-shot operations against the controller.
///
/// Holds no connection itself; see the module docs for the per-call
/// connection policy.
#[derive(Clone, Debug)]
pub struct CommandChannel {
    config: ChannelConfig,
}

impl CommandChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }

    /// Open a fresh connection for one operation.
    async fn connect(&self) -> Result<TcpStream> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                RobotError::Connection(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out"),
                ))
            })??;
        Ok(stream)
    }

    /// Transmit a full program as a single write. No reply is read.
    pub async fn send_program(&self, program: &str) -> Result<()> {
        let mut stream = self.connect().await?;
        stream.write_all(program.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }

    /// Encode and transmit one motion command.
    pub async fn send_command(&self, command: &MotionCommand) -> Result<()> {
        self.send_program(&command.encode()).await
    }

    /// Read exactly one framed state report.
    ///
    /// The controller pushes a state frame on connect; this reads the 4-byte
    /// length prefix and then exactly the remaining body, so a frame is never
    /// assumed to fit in one socket read.
    pub async fn read_state_frame(&self) -> Result<Vec<u8>> {
        let mut stream = self.connect().await?;

        let mut prefix = [0u8; state::LENGTH_PREFIX];
        stream.read_exact(&mut prefix).await?;
        let total = u32::from_be_bytes(prefix) as usize;
        if total < state::MIN_FRAME_LEN || total > MAX_FRAME_LEN {
            return Err(RobotError::MalformedFrame(format!(
                "implausible frame length {total}"
            )));
        }

        let mut frame = vec![0u8; total];
        frame[..state::LENGTH_PREFIX].copy_from_slice(&prefix);
        stream.read_exact(&mut frame[state::LENGTH_PREFIX..]).await?;
        Ok(frame)
    }

    /// Read a state frame and decode the actual joint positions.
    pub async fn current_joints(&self) -> Result<JointState> {
        let frame = self.read_state_frame().await?;
        state::parse_joint_state(&frame)
    }

    /// Read a state frame and decode the actual TCP pose.
    pub async fn current_pose(&self) -> Result<Pose6D> {
        let frame = self.read_state_frame().await?;
        state::parse_tcp_pose(&frame)
    }
}
