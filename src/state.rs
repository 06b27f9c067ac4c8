//! Binary state-frame codec.
//!
//! The controller reports its full state as a single binary frame whose
//! layout is owned by the controller firmware and treated as a fixed
//! contract:
//!
//! ```text
//! state frame, big-endian          // 492 bytes minimum
//!     u32 length;                  // total frame length, prefix included
//!     ...                          // firmware-internal fields
//!     f64 q_actual[6];             // offset 252: joint positions (rad)
//!     ...
//!     f64 tcp_actual[6];           // offset 444: x,y,z (m), rx,ry,rz (rad)
//! ```
//!
//! The length prefix is what the transport layer frames reads on (see
//! [`crate::channel`]); the decode functions here additionally check it
//! against the bytes actually received before trusting any offset.
//!
//! [`encode_state_frame`] is the inverse used by the simulator and by tests.

use bytes::{BufMut, BytesMut};

use crate::error::{Result, RobotError};
use crate::pose::{JointState, Pose6D};

/// Size of the length prefix.
pub const LENGTH_PREFIX: usize = 4;
/// Byte offset of the six actual joint positions.
pub const JOINT_DATA_OFFSET: usize = 252;
/// Byte offset of the actual TCP pose.
pub const TCP_POSE_OFFSET: usize = 444;
/// Smallest frame that contains both state sections.
pub const MIN_FRAME_LEN: usize = TCP_POSE_OFFSET + 6 * 8;

/// Validate the frame length field and overall size.
fn check_frame(frame: &[u8]) -> Result<()> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(RobotError::MalformedFrame(format!(
            "frame too short: {} bytes, need at least {MIN_FRAME_LEN}",
            frame.len()
        )));
    }
    let declared = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    if declared != frame.len() {
        return Err(RobotError::MalformedFrame(format!(
            "length field says {declared} bytes but frame has {}",
            frame.len()
        )));
    }
    Ok(())
}

fn read_f64x6(frame: &[u8], offset: usize) -> [f64; 6] {
    let mut out = [0.0; 6];
    for (i, v) in out.iter_mut().enumerate() {
        let start = offset + i * 8;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&frame[start..start + 8]);
        *v = f64::from_be_bytes(raw);
    }
    out
}

/// Decode the six actual joint positions from a state frame.
pub fn parse_joint_state(frame: &[u8]) -> Result<JointState> {
    check_frame(frame)?;
    Ok(JointState(read_f64x6(frame, JOINT_DATA_OFFSET)))
}

/// Decode the actual TCP pose from a state frame.
pub fn parse_tcp_pose(frame: &[u8]) -> Result<Pose6D> {
    check_frame(frame)?;
    Ok(Pose6D::from_array(read_f64x6(frame, TCP_POSE_OFFSET)))
}

/// Encode a minimal well-formed state frame carrying the given joint and
/// pose state. Firmware-internal fields are zeroed.
pub fn encode_state_frame(joints: &JointState, pose: &Pose6D) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(MIN_FRAME_LEN);
    buf.put_u32(MIN_FRAME_LEN as u32);
    buf.put_bytes(0, JOINT_DATA_OFFSET - LENGTH_PREFIX);
    for q in joints.0 {
        buf.put_f64(q);
    }
    buf.put_bytes(0, TCP_POSE_OFFSET - JOINT_DATA_OFFSET - 6 * 8);
    for v in pose.to_array() {
        buf.put_f64(v);
    }
    debug_assert_eq!(buf.len(), MIN_FRAME_LEN);
    buf.to_vec()
}
