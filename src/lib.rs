//! Motion-script client for 6-axis robot arms.
//!
//! `armscript` commands an arm over a TCP socket using a line-oriented,
//! human-readable script protocol, and confirms motion completion by polling
//! the arm's reported joint/pose state until it converges on the commanded
//! target (the protocol offers no completion acknowledgment of its own).
//! On top of the motion primitives it provides the discrete-step task set
//! and the majority-vote correction heuristic used by instruction-driven
//! experiment loops.
//!
//! # Layers
//!
//! - [`pose`] - joint/pose value types, rotation-vector / RPY conversion
//! - [`script`] / [`state`] - program-text and state-frame codecs
//! - [`channel`] - one transient connection per operation, framed reads
//! - [`converge`] - polling waiters with optional timeout/cancellation
//! - [`tasks`] - named motion operations with fixed profiles
//! - [`instruction`] / [`history`] / [`correction`] / [`controller`] - the
//!   instruction-driven control layer
//! - [`sim`] - in-process controller simulator for development and tests
//!
//! # Example
//!
//! ```no_run
//! use armscript::channel::{ChannelConfig, CommandChannel};
//! use armscript::controller::RobotController;
//! use armscript::tasks::RobotArm;
//!
//! # async fn example() -> armscript::error::Result<()> {
//! let channel = CommandChannel::new(ChannelConfig::new("192.168.56.6", 30003));
//! let controller = RobotController::new(RobotArm::new(channel));
//!
//! controller.go_rand_init().await?;
//! controller.execute_text("move a little to the left").await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod controller;
pub mod converge;
pub mod correction;
pub mod error;
pub mod history;
pub mod instruction;
pub mod pose;
pub mod script;
pub mod sim;
pub mod state;
pub mod tasks;

pub use channel::{ChannelConfig, CommandChannel};
pub use controller::{InstructionSource, OutcomeRecord, RobotController};
pub use converge::{ToleranceProfile, WaitOptions};
pub use correction::{Correction, Evaluation};
pub use error::{Result, RobotError};
pub use history::MoveHistory;
pub use instruction::{Instruction, MoveStep};
pub use pose::{JointState, Pose6D, Rpy};
pub use script::MotionCommand;
pub use tasks::RobotArm;
