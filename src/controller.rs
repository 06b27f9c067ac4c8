//! Top-level controller: instruction dispatch and correction replay.
//!
//! [`RobotController`] is what the experiment loop drives: it turns opaque
//! instruction text into discrete arm steps of a fixed configured size,
//! applies a z safety floor to downward steps, and replays the corrective
//! steps the majority-vote heuristic decides on. The experiment loop itself
//! (capture, model query, logging) stays outside this crate and talks to it
//! through [`InstructionSource`] and the methods here.

use crate::correction::{plan_corrections, Correction, Evaluation};
use crate::error::Result;
use crate::history::MoveHistory;
use crate::instruction::{Instruction, MoveStep};
use crate::tasks::RobotArm;

/// Default translation per discrete step, m.
pub const DEFAULT_STEP_LENGTH: f64 = 0.001;
/// Default wrist rotation per discrete step, degrees.
pub const DEFAULT_STEP_ANGLE_DEG: f64 = 1.0;
/// Tool z below which downward steps are refused, m.
pub const DEFAULT_Z_FLOOR: f64 = 0.12403579;

/// Dispatches instructions and corrections onto a [`RobotArm`].
pub struct RobotController {
    arm: RobotArm,
    step_length: f64,
    step_angle_deg: f64,
    z_floor: f64,
}

impl RobotController {
    pub fn new(arm: RobotArm) -> Self {
        Self {
            arm,
            step_length: DEFAULT_STEP_LENGTH,
            step_angle_deg: DEFAULT_STEP_ANGLE_DEG,
            z_floor: DEFAULT_Z_FLOOR,
        }
    }

    /// Override the translation per step.
    pub fn with_step_length(mut self, meters: f64) -> Self {
        self.step_length = meters;
        self
    }

    /// Override the rotation per step.
    pub fn with_step_angle(mut self, degrees: f64) -> Self {
        self.step_angle_deg = degrees;
        self
    }

    /// Override the downward safety floor.
    pub fn with_z_floor(mut self, meters: f64) -> Self {
        self.z_floor = meters;
        self
    }

    pub fn arm(&self) -> &RobotArm {
        &self.arm
    }

    /// Home the arm, then move to the randomized start pose.
    pub async fn go_rand_init(&self) -> Result<()> {
        self.arm.go_home().await?;
        self.arm.go_random_init().await
    }

    /// Parse instruction text without executing anything.
    pub fn interpret(&self, text: &str) -> Instruction {
        Instruction::parse(text)
    }

    /// Parse and execute one instruction. Unknown text executes nothing and
    /// is reported as [`Instruction::Unknown`]; it is not an error.
    pub async fn execute_text(&self, text: &str) -> Result<Instruction> {
        let instruction = Instruction::parse(text);
        if instruction == Instruction::Unknown {
            tracing::info!(text, "no actionable command found in instruction");
            return Ok(Instruction::Unknown);
        }
        self.execute(instruction).await?;
        Ok(instruction)
    }

    /// Execute one parsed instruction with the configured step profile.
    pub async fn execute(&self, instruction: Instruction) -> Result<()> {
        match instruction {
            Instruction::Step(MoveStep::Down) => {
                let pose = self.arm.current_pose().await?;
                if pose.position.z > self.z_floor {
                    self.arm.step_down(self.step_length).await?;
                } else {
                    tracing::warn!(z = pose.position.z, floor = self.z_floor,
                        "skipping down step at safety floor");
                }
            }
            Instruction::Step(step) => self.step(step).await?,
            Instruction::Done => self.arm.done().await?,
            Instruction::Unknown => {}
        }
        Ok(())
    }

    /// Execute one discrete step of the configured size, no safety check.
    pub async fn step(&self, step: MoveStep) -> Result<()> {
        match step {
            MoveStep::Backward => self.arm.step_back(self.step_length).await,
            MoveStep::Forward => self.arm.step_forward(self.step_length).await,
            MoveStep::Left => self.arm.step_left(self.step_length).await,
            MoveStep::Right => self.arm.step_right(self.step_length).await,
            MoveStep::Down => self.arm.step_down(self.step_length).await,
            MoveStep::Up => self.arm.step_up(self.step_length).await,
            MoveStep::Clockwise => self.arm.step_clockwise(self.step_angle_deg).await,
            MoveStep::Anticlockwise => self.arm.step_anticlockwise(self.step_angle_deg).await,
        }
    }

    /// Apply the expert's judgment: plan per-axis inversions over `history`
    /// and replay each planned correction on the arm.
    ///
    /// Returns the corrections performed. Judgment text that does not parse
    /// is ignored (logged), matching the no-fault treatment of unusable
    /// model output.
    pub async fn apply_correction(
        &self,
        judgment: &str,
        history: &mut MoveHistory,
    ) -> Result<Vec<Correction>> {
        let Some(eval) = Evaluation::parse(judgment) else {
            tracing::warn!(judgment, "unparseable judgment, skipping correction");
            return Ok(Vec::new());
        };
        let corrections = plan_corrections(&eval, history);
        for correction in &corrections {
            tracing::info!(
                direction = %correction.direction,
                steps = correction.steps,
                "replaying corrective steps"
            );
            for _ in 0..correction.steps {
                self.step(correction.direction).await?;
            }
        }
        Ok(corrections)
    }
}

/// Outcome of one executed instruction, handed back to the external loop
/// for logging.
#[derive(Clone, Debug)]
pub struct OutcomeRecord {
    /// 1-based index of the move within the run.
    pub move_count: u64,
    /// The raw instruction text that produced it.
    pub instruction_text: String,
    /// What was actually executed (possibly `Unknown`).
    pub executed: Instruction,
}

/// The external collaborator the driving loop consumes: something that
/// produces instruction text, periodic judgment text, and accepts outcome
/// records. How these are produced (HTTP model calls, image capture) is out
/// of scope here.
pub trait InstructionSource {
    /// Next instruction to execute, as opaque text.
    fn next_instruction(&mut self) -> impl std::future::Future<Output = anyhow::Result<String>>;

    /// Periodic three-axis judgment text (see [`Evaluation::parse`]).
    fn evaluation(&mut self) -> impl std::future::Future<Output = anyhow::Result<String>>;

    /// Record the outcome of one executed instruction.
    fn log_outcome(
        &mut self,
        record: &OutcomeRecord,
    ) -> impl std::future::Future<Output = anyhow::Result<()>>;
}
