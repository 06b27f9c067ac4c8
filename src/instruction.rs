//! Instruction parsing.
//!
//! The driving loop receives free-form text ("move a little to the left")
//! from an external instruction source and needs one of a small closed set
//! of commands out of it. This parser scans whole words, so "anticlockwise"
//! can never be mistaken for "clockwise", and anything unrecognized maps to
//! the explicit [`Instruction::Unknown`] variant rather than an error:
//! unusable model output is an expected occurrence, not a fault.

use std::fmt;

/// One discrete executable step. These are the labels recorded in
/// [`crate::history::MoveHistory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveStep {
    Backward,
    Forward,
    Left,
    Right,
    Down,
    Up,
    Clockwise,
    Anticlockwise,
}

impl MoveStep {
    /// The step that undoes this one.
    pub fn opposite(self) -> MoveStep {
        match self {
            MoveStep::Backward => MoveStep::Forward,
            MoveStep::Forward => MoveStep::Backward,
            MoveStep::Left => MoveStep::Right,
            MoveStep::Right => MoveStep::Left,
            MoveStep::Down => MoveStep::Up,
            MoveStep::Up => MoveStep::Down,
            MoveStep::Clockwise => MoveStep::Anticlockwise,
            MoveStep::Anticlockwise => MoveStep::Clockwise,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoveStep::Backward => "backward",
            MoveStep::Forward => "forward",
            MoveStep::Left => "left",
            MoveStep::Right => "right",
            MoveStep::Down => "down",
            MoveStep::Up => "up",
            MoveStep::Clockwise => "clockwise",
            MoveStep::Anticlockwise => "anticlockwise",
        }
    }
}

impl fmt::Display for MoveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed instruction: either a discrete step, the terminal insertion
/// command, or nothing recognizable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    Step(MoveStep),
    Done,
    Unknown,
}

impl Instruction {
    /// Parse free-form instruction text. The first recognized word wins;
    /// matching is case-insensitive on whole words with punctuation
    /// stripped, and plural forms ("forwards") are accepted.
    pub fn parse(text: &str) -> Instruction {
        for word in text
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_ascii_lowercase();
            let parsed = match word.as_str() {
                "backward" | "backwards" => Instruction::Step(MoveStep::Backward),
                "forward" | "forwards" => Instruction::Step(MoveStep::Forward),
                "left" => Instruction::Step(MoveStep::Left),
                "right" => Instruction::Step(MoveStep::Right),
                "down" => Instruction::Step(MoveStep::Down),
                "up" => Instruction::Step(MoveStep::Up),
                "clockwise" => Instruction::Step(MoveStep::Clockwise),
                "anticlockwise" | "counterclockwise" => {
                    Instruction::Step(MoveStep::Anticlockwise)
                }
                "done" => Instruction::Done,
                _ => continue,
            };
            return parsed;
        }
        Instruction::Unknown
    }

    /// Like [`parse`](Instruction::parse), but for callers that treat
    /// unrecognized text as a hard failure rather than a no-op.
    pub fn parse_strict(text: &str) -> crate::error::Result<Instruction> {
        match Instruction::parse(text) {
            Instruction::Unknown => Err(crate::error::RobotError::UnknownInstruction(
                text.to_string(),
            )),
            instruction => Ok(instruction),
        }
    }
}
