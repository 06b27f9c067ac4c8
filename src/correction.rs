//! Majority-vote correction heuristic.
//!
//! Every few steps an external expert judges, per axis, whether the last
//! window of moves brought the tool closer to the target. For each axis
//! judged "not closer", the heuristic assumes the majority direction in the
//! history window was wrong: it rewrites those entries to the opposite label
//! and replays that many corrective steps in the opposite direction.
//!
//! This is a compensating control, not a planner. It never looks at
//! magnitudes, only discrete step counts, and it presumes all historical
//! steps used the step length/angle currently configured.

use crate::history::MoveHistory;
use crate::instruction::MoveStep;

/// Per-axis verdict, parsed by prefix match against the literal "closer".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisJudgment {
    Closer,
    NotCloser,
}

impl AxisJudgment {
    fn from_token(token: &str) -> AxisJudgment {
        if token.trim_start().starts_with("closer") {
            AxisJudgment::Closer
        } else {
            AxisJudgment::NotCloser
        }
    }

    pub fn is_closer(self) -> bool {
        self == AxisJudgment::Closer
    }
}

/// The expert's three-axis judgment of the last move window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub x: AxisJudgment,
    pub y: AxisJudgment,
    pub rz: AxisJudgment,
}

impl Evaluation {
    /// Parse judgment text of the shape
    /// `"No, closer along x, not closer along y, closer along rz"`.
    ///
    /// Slot 0 is an overall flag and is ignored; slots 1-3 are the x, y and
    /// rz verdicts. Returns None when fewer than four comma-separated slots
    /// are present.
    pub fn parse(text: &str) -> Option<Evaluation> {
        let parts: Vec<&str> = text.split(", ").collect();
        if parts.len() < 4 {
            return None;
        }
        Some(Evaluation {
            x: AxisJudgment::from_token(parts[1]),
            y: AxisJudgment::from_token(parts[2]),
            rz: AxisJudgment::from_token(parts[3]),
        })
    }
}

/// One axis's corrective action: `steps` replays of `direction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Correction {
    pub direction: MoveStep,
    pub steps: usize,
}

/// Decide and record the correction for one axis.
///
/// `first`/`second` are the axis's opposing labels in the source order
/// (forward/backward, left/right, clockwise/anticlockwise). The majority is
/// `first` only on a strictly greater count; an equal count selects
/// `second`. That tie-break mirrors the original control structure and is
/// kept as an explicit policy. Every majority entry in `history` is
/// rewritten in place to its opposite, and the returned step count is
/// exactly the number of entries rewritten.
pub fn plan_axis(history: &mut MoveHistory, first: MoveStep, second: MoveStep) -> Correction {
    let majority = if history.count(first) > history.count(second) {
        first
    } else {
        second
    };
    let steps = history.rewrite_all(majority, majority.opposite());
    Correction {
        direction: majority.opposite(),
        steps,
    }
}

/// Plan corrections for every axis judged "not closer", in x, y, rz order.
pub fn plan_corrections(eval: &Evaluation, history: &mut MoveHistory) -> Vec<Correction> {
    let axes = [
        (eval.x, MoveStep::Forward, MoveStep::Backward),
        (eval.y, MoveStep::Left, MoveStep::Right),
        (eval.rz, MoveStep::Clockwise, MoveStep::Anticlockwise),
    ];
    axes.into_iter()
        .filter(|(judgment, _, _)| !judgment.is_closer())
        .map(|(_, first, second)| plan_axis(history, first, second))
        .collect()
}
