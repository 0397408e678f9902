//! Actions programs request and the feedback they get back

use serde::Serialize;

use crate::core::types::{Direction, GridPos, Tick};
use crate::reactor::RegionLabel;

/// One tick's worth of work for a waldo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Wait,
    Move(Direction),
    Grab,
    Drop,
    GrabDrop,
    Input(RegionLabel),
    Output(RegionLabel),
    Bond(Direction),
    Unbond(Direction),
}

/// Result of the previous action, delivered when the program resumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Whether a grab picked up a molecule
    Grabbed(bool),
    /// Whether an input produced a molecule
    Input(bool),
    /// Whether molecules remain in the output region afterwards
    Output { remaining: bool },
    /// Whether a bond or unbond took effect
    Bonded(bool),
    /// The reactor refused the action as a configuration error
    Rejected(String),
}

/// What a program sees of the world while it decides its next action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaldoView {
    pub tick: Tick,
    pub position: GridPos,
    pub grabbed: bool,
    pub holding: bool,
    pub last_outcome: Option<Outcome>,
}
