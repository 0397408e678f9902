use std::time::Duration;
use thiserror::Error;

use crate::core::types::{GridPos, MoleculeId, WaldoColor};
use crate::reactor::RegionLabel;

/// Broad classes of failure, deciding whether a run can continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input at the point of a call; the rest of the reactor is unaffected
    Configuration,
    /// Impossible world configuration reached; the run must stop
    SimulationFault,
    /// A program failed to cooperate with the scheduler; the run must stop
    SchedulingFault,
    /// The run already stopped or the shared state is unusable
    Aborted,
    /// Reading configuration or challenge files
    Io,
}

/// Why an authored bond was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondFault {
    MissingAtom,
    Diagonal,
    NotAdjacent,
    Capacity,
    NoBond,
}

impl std::fmt::Display for BondFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BondFault::MissingAtom => write!(f, "no atom at one of the positions"),
            BondFault::Diagonal => write!(f, "positions are diagonal"),
            BondFault::NotAdjacent => write!(f, "positions are not one step apart"),
            BondFault::Capacity => write!(f, "an atom has no free bonds"),
            BondFault::NoBond => write!(f, "atoms are not bonded"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReactorError {
    #[error("Invalid reactor dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("Start position {pos} for {color} waldo is out of bounds")]
    StartOutOfBounds { color: WaldoColor, pos: GridPos },

    #[error("The {0} waldo already has a program")]
    AlreadyBound(WaldoColor),

    #[error("Invalid bond {from} -> {to}: {fault}")]
    InvalidBond {
        from: GridPos,
        to: GridPos,
        fault: BondFault,
    },

    #[error("No region labelled {0:?}")]
    UnknownRegion(RegionLabel),

    #[error("Region {0:?} is not an input")]
    RegionNotInput(RegionLabel),

    #[error("Region {0:?} is not an output")]
    RegionNotOutput(RegionLabel),

    #[error("Region {0:?} is defined more than once")]
    DuplicateRegion(RegionLabel),

    #[error("Region {0:?} does not fit inside the reactor")]
    RegionOutOfBounds(RegionLabel),

    #[error("Regions {0:?} and {1:?} overlap")]
    OverlappingRegions(RegionLabel, RegionLabel),

    #[error("Input region {0:?} has no blueprints")]
    NoBlueprints(RegionLabel),

    #[error("Blueprint for {0:?} has zero weight")]
    ZeroWeight(RegionLabel),

    #[error("Blueprint for {0:?} has no atoms")]
    EmptyBlueprint(RegionLabel),

    #[error("Blueprint for {0:?} does not fit inside the region")]
    BlueprintOutsideRegion(RegionLabel),

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Unknown challenge: {0}")]
    UnknownChallenge(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Molecule collision detected moving {molecule} held by the {color} waldo")]
    Collision { color: WaldoColor, molecule: MoleculeId },

    #[error("Molecule {0} dropped while already loose")]
    DoubleDrop(MoleculeId),

    #[error("{program} ({color} waldo) took too long to act (timeout {timeout:?})")]
    ProgramTimeout {
        color: WaldoColor,
        program: String,
        timeout: Duration,
    },

    #[error("{program} ({color} waldo) crashed: {message}")]
    ProgramPanicked {
        color: WaldoColor,
        program: String,
        message: String,
    },

    #[error("Run aborted after fatal fault: {0}")]
    RunAborted(String),

    #[error("Reactor lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl ReactorError {
    pub fn category(&self) -> ErrorCategory {
        use ReactorError::*;
        match self {
            Collision { .. } | DoubleDrop(_) => ErrorCategory::SimulationFault,
            ProgramTimeout { .. } | ProgramPanicked { .. } => ErrorCategory::SchedulingFault,
            RunAborted(_) | LockPoisoned => ErrorCategory::Aborted,
            IoError(_) | TomlError(_) | SerdeError(_) => ErrorCategory::Io,
            _ => ErrorCategory::Configuration,
        }
    }

    /// Faults that must stop the owning run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::SimulationFault | ErrorCategory::SchedulingFault
        )
    }

    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}

pub type Result<T> = std::result::Result<T, ReactorError>;
