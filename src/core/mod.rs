pub mod config;
pub mod error;
pub mod types;

pub use config::{SimulationConfig, StepSpeed};
pub use error::{BondFault, ErrorCategory, ReactorError, Result};
pub use types::{Direction, GridPos, GridRect, MoleculeId, Tick, WaldoColor};
