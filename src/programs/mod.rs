//! Ready-made waldo programs

pub mod samples;
pub mod script;

pub use samples::{BigLoop, LittleLoop, Shuttle};
pub use script::{ScriptProgram, ScriptStep};

use crate::core::types::GridPos;
use crate::waldo::WaldoProgram;

/// Names accepted by `sample`
pub const SAMPLE_NAMES: [&str; 3] = ["LittleLoop", "BigLoop", "Shuttle"];

/// Look up a sample program by name (case-insensitive) with its start cell
pub fn sample(name: &str) -> Option<(Box<dyn WaldoProgram>, GridPos)> {
    match name.to_ascii_lowercase().as_str() {
        "littleloop" => Some((Box::new(LittleLoop), LittleLoop::START)),
        "bigloop" => Some((Box::new(BigLoop), BigLoop::START)),
        "shuttle" => Some((Box::new(Shuttle), Shuttle::START)),
        _ => None,
    }
}
