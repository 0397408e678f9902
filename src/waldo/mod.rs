//! Waldos - grabber arms, the programs that drive them, and the rendezvous
//! that keeps each program in lockstep with the reactor clock

pub mod action;
pub mod agent;
pub mod program;
pub mod rendezvous;

pub use action::{Action, Outcome, WaldoView};
pub use agent::{Waldo, WaldoState};
pub use program::{FnProgram, ProgramContext, ProgramError, Step, WaldoProgram};
pub use rendezvous::{ProgramRunner, RunnerState};
