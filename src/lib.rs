//! Waldo Reactor - a grid chemistry puzzle simulator
//!
//! Two programmable waldos move molecules around a reactor grid, pulling them
//! from input regions and delivering them to output regions. Each program
//! runs as ordinary blocking code and meets the scheduler once per tick.

pub mod challenge;
pub mod chemistry;
pub mod core;
pub mod driver;
pub mod programs;
pub mod reactor;
pub mod waldo;
