//! Reactor - the grid, its regions, and the tick scheduler driving two waldos

pub mod chamber;
pub mod engine;
pub mod layout;
pub mod region;
pub mod shared;
pub mod snapshot;

pub use chamber::Chamber;
pub use engine::{Reactor, TickReport};
pub use layout::{ReactorLayout, RegionSpec};
pub use region::{Blueprint, ReactorRegion, RegionKind, RegionLabel};
pub use shared::SharedReactor;
pub use snapshot::{AtomSnapshot, MoleculeSnapshot, ReactorSnapshot, RegionSnapshot, WaldoSnapshot};
