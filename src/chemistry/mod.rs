//! Chemistry model - elements, atoms and molecules
//!
//! Molecules own their atoms outright. Bonds are stored on both atoms and
//! every mutation goes through `Molecule`, which keeps the two halves equal.

pub mod atom;
pub mod element;
pub mod molecule;

pub use atom::{Atom, AtomId};
pub use element::Element;
pub use molecule::{check_adjacent, Molecule};
