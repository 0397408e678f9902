//! Atoms and their bond multisets

use std::collections::BTreeMap;

use crate::chemistry::element::Element;

/// Identifies an atom within its owning molecule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

/// A single atom, positioned relative to its molecule's anchor
///
/// Bonds are one half of a symmetric relation. `add_bond` and `break_bond`
/// only touch this side; `Molecule` applies them in pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub(crate) id: AtomId,
    pub(crate) element: Element,
    pub(crate) x_offset: i32,
    pub(crate) y_offset: i32,
    bonds: BTreeMap<AtomId, u8>,
}

impl Atom {
    pub fn new(id: AtomId, element: Element, x_offset: i32, y_offset: i32) -> Self {
        Self {
            id,
            element,
            x_offset,
            y_offset,
            bonds: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> AtomId {
        self.id
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn x_offset(&self) -> i32 {
        self.x_offset
    }

    pub fn y_offset(&self) -> i32 {
        self.y_offset
    }

    /// Total bond multiplicity across all partners
    pub fn bonds_used(&self) -> u32 {
        self.bonds.values().map(|&n| n as u32).sum()
    }

    pub fn free_bonds(&self) -> u32 {
        (self.element.max_bonds() as u32).saturating_sub(self.bonds_used())
    }

    pub fn bond_count_to(&self, other: AtomId) -> u8 {
        self.bonds.get(&other).copied().unwrap_or(0)
    }

    /// Partners and multiplicities, in id order
    pub fn bonds(&self) -> impl Iterator<Item = (AtomId, u8)> + '_ {
        self.bonds.iter().map(|(&id, &n)| (id, n))
    }

    /// Add one bond to `other`; false if the element is already at capacity
    pub fn add_bond(&mut self, other: AtomId) -> bool {
        if self.free_bonds() == 0 {
            return false;
        }
        *self.bonds.entry(other).or_insert(0) += 1;
        true
    }

    /// Remove one bond to `other`; false if there is none
    pub fn break_bond(&mut self, other: AtomId) -> bool {
        match self.bonds.get_mut(&other) {
            None => false,
            Some(n) if *n <= 1 => {
                self.bonds.remove(&other);
                true
            }
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}
