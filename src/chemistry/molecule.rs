//! Molecules: anchored groups of bonded atoms that move as one unit
//!
//! Atom positions are stored relative to the molecule's anchor, which is fixed
//! by the first atom added. Everything the reactor sees is in absolute grid
//! coordinates.

use ahash::AHashMap;
use std::collections::VecDeque;

use crate::chemistry::atom::{Atom, AtomId};
use crate::chemistry::element::Element;
use crate::core::error::{BondFault, ReactorError, Result};
use crate::core::types::{GridPos, GridRect, MoleculeId};

#[derive(Debug, Clone)]
pub struct Molecule {
    id: MoleculeId,
    origin_x: i32,
    origin_y: i32,
    atoms: Vec<Atom>,
    next_atom_id: u32,
}

impl Default for Molecule {
    fn default() -> Self {
        Self::new()
    }
}

impl Molecule {
    pub fn new() -> Self {
        Self {
            id: MoleculeId::next(),
            origin_x: 0,
            origin_y: 0,
            atoms: Vec::new(),
            next_atom_id: 0,
        }
    }

    pub fn id(&self) -> MoleculeId {
        self.id
    }

    pub fn origin(&self) -> GridPos {
        GridPos::new(self.origin_x, self.origin_y)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Add an atom at an absolute position; the first atom fixes the anchor
    pub fn add(&mut self, element: Element, x: i32, y: i32) -> AtomId {
        if self.atoms.is_empty() {
            self.origin_x = x;
            self.origin_y = y;
        }
        let id = AtomId(self.next_atom_id);
        self.next_atom_id += 1;
        self.atoms
            .push(Atom::new(id, element, x - self.origin_x, y - self.origin_y));
        id
    }

    /// Builder form of `add`
    pub fn with_atom(mut self, element: Element, x: i32, y: i32) -> Self {
        self.add(element, x, y);
        self
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.id == id)
    }

    fn index_of(&self, id: AtomId) -> Option<usize> {
        self.atoms.iter().position(|a| a.id == id)
    }

    /// Absolute grid position of an atom
    pub fn position_of(&self, atom: &Atom) -> GridPos {
        GridPos::new(self.origin_x + atom.x_offset, self.origin_y + atom.y_offset)
    }

    /// The atom occupying an absolute position, if any
    pub fn atom_at(&self, pos: GridPos) -> Option<AtomId> {
        self.atoms
            .iter()
            .find(|a| self.position_of(a) == pos)
            .map(|a| a.id)
    }

    pub fn hit_test(&self, x: i32, y: i32) -> bool {
        self.atom_at(GridPos::new(x, y)).is_some()
    }

    /// Absolute positions of every atom, in insertion order
    pub fn positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.atoms.iter().map(|a| self.position_of(a))
    }

    /// True if any cell is occupied by both molecules
    pub fn overlaps(&self, other: &Molecule) -> bool {
        self.positions().any(|p| other.hit_test(p.x, p.y))
    }

    /// Tight bounding box, `None` for an empty molecule
    pub fn bounds(&self) -> Option<GridRect> {
        let min_x = self.atoms.iter().map(|a| a.x_offset).min()?;
        let max_x = self.atoms.iter().map(|a| a.x_offset).max()?;
        let min_y = self.atoms.iter().map(|a| a.y_offset).min()?;
        let max_y = self.atoms.iter().map(|a| a.y_offset).max()?;
        Some(GridRect::from_edges(
            self.origin_x + min_x,
            self.origin_y + min_y,
            self.origin_x + max_x + 1,
            self.origin_y + max_y + 1,
        ))
    }

    /// Author a bond between the atoms at two absolute positions
    ///
    /// The positions must be orthogonal neighbours exactly one cell apart.
    pub fn bond(&mut self, ax: i32, ay: i32, bx: i32, by: i32) -> Result<()> {
        let from = GridPos::new(ax, ay);
        let to = GridPos::new(bx, by);
        let fail = |fault| ReactorError::InvalidBond { from, to, fault };

        let a = self.atom_at(from).ok_or_else(|| fail(BondFault::MissingAtom))?;
        let b = self.atom_at(to).ok_or_else(|| fail(BondFault::MissingAtom))?;
        check_adjacent(from, to).map_err(fail)?;
        self.bond_between(a, b).map_err(fail)
    }

    /// Builder form of `bond`
    pub fn with_bond(mut self, ax: i32, ay: i32, bx: i32, by: i32) -> Result<Self> {
        self.bond(ax, ay, bx, by)?;
        Ok(self)
    }

    /// Add one bond on both sides, or neither
    pub fn bond_between(&mut self, a: AtomId, b: AtomId) -> std::result::Result<(), BondFault> {
        let ia = self.index_of(a).ok_or(BondFault::MissingAtom)?;
        let ib = self.index_of(b).ok_or(BondFault::MissingAtom)?;
        if ia == ib {
            return Err(BondFault::NotAdjacent);
        }
        if self.atoms[ia].free_bonds() == 0 || self.atoms[ib].free_bonds() == 0 {
            return Err(BondFault::Capacity);
        }
        self.atoms[ia].add_bond(b);
        self.atoms[ib].add_bond(a);
        Ok(())
    }

    /// Remove one bond on both sides; false if the atoms are not bonded
    pub fn unbond_between(&mut self, a: AtomId, b: AtomId) -> bool {
        let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) else {
            return false;
        };
        if self.atoms[ia].bond_count_to(b) == 0 {
            return false;
        }
        self.atoms[ia].break_bond(b);
        self.atoms[ib].break_bond(a);
        true
    }

    /// Deep copy shifted by `(dx, dy)`, with a fresh id and fresh atoms
    pub fn clone_offset(&self, dx: i32, dy: i32) -> Molecule {
        let mut molecule = Molecule::new();
        let clones: AHashMap<AtomId, AtomId> = self
            .atoms
            .iter()
            .map(|atom| {
                let pos = self.position_of(atom);
                (atom.id, molecule.add(atom.element, pos.x + dx, pos.y + dy))
            })
            .collect();

        for atom in &self.atoms {
            let clone = clones[&atom.id];
            let index = molecule.atoms.iter().position(|a| a.id == clone);
            for (partner, count) in atom.bonds() {
                if let (Some(i), Some(&other)) = (index, clones.get(&partner)) {
                    for _ in 0..count {
                        molecule.atoms[i].add_bond(other);
                    }
                }
            }
        }

        molecule
    }

    /// Shift the anchor unconditionally
    pub(crate) fn translate(&mut self, dx: i32, dy: i32) {
        self.origin_x += dx;
        self.origin_y += dy;
    }

    /// Shift the anchor if the result stays inside `[0,width) x [0,height)`
    ///
    /// Leaves the molecule untouched and returns false otherwise.
    pub fn translate_within(&mut self, dx: i32, dy: i32, width: i32, height: i32) -> bool {
        if let Some(b) = self.bounds() {
            let arena = GridRect::new(0, 0, width, height);
            let moved = GridRect::new(b.x + dx, b.y + dy, b.width, b.height);
            if !arena.contains_rect(&moved) {
                return false;
            }
        }
        self.translate(dx, dy);
        true
    }

    /// Move every atom of `other` into this molecule, keeping absolute positions and bonds
    ///
    /// Returns the new ids of the absorbed atoms keyed by their old ids.
    pub fn absorb(&mut self, other: Molecule) -> AHashMap<AtomId, AtomId> {
        let mapping: AHashMap<AtomId, AtomId> = other
            .atoms
            .iter()
            .map(|atom| {
                let pos = other.position_of(atom);
                (atom.id, self.add(atom.element, pos.x, pos.y))
            })
            .collect();

        for atom in &other.atoms {
            let Some(index) = self.index_of(mapping[&atom.id]) else {
                continue;
            };
            for (partner, count) in atom.bonds() {
                if let Some(&new_partner) = mapping.get(&partner) {
                    for _ in 0..count {
                        self.atoms[index].add_bond(new_partner);
                    }
                }
            }
        }

        mapping
    }

    /// Atoms reachable from `start` through bonds, including `start`
    pub fn connected_component(&self, start: AtomId) -> Vec<AtomId> {
        let mut seen = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            let Some(atom) = self.atom(id) else { continue };
            for (partner, _) in atom.bonds() {
                if !seen.contains(&partner) {
                    seen.push(partner);
                    queue.push_back(partner);
                }
            }
        }
        seen
    }

    /// Split off the component containing `detach` if it is no longer bonded to `keep`
    pub fn split_off(&mut self, keep: AtomId, detach: AtomId) -> Option<Molecule> {
        self.atom(detach)?;
        let component = self.connected_component(detach);
        if component.contains(&keep) {
            return None;
        }

        let mut detached: Vec<Atom> = Vec::new();
        let mut kept: Vec<Atom> = Vec::new();
        for atom in self.atoms.drain(..) {
            if component.contains(&atom.id) {
                detached.push(atom);
            } else {
                kept.push(atom);
            }
        }
        self.atoms = kept;

        let source = Molecule {
            id: self.id,
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            atoms: detached,
            next_atom_id: self.next_atom_id,
        };
        let mut split = Molecule::new();
        split.absorb(source);
        Some(split)
    }
}

/// Bonds must join orthogonal neighbours exactly one step apart
pub fn check_adjacent(from: GridPos, to: GridPos) -> std::result::Result<(), BondFault> {
    let dx = (from.x - to.x).abs();
    let dy = (from.y - to.y).abs();
    if dx != 0 && dy != 0 {
        return Err(BondFault::Diagonal);
    }
    if dx + dy != 1 {
        return Err(BondFault::NotAdjacent);
    }
    Ok(())
}
