//! Reactor chamber - the grid, its regions and every molecule not held by a waldo
//!
//! This is the spatial authority: it decides what a grab picks up, whether an
//! input has room, and which molecule an output region consumes.

use crate::chemistry::Molecule;
use crate::core::config::SimulationConfig;
use crate::core::error::{ReactorError, Result};
use crate::core::types::{GridPos, GridRect, Tick};
use crate::reactor::layout::ReactorLayout;
use crate::reactor::region::{ReactorRegion, RegionLabel};

#[derive(Debug)]
pub struct Chamber {
    width: i32,
    height: i32,
    tick: Tick,
    regions: Vec<ReactorRegion>,
    loose: Vec<Molecule>,
}

impl Chamber {
    pub fn new(layout: &ReactorLayout, config: &SimulationConfig) -> Result<Self> {
        Ok(Self {
            width: layout.width,
            height: layout.height,
            tick: 0,
            regions: layout.build_regions(config)?,
            loose: Vec::new(),
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub(crate) fn set_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }

    pub fn bounds(&self) -> GridRect {
        GridRect::new(0, 0, self.width, self.height)
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        self.bounds().contains(pos)
    }

    pub fn regions(&self) -> &[ReactorRegion] {
        &self.regions
    }

    pub fn region(&self, label: RegionLabel) -> Option<&ReactorRegion> {
        self.regions.iter().find(|r| r.label() == label)
    }

    fn region_mut(&mut self, label: RegionLabel) -> Result<&mut ReactorRegion> {
        self.regions
            .iter_mut()
            .find(|r| r.label() == label)
            .ok_or(ReactorError::UnknownRegion(label))
    }

    /// Molecules not held by any waldo, in the order they became loose
    pub fn loose(&self) -> &[Molecule] {
        &self.loose
    }

    pub fn loose_index_at(&self, pos: GridPos) -> Option<usize> {
        self.loose.iter().position(|m| m.hit_test(pos.x, pos.y))
    }

    pub(crate) fn take_loose(&mut self, index: usize) -> Molecule {
        self.loose.remove(index)
    }

    /// Loose molecules lying entirely inside `rect`
    pub fn loose_within(&self, rect: GridRect) -> impl Iterator<Item = &Molecule> + '_ {
        self.loose
            .iter()
            .filter(move |m| m.bounds().is_some_and(|b| rect.contains_rect(&b)))
    }

    /// Remove and return the first loose molecule with an atom at `pos`
    pub fn grab_molecule(&mut self, pos: GridPos) -> Option<Molecule> {
        self.loose_index_at(pos).map(|i| self.loose.remove(i))
    }

    /// Return a molecule to the loose set
    ///
    /// Dropping a molecule that is already loose is a fatal fault.
    pub fn drop_molecule(&mut self, molecule: Molecule) -> Result<()> {
        if self.loose.iter().any(|m| m.id() == molecule.id()) {
            return Err(ReactorError::DoubleDrop(molecule.id()));
        }
        self.loose.push(molecule);
        Ok(())
    }

    /// Draw from an input region and place the result
    ///
    /// Returns false, leaving the chamber unchanged, if the drawn molecule
    /// would overlap a loose one.
    pub fn input(&mut self, label: RegionLabel) -> Result<bool> {
        let tick = self.tick;
        let region = self.region_mut(label)?;
        if !label.is_input() {
            return Err(ReactorError::RegionNotInput(label));
        }
        let molecule = region.input(tick)?;

        if self.loose.iter().any(|m| m.overlaps(&molecule)) {
            tracing::debug!(region = %label, tick, "input blocked by an occupying molecule");
            return Ok(false);
        }
        tracing::debug!(region = %label, tick, molecule = %molecule.id(), atoms = molecule.len(), "molecule input");
        self.loose.push(molecule);
        Ok(true)
    }

    /// Hand a contained loose molecule to an output region
    ///
    /// Returns whether loose molecules still lie inside the region afterwards.
    pub fn output(&mut self, label: RegionLabel) -> Result<bool> {
        if !label.is_output() {
            return Err(ReactorError::RegionNotOutput(label));
        }
        let tick = self.tick;
        let rect = self.region_mut(label)?.rect();

        let index = self
            .loose
            .iter()
            .position(|m| m.bounds().is_some_and(|b| rect.contains_rect(&b)));
        let molecule = index.map(|i| self.loose.remove(i));
        self.region_mut(label)?.output(tick, molecule)?;

        Ok(self.loose_within(rect).next().is_some())
    }
}
