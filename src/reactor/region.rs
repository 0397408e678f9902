//! Reactor regions - labelled rectangles that produce or consume molecules
//!
//! Input regions hold weighted blueprints and draw from them with their own
//! generator. Output regions only count what they are handed. Both record the
//! tick they were last touched so a display can flash them.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chemistry::Molecule;
use crate::core::error::{ReactorError, Result};
use crate::core::types::{GridRect, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionLabel {
    InputA,
    InputB,
    OutputC,
    OutputD,
}

impl RegionLabel {
    pub const ALL: [RegionLabel; 4] = [
        RegionLabel::InputA,
        RegionLabel::InputB,
        RegionLabel::OutputC,
        RegionLabel::OutputD,
    ];

    pub fn kind(self) -> RegionKind {
        match self {
            RegionLabel::InputA | RegionLabel::InputB => RegionKind::Input,
            RegionLabel::OutputC | RegionLabel::OutputD => RegionKind::Output,
        }
    }

    pub fn is_input(self) -> bool {
        self.kind() == RegionKind::Input
    }

    pub fn is_output(self) -> bool {
        self.kind() == RegionKind::Output
    }
}

impl fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for RegionLabel {
    type Err = ReactorError;

    /// Accepts "InputA" style names or the bare letter
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "inputa" | "a" => Ok(RegionLabel::InputA),
            "inputb" | "b" => Ok(RegionLabel::InputB),
            "outputc" | "c" => Ok(RegionLabel::OutputC),
            "outputd" | "d" => Ok(RegionLabel::OutputD),
            _ => Err(ReactorError::Parse(format!("unknown region label '{}'", s))),
        }
    }
}

/// A template molecule in region-local coordinates with a selection weight
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub molecule: Molecule,
    pub weight: u32,
}

pub struct ReactorRegion {
    rect: GridRect,
    label: RegionLabel,
    blueprints: Vec<Blueprint>,
    rng: Box<dyn RngCore + Send>,
    last_pulse_tick: Option<Tick>,
    molecules_in: u64,
    molecules_out: u64,
}

impl fmt::Debug for ReactorRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorRegion")
            .field("rect", &self.rect)
            .field("label", &self.label)
            .field("blueprints", &self.blueprints.len())
            .field("last_pulse_tick", &self.last_pulse_tick)
            .finish_non_exhaustive()
    }
}

impl ReactorRegion {
    /// Region drawing from an injected random source
    pub fn new(label: RegionLabel, rect: GridRect, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            rect,
            label,
            blueprints: Vec::new(),
            rng,
            last_pulse_tick: None,
            molecules_in: 0,
            molecules_out: 0,
        }
    }

    /// Region with its own deterministic generator
    pub fn seeded(label: RegionLabel, rect: GridRect, seed: u64) -> Self {
        Self::new(label, rect, Box::new(ChaCha8Rng::seed_from_u64(seed)))
    }

    pub fn rect(&self) -> GridRect {
        self.rect
    }

    pub fn label(&self) -> RegionLabel {
        self.label
    }

    pub fn blueprints(&self) -> &[Blueprint] {
        &self.blueprints
    }

    pub fn last_pulse_tick(&self) -> Option<Tick> {
        self.last_pulse_tick
    }

    /// Molecules generated so far
    pub fn molecules_in(&self) -> u64 {
        self.molecules_in
    }

    /// Molecules consumed so far
    pub fn molecules_out(&self) -> u64 {
        self.molecules_out
    }

    pub fn total_weight(&self) -> u64 {
        self.blueprints.iter().map(|b| b.weight as u64).sum()
    }

    /// Register a blueprint; empty, zero-weight or ill-fitting blueprints are refused
    pub fn add_blueprint(&mut self, molecule: Molecule, weight: u32) -> Result<()> {
        if !self.label.is_input() {
            return Err(ReactorError::RegionNotInput(self.label));
        }
        if weight == 0 {
            return Err(ReactorError::ZeroWeight(self.label));
        }
        let placed = molecule
            .clone_offset(self.rect.x, self.rect.y)
            .bounds()
            .ok_or(ReactorError::EmptyBlueprint(self.label))?;
        if !self.rect.contains_rect(&placed) {
            return Err(ReactorError::BlueprintOutsideRegion(self.label));
        }
        self.blueprints.push(Blueprint { molecule, weight });
        Ok(())
    }

    /// Builder form of `add_blueprint`
    pub fn with_blueprint(mut self, molecule: Molecule, weight: u32) -> Result<Self> {
        self.add_blueprint(molecule, weight)?;
        Ok(self)
    }

    /// Record activity at `tick`; never moves backwards
    pub fn pulse(&mut self, tick: Tick) {
        self.last_pulse_tick = Some(self.last_pulse_tick.map_or(tick, |t| t.max(tick)));
    }

    /// Draw a blueprint by weight and place a fresh copy at the region origin
    pub fn input(&mut self, tick: Tick) -> Result<Molecule> {
        if !self.label.is_input() {
            return Err(ReactorError::RegionNotInput(self.label));
        }
        self.pulse(tick);

        let total = self.total_weight();
        if total == 0 {
            return Err(ReactorError::NoBlueprints(self.label));
        }

        let mut remainder = self.rng.gen_range(0..total) as i64;
        let mut selected = &self.blueprints[0];
        for blueprint in &self.blueprints {
            remainder -= blueprint.weight as i64;
            if remainder < 0 {
                selected = blueprint;
                break;
            }
        }

        self.molecules_in += 1;
        Ok(selected.molecule.clone_offset(self.rect.x, self.rect.y))
    }

    /// Accept a molecule (or nothing) for output
    ///
    /// Containment is the caller's business; this only records the pulse.
    pub fn output(&mut self, tick: Tick, molecule: Option<Molecule>) -> Result<()> {
        if !self.label.is_output() {
            return Err(ReactorError::RegionNotOutput(self.label));
        }
        self.pulse(tick);
        if let Some(molecule) = molecule {
            tracing::debug!(region = %self.label, molecule = %molecule.id(), "molecule consumed");
            self.molecules_out += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::Element;
    use rand::rngs::mock::StepRng;

    fn single(element: Element) -> Molecule {
        Molecule::new().with_atom(element, 0, 0)
    }

    fn input_a(seed: u64) -> ReactorRegion {
        ReactorRegion::seeded(RegionLabel::InputA, GridRect::new(0, 0, 4, 4), seed)
    }

    #[test]
    fn test_label_kinds() {
        assert!(RegionLabel::InputB.is_input());
        assert!(RegionLabel::OutputD.is_output());
        assert_eq!("c".parse::<RegionLabel>().unwrap(), RegionLabel::OutputC);
    }

    #[test]
    fn test_forced_zero_draw_selects_first() {
        let mut region = ReactorRegion::new(
            RegionLabel::InputA,
            GridRect::new(0, 0, 4, 4),
            Box::new(StepRng::new(0, 0)),
        );
        region.add_blueprint(single(Element::N), 1).unwrap();
        region.add_blueprint(single(Element::O), 5).unwrap();
        for tick in 0..10 {
            let m = region.input(tick).unwrap();
            assert_eq!(m.atoms()[0].element(), Element::N);
        }
    }

    #[test]
    fn test_weighted_draw_ratio() {
        let mut region = input_a(42);
        region.add_blueprint(single(Element::C), 3).unwrap();
        region.add_blueprint(single(Element::H), 1).unwrap();

        let draws = 8000;
        let carbon = (0..draws)
            .filter(|&t| region.input(t).unwrap().atoms()[0].element() == Element::C)
            .count() as u64;
        let ratio = carbon as f64 / (draws - carbon) as f64;
        assert!((2.7..3.3).contains(&ratio), "ratio was {}", ratio);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = input_a(9);
        let mut b = input_a(9);
        for region in [&mut a, &mut b] {
            region.add_blueprint(single(Element::C), 1).unwrap();
            region.add_blueprint(single(Element::H), 1).unwrap();
        }
        for t in 0..50 {
            assert_eq!(
                a.input(t).unwrap().atoms()[0].element(),
                b.input(t).unwrap().atoms()[0].element()
            );
        }
    }

    #[test]
    fn test_input_places_at_region_origin() {
        let mut region =
            ReactorRegion::seeded(RegionLabel::InputB, GridRect::new(0, 4, 4, 4), 1);
        region.add_blueprint(single(Element::C), 1).unwrap();
        let m = region.input(3).unwrap();
        assert!(m.hit_test(0, 4));
        assert_eq!(region.last_pulse_tick(), Some(3));
    }

    #[test]
    fn test_blueprint_validation() {
        let mut region = input_a(1);
        assert!(matches!(
            region.add_blueprint(single(Element::C), 0),
            Err(ReactorError::ZeroWeight(_))
        ));
        assert!(matches!(
            region.add_blueprint(Molecule::new(), 1),
            Err(ReactorError::EmptyBlueprint(_))
        ));
        assert!(matches!(
            region.add_blueprint(Molecule::new().with_atom(Element::C, 4, 0), 1),
            Err(ReactorError::BlueprintOutsideRegion(_))
        ));
        assert!(matches!(region.input(0), Err(ReactorError::NoBlueprints(_))));
    }

    #[test]
    fn test_capability_mismatch() {
        let mut out = ReactorRegion::seeded(RegionLabel::OutputC, GridRect::new(6, 0, 4, 4), 0);
        assert!(matches!(out.input(1), Err(ReactorError::RegionNotInput(_))));
        assert!(matches!(
            out.add_blueprint(single(Element::C), 1),
            Err(ReactorError::RegionNotInput(_))
        ));
        let mut inp = input_a(0);
        assert!(matches!(
            inp.output(1, None),
            Err(ReactorError::RegionNotOutput(_))
        ));
    }

    #[test]
    fn test_pulse_is_monotonic() {
        let mut out = ReactorRegion::seeded(RegionLabel::OutputD, GridRect::new(6, 4, 4, 4), 0);
        out.output(5, None).unwrap();
        assert_eq!(out.last_pulse_tick(), Some(5));
        out.pulse(2);
        assert_eq!(out.last_pulse_tick(), Some(5));
        out.output(9, Some(single(Element::He))).unwrap();
        assert_eq!(out.last_pulse_tick(), Some(9));
        assert_eq!(out.molecules_out(), 1);
    }
}
