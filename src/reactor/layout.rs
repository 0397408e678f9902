//! Reactor layout - the immutable description a reactor is built from

use crate::chemistry::Molecule;
use crate::core::config::SimulationConfig;
use crate::core::error::{ReactorError, Result};
use crate::core::types::GridRect;
use crate::reactor::region::{Blueprint, ReactorRegion, RegionLabel};

/// One labelled region and, for inputs, its weighted blueprints
#[derive(Debug, Clone)]
pub struct RegionSpec {
    pub label: RegionLabel,
    pub rect: GridRect,
    pub blueprints: Vec<Blueprint>,
}

impl RegionSpec {
    pub fn new(label: RegionLabel, rect: GridRect) -> Self {
        Self {
            label,
            rect,
            blueprints: Vec::new(),
        }
    }
}

/// Grid size plus regions
#[derive(Debug, Clone)]
pub struct ReactorLayout {
    pub width: i32,
    pub height: i32,
    pub regions: Vec<RegionSpec>,
}

impl ReactorLayout {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            regions: Vec::new(),
        }
    }

    /// The standard 10x8 reactor: inputs on the left, outputs on the right
    pub fn standard() -> Self {
        Self::new(10, 8)
            .with_region(RegionLabel::InputA, GridRect::new(0, 0, 4, 4))
            .with_region(RegionLabel::InputB, GridRect::new(0, 4, 4, 4))
            .with_region(RegionLabel::OutputC, GridRect::new(6, 0, 4, 4))
            .with_region(RegionLabel::OutputD, GridRect::new(6, 4, 4, 4))
    }

    pub fn with_region(mut self, label: RegionLabel, rect: GridRect) -> Self {
        self.regions.push(RegionSpec::new(label, rect));
        self
    }

    pub fn region(&self, label: RegionLabel) -> Option<&RegionSpec> {
        self.regions.iter().find(|r| r.label == label)
    }

    /// Attach a weighted blueprint to an input region
    pub fn add_blueprint(&mut self, label: RegionLabel, molecule: Molecule, weight: u32) -> Result<()> {
        if !label.is_input() {
            return Err(ReactorError::RegionNotInput(label));
        }
        let spec = self
            .regions
            .iter_mut()
            .find(|r| r.label == label)
            .ok_or(ReactorError::UnknownRegion(label))?;
        spec.blueprints.push(Blueprint { molecule, weight });
        Ok(())
    }

    /// Builder form of `add_blueprint`
    pub fn with_blueprint(mut self, label: RegionLabel, molecule: Molecule, weight: u32) -> Result<Self> {
        self.add_blueprint(label, molecule, weight)?;
        Ok(self)
    }

    /// Check everything that does not need a random source
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ReactorError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let grid = GridRect::new(0, 0, self.width, self.height);
        for (i, spec) in self.regions.iter().enumerate() {
            if spec.rect.is_empty() || !grid.contains_rect(&spec.rect) {
                return Err(ReactorError::RegionOutOfBounds(spec.label));
            }
            for other in &self.regions[..i] {
                if other.label == spec.label {
                    return Err(ReactorError::DuplicateRegion(spec.label));
                }
                if other.rect.intersects(&spec.rect) {
                    return Err(ReactorError::OverlappingRegions(other.label, spec.label));
                }
            }
            if spec.label.is_input() && spec.blueprints.is_empty() {
                return Err(ReactorError::NoBlueprints(spec.label));
            }
        }
        Ok(())
    }

    /// Validate and instantiate regions, each with its own seeded generator
    pub fn build_regions(&self, config: &SimulationConfig) -> Result<Vec<ReactorRegion>> {
        self.validate()?;
        self.regions
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let mut region =
                    ReactorRegion::seeded(spec.label, spec.rect, config.region_seed(index));
                for blueprint in &spec.blueprints {
                    region.add_blueprint(blueprint.molecule.clone(), blueprint.weight)?;
                }
                Ok(region)
            })
            .collect()
    }
}
