//! Challenges - stocked reactor layouts, built in or loaded from TOML
//!
//! Input regions a challenge leaves unstocked are dropped from its layout,
//! so every input left in the reactor has something to draw.

use serde::Deserialize;
use std::path::Path;

use crate::chemistry::{Element, Molecule};
use crate::core::config::SimulationConfig;
use crate::core::error::{ReactorError, Result};
use crate::core::types::GridRect;
use crate::reactor::{Reactor, ReactorLayout, RegionLabel};

/// Passcodes accepted by `Challenge::get`
pub const PASSCODES: [&str; 1] = ["Hello world!"];

#[derive(Debug, Clone)]
pub struct Challenge {
    pub name: String,
    pub layout: ReactorLayout,
}

impl Challenge {
    /// Look up a built-in challenge
    pub fn get(passcode: &str) -> Result<Self> {
        let layout = match passcode {
            "Hello world!" => ReactorLayout::standard()
                .with_blueprint(RegionLabel::InputA, formaldehyde()?, 1)?
                .with_blueprint(RegionLabel::InputA, water()?, 3)?,
            _ => return Err(ReactorError::UnknownChallenge(passcode.to_string())),
        };
        tracing::info!(challenge = passcode, "challenge loaded");
        Ok(Self {
            name: passcode.to_string(),
            layout: drop_unstocked_inputs(layout),
        })
    }

    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> Result<Self> {
        let data: TomlChallenge = toml::from_str(content)?;
        let challenge = data.into_challenge()?;
        challenge.layout.validate()?;
        tracing::info!(challenge = %challenge.name, "challenge loaded from file");
        Ok(challenge)
    }

    /// Build a fresh reactor for this challenge
    pub fn build(&self, config: SimulationConfig) -> Result<Reactor> {
        Reactor::new(&self.layout, config)
    }
}

fn drop_unstocked_inputs(mut layout: ReactorLayout) -> ReactorLayout {
    layout
        .regions
        .retain(|r| !r.label.is_input() || !r.blueprints.is_empty());
    layout
}

/// H2O, oxygen at (1,1)
pub fn water() -> Result<Molecule> {
    Molecule::new()
        .with_atom(Element::O, 1, 1)
        .with_atom(Element::H, 2, 1)
        .with_bond(1, 1, 2, 1)?
        .with_atom(Element::H, 1, 2)
        .with_bond(1, 1, 1, 2)
}

/// CH2O, carbon at (2,2) double-bonded to the oxygen on its right
pub fn formaldehyde() -> Result<Molecule> {
    Molecule::new()
        .with_atom(Element::C, 2, 2)
        .with_atom(Element::H, 2, 1)
        .with_bond(2, 2, 2, 1)?
        .with_atom(Element::H, 1, 2)
        .with_bond(2, 2, 1, 2)?
        .with_atom(Element::O, 3, 2)
        .with_bond(2, 2, 3, 2)?
        .with_bond(2, 2, 3, 2)
}

/// TOML representation of a challenge
#[derive(Debug, Deserialize)]
struct TomlChallenge {
    name: String,
    width: Option<i32>,
    height: Option<i32>,
    #[serde(default)]
    regions: Vec<TomlRegion>,
    #[serde(default)]
    blueprints: Vec<TomlBlueprint>,
}

#[derive(Debug, Deserialize)]
struct TomlRegion {
    label: String,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

/// Atoms and bonds in region-local coordinates
#[derive(Debug, Deserialize)]
struct TomlBlueprint {
    region: String,
    weight: u32,
    atoms: Vec<TomlAtom>,
    /// Each entry is `[ax, ay, bx, by]`; repeat an entry for a double bond
    #[serde(default)]
    bonds: Vec<[i32; 4]>,
}

#[derive(Debug, Deserialize)]
struct TomlAtom {
    element: String,
    x: i32,
    y: i32,
}

impl TomlChallenge {
    fn into_challenge(self) -> Result<Challenge> {
        let mut layout = if self.regions.is_empty() {
            ReactorLayout::standard()
        } else {
            let mut layout = ReactorLayout::new(0, 0);
            for region in self.regions {
                let label: RegionLabel = region.label.parse()?;
                layout = layout.with_region(
                    label,
                    GridRect::new(region.x, region.y, region.width, region.height),
                );
            }
            layout
        };
        let (default_width, default_height) = (layout.width, layout.height);
        layout.width = self.width.unwrap_or(default_width);
        layout.height = self.height.unwrap_or(default_height);

        for blueprint in self.blueprints {
            let label: RegionLabel = blueprint.region.parse()?;
            layout.add_blueprint(label, blueprint.to_molecule()?, blueprint.weight)?;
        }

        Ok(Challenge {
            name: self.name,
            layout: drop_unstocked_inputs(layout),
        })
    }
}

impl TomlBlueprint {
    fn to_molecule(&self) -> Result<Molecule> {
        let mut molecule = Molecule::new();
        for atom in &self.atoms {
            let element: Element = atom.element.parse()?;
            molecule.add(element, atom.x, atom.y);
        }
        for &[ax, ay, bx, by] in &self.bonds {
            molecule.bond(ax, ay, bx, by)?;
        }
        Ok(molecule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GridPos;

    #[test]
    fn test_hello_world_stocks_input_a() {
        let challenge = Challenge::get("Hello world!").unwrap();
        let a = challenge.layout.region(RegionLabel::InputA).unwrap();
        let weights: Vec<u32> = a.blueprints.iter().map(|b| b.weight).collect();
        assert_eq!(weights, vec![1, 3]);
        assert!(challenge.layout.region(RegionLabel::InputB).is_none());
        assert!(challenge.layout.region(RegionLabel::OutputC).is_some());
        challenge.layout.validate().unwrap();
    }

    #[test]
    fn test_unknown_passcode() {
        assert!(matches!(
            Challenge::get("Goodbye"),
            Err(ReactorError::UnknownChallenge(_))
        ));
    }

    #[test]
    fn test_formaldehyde_has_double_bond() {
        let m = formaldehyde().unwrap();
        let c = m.atom_at(GridPos::new(2, 2)).unwrap();
        let o = m.atom_at(GridPos::new(3, 2)).unwrap();
        assert_eq!(m.atom(c).unwrap().bond_count_to(o), 2);
        assert_eq!(m.atom(c).unwrap().free_bonds(), 0);
        assert_eq!(water().unwrap().len(), 3);
    }

    #[test]
    fn test_parse_toml_challenge() {
        let content = r#"
name = "Split water"

[[blueprints]]
region = "InputB"
weight = 2
atoms = [
    { element = "O", x = 1, y = 1 },
    { element = "H", x = 2, y = 1 },
]
bonds = [[1, 1, 2, 1]]
"#;
        let challenge = Challenge::parse_toml(content).unwrap();
        assert_eq!(challenge.name, "Split water");
        assert_eq!(challenge.layout.width, 10);
        assert!(challenge.layout.region(RegionLabel::InputA).is_none());
        let b = challenge.layout.region(RegionLabel::InputB).unwrap();
        assert_eq!(b.blueprints[0].molecule.len(), 2);

        let reactor = challenge.build(SimulationConfig::default()).unwrap();
        assert_eq!(reactor.chamber().regions().len(), 3);
    }

    #[test]
    fn test_parse_toml_rejects_bad_chemistry() {
        let diagonal = r#"
name = "Broken"
[[blueprints]]
region = "InputA"
weight = 1
atoms = [{ element = "C", x = 0, y = 0 }, { element = "C", x = 1, y = 1 }]
bonds = [[0, 0, 1, 1]]
"#;
        assert!(matches!(
            Challenge::parse_toml(diagonal),
            Err(ReactorError::InvalidBond { .. })
        ));

        let element = r#"
name = "Broken"
[[blueprints]]
region = "InputA"
weight = 1
atoms = [{ element = "Xx", x = 0, y = 0 }]
"#;
        assert!(matches!(
            Challenge::parse_toml(element),
            Err(ReactorError::UnknownElement(_))
        ));
    }

    #[test]
    fn test_custom_regions() {
        let content = r#"
name = "Tiny"
width = 6
height = 3

[[regions]]
label = "A"
x = 0
y = 0
width = 2
height = 3

[[regions]]
label = "OutputD"
x = 4
y = 0
width = 2
height = 3

[[blueprints]]
region = "A"
weight = 1
atoms = [{ element = "Ne", x = 0, y = 0 }]
"#;
        let challenge = Challenge::parse_toml(content).unwrap();
        assert_eq!((challenge.layout.width, challenge.layout.height), (6, 3));
        assert_eq!(challenge.layout.regions.len(), 2);
    }
}
