//! Serializable reactor state for display and run output

use serde::{Deserialize, Serialize};

use crate::chemistry::{Element, Molecule};
use crate::core::types::{GridPos, GridRect, MoleculeId, Tick, WaldoColor};
use crate::reactor::engine::Reactor;
use crate::reactor::region::RegionLabel;

/// Complete view of the reactor after a tick
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReactorSnapshot {
    pub tick: Tick,
    pub width: i32,
    pub height: i32,
    pub waldos: Vec<WaldoSnapshot>,
    pub molecules: Vec<MoleculeSnapshot>,
    pub regions: Vec<RegionSnapshot>,
    pub fault: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaldoSnapshot {
    pub color: WaldoColor,
    pub program: Option<String>,
    pub position: GridPos,
    pub previous: GridPos,
    pub grabbed: bool,
    pub holding: Option<MoleculeId>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoleculeSnapshot {
    pub id: MoleculeId,
    pub held_by: Option<WaldoColor>,
    pub atoms: Vec<AtomSnapshot>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AtomSnapshot {
    pub element: Element,
    pub x: i32,
    pub y: i32,
    /// (index into `atoms`, multiplicity), listed once per pair from the lower index
    pub bonds: Vec<(usize, u8)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegionSnapshot {
    pub label: RegionLabel,
    pub rect: GridRect,
    pub last_pulse_tick: Option<Tick>,
    pub molecules_in: u64,
    pub molecules_out: u64,
}

impl MoleculeSnapshot {
    fn capture(molecule: &Molecule, held_by: Option<WaldoColor>) -> Self {
        let atoms = molecule.atoms();
        let index_of = |id| atoms.iter().position(|a| a.id() == id);
        let atoms = atoms
            .iter()
            .enumerate()
            .map(|(i, atom)| {
                let pos = molecule.position_of(atom);
                let bonds = atom
                    .bonds()
                    .filter_map(|(other, count)| index_of(other).map(|j| (j, count)))
                    .filter(|&(j, _)| j > i)
                    .collect();
                AtomSnapshot {
                    element: atom.element(),
                    x: pos.x,
                    y: pos.y,
                    bonds,
                }
            })
            .collect();
        Self {
            id: molecule.id(),
            held_by,
            atoms,
        }
    }
}

impl ReactorSnapshot {
    pub fn capture(reactor: &Reactor) -> Self {
        let mut waldos = Vec::with_capacity(2);
        let mut molecules = Vec::new();
        for color in [WaldoColor::Red, WaldoColor::Blue] {
            let waldo = reactor.waldo(color);
            if let Some(held) = waldo.held_molecule() {
                molecules.push(MoleculeSnapshot::capture(held, Some(color)));
            }
            waldos.push(WaldoSnapshot {
                color,
                program: waldo.program_name().map(str::to_string),
                position: waldo.position(),
                previous: waldo.previous_position(),
                grabbed: waldo.is_grabbed(),
                holding: waldo.held_molecule().map(Molecule::id),
            });
        }
        molecules.extend(
            reactor
                .loose_molecules()
                .iter()
                .map(|m| MoleculeSnapshot::capture(m, None)),
        );

        let regions = reactor
            .chamber()
            .regions()
            .iter()
            .map(|r| RegionSnapshot {
                label: r.label(),
                rect: r.rect(),
                last_pulse_tick: r.last_pulse_tick(),
                molecules_in: r.molecules_in(),
                molecules_out: r.molecules_out(),
            })
            .collect();

        Self {
            tick: reactor.tick(),
            width: reactor.width(),
            height: reactor.height(),
            waldos,
            molecules,
            regions,
            fault: reactor.fault().map(str::to_string),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Character grid: element symbols, `.` for empty cells, `R`/`B` for an
    /// empty waldo cell. A cell shared by several atoms shows the first.
    pub fn render_grid(&self) -> String {
        let (w, h) = (self.width.max(0) as usize, self.height.max(0) as usize);
        let mut cells = vec![vec![".".to_string(); w]; h];
        let mut put = |x: i32, y: i32, s: &str, overwrite: bool| {
            if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
                return;
            }
            let cell = &mut cells[y as usize][x as usize];
            if overwrite || cell == "." {
                *cell = s.to_string();
            }
        };
        for m in &self.molecules {
            for a in &m.atoms {
                put(a.x, a.y, a.element.symbol(), false);
            }
        }
        for waldo in &self.waldos {
            if waldo.program.is_some() {
                let mark = match waldo.color {
                    WaldoColor::Red => "R",
                    WaldoColor::Blue => "B",
                };
                put(waldo.position.x, waldo.position.y, mark, false);
            }
        }
        cells
            .into_iter()
            .map(|row| row.iter().map(|c| format!("{:<2}", c)).collect::<String>())
            .map(|row| row.trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "tick {}: {} molecule(s) in a {}x{} reactor",
            self.tick,
            self.molecules.len(),
            self.width,
            self.height
        );
        for r in &self.regions {
            out.push_str(&format!(
                "\n  {} in={} out={}",
                r.label, r.molecules_in, r.molecules_out
            ));
        }
        for waldo in &self.waldos {
            if let Some(program) = &waldo.program {
                out.push_str(&format!(
                    "\n  {} [{}] at {} grabbed={} holding={}",
                    waldo.color,
                    program,
                    waldo.position,
                    waldo.grabbed,
                    waldo.holding.is_some()
                ));
            }
        }
        if let Some(fault) = &self.fault {
            out.push_str(&format!("\n  fault: {}", fault));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::reactor::layout::ReactorLayout;

    fn reactor() -> Reactor {
        let layout = ReactorLayout::standard()
            .with_blueprint(RegionLabel::InputA, Molecule::new().with_atom(Element::C, 0, 0), 1)
            .unwrap()
            .with_blueprint(RegionLabel::InputB, Molecule::new().with_atom(Element::H, 0, 0), 1)
            .unwrap();
        Reactor::new(&layout, SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_bonds_listed_once_by_index() {
        let mut r = reactor();
        r.drop_molecule(
            Molecule::new()
                .with_atom(Element::O, 5, 5)
                .with_atom(Element::H, 6, 5)
                .with_atom(Element::H, 5, 6)
                .with_bond(5, 5, 6, 5)
                .unwrap()
                .with_bond(5, 5, 5, 6)
                .unwrap(),
        )
        .unwrap();
        let snap = r.snapshot();
        let water = &snap.molecules[0];
        assert_eq!(water.held_by, None);
        assert_eq!(water.atoms[0].bonds, vec![(1, 1), (2, 1)]);
        assert!(water.atoms[1].bonds.is_empty());
        assert!(water.atoms[2].bonds.is_empty());
    }

    #[test]
    fn test_regions_reported_in_layout_order() {
        let snap = reactor().snapshot();
        let labels: Vec<_> = snap.regions.iter().map(|r| r.label).collect();
        assert_eq!(labels, RegionLabel::ALL.to_vec());
        assert_eq!(snap.waldos.len(), 2);
        assert!(snap.fault.is_none());
    }

    #[test]
    fn test_render_grid_shows_atoms() {
        let mut r = reactor();
        r.input(RegionLabel::InputA).unwrap();
        let grid = r.snapshot().render_grid();
        let first = grid.lines().next().unwrap();
        assert!(first.starts_with('C'));
        assert_eq!(grid.lines().count(), 8);
    }

    #[test]
    fn test_json_round_trips() {
        let snap = reactor().snapshot();
        let parsed: ReactorSnapshot = serde_json::from_str(&snap.to_json()).unwrap();
        assert_eq!(parsed.width, 10);
        assert_eq!(parsed.height, 8);
    }
}
