//! Waldo agent - one grabber arm and the program driving it

use crate::chemistry::Molecule;
use crate::core::error::{ReactorError, Result};
use crate::core::types::{Direction, GridPos, WaldoColor};
use crate::reactor::chamber::Chamber;
use crate::waldo::action::{Action, Outcome, WaldoView};
use crate::waldo::rendezvous::ProgramRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaldoState {
    /// No program bound
    Idle,
    /// Program bound and being stepped
    Running,
}

pub struct Waldo {
    color: WaldoColor,
    position: GridPos,
    previous: GridPos,
    grabbed: bool,
    held: Option<Molecule>,
    runner: Option<ProgramRunner>,
    last_outcome: Option<Outcome>,
    last_action: Option<Action>,
}

impl Waldo {
    pub fn new(color: WaldoColor) -> Self {
        Self {
            color,
            position: GridPos::default(),
            previous: GridPos::default(),
            grabbed: false,
            held: None,
            runner: None,
            last_outcome: None,
            last_action: None,
        }
    }

    pub fn color(&self) -> WaldoColor {
        self.color
    }

    pub fn position(&self) -> GridPos {
        self.position
    }

    /// Position before the last tick's action, for interpolating display
    pub fn previous_position(&self) -> GridPos {
        self.previous
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    pub fn held_molecule(&self) -> Option<&Molecule> {
        self.held.as_ref()
    }

    pub fn last_action(&self) -> Option<Action> {
        self.last_action
    }

    pub fn state(&self) -> WaldoState {
        if self.runner.is_some() {
            WaldoState::Running
        } else {
            WaldoState::Idle
        }
    }

    pub fn program_name(&self) -> Option<&str> {
        self.runner.as_ref().map(|r| r.name())
    }

    /// Attach a spawned program; start position is checked by the reactor
    pub(crate) fn bind(&mut self, runner: ProgramRunner, start: GridPos) -> Result<()> {
        if self.runner.is_some() {
            return Err(ReactorError::AlreadyBound(self.color));
        }
        self.position = start;
        self.previous = start;
        self.runner = Some(runner);
        Ok(())
    }

    /// Stop the bound program, if any
    pub(crate) fn halt(&mut self) {
        if let Some(runner) = self.runner.as_mut() {
            runner.halt();
        }
    }

    /// Advance one tick: catch the held molecule up, then run one action
    pub fn think(&mut self, chamber: &mut Chamber) -> Result<Option<Action>> {
        if self.runner.is_none() {
            return Ok(None);
        }

        if self.grabbed {
            if let Some(molecule) = self.held.as_mut() {
                let dx = self.position.x - self.previous.x;
                let dy = self.position.y - self.previous.y;
                if !molecule.translate_within(dx, dy, chamber.width(), chamber.height()) {
                    return Err(ReactorError::Collision {
                        color: self.color,
                        molecule: molecule.id(),
                    });
                }
            }
        }

        self.previous = self.position;

        let view = WaldoView {
            tick: chamber.tick(),
            position: self.position,
            grabbed: self.grabbed,
            holding: self.held.is_some(),
            last_outcome: self.last_outcome.take(),
        };
        let action = match self.runner.as_mut() {
            Some(runner) => runner.next_action(view)?,
            None => return Ok(None),
        };

        let outcome = self.apply(action, chamber)?;
        tracing::debug!(
            tick = chamber.tick(),
            waldo = %self.color,
            ?action,
            ?outcome,
            x = self.position.x,
            y = self.position.y,
            "waldo acted"
        );
        self.last_outcome = Some(outcome);
        self.last_action = Some(action);
        Ok(Some(action))
    }

    fn apply(&mut self, action: Action, chamber: &mut Chamber) -> Result<Outcome> {
        let outcome = match action {
            Action::Wait => Outcome::Done,
            Action::Move(dir) => {
                let next = self.position.step(dir);
                if chamber.in_bounds(next) {
                    self.position = next;
                }
                Outcome::Done
            }
            Action::Grab => Outcome::Grabbed(self.grab(chamber)),
            Action::Drop => {
                self.drop_held(chamber)?;
                Outcome::Done
            }
            Action::GrabDrop => {
                if self.grabbed {
                    self.drop_held(chamber)?;
                    Outcome::Done
                } else {
                    Outcome::Grabbed(self.grab(chamber))
                }
            }
            Action::Input(label) => match chamber.input(label) {
                Ok(placed) => Outcome::Input(placed),
                Err(e) => self.reject(e)?,
            },
            Action::Output(label) => match chamber.output(label) {
                Ok(remaining) => Outcome::Output { remaining },
                Err(e) => self.reject(e)?,
            },
            Action::Bond(dir) => Outcome::Bonded(self.bond(dir, chamber)),
            Action::Unbond(dir) => Outcome::Bonded(self.unbond(dir, chamber)?),
        };
        Ok(outcome)
    }

    /// Configuration errors go back to the program; anything else stops the run
    fn reject(&self, error: ReactorError) -> Result<Outcome> {
        if !error.is_configuration() {
            return Err(error);
        }
        tracing::warn!(waldo = %self.color, %error, "action rejected");
        Ok(Outcome::Rejected(error.to_string()))
    }

    /// Close the grabber over whatever loose molecule is under the waldo
    ///
    /// An empty grab still closes the grabber. Grabbing while closed does nothing.
    pub fn grab(&mut self, chamber: &mut Chamber) -> bool {
        if !self.grabbed {
            self.grabbed = true;
            self.held = chamber.grab_molecule(self.position);
        }
        self.held.is_some()
    }

    /// Open the grabber, returning any held molecule to the loose set
    pub fn drop_held(&mut self, chamber: &mut Chamber) -> Result<()> {
        self.grabbed = false;
        match self.held.take() {
            Some(molecule) => chamber.drop_molecule(molecule),
            None => Ok(()),
        }
    }

    pub fn grab_drop(&mut self, chamber: &mut Chamber) -> Result<()> {
        if self.grabbed {
            self.drop_held(chamber)
        } else {
            self.grab(chamber);
            Ok(())
        }
    }

    /// Bond the held atom under the waldo to the atom next to it
    ///
    /// A neighbour belonging to a loose molecule is merged into the held one.
    fn bond(&mut self, dir: Direction, chamber: &mut Chamber) -> bool {
        let target = self.position.step(dir);
        let Some(held) = self.held.as_mut() else {
            return false;
        };
        let Some(a) = held.atom_at(self.position) else {
            return false;
        };
        if let Some(b) = held.atom_at(target) {
            return held.bond_between(a, b).is_ok();
        }

        let Some(index) = chamber.loose_index_at(target) else {
            return false;
        };
        let other = &chamber.loose()[index];
        let b_free = other
            .atom_at(target)
            .and_then(|b| other.atom(b))
            .map_or(0, |atom| atom.free_bonds());
        let a_free = held.atom(a).map_or(0, |atom| atom.free_bonds());
        if a_free == 0 || b_free == 0 {
            return false;
        }

        let other = chamber.take_loose(index);
        let Some(b_old) = other.atom_at(target) else {
            return false;
        };
        let mapping = held.absorb(other);
        held.bond_between(a, mapping[&b_old]).is_ok()
    }

    /// Break one bond; a part that no longer connects becomes a loose molecule
    fn unbond(&mut self, dir: Direction, chamber: &mut Chamber) -> Result<bool> {
        let target = self.position.step(dir);
        let Some(held) = self.held.as_mut() else {
            return Ok(false);
        };
        let (Some(a), Some(b)) = (held.atom_at(self.position), held.atom_at(target)) else {
            return Ok(false);
        };
        if !held.unbond_between(a, b) {
            return Ok(false);
        }
        if let Some(part) = held.split_off(a, b) {
            chamber.drop_molecule(part)?;
        }
        Ok(true)
    }
}
