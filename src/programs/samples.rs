//! Hand-written sample programs

use crate::core::types::{Direction, GridPos};
use crate::reactor::RegionLabel;
use crate::waldo::{ProgramContext, Step, WaldoProgram};

/// Rectangular loop that grab-drops at three of its corners
pub struct LittleLoop;

impl LittleLoop {
    pub const START: GridPos = GridPos { x: 2, y: 2 };
}

impl WaldoProgram for LittleLoop {
    fn run(&mut self, ctx: &mut ProgramContext) -> Step<()> {
        loop {
            ctx.step_n(Direction::Right, 5)?;
            ctx.step_n(Direction::Down, 3)?;
            ctx.grab_drop()?;
            ctx.step_n(Direction::Left, 5)?;
            ctx.grab_drop()?;
            ctx.step_n(Direction::Up, 3)?;
            ctx.grab_drop()?;
        }
    }
}

/// Serpentine sweep over the whole reactor
///
/// Even columns are walked upwards and odd columns downwards. From the
/// bottom of the last column it runs straight back to column zero.
pub struct BigLoop;

impl BigLoop {
    pub const START: GridPos = GridPos { x: 1, y: 1 };
}

impl WaldoProgram for BigLoop {
    fn run(&mut self, ctx: &mut ProgramContext) -> Step<()> {
        let (width, height) = (ctx.reactor_width(), ctx.reactor_height());
        loop {
            if ctx.x() % 2 == 0 {
                if ctx.y() > 0 {
                    ctx.step(Direction::Up)?;
                } else {
                    ctx.step(Direction::Right)?;
                }
            } else if ctx.y() < height - 1 {
                ctx.step(Direction::Down)?;
            } else if ctx.x() == width - 1 {
                ctx.step_n(Direction::Left, (width - 1) as u32)?;
            } else {
                ctx.step(Direction::Right)?;
            }
        }
    }
}

/// Ferries molecules from InputA across to OutputC on the standard layout
///
/// Starts on the one cell every "Hello world!" molecule covers.
pub struct Shuttle;

impl Shuttle {
    pub const START: GridPos = GridPos { x: 2, y: 1 };
    const SPAN: u32 = 5;
}

impl WaldoProgram for Shuttle {
    fn run(&mut self, ctx: &mut ProgramContext) -> Step<()> {
        loop {
            ctx.input(RegionLabel::InputA)?;
            ctx.grab()?;
            ctx.step_n(Direction::Right, Self::SPAN)?;
            ctx.drop()?;
            ctx.output(RegionLabel::OutputC)?;
            ctx.step_n(Direction::Left, Self::SPAN)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::{Element, Molecule};
    use crate::core::config::SimulationConfig;
    use crate::core::types::WaldoColor;
    use crate::reactor::{Reactor, ReactorLayout};

    fn reactor() -> Reactor {
        let layout = ReactorLayout::standard()
            .with_blueprint(RegionLabel::InputA, Molecule::new().with_atom(Element::C, 2, 1), 1)
            .unwrap()
            .with_blueprint(RegionLabel::InputB, Molecule::new().with_atom(Element::H, 0, 0), 1)
            .unwrap();
        Reactor::new(&layout, SimulationConfig::default()).unwrap()
    }

    fn run(reactor: &mut Reactor, ticks: usize) {
        for _ in 0..ticks {
            reactor.advance_tick().unwrap();
        }
    }

    #[test]
    fn test_little_loop_path() {
        let mut r = reactor();
        r.bind_program(WaldoColor::Red, LittleLoop::START, LittleLoop).unwrap();
        run(&mut r, 8);
        assert_eq!(r.waldo(WaldoColor::Red).position(), GridPos::new(7, 5));
        run(&mut r, 6);
        assert_eq!(r.waldo(WaldoColor::Red).position(), GridPos::new(2, 5));
    }

    #[test]
    fn test_big_loop_turns_at_the_bottom() {
        let mut r = reactor();
        r.bind_program(WaldoColor::Blue, BigLoop::START, BigLoop).unwrap();
        run(&mut r, 6);
        assert_eq!(r.waldo(WaldoColor::Blue).position(), GridPos::new(1, 7));
        run(&mut r, 2);
        assert_eq!(r.waldo(WaldoColor::Blue).position(), GridPos::new(2, 6));
    }

    #[test]
    fn test_shuttle_delivers_one_molecule_per_cycle() {
        let mut r = reactor();
        r.bind_program(WaldoColor::Red, Shuttle::START, Shuttle).unwrap();
        run(&mut r, 14);
        let out = r.region(RegionLabel::OutputC).unwrap();
        assert_eq!(out.molecules_out(), 1);
        assert_eq!(r.waldo(WaldoColor::Red).position(), Shuttle::START);
        assert!(r.loose_molecules().is_empty());
    }
}
