//! Reactor engine - the tick scheduler
//!
//! Each tick steps the red waldo and then the blue one, exactly once each.
//! Red always goes first, so when both touch the same cell in one tick red's
//! effect is already committed when blue acts.
//!
//! The first fatal fault latches: the programs are halted and every later
//! `advance_tick` returns `RunAborted`.

use crate::chemistry::Molecule;
use crate::core::config::SimulationConfig;
use crate::core::error::{ReactorError, Result};
use crate::core::types::{GridPos, Tick, WaldoColor};
use crate::reactor::chamber::Chamber;
use crate::reactor::layout::ReactorLayout;
use crate::reactor::region::{ReactorRegion, RegionLabel};
use crate::reactor::snapshot::ReactorSnapshot;
use crate::waldo::{Action, ProgramRunner, Waldo, WaldoProgram};

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    pub red: Option<Action>,
    pub blue: Option<Action>,
}

pub struct Reactor {
    config: SimulationConfig,
    chamber: Chamber,
    red: Waldo,
    blue: Waldo,
    tick: Tick,
    fault: Option<String>,
}

impl Reactor {
    pub fn new(layout: &ReactorLayout, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let chamber = Chamber::new(layout, &config)?;
        tracing::info!(
            width = layout.width,
            height = layout.height,
            regions = layout.regions.len(),
            "reactor built"
        );
        Ok(Self {
            config,
            chamber,
            red: Waldo::new(WaldoColor::Red),
            blue: Waldo::new(WaldoColor::Blue),
            tick: 0,
            fault: None,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn width(&self) -> i32 {
        self.chamber.width()
    }

    pub fn height(&self) -> i32 {
        self.chamber.height()
    }

    /// Ticks completed so far
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn chamber(&self) -> &Chamber {
        &self.chamber
    }

    pub fn waldo(&self, color: WaldoColor) -> &Waldo {
        match color {
            WaldoColor::Red => &self.red,
            WaldoColor::Blue => &self.blue,
        }
    }

    fn waldo_mut(&mut self, color: WaldoColor) -> &mut Waldo {
        match color {
            WaldoColor::Red => &mut self.red,
            WaldoColor::Blue => &mut self.blue,
        }
    }

    pub fn loose_molecules(&self) -> &[Molecule] {
        self.chamber.loose()
    }

    pub fn region(&self, label: RegionLabel) -> Option<&ReactorRegion> {
        self.chamber.region(label)
    }

    /// The fault that stopped this run, if any
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// Bind a program to a waldo at a starting cell
    ///
    /// Each waldo accepts exactly one program for its whole life.
    pub fn bind_program<P: WaldoProgram>(
        &mut self,
        color: WaldoColor,
        start: GridPos,
        program: P,
    ) -> Result<()> {
        if !self.chamber.in_bounds(start) {
            return Err(ReactorError::StartOutOfBounds { color, pos: start });
        }
        if self.waldo(color).program_name().is_some() {
            return Err(ReactorError::AlreadyBound(color));
        }

        let runner = ProgramRunner::spawn(
            program,
            color,
            start,
            (self.width(), self.height()),
            self.config.rendezvous_timeout(),
        )?;
        tracing::info!(waldo = %color, program = runner.name(), x = start.x, y = start.y, "program bound");
        self.waldo_mut(color).bind(runner, start)
    }

    /// Advance the reactor by exactly one tick
    pub fn advance_tick(&mut self) -> Result<TickReport> {
        if let Some(fault) = &self.fault {
            return Err(ReactorError::RunAborted(fault.clone()));
        }

        let tick = self.tick + 1;
        self.chamber.set_tick(tick);

        let red = self.red.think(&mut self.chamber).map_err(|e| self.abort(e))?;
        let blue = self.blue.think(&mut self.chamber).map_err(|e| self.abort(e))?;

        self.tick = tick;
        tracing::debug!(tick, ?red, ?blue, loose = self.chamber.loose().len(), "tick complete");
        Ok(TickReport { tick, red, blue })
    }

    /// Latch a fatal error and stop both programs
    fn abort(&mut self, error: ReactorError) -> ReactorError {
        if error.is_fatal() {
            tracing::error!(tick = self.chamber.tick(), %error, "run aborted");
            self.fault = Some(error.to_string());
            self.red.halt();
            self.blue.halt();
        }
        error
    }

    /// Pick up the first loose molecule at a cell
    pub fn grab_molecule(&mut self, x: i32, y: i32) -> Option<Molecule> {
        self.chamber.grab_molecule(GridPos::new(x, y))
    }

    pub fn drop_molecule(&mut self, molecule: Molecule) -> Result<()> {
        self.chamber.drop_molecule(molecule).map_err(|e| self.abort(e))
    }

    pub fn input(&mut self, label: RegionLabel) -> Result<bool> {
        self.chamber.input(label)
    }

    pub fn output(&mut self, label: RegionLabel) -> Result<bool> {
        self.chamber.output(label)
    }

    pub fn snapshot(&self) -> ReactorSnapshot {
        ReactorSnapshot::capture(self)
    }

    /// Stop both programs and wait for them to exit
    pub fn dispose(&mut self) {
        self.red.halt();
        self.blue.halt();
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::Element;
    use crate::core::types::Direction;
    use crate::waldo::program::FnProgram;

    fn reactor() -> Reactor {
        let layout = ReactorLayout::standard()
            .with_blueprint(RegionLabel::InputA, Molecule::new().with_atom(Element::C, 0, 0), 1)
            .unwrap()
            .with_blueprint(RegionLabel::InputB, Molecule::new().with_atom(Element::H, 0, 0), 1)
            .unwrap();
        Reactor::new(&layout, SimulationConfig::default()).unwrap()
    }

    struct Walker(Direction);

    impl WaldoProgram for Walker {
        fn run(&mut self, ctx: &mut crate::waldo::ProgramContext) -> crate::waldo::Step<()> {
            loop {
                ctx.step(self.0)?;
            }
        }
    }

    fn walker(dir: Direction) -> Walker {
        Walker(dir)
    }

    #[test]
    fn test_bind_rejects_out_of_bounds_start() {
        let mut r = reactor();
        let err = r
            .bind_program(WaldoColor::Red, GridPos::new(10, 0), walker(Direction::Left))
            .unwrap_err();
        assert!(matches!(err, ReactorError::StartOutOfBounds { .. }));
        assert!(r.waldo(WaldoColor::Red).program_name().is_none());
    }

    #[test]
    fn test_bind_only_once() {
        let mut r = reactor();
        r.bind_program(WaldoColor::Blue, GridPos::new(1, 1), walker(Direction::Left))
            .unwrap();
        assert!(matches!(
            r.bind_program(WaldoColor::Blue, GridPos::new(2, 2), walker(Direction::Up)),
            Err(ReactorError::AlreadyBound(WaldoColor::Blue))
        ));
    }

    #[test]
    fn test_moves_clamp_at_walls() {
        let mut r = reactor();
        r.bind_program(WaldoColor::Red, GridPos::new(1, 0), walker(Direction::Left))
            .unwrap();
        for _ in 0..3 {
            r.advance_tick().unwrap();
        }
        assert_eq!(r.waldo(WaldoColor::Red).position(), GridPos::new(0, 0));
        assert_eq!(r.tick(), 3);
    }

    #[test]
    fn test_idle_waldo_reports_no_action() {
        let mut r = reactor();
        r.bind_program(WaldoColor::Red, GridPos::new(4, 4), walker(Direction::Up))
            .unwrap();
        let report = r.advance_tick().unwrap();
        assert_eq!(report.red, Some(Action::Move(Direction::Up)));
        assert_eq!(report.blue, None);
    }

    #[test]
    fn test_collision_latches_fault() {
        let mut r = reactor();
        r.drop_molecule(
            Molecule::new()
                .with_atom(Element::C, 1, 5)
                .with_atom(Element::C, 0, 5),
        )
        .unwrap();
        r.bind_program(
            WaldoColor::Red,
            GridPos::new(1, 5),
            FnProgram::new("Pusher", |ctx| {
                ctx.grab()?;
                loop {
                    ctx.step(Direction::Left)?;
                }
            }),
        )
        .unwrap();

        r.advance_tick().unwrap(); // grab
        r.advance_tick().unwrap(); // waldo steps to x = 0
        let err = r.advance_tick().unwrap_err();
        assert!(matches!(err, ReactorError::Collision { color: WaldoColor::Red, .. }));
        assert!(r.is_faulted());
        assert!(matches!(r.advance_tick(), Err(ReactorError::RunAborted(_))));
    }

    #[test]
    fn test_rejected_action_is_not_fatal() {
        let mut r = reactor();
        r.bind_program(
            WaldoColor::Red,
            GridPos::new(0, 0),
            FnProgram::new("Confused", |ctx| {
                match ctx.input(RegionLabel::OutputC) {
                    Err(crate::waldo::ProgramError::Rejected(_)) => {}
                    other => panic!("expected rejection, got {other:?}"),
                }
                loop {
                    ctx.step(Direction::Right)?;
                }
            }),
        )
        .unwrap();
        for _ in 0..3 {
            r.advance_tick().unwrap();
        }
        assert!(!r.is_faulted());
        // Tick 1 was the rejected input; ticks 2 and 3 were steps
        assert_eq!(r.waldo(WaldoColor::Red).position(), GridPos::new(2, 0));
    }
}
