//! Waldo programs and the API they drive the waldo with
//!
//! A program is ordinary blocking code. Every action method on
//! `ProgramContext` is a yield point: it hands the action to the scheduler and
//! does not return until the next tick, so a program can never get ahead of
//! the reactor clock.

use std::sync::mpsc::{Receiver, SyncSender};
use thiserror::Error;

use crate::core::types::{Direction, GridPos, Tick, WaldoColor};
use crate::reactor::RegionLabel;
use crate::waldo::action::{Action, Outcome, WaldoView};
use crate::waldo::rendezvous::Yield;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// The reactor stopped listening; unwind and return
    #[error("program halted by the reactor")]
    Halted,
    /// The reactor refused the last action
    #[error("action rejected: {0}")]
    Rejected(String),
}

pub type Step<T> = std::result::Result<T, ProgramError>;

/// Unwind payload for a program that keeps acting after `Halted`
pub(crate) struct HaltSignal;

/// User logic bound to a waldo
///
/// `run` is called once on a dedicated thread. Looping forever is normal;
/// returning leaves the waldo waiting for the rest of the run.
pub trait WaldoProgram: Send + 'static {
    /// Identity used when reporting faults
    fn name(&self) -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }

    fn run(&mut self, ctx: &mut ProgramContext) -> Step<()>;
}

impl WaldoProgram for Box<dyn WaldoProgram> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn run(&mut self, ctx: &mut ProgramContext) -> Step<()> {
        (**self).run(ctx)
    }
}

/// A program built from a closure, mostly for tests and quick experiments
pub struct FnProgram<F> {
    name: String,
    body: F,
}

impl<F> FnProgram<F>
where
    F: FnMut(&mut ProgramContext) -> Step<()> + Send + 'static,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl<F> WaldoProgram for FnProgram<F>
where
    F: FnMut(&mut ProgramContext) -> Step<()> + Send + 'static,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn run(&mut self, ctx: &mut ProgramContext) -> Step<()> {
        (self.body)(ctx)
    }
}

/// The program side of the rendezvous
pub struct ProgramContext {
    color: WaldoColor,
    reactor_width: i32,
    reactor_height: i32,
    view: WaldoView,
    proceed_rx: Receiver<WaldoView>,
    action_tx: SyncSender<Yield>,
    halted: bool,
}

impl ProgramContext {
    pub(crate) fn new(
        color: WaldoColor,
        reactor_width: i32,
        reactor_height: i32,
        start: GridPos,
        proceed_rx: Receiver<WaldoView>,
        action_tx: SyncSender<Yield>,
    ) -> Self {
        Self {
            color,
            reactor_width,
            reactor_height,
            view: WaldoView {
                tick: 0,
                position: start,
                grabbed: false,
                holding: false,
                last_outcome: None,
            },
            proceed_rx,
            action_tx,
            halted: false,
        }
    }

    /// Block until the scheduler first asks for an action
    pub(crate) fn await_start(&mut self) -> Step<()> {
        match self.proceed_rx.recv() {
            Ok(view) => {
                self.view = view;
                Ok(())
            }
            Err(_) => Err(self.halt()),
        }
    }

    fn halt(&mut self) -> ProgramError {
        self.halted = true;
        ProgramError::Halted
    }

    /// `Halted` is reported once. Any later action unwinds the program thread
    /// so a body that ignores the error cannot keep running.
    fn act(&mut self, action: Action) -> Step<Outcome> {
        if self.halted {
            std::panic::resume_unwind(Box::new(HaltSignal));
        }
        if self.action_tx.send(Yield::Action(action)).is_err() {
            return Err(self.halt());
        }
        self.view = match self.proceed_rx.recv() {
            Ok(view) => view,
            Err(_) => return Err(self.halt()),
        };
        match self.view.last_outcome.clone() {
            Some(Outcome::Rejected(reason)) => Err(ProgramError::Rejected(reason)),
            Some(outcome) => Ok(outcome),
            None => Ok(Outcome::Done),
        }
    }

    pub fn color(&self) -> WaldoColor {
        self.color
    }

    pub fn reactor_width(&self) -> i32 {
        self.reactor_width
    }

    pub fn reactor_height(&self) -> i32 {
        self.reactor_height
    }

    pub fn tick(&self) -> Tick {
        self.view.tick
    }

    pub fn position(&self) -> GridPos {
        self.view.position
    }

    pub fn x(&self) -> i32 {
        self.view.position.x
    }

    pub fn y(&self) -> i32 {
        self.view.position.y
    }

    pub fn is_grabbed(&self) -> bool {
        self.view.grabbed
    }

    pub fn is_holding(&self) -> bool {
        self.view.holding
    }

    pub fn wait(&mut self) -> Step<()> {
        self.act(Action::Wait).map(|_| ())
    }

    pub fn wait_for(&mut self, ticks: u32) -> Step<()> {
        for _ in 0..ticks {
            self.wait()?;
        }
        Ok(())
    }

    /// Move one cell; walking into a wall just wastes the tick
    pub fn step(&mut self, dir: Direction) -> Step<()> {
        self.act(Action::Move(dir)).map(|_| ())
    }

    pub fn step_n(&mut self, dir: Direction, steps: u32) -> Step<()> {
        for _ in 0..steps {
            self.step(dir)?;
        }
        Ok(())
    }

    /// Close the grabber; true if a molecule was picked up
    pub fn grab(&mut self) -> Step<bool> {
        Ok(matches!(self.act(Action::Grab)?, Outcome::Grabbed(true)))
    }

    pub fn drop(&mut self) -> Step<()> {
        self.act(Action::Drop).map(|_| ())
    }

    pub fn grab_drop(&mut self) -> Step<()> {
        self.act(Action::GrabDrop).map(|_| ())
    }

    /// Request a molecule from an input region; false if it could not be placed
    pub fn input(&mut self, label: RegionLabel) -> Step<bool> {
        Ok(matches!(self.act(Action::Input(label))?, Outcome::Input(true)))
    }

    /// Hand a contained molecule to an output region; true if more remain there
    pub fn output(&mut self, label: RegionLabel) -> Step<bool> {
        Ok(matches!(
            self.act(Action::Output(label))?,
            Outcome::Output { remaining: true }
        ))
    }

    /// Bond the held atom under the waldo to its neighbour in `dir`
    pub fn bond(&mut self, dir: Direction) -> Step<bool> {
        Ok(matches!(self.act(Action::Bond(dir))?, Outcome::Bonded(true)))
    }

    /// Break one bond between the held atom under the waldo and its neighbour in `dir`
    pub fn unbond(&mut self, dir: Direction) -> Step<bool> {
        Ok(matches!(self.act(Action::Unbond(dir))?, Outcome::Bonded(true)))
    }
}
