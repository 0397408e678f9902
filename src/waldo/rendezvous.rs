//! Program runner - strict alternation between the scheduler and a program
//!
//! Each program gets its own thread purely for a private call stack. Two
//! single-slot channels carry the baton back and forth:
//!
//! - scheduler sends a `WaldoView` ("proceed") then waits, bounded, for a `Yield`
//! - program sends a `Yield` ("action ready") then waits for the next view
//!
//! At most one side is running at any instant. A program that does not yield
//! within the timeout is reported as stuck and the run is aborted.
//!
//! Halting drops the proceed sender. A program parked at a yield point sees
//! `ProgramError::Halted`, and any action it issues afterwards unwinds its
//! thread. A thread cannot be killed, though: a program stuck in its own code
//! is detached and keeps running until it next touches its context, possibly
//! after the waldo that owned it is gone.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::error::{ReactorError, Result};
use crate::core::types::{GridPos, WaldoColor};
use crate::waldo::action::{Action, WaldoView};
use crate::waldo::program::{HaltSignal, ProgramContext, ProgramError, WaldoProgram};

/// Message from the program thread to the scheduler
#[derive(Debug)]
pub(crate) enum Yield {
    Action(Action),
    /// `run` returned normally
    Finished,
    /// `run` gave up after a rejected action
    Failed(String),
    /// `run` panicked
    Panicked(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Spawned, waiting for the first proceed
    Pending,
    /// Blocked at a yield point
    Parked,
    /// Body returned; the waldo waits from now on
    Finished,
    /// Missed its deadline or crashed
    Faulted,
}

pub struct ProgramRunner {
    color: WaldoColor,
    name: String,
    timeout: Duration,
    proceed_tx: Option<SyncSender<WaldoView>>,
    action_rx: Receiver<Yield>,
    handle: Option<JoinHandle<()>>,
    state: RunnerState,
    stalled: bool,
}

impl ProgramRunner {
    /// Start `program` on its own thread, parked until the first `next_action`
    pub fn spawn<P: WaldoProgram>(
        mut program: P,
        color: WaldoColor,
        start: GridPos,
        reactor_size: (i32, i32),
        timeout: Duration,
    ) -> Result<Self> {
        let name = program.name();
        let (proceed_tx, proceed_rx) = sync_channel::<WaldoView>(1);
        let (action_tx, action_rx) = sync_channel::<Yield>(1);
        let exit_tx = action_tx.clone();
        let (width, height) = reactor_size;

        let handle = thread::Builder::new()
            .name(format!("waldo-{}", color))
            .spawn(move || {
                let mut ctx =
                    ProgramContext::new(color, width, height, start, proceed_rx, action_tx);
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    ctx.await_start()?;
                    program.run(&mut ctx)
                }));
                let last = match result {
                    Ok(Ok(())) => Yield::Finished,
                    Ok(Err(ProgramError::Halted)) => return,
                    Err(payload) if (*payload).is::<HaltSignal>() => return,
                    Ok(Err(ProgramError::Rejected(reason))) => Yield::Failed(reason),
                    Err(payload) => Yield::Panicked(panic_message(payload.as_ref())),
                };
                let _ = exit_tx.send(last);
            })?;

        Ok(Self {
            color,
            name,
            timeout,
            proceed_tx: Some(proceed_tx),
            action_rx,
            handle: Some(handle),
            state: RunnerState::Pending,
            stalled: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Let the program run up to its next yield point and collect the action
    pub fn next_action(&mut self, view: WaldoView) -> Result<Action> {
        match self.state {
            RunnerState::Finished => return Ok(Action::Wait),
            RunnerState::Faulted => {
                return Err(ReactorError::RunAborted(format!(
                    "{} already faulted",
                    self.name
                )))
            }
            RunnerState::Pending | RunnerState::Parked => {}
        }

        let Some(proceed_tx) = &self.proceed_tx else {
            return Err(ReactorError::RunAborted(format!("{} was halted", self.name)));
        };
        if proceed_tx.send(view).is_err() {
            return Err(self.crashed("program thread exited without yielding".into()));
        }

        match self.action_rx.recv_timeout(self.timeout) {
            Ok(Yield::Action(action)) => {
                self.state = RunnerState::Parked;
                Ok(action)
            }
            Ok(Yield::Finished) => {
                tracing::info!(waldo = %self.color, program = %self.name, "program finished");
                self.state = RunnerState::Finished;
                Ok(Action::Wait)
            }
            Ok(Yield::Failed(reason)) => {
                tracing::warn!(
                    waldo = %self.color,
                    program = %self.name,
                    %reason,
                    "program stopped after a rejected action"
                );
                self.state = RunnerState::Finished;
                Ok(Action::Wait)
            }
            Ok(Yield::Panicked(message)) => Err(self.crashed(message)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(self.crashed("program thread exited without yielding".into()))
            }
            Err(RecvTimeoutError::Timeout) => {
                self.state = RunnerState::Faulted;
                self.stalled = true;
                Err(ReactorError::ProgramTimeout {
                    color: self.color,
                    program: self.name.clone(),
                    timeout: self.timeout,
                })
            }
        }
    }

    fn crashed(&mut self, message: String) -> ReactorError {
        self.state = RunnerState::Faulted;
        ReactorError::ProgramPanicked {
            color: self.color,
            program: self.name.clone(),
            message,
        }
    }

    /// Stop the program
    ///
    /// A program parked at a yield point sees `ProgramError::Halted` and its
    /// thread is joined. The join waits at most one rendezvous timeout; a
    /// program that stalled in its own code, or that is still busy when the
    /// bound runs out, is detached.
    pub fn halt(&mut self) {
        if self.proceed_tx.take().is_none() {
            return;
        }
        let Some(handle) = self.handle.take() else {
            return;
        };
        if self.stalled {
            tracing::warn!(
                waldo = %self.color,
                program = %self.name,
                "detaching stalled program thread"
            );
            return;
        }

        let deadline = Instant::now() + self.timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                tracing::warn!(
                    waldo = %self.color,
                    program = %self.name,
                    "program ignored halt, detaching its thread"
                );
                return;
            }
            // Drain a late yield so a program blocked on send can observe the halt
            let _ = self.action_rx.try_recv();
            thread::sleep(Duration::from_millis(1));
        }
        if handle.join().is_err() {
            tracing::warn!(waldo = %self.color, program = %self.name, "program thread panicked on halt");
        }
    }
}

impl Drop for ProgramRunner {
    fn drop(&mut self) {
        self.halt();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "program panicked".to_string()
    }
}
