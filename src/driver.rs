//! Tick driver - the external clock that advances a reactor
//!
//! The reactor never schedules itself. A driver owns the timer and calls
//! `advance_tick` once per interval, either as fast as possible for headless
//! runs or paced by a tokio interval for watching a run live.

use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

use crate::core::config::StepSpeed;
use crate::core::error::{ReactorError, Result};
use crate::reactor::{SharedReactor, TickReport};

/// How a run ended
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub final_tick: u64,
    pub elapsed_ms: u64,
    pub fault: Option<String>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.fault.is_none()
    }
}

pub struct TickDriver {
    reactor: SharedReactor,
    interval: Duration,
}

impl TickDriver {
    pub fn new(reactor: SharedReactor, speed: StepSpeed) -> Self {
        Self {
            reactor,
            interval: speed.interval(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reactor(&self) -> &SharedReactor {
        &self.reactor
    }

    /// Run up to `ticks` ticks back to back, stopping at the first fault
    pub fn run_ticks(&self, ticks: u64) -> RunSummary {
        let start = Instant::now();
        let mut ticks_run = 0;
        let mut fault = None;
        for _ in 0..ticks {
            match self.reactor.advance_tick() {
                Ok(_) => ticks_run += 1,
                Err(e) => {
                    fault = Some(e.to_string());
                    break;
                }
            }
        }
        self.finish(ticks_run, fault, start)
    }

    /// Run up to `ticks` ticks paced by the driver interval
    ///
    /// Each tick runs on the blocking pool since it waits on program threads.
    /// `on_tick` sees every completed tick.
    pub async fn run_realtime(
        &self,
        ticks: u64,
        mut on_tick: impl FnMut(&TickReport),
    ) -> RunSummary {
        let start = Instant::now();
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks_run = 0;
        let mut fault = None;
        for _ in 0..ticks {
            interval.tick().await;
            match self.advance_blocking().await {
                Ok(report) => {
                    ticks_run += 1;
                    on_tick(&report);
                }
                Err(e) => {
                    fault = Some(e.to_string());
                    break;
                }
            }
        }
        self.finish(ticks_run, fault, start)
    }

    async fn advance_blocking(&self) -> Result<TickReport> {
        let reactor = self.reactor.clone();
        tokio::task::spawn_blocking(move || reactor.advance_tick())
            .await
            .map_err(|e| ReactorError::RunAborted(format!("tick task failed: {}", e)))?
    }

    fn finish(&self, ticks_run: u64, fault: Option<String>, start: Instant) -> RunSummary {
        let final_tick = self.reactor.with(|r| r.tick()).unwrap_or_default();
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &fault {
            Some(fault) => tracing::error!(ticks_run, final_tick, %fault, "run stopped"),
            None => tracing::info!(ticks_run, final_tick, elapsed_ms, "run complete"),
        }
        RunSummary {
            ticks_run,
            final_tick,
            elapsed_ms,
            fault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::Challenge;
    use crate::core::config::SimulationConfig;
    use crate::core::types::{GridPos, WaldoColor};
    use crate::programs::{BigLoop, LittleLoop};
    use crate::waldo::FnProgram;

    fn shared(config: SimulationConfig) -> SharedReactor {
        let mut reactor = Challenge::get("Hello world!").unwrap().build(config).unwrap();
        reactor
            .bind_program(WaldoColor::Red, LittleLoop::START, LittleLoop)
            .unwrap();
        reactor
            .bind_program(WaldoColor::Blue, BigLoop::START, BigLoop)
            .unwrap();
        SharedReactor::new(reactor)
    }

    #[test]
    fn test_run_ticks_counts() {
        let driver = TickDriver::new(shared(SimulationConfig::default()), StepSpeed::Turbo);
        let summary = driver.run_ticks(40);
        assert!(summary.is_clean());
        assert_eq!(summary.ticks_run, 40);
        assert_eq!(summary.final_tick, 40);
    }

    #[test]
    fn test_run_stops_at_fault() {
        let layout = Challenge::get("Hello world!").unwrap().layout;
        let mut reactor = crate::reactor::Reactor::new(
            &layout,
            SimulationConfig::default().with_timeout(Duration::from_millis(30)),
        )
        .unwrap();
        reactor
            .bind_program(
                WaldoColor::Red,
                GridPos::new(0, 0),
                FnProgram::new("Stuck", |ctx| {
                    ctx.wait()?;
                    std::thread::sleep(Duration::from_millis(300));
                    Ok(())
                }),
            )
            .unwrap();
        let driver = TickDriver::new(SharedReactor::new(reactor), StepSpeed::Turbo);
        let summary = driver.run_ticks(10);
        assert_eq!(summary.ticks_run, 1);
        assert!(summary.fault.unwrap().contains("Stuck"));
    }

    #[tokio::test]
    async fn test_realtime_reports_every_tick() {
        let driver = TickDriver::new(shared(SimulationConfig::default()), StepSpeed::Turbo)
            .with_interval(Duration::from_millis(1));
        let mut seen = Vec::new();
        let summary = driver.run_realtime(5, |report| seen.push(report.tick)).await;
        assert!(summary.is_clean());
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }
}
