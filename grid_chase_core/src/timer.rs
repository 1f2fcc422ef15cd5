use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use tracing::{debug, info};

use crate::signal::{RunFlag, StopReason};

/// Seconds left in the current level.
///
/// Only ever decreases within a level; [`reset`](Countdown::reset) starts the
/// next one.
#[derive(Debug, Default)]
pub struct Countdown {
    remaining: AtomicU32,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Countdown {
            remaining: AtomicU32::new(seconds),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn reset(&self, seconds: u32) {
        self.remaining.store(seconds, Ordering::SeqCst);
    }

    /// Takes one second off the clock, never going below zero, and returns
    /// what is left.
    pub fn tick(&self) -> u32 {
        let previous = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| {
                Some(s.saturating_sub(1))
            })
            .unwrap_or_default();
        previous.saturating_sub(1)
    }
}

/// How a timer agent finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The clock reached zero and this agent ended the session.
    Expired,
    /// Something else ended the session first.
    Cancelled,
}

/// Counts the level clock down once per interval.
#[derive(Debug)]
pub struct TimerAgent<'a> {
    countdown: &'a Countdown,
    run: &'a RunFlag,
    interval: Duration,
}

impl<'a> TimerAgent<'a> {
    pub fn new(countdown: &'a Countdown, run: &'a RunFlag, interval: Duration) -> Self {
        TimerAgent {
            countdown,
            run,
            interval,
        }
    }

    /// Performs one tick. Returns `Some` once the agent is finished.
    pub fn step(&self) -> Option<TimerOutcome> {
        if !self.run.is_running() {
            return Some(TimerOutcome::Cancelled);
        }
        let remaining = self.countdown.tick();
        debug!(remaining, "timer tick");
        if remaining > 0 {
            return None;
        }
        if self.run.stop(StopReason::TimeExpired) {
            info!("time expired");
            Some(TimerOutcome::Expired)
        } else {
            Some(TimerOutcome::Cancelled)
        }
    }

    /// Ticks until the clock runs out or the session is stopped elsewhere.
    pub fn run(self) -> TimerOutcome {
        loop {
            if !self.run.sleep(self.interval) {
                return TimerOutcome::Cancelled;
            }
            if let Some(outcome) = self.step() {
                return outcome;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_saturates_at_zero() {
        let countdown = Countdown::new(2);
        assert_eq!(countdown.tick(), 1);
        assert_eq!(countdown.tick(), 0);
        assert_eq!(countdown.tick(), 0);
        countdown.reset(15);
        assert_eq!(countdown.remaining(), 15);
    }

    #[test]
    fn expiry_stops_session_once() {
        let countdown = Countdown::new(2);
        let run = RunFlag::new();
        let timer = TimerAgent::new(&countdown, &run, Duration::ZERO);

        assert_eq!(timer.step(), None);
        assert_eq!(timer.step(), Some(TimerOutcome::Expired));
        assert_eq!(run.reason(), Some(StopReason::TimeExpired));

        assert_eq!(timer.step(), Some(TimerOutcome::Cancelled));
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn stopped_session_is_not_decremented() {
        let countdown = Countdown::new(9);
        let run = RunFlag::new();
        run.stop(StopReason::PlayerQuit);
        let timer = TimerAgent::new(&countdown, &run, Duration::from_millis(1));
        assert_eq!(timer.run(), TimerOutcome::Cancelled);
        assert_eq!(countdown.remaining(), 9);
        assert_eq!(run.reason(), Some(StopReason::PlayerQuit));
    }

    #[test]
    fn run_counts_down_to_expiry() {
        let countdown = Countdown::new(3);
        let run = RunFlag::new();
        let outcome = TimerAgent::new(&countdown, &run, Duration::from_millis(2)).run();
        assert_eq!(outcome, TimerOutcome::Expired);
        assert_eq!(countdown.remaining(), 0);
        assert!(!run.is_running());
    }
}
