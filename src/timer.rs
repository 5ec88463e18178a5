use std::time::{Duration, Instant};

use itertools::Itertools;

use crate::field::TimerOutput;

/// Formats a duration as payload seconds: whole milliseconds, 3 decimals.
pub fn fmt_secs3(d: Duration) -> String {
    format!("{:.3}", d.as_millis() as f64 / 1000.0)
}

/// Formats a duration as display seconds: 2 decimals.
pub fn fmt_secs2(d: Duration) -> String {
    format!("{:.2}", d.as_millis() as f64 / 1000.0)
}

/// A start/stop/lap/reset timer with a committed lap history.
///
/// Two states: Idle and Running. The current (uncommitted) lap survives a
/// stop, so stop/start pairs pause and resume it. `lap` moves the current
/// lap into history without stopping the clock. All time-consuming events
/// take an explicit `now` so behavior is deterministic under test; the
/// elapsed value is derived from the anchor on demand, never pushed by a
/// background task.
///
/// Invariant: `total() == laps().iter().sum()` after every commit.
#[derive(Debug, Clone)]
pub struct LapTimer {
    output_type: TimerOutput,
    list_separator: String,
    started_at: Option<Instant>,
    elapsed: Duration,
    total: Duration,
    laps: Vec<Duration>,
}

impl LapTimer {
    pub fn new(output_type: TimerOutput, list_separator: impl Into<String>) -> Self {
        Self {
            output_type,
            list_separator: list_separator.into(),
            started_at: None,
            elapsed: Duration::ZERO,
            total: Duration::ZERO,
            laps: vec![],
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn output_type(&self) -> TimerOutput {
        self.output_type
    }

    pub fn laps(&self) -> &[Duration] {
        &self.laps
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// The current uncommitted lap as of `now`.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(anchor) => now.saturating_duration_since(anchor),
            None => self.elapsed,
        }
    }

    /// Idle -> Running. Anchors so that a previously stopped lap resumes
    /// where it left off. No-op while running.
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now.checked_sub(self.elapsed).unwrap_or(now));
        }
    }

    /// Running -> Idle. The current lap is retained, not committed.
    pub fn stop(&mut self, now: Instant) {
        if let Some(anchor) = self.started_at.take() {
            self.elapsed = now.saturating_duration_since(anchor);
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_running() {
            self.stop(now);
        } else {
            self.start(now);
        }
    }

    /// Commits the current lap to history and keeps the clock going.
    /// A zero-length current lap is ignored, so double-fired lap events
    /// before any time has accrued cannot record empty laps.
    pub fn lap(&mut self, now: Instant) {
        let current = self.elapsed_at(now);
        if current.is_zero() {
            return;
        }

        self.total += current;
        self.laps.push(current);

        self.elapsed = Duration::ZERO;
        if self.started_at.is_some() {
            self.started_at = Some(now);
        }
    }

    /// Back to the initial state: Idle, no elapsed time, no history.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.elapsed = Duration::ZERO;
        self.total = Duration::ZERO;
        self.laps.clear();
    }

    /// The timer's contribution to the assembled payload. Read-only.
    pub fn output(&self, now: Instant) -> String {
        match self.output_type {
            TimerOutput::Average => {
                if self.laps.is_empty() {
                    "0".to_string()
                } else {
                    fmt_secs3(self.total / self.laps.len() as u32)
                }
            }
            TimerOutput::Total => {
                if self.laps.is_empty() {
                    "0".to_string()
                } else {
                    // Unlike average, the in-progress lap counts.
                    let sum: Duration = self.laps.iter().sum();
                    fmt_secs3(sum + self.elapsed_at(now))
                }
            }
            TimerOutput::List => self
                .laps
                .iter()
                .map(|lap| fmt_secs3(*lap))
                .join(&self.list_separator),
            TimerOutput::Unsupported => "undefined".to_string(),
        }
    }

    /// On-screen readout of the current lap (2 decimals).
    pub fn current_display(&self, now: Instant) -> String {
        fmt_secs2(self.elapsed_at(now))
    }

    /// On-screen cumulative readout (2 decimals): the lap average for
    /// average output, the committed total otherwise.
    pub fn cumulative_display(&self) -> String {
        let time = match self.output_type {
            TimerOutput::Average if !self.laps.is_empty() => {
                self.total / self.laps.len() as u32
            }
            TimerOutput::Average => Duration::ZERO,
            _ => self.total,
        };
        fmt_secs2(time)
    }
}
