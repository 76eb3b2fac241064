//! Session state machine: start, clock ticks, oscillation frames, two-phase drops.

use crate::config::GameConfig;
use crate::oscillator::{self, FallingBlock};
use crate::resolver::{self, DropOutcome, Landing};
use crate::stack::Stack;
use crate::timer::Repeating;
use std::time::{Duration, Instant};

/// Frames replayed at most per update before the oscillator is re-based
/// (a stalled terminal must not teleport the block).
const MAX_CATCH_UP_FRAMES: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Dropped block did not land on the stack.
    Missed,
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Ended(EndReason),
    Won,
}

/// Snapshot of a dropped block, taken the instant the player dropped it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTicket {
    epoch: u64,
    pub left: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy)]
struct PendingDrop {
    ticket: DropTicket,
    started: Instant,
    due: Instant,
}

/// What an [`Session::update`] call did, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Ticked { remaining: u32 },
    Resolved(DropOutcome),
    Finished(SessionState),
}

#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    state: SessionState,
    stack: Stack,
    falling: Option<FallingBlock>,
    /// Width and speed the next falling block spawns with.
    next_width: f64,
    speed: f64,
    remaining_secs: u32,
    /// Bumped on every start; tickets from an older epoch are stale.
    epoch: u64,
    clock: Repeating,
    frames: Repeating,
    pending: Option<PendingDrop>,
    last_landing: Option<Landing>,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        let stack = Stack::new(config.plate_width, config.field_width / 2.0);
        Self {
            next_width: config.initial_width,
            speed: config.initial_speed,
            remaining_secs: config.round_secs,
            clock: Repeating::new(config.clock_interval),
            frames: Repeating::new(config.frame_interval),
            config,
            state: SessionState::Idle,
            stack,
            falling: None,
            epoch: 0,
            pending: None,
            last_landing: None,
        }
    }

    /// Reset everything and start a round. Also used for restart.
    pub fn start(&mut self, now: Instant) {
        self.stop();
        self.epoch = self.epoch.wrapping_add(1);
        self.stack = Stack::new(self.config.plate_width, self.config.field_width / 2.0);
        self.next_width = self.config.initial_width;
        self.speed = self.config.initial_speed;
        self.remaining_secs = self.config.round_secs;
        self.last_landing = None;
        self.state = SessionState::Running;
        self.spawn(now);
        self.clock.arm(now);
        log::info!(
            "round {} started: {}s, win at {}",
            self.epoch,
            self.remaining_secs,
            self.config.win_threshold
        );
    }

    /// Halt the clock and oscillator and forget any block in flight.
    pub fn stop(&mut self) {
        self.clock.cancel();
        self.frames.cancel();
        self.falling = None;
        self.pending = None;
    }

    /// One clock second.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if self.state != SessionState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.finish(SessionState::Ended(EndReason::TimeUp));
            return Some(SessionEvent::Finished(self.state));
        }
        Some(SessionEvent::Ticked {
            remaining: self.remaining_secs,
        })
    }

    /// One oscillation frame.
    pub fn step_frame(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        if let Some(ref mut block) = self.falling {
            oscillator::advance(block, self.config.field_width);
        }
    }

    /// Drop the falling block: stop it, snapshot its position and schedule
    /// resolution. No-op (None) unless running with a block in the air.
    pub fn begin_drop(&mut self, now: Instant) -> Option<DropTicket> {
        if self.state != SessionState::Running {
            return None;
        }
        let block = self.falling.take()?;
        self.frames.cancel();
        let ticket = DropTicket {
            epoch: self.epoch,
            left: block.x,
            width: block.width,
        };
        self.pending = Some(PendingDrop {
            ticket,
            started: now,
            due: now + self.config.drop_delay,
        });
        log::debug!("dropped at x={:.1} width={:.1}", ticket.left, ticket.width);
        Some(ticket)
    }

    /// Resolve a dropped block. Tickets that are not the pending drop of the
    /// current round (e.g. issued before a restart) are discarded.
    pub fn complete_drop(&mut self, ticket: DropTicket, now: Instant) -> Option<DropOutcome> {
        if self.state != SessionState::Running || ticket.epoch != self.epoch {
            log::debug!("discarding stale drop from round {}", ticket.epoch);
            return None;
        }
        self.pending.take_if(|p| p.ticket == ticket)?;

        let outcome = resolver::resolve(&mut self.stack, ticket.left, ticket.width, &self.config);
        match outcome {
            DropOutcome::Missed { overlap } => {
                log::info!("missed the stack (overlap {:.1})", overlap);
                self.finish(SessionState::Ended(EndReason::Missed));
            }
            DropOutcome::Landed(landing) => {
                self.last_landing = Some(landing);
                let count = self.score();
                log::info!(
                    "landed #{}: width {:.1} on {:.1} at y={:.0}{}",
                    count,
                    landing.segment.width,
                    landing.base_width,
                    landing.bottom_offset,
                    if landing.is_perfect { " (perfect)" } else { "" }
                );
                if count >= self.config.win_threshold {
                    self.finish(SessionState::Won);
                } else {
                    self.next_width = landing.segment.width;
                    self.speed = (self.speed + self.config.speed_step).min(self.config.max_speed);
                    self.spawn(now);
                }
            }
        }
        Some(outcome)
    }

    /// Fire whatever is due at `now`: clock ticks, then a pending drop, then
    /// oscillator frames.
    pub fn update(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while self.clock.fire_due(now) {
            if let Some(event) = self.tick() {
                events.push(event);
            }
            if self.state != SessionState::Running {
                return events;
            }
        }

        if let Some(pending) = self.pending {
            if pending.due <= now {
                if let Some(outcome) = self.complete_drop(pending.ticket, now) {
                    events.push(SessionEvent::Resolved(outcome));
                }
                if self.state != SessionState::Running {
                    events.push(SessionEvent::Finished(self.state));
                    return events;
                }
            }
        }

        let mut frames = 0;
        while self.frames.fire_due(now) {
            self.step_frame();
            frames += 1;
            if frames >= MAX_CATCH_UP_FRAMES {
                self.frames.arm(now);
                break;
            }
        }
        events
    }

    fn spawn(&mut self, now: Instant) {
        self.falling = Some(FallingBlock::spawn(self.next_width, self.speed));
        self.frames.arm(now);
    }

    fn finish(&mut self, state: SessionState) {
        self.stop();
        self.state = state;
        match state {
            SessionState::Won => log::info!("round {} won with {} stacked", self.epoch, self.score()),
            SessionState::Ended(reason) => {
                log::info!("round {} ended ({:?}) with {} stacked", self.epoch, reason, self.score());
            }
            _ => {}
        }
    }

    /// Stacked blocks, plate excluded.
    pub fn score(&self) -> usize {
        self.stack.stacked_count()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn falling(&self) -> Option<&FallingBlock> {
        self.falling.as_ref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn next_width(&self) -> f64 {
        self.next_width
    }

    pub fn last_landing(&self) -> Option<&Landing> {
        self.last_landing.as_ref()
    }

    pub fn is_oscillating(&self) -> bool {
        self.frames.is_armed()
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock.is_armed()
    }

    /// Block currently falling after a drop, with animation progress 0..=1.
    pub fn drop_in_flight(&self, now: Instant) -> Option<(DropTicket, f64)> {
        let pending = self.pending?;
        let total = pending.due.saturating_duration_since(pending.started);
        let progress = if total == Duration::ZERO {
            1.0
        } else {
            (now.saturating_duration_since(pending.started).as_secs_f64() / total.as_secs_f64())
                .min(1.0)
        };
        Some((pending.ticket, progress))
    }
}
