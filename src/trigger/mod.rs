// LiveTrigger - debounced swing phase state machine
//
// Converts a noisy per-frame label stream into clean start/stop recording
// commands. The machine is single-writer: every input arrives as a
// TriggerEvent (frame label, timer expiry, session activation) and the only
// outputs are the returned TriggerCommands.
//
// Phases:
// - Idle: no session
// - WaitingReady: waiting for a held Ready pose outside the cooldown
// - RecordingSwing: clip recording, waiting for a held EndSwing pose
// - PostEndSwing: recording the follow-through until the post-end timer fires
//
// The cooldown is measured from the last phase change of any kind, including
// entering WaitingReady on activation or after a clip stops.

mod history;

pub use history::LabelHistory;

use serde::{Deserialize, Serialize};

use crate::analysis::PoseLabel;
use crate::config::TriggerConfig;

/// Live recording phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    #[default]
    Idle,
    WaitingReady,
    RecordingSwing,
    PostEndSwing,
}

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerEvent {
    /// A classified frame arrived
    Label { timestamp: f64, label: PoseLabel },
    /// The post-end timer armed with `generation` elapsed
    TimerElapsed { generation: u64, timestamp: f64 },
    /// The host activated or deactivated the session
    SetActive { active: bool, timestamp: f64 },
}

/// Output side effects, dispatched to the presentation side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCommand {
    StartClip {
        timestamp: f64,
    },
    StopClip {
        timestamp: f64,
    },
    PhaseChanged {
        from: PhaseState,
        to: PhaseState,
        timestamp: f64,
    },
}

/// Armed post-end timer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostEndTimer {
    pub generation: u64,
    pub deadline: f64,
}

/// Debounced swing trigger
#[derive(Debug, Clone)]
pub struct LiveTrigger {
    config: TriggerConfig,
    phase: PhaseState,
    history: LabelHistory,
    last_phase_change: Option<f64>,
    timer: Option<PostEndTimer>,
    next_generation: u64,
}

impl LiveTrigger {
    pub fn new(config: TriggerConfig) -> Self {
        let history = LabelHistory::new(config.history_window_s);
        Self {
            config,
            phase: PhaseState::Idle,
            history,
            last_phase_change: None,
            timer: None,
            next_generation: 0,
        }
    }

    pub fn phase(&self) -> PhaseState {
        self.phase
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn last_phase_change(&self) -> Option<f64> {
        self.last_phase_change
    }

    /// Currently armed post-end timer, if any
    pub fn pending_timer(&self) -> Option<PostEndTimer> {
        self.timer
    }

    /// How long the most recent uninterrupted run of `label` has lasted
    pub fn continuous_duration(&self, label: PoseLabel, now: f64) -> f64 {
        self.history.continuous_duration(label, now)
    }

    /// Apply one event and return the resulting commands
    pub fn handle(&mut self, event: TriggerEvent) -> Vec<TriggerCommand> {
        match event {
            TriggerEvent::Label { timestamp, label } => self.on_label(timestamp, label),
            TriggerEvent::TimerElapsed {
                generation,
                timestamp,
            } => self.on_timer_elapsed(generation, timestamp),
            TriggerEvent::SetActive { active, timestamp } => self.set_active(active, timestamp),
        }
    }

    /// Feed one classified frame
    pub fn on_label(&mut self, timestamp: f64, label: PoseLabel) -> Vec<TriggerCommand> {
        self.history.push(timestamp, label);
        let mut commands = Vec::new();

        match self.phase {
            PhaseState::Idle | PhaseState::PostEndSwing => {}
            PhaseState::WaitingReady => {
                let held = self.continuous_duration(PoseLabel::Ready, timestamp);
                if held >= self.config.ready_hold_s && self.cooldown_elapsed(timestamp) {
                    self.transition(PhaseState::RecordingSwing, timestamp, &mut commands);
                    commands.push(TriggerCommand::StartClip { timestamp });
                }
            }
            PhaseState::RecordingSwing => {
                let held = self.continuous_duration(PoseLabel::EndSwing, timestamp);
                if held >= self.config.end_hold_s {
                    self.transition(PhaseState::PostEndSwing, timestamp, &mut commands);
                    self.arm_timer(timestamp);
                }
            }
        }

        commands
    }

    /// Activate or deactivate the session
    ///
    /// Deactivating while a clip is recording forces an immediate stop.
    pub fn set_active(&mut self, active: bool, timestamp: f64) -> Vec<TriggerCommand> {
        let mut commands = Vec::new();

        if active {
            if self.phase == PhaseState::Idle {
                self.transition(PhaseState::WaitingReady, timestamp, &mut commands);
            }
            return commands;
        }

        match self.phase {
            PhaseState::Idle => {}
            PhaseState::WaitingReady => {
                self.transition(PhaseState::Idle, timestamp, &mut commands);
            }
            PhaseState::RecordingSwing | PhaseState::PostEndSwing => {
                self.timer = None;
                commands.push(TriggerCommand::StopClip { timestamp });
                self.transition(PhaseState::Idle, timestamp, &mut commands);
            }
        }
        self.history.clear();
        commands
    }

    /// Timer expiry; stale generations are ignored
    pub fn on_timer_elapsed(&mut self, generation: u64, timestamp: f64) -> Vec<TriggerCommand> {
        let mut commands = Vec::new();
        match self.timer {
            Some(timer) if timer.generation == generation => {}
            _ => {
                tracing::debug!(
                    "[Trigger] Ignoring stale timer generation {} at {:.3}s",
                    generation,
                    timestamp
                );
                return commands;
            }
        }

        self.timer = None;
        if self.phase == PhaseState::PostEndSwing {
            commands.push(TriggerCommand::StopClip { timestamp });
            self.transition(PhaseState::WaitingReady, timestamp, &mut commands);
        }
        commands
    }

    /// Fire the post-end timer if its deadline has passed
    ///
    /// Called by the lane on every loop iteration so recording stops even
    /// when no further frames arrive.
    pub fn poll_timer(&mut self, now: f64) -> Vec<TriggerCommand> {
        match self.timer {
            Some(timer) if now >= timer.deadline => self.on_timer_elapsed(timer.generation, now),
            _ => Vec::new(),
        }
    }

    /// Cancel any running post-end timer and start a fresh one
    fn arm_timer(&mut self, now: f64) -> PostEndTimer {
        self.next_generation += 1;
        let timer = PostEndTimer {
            generation: self.next_generation,
            deadline: now + self.config.post_end_duration_s,
        };
        if let Some(previous) = self.timer.replace(timer) {
            tracing::debug!(
                "[Trigger] Restarting post-end timer (cancelled generation {})",
                previous.generation
            );
        }
        timer
    }

    fn cooldown_elapsed(&self, now: f64) -> bool {
        self.last_phase_change
            .map_or(true, |changed| now - changed > self.config.cooldown_s)
    }

    fn transition(&mut self, to: PhaseState, timestamp: f64, commands: &mut Vec<TriggerCommand>) {
        let from = self.phase;
        self.phase = to;
        self.last_phase_change = Some(timestamp);
        tracing::info!("[Trigger] {:?} -> {:?} at {:.3}s", from, to, timestamp);
        commands.push(TriggerCommand::PhaseChanged {
            from,
            to,
            timestamp,
        });
    }
}

impl Default for LiveTrigger {
    fn default() -> Self {
        Self::new(TriggerConfig::default())
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
