use super::*;

const STEP: f64 = 0.125;

/// Feed `count` frames of `label` starting at `start`, collecting commands
fn feed(trigger: &mut LiveTrigger, start: f64, count: usize, label: PoseLabel) -> Vec<TriggerCommand> {
    (0..count)
        .flat_map(|i| trigger.on_label(start + i as f64 * STEP, label))
        .collect()
}

fn starts(commands: &[TriggerCommand]) -> Vec<f64> {
    commands
        .iter()
        .filter_map(|c| match c {
            TriggerCommand::StartClip { timestamp } => Some(*timestamp),
            _ => None,
        })
        .collect()
}

fn stops(commands: &[TriggerCommand]) -> Vec<f64> {
    commands
        .iter()
        .filter_map(|c| match c {
            TriggerCommand::StopClip { timestamp } => Some(*timestamp),
            _ => None,
        })
        .collect()
}

/// Session activated at t=0, recording started at t=6.125
fn recording_trigger() -> LiveTrigger {
    let mut trigger = LiveTrigger::default();
    trigger.set_active(true, 0.0);
    let commands = feed(&mut trigger, 6.0, 2, PoseLabel::Ready);
    assert_eq!(starts(&commands), vec![6.125]);
    assert_eq!(trigger.phase(), PhaseState::RecordingSwing);
    trigger
}

/// Recording entered post-end at t=7.125
fn post_end_trigger() -> LiveTrigger {
    let mut trigger = recording_trigger();
    feed(&mut trigger, 7.0, 2, PoseLabel::EndSwing);
    assert_eq!(trigger.phase(), PhaseState::PostEndSwing);
    trigger
}

#[test]
fn test_activation_enters_waiting_ready() {
    let mut trigger = LiveTrigger::default();
    let commands = trigger.set_active(true, 0.0);

    assert_eq!(trigger.phase(), PhaseState::WaitingReady);
    assert_eq!(
        commands,
        vec![TriggerCommand::PhaseChanged {
            from: PhaseState::Idle,
            to: PhaseState::WaitingReady,
            timestamp: 0.0
        }]
    );
}

#[test]
fn test_idle_ignores_labels() {
    let mut trigger = LiveTrigger::default();
    let commands = feed(&mut trigger, 10.0, 20, PoseLabel::Ready);

    assert!(commands.is_empty());
    assert_eq!(trigger.phase(), PhaseState::Idle);
}

#[test]
fn test_ready_hold_starts_clip_exactly_once() {
    let mut trigger = LiveTrigger::default();
    trigger.set_active(true, 0.0);

    let mut commands = feed(&mut trigger, 5.0, 8, PoseLabel::Other);
    commands.extend(feed(&mut trigger, 6.0, 8, PoseLabel::Ready));

    // Ready run reaches 0.1s on its second frame
    assert_eq!(starts(&commands), vec![6.125]);
    assert_eq!(trigger.phase(), PhaseState::RecordingSwing);
}

#[test]
fn test_single_other_frame_resets_ready_run() {
    let mut trigger = LiveTrigger::default();
    trigger.set_active(true, 0.0);

    assert!(trigger.on_label(6.0, PoseLabel::Ready).is_empty());
    assert!(trigger.on_label(6.125, PoseLabel::Other).is_empty());
    assert!(trigger.on_label(6.25, PoseLabel::Ready).is_empty());
    assert_eq!(trigger.continuous_duration(PoseLabel::Ready, 6.25), 0.0);

    let commands = trigger.on_label(6.375, PoseLabel::Ready);
    assert_eq!(starts(&commands), vec![6.375]);
}

#[test]
fn test_activation_counts_as_phase_change_for_cooldown() {
    // Entering WaitingReady updates the last phase change, so a held Ready
    // pose right after activation waits out the cooldown.
    let mut trigger = LiveTrigger::default();
    trigger.set_active(true, 0.0);

    let commands = feed(&mut trigger, 1.0, 33, PoseLabel::Ready);
    assert!(starts(&commands).is_empty(), "t <= 5.0 is inside cooldown");

    let commands = trigger.on_label(5.125, PoseLabel::Ready);
    assert_eq!(starts(&commands), vec![5.125]);
}

#[test]
fn test_end_swing_hold_arms_post_end_timer() {
    let mut trigger = recording_trigger();

    let commands = feed(&mut trigger, 7.0, 2, PoseLabel::EndSwing);
    assert!(starts(&commands).is_empty());
    assert!(stops(&commands).is_empty());
    assert_eq!(trigger.phase(), PhaseState::PostEndSwing);

    let timer = trigger.pending_timer().expect("timer armed");
    assert_eq!(timer.deadline, 7.125 + 4.0);
}

#[test]
fn test_post_end_ignores_labels() {
    let mut trigger = post_end_trigger();
    let commands = feed(&mut trigger, 8.0, 10, PoseLabel::Ready);

    assert!(commands.is_empty());
    assert_eq!(trigger.phase(), PhaseState::PostEndSwing);
}

#[test]
fn test_timer_expiry_stops_clip_without_frames() {
    let mut trigger = post_end_trigger();

    assert!(trigger.poll_timer(11.0).is_empty());
    let commands = trigger.poll_timer(11.125);

    assert_eq!(stops(&commands), vec![11.125]);
    assert_eq!(trigger.phase(), PhaseState::WaitingReady);
    assert!(trigger.pending_timer().is_none());
    assert!(trigger.poll_timer(20.0).is_empty());
}

#[test]
fn test_retrigger_inside_cooldown_is_blocked() {
    let mut trigger = post_end_trigger();
    trigger.poll_timer(11.125);

    // Ready held across the whole cooldown window
    let commands = feed(&mut trigger, 11.25, 39, PoseLabel::Ready);
    assert!(
        starts(&commands).is_empty(),
        "last start candidate is t = 16.0, still within 5s of 11.125"
    );

    let commands = trigger.on_label(16.25, PoseLabel::Ready);
    assert_eq!(starts(&commands), vec![16.25]);
}

#[test]
fn test_deactivate_while_recording_forces_stop() {
    let mut trigger = recording_trigger();
    let commands = trigger.set_active(false, 6.5);

    assert_eq!(stops(&commands), vec![6.5]);
    assert_eq!(trigger.phase(), PhaseState::Idle);
}

#[test]
fn test_deactivate_during_post_end_cancels_timer() {
    let mut trigger = post_end_trigger();
    let commands = trigger.set_active(false, 8.0);

    assert_eq!(stops(&commands), vec![8.0]);
    assert_eq!(trigger.phase(), PhaseState::Idle);
    assert!(trigger.pending_timer().is_none());
    assert!(trigger.poll_timer(30.0).is_empty());
}

#[test]
fn test_deactivate_while_waiting_emits_no_stop() {
    let mut trigger = LiveTrigger::default();
    trigger.set_active(true, 0.0);
    let commands = trigger.set_active(false, 1.0);

    assert!(stops(&commands).is_empty());
    assert_eq!(trigger.phase(), PhaseState::Idle);
}

#[test]
fn test_rearming_cancels_previous_timer() {
    let mut trigger = post_end_trigger();
    let first = trigger.pending_timer().unwrap();
    let second = trigger.arm_timer(9.0);

    assert_ne!(first.generation, second.generation);
    assert!(trigger
        .on_timer_elapsed(first.generation, first.deadline)
        .is_empty());
    assert_eq!(trigger.phase(), PhaseState::PostEndSwing);

    let commands = trigger.handle(TriggerEvent::TimerElapsed {
        generation: second.generation,
        timestamp: second.deadline,
    });
    assert_eq!(stops(&commands), vec![13.0]);
}

#[test]
fn test_handle_dispatches_events() {
    let mut trigger = LiveTrigger::default();
    trigger.handle(TriggerEvent::SetActive {
        active: true,
        timestamp: 0.0,
    });
    trigger.handle(TriggerEvent::Label {
        timestamp: 6.0,
        label: PoseLabel::Ready,
    });
    let commands = trigger.handle(TriggerEvent::Label {
        timestamp: 6.125,
        label: PoseLabel::Ready,
    });

    assert_eq!(starts(&commands), vec![6.125]);
}

#[test]
fn test_late_frames_do_not_panic() {
    let mut trigger = LiveTrigger::default();
    trigger.set_active(true, 0.0);
    trigger.on_label(6.5, PoseLabel::Ready);
    trigger.on_label(6.25, PoseLabel::Ready);

    assert_eq!(trigger.phase(), PhaseState::WaitingReady);
}
