use super::*;
use crate::analysis::{HeuristicClassifier, PoseLabel};
use crate::engine::backend::{ManualTimeSource, ScriptedPoseDetector};
use crate::pose::{Joint, JointSample};
use crate::trigger::PhaseState;

/// Golfer at address: hands together below the shoulders
fn address_pose() -> PoseKeypoints {
    PoseKeypoints::new()
        .with(Joint::Neck, JointSample::new(0.50, 0.30, 0.9))
        .with(Joint::LeftShoulder, JointSample::new(0.40, 0.30, 0.9))
        .with(Joint::RightShoulder, JointSample::new(0.60, 0.30, 0.9))
        .with(Joint::LeftWrist, JointSample::new(0.49, 0.60, 0.9))
        .with(Joint::RightWrist, JointSample::new(0.51, 0.60, 0.9))
        .with(Joint::LeftHip, JointSample::new(0.45, 0.70, 0.9))
        .with(Joint::RightHip, JointSample::new(0.55, 0.70, 0.9))
}

/// Golfer in the finish: hands raised above the shoulders
fn finish_pose() -> PoseKeypoints {
    PoseKeypoints::new()
        .with(Joint::Neck, JointSample::new(0.50, 0.30, 0.9))
        .with(Joint::LeftShoulder, JointSample::new(0.40, 0.30, 0.9))
        .with(Joint::RightShoulder, JointSample::new(0.60, 0.30, 0.9))
        .with(Joint::LeftWrist, JointSample::new(0.55, 0.15, 0.9))
        .with(Joint::RightWrist, JointSample::new(0.57, 0.15, 0.9))
        .with(Joint::LeftHip, JointSample::new(0.45, 0.70, 0.9))
        .with(Joint::RightHip, JointSample::new(0.55, 0.70, 0.9))
}

fn heuristic_slot() -> ClassifierSlot {
    ClassifierSlot::with_classifier(Arc::new(HeuristicClassifier::default()))
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Offer a frame and block until the worker has processed it
fn offer_and_wait(lane: &LiveLane, timestamp: f64) {
    let before = lane.processed_frames();
    assert!(lane.offer(CameraFrame::at(timestamp)), "lane busy at {}", timestamp);
    assert!(
        wait_until(Duration::from_secs(2), || lane.processed_frames() > before),
        "frame at {} never processed",
        timestamp
    );
}

/// Drain commands until one matches `done` or the timeout passes
fn collect_until(
    rx: &mut broadcast::Receiver<TriggerCommand>,
    mut done: impl FnMut(&TriggerCommand) -> bool,
) -> Vec<TriggerCommand> {
    let mut received = Vec::new();
    wait_until(Duration::from_secs(2), || {
        while let Ok(command) = rx.try_recv() {
            let finished = done(&command);
            received.push(command);
            if finished {
                return true;
            }
        }
        false
    });
    received
}

#[test]
fn test_pipeline_classifies_poses() {
    let detector = Arc::new(ScriptedPoseDetector::new(vec![
        Some(address_pose()),
        Some(finish_pose()),
        None,
    ]));
    let pipeline = LanePipeline::new(&AppConfig::default(), detector, heuristic_slot());

    assert_eq!(pipeline.classify_frame(&CameraFrame::at(0.0)).label, PoseLabel::Ready);
    assert_eq!(
        pipeline.classify_frame(&CameraFrame::at(0.1)).label,
        PoseLabel::EndSwing
    );

    let gap = pipeline.classify_frame(&CameraFrame::at(0.2));
    assert_eq!(gap.label, PoseLabel::Other);
    assert_eq!(gap.confidence, 0.0);
    assert_eq!(gap.timestamp, 0.2);
}

#[test]
fn test_pipeline_starts_clip_after_ready_hold() {
    let detector = Arc::new(ScriptedPoseDetector::repeating(address_pose()));
    let mut pipeline = LanePipeline::new(&AppConfig::default(), detector, heuristic_slot());
    pipeline.set_active(true, 0.0);

    assert!(pipeline.process(&CameraFrame::at(6.0)).is_empty());
    let commands = pipeline.process(&CameraFrame::at(6.125));

    assert!(commands.contains(&TriggerCommand::StartClip { timestamp: 6.125 }));
    assert_eq!(pipeline.trigger().phase(), PhaseState::RecordingSwing);
}

#[test]
fn test_pipeline_without_classifier_never_triggers() {
    let detector = Arc::new(ScriptedPoseDetector::repeating(address_pose()));
    let mut pipeline = LanePipeline::new(&AppConfig::default(), detector, ClassifierSlot::empty());
    pipeline.set_active(true, 0.0);

    let started = (0..80)
        .flat_map(|i| pipeline.process(&CameraFrame::at(6.0 + i as f64 * 0.125)))
        .any(|c| matches!(c, TriggerCommand::StartClip { .. }));

    assert!(!started);
    assert_eq!(pipeline.trigger().phase(), PhaseState::WaitingReady);
}

#[test]
fn test_lane_drops_frames_while_busy() {
    let detector = Arc::new(
        ScriptedPoseDetector::repeating(address_pose()).with_delay(Duration::from_millis(100)),
    );
    let (tx, _rx) = broadcast::channel(16);
    let mut lane = LiveLane::spawn(
        &AppConfig::default(),
        detector,
        heuristic_slot(),
        Arc::new(ManualTimeSource::default()),
        tx,
    );

    assert!(lane.offer(CameraFrame::at(0.0)));
    assert!(!lane.offer(CameraFrame::at(0.05)), "second frame must be dropped");
    assert_eq!(lane.dropped_frames(), 1);

    assert!(wait_until(Duration::from_secs(2), || lane.processed_frames() == 1));
    assert!(lane.offer(CameraFrame::at(0.2)));

    lane.stop().unwrap();
}

#[test]
fn test_lane_timer_stops_clip_without_frames() {
    let detector = Arc::new(ScriptedPoseDetector::new(vec![
        Some(address_pose()),
        Some(address_pose()),
        Some(finish_pose()),
        Some(finish_pose()),
    ]));
    let time = Arc::new(ManualTimeSource::new(0.0));
    let (tx, mut rx) = broadcast::channel(64);
    let mut lane = LiveLane::spawn(
        &AppConfig::default(),
        detector,
        heuristic_slot(),
        time.clone(),
        tx,
    );

    lane.set_active(true).unwrap();
    let activated = collect_until(&mut rx, |c| {
        matches!(
            c,
            TriggerCommand::PhaseChanged {
                to: PhaseState::WaitingReady,
                ..
            }
        )
    });
    assert!(!activated.is_empty());

    time.set(6.0);
    offer_and_wait(&lane, 6.0);
    offer_and_wait(&lane, 6.125);
    let started = collect_until(&mut rx, |c| matches!(c, TriggerCommand::StartClip { .. }));
    assert!(started.contains(&TriggerCommand::StartClip { timestamp: 6.125 }));

    time.set(7.0);
    offer_and_wait(&lane, 7.0);
    offer_and_wait(&lane, 7.125);

    // No more frames: the worker's timer poll must stop the clip
    time.set(11.25);
    let stopped = collect_until(&mut rx, |c| matches!(c, TriggerCommand::StopClip { .. }));
    assert!(
        stopped.contains(&TriggerCommand::StopClip { timestamp: 11.25 }),
        "got {:?}",
        stopped
    );

    lane.stop().unwrap();
}

#[test]
fn test_lane_stop_forces_stop_clip() {
    let detector = Arc::new(ScriptedPoseDetector::repeating(address_pose()));
    let time = Arc::new(ManualTimeSource::new(0.0));
    let (tx, mut rx) = broadcast::channel(64);
    let mut lane = LiveLane::spawn(
        &AppConfig::default(),
        detector,
        heuristic_slot(),
        time.clone(),
        tx,
    );

    lane.set_active(true).unwrap();
    time.set(6.0);
    offer_and_wait(&lane, 6.0);
    offer_and_wait(&lane, 6.125);

    time.set(6.5);
    lane.stop().unwrap();

    let commands = collect_until(&mut rx, |c| matches!(c, TriggerCommand::StopClip { .. }));
    assert!(commands.contains(&TriggerCommand::StopClip { timestamp: 6.5 }));

    assert!(!lane.is_running());
    assert!(!lane.offer(CameraFrame::at(7.0)));
    assert_eq!(lane.stop(), Err(PoseError::LaneStopped));
    assert_eq!(lane.set_active(true), Err(PoseError::LaneStopped));
}
