use crate::{
    CaptureSession, CoreError, OPUS_SAMPLE_RATE, SessionState,
    tests::support::{OggOpusStream, ScriptedSource, SourceTracker, TEST_FORMAT},
};

// Samples at 48kHz for `count` samples captured in TEST_FORMAT.
fn at_opus_rate(count: u64) -> u64 {
    count * u64::from(OPUS_SAMPLE_RATE) / u64::from(TEST_FORMAT.sample_rate)
}

fn scripted(tracker: &SourceTracker) -> CaptureSession {
    CaptureSession::new(Box::new(ScriptedSource::new(
        tracker.clone(),
        vec![vec![0.1; 160], vec![0.2; 160]],
    )))
}

/// WHAT: Starting an idle session acquires the device and records
/// WHY: Idle is the only state a capture may start from
#[test]
#[allow(clippy::unwrap_used)]
fn given_idle_session_when_starting_then_recording_with_device_acquired() {
    // Given: An idle session
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);
    assert_eq!(session.state(), SessionState::Idle);

    // When: Starting
    session.start().unwrap();

    // Then: Recording with exactly one acquisition
    assert_eq!(session.state(), SessionState::Recording);
    assert_eq!(tracker.acquisitions(), 1);
    assert_eq!(tracker.releases(), 0);
}

/// WHAT: Start while recording is rejected without re-acquiring
/// WHY: A second acquisition would leak the first device handle
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_starting_again_then_rejected_without_reacquire() {
    // Given: A recording session
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);
    session.start().unwrap();

    // When: Starting again
    let result = session.start();

    // Then: AlreadyRecording, still Recording, device acquired once
    assert!(matches!(result, Err(CoreError::AlreadyRecording { .. })));
    assert_eq!(session.state(), SessionState::Recording);
    assert_eq!(tracker.acquisitions(), 1);
}

/// WHAT: A denied device leaves the session idle
/// WHY: No partial capture may exist after a failed start
#[test]
fn given_denied_device_when_starting_then_capture_unavailable_and_idle() {
    // Given: A source that refuses access
    let tracker = SourceTracker::default();
    let mut session = CaptureSession::new(Box::new(ScriptedSource::denied(tracker.clone())));

    // When: Starting
    let result = session.start();

    // Then: CaptureUnavailable and Idle; stop has nothing to finalize
    assert!(matches!(result, Err(CoreError::CaptureUnavailable { .. })));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(matches!(
        session.stop(),
        Err(CoreError::NoActiveSession { .. })
    ));
}

/// WHAT: Stop while idle signals NoActiveSession
/// WHY: Stop without a capture is a no-op, not a crash
#[test]
fn given_idle_session_when_stopping_then_no_active_session() {
    // Given: An idle session
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);

    // When: Stopping
    let result = session.stop();

    // Then: NoActiveSession and the device was never touched
    assert!(matches!(result, Err(CoreError::NoActiveSession { .. })));
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(tracker.acquisitions(), 0);
    assert_eq!(tracker.releases(), 0);
}

/// WHAT: Stop releases the device and yields one blob of everything captured
/// WHY: The buffer collapses into exactly one finalized unit
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_stopping_then_one_blob_and_device_released() {
    // Given: A recording session that received scripted and live chunks
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);
    session.start().unwrap();
    tracker.push(&[0.3; 80]);

    // When: Stopping
    let blob = session.stop().unwrap();

    // Then: Idle, released, and the blob holds all 400 samples
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(tracker.releases(), 1);
    assert_eq!(blob.file_name(), "recording0.ogg");

    let stream = OggOpusStream::parse(blob.bytes());
    assert_eq!(stream.playable_samples(), at_opus_rate(400));
}

/// WHAT: The device can be re-acquired after stop and late chunks are dropped
/// WHY: Each capture starts from a fresh buffer
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_session_when_starting_again_then_fresh_capture() {
    // Given: A session that recorded once, then got a late chunk
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);
    session.start().unwrap();
    let first = session.stop().unwrap();
    tracker.push(&[0.9; 1000]);

    // When: Recording again
    session.start().unwrap();
    let second = session.stop().unwrap();

    // Then: Device acquired twice, released twice, late chunk not included
    assert_eq!(tracker.acquisitions(), 2);
    assert_eq!(tracker.releases(), 2);
    assert_eq!(first.file_name(), "recording0.ogg");
    assert_eq!(second.file_name(), "recording1.ogg");

    let stream = OggOpusStream::parse(second.bytes());
    assert_eq!(stream.playable_samples(), at_opus_rate(320));
}

/// WHAT: Abort leaves Recording, releases the device, and discards audio
/// WHY: A device failure must not leave the microphone held
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_aborting_then_idle_and_released() {
    // Given: A recording session
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);
    session.start().unwrap();

    // When: Aborting twice
    let first = session.abort();
    let second = session.abort();

    // Then: Only the first abort did anything
    assert!(first);
    assert!(!second);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(tracker.releases(), 1);
}

/// WHAT: Device faults during recording are delivered to the owner
/// WHY: The controller must learn about disconnection to stop the timer
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_session_when_device_faults_then_fault_delivered() {
    // Given: A recording session
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);
    session.start().unwrap();

    // When: The platform reports a failure
    tracker.fault("device disconnected");

    // Then: The fault is received
    let fault = session.next_fault().await.unwrap();
    assert_eq!(fault.reason, "device disconnected");
}

/// WHAT: Stale faults from a previous capture are not delivered to the next
/// WHY: A new recording must not be aborted for an old failure
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_fault_before_stop_when_restarting_then_stale_fault_dropped() {
    // Given: A fault reported, then the capture stopped without handling it
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);
    session.start().unwrap();
    tracker.fault("glitch");
    session.stop().unwrap();

    // When: Starting a new capture and reporting a fresh fault
    session.start().unwrap();
    tracker.fault("unplugged");

    // Then: Only the fresh fault is delivered
    let fault = session.next_fault().await.unwrap();
    assert_eq!(fault.reason, "unplugged");
}

/// WHAT: Dropping a recording session releases the device
/// WHY: Device acquisition is a scoped resource on every exit path
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_dropped_then_device_released() {
    // Given: A recording session
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);
    session.start().unwrap();

    // When: Dropping it
    drop(session);

    // Then: The device was released
    assert_eq!(tracker.releases(), 1);
}

/// WHAT: State is Idle iff completed stops equal completed starts
/// WHY: Start/stop parity holds across any legal sequence
#[test]
#[allow(clippy::unwrap_used)]
fn given_alternating_requests_when_applied_then_state_tracks_parity() {
    // Given: An idle session and a sequence with illegal requests mixed in
    let tracker = SourceTracker::default();
    let mut session = scripted(&tracker);
    let requests = [true, true, false, false, true, false, true, true, false];
    let (mut starts, mut stops) = (0, 0);

    // When: Applying each request
    for start in requests {
        if start {
            if session.start().is_ok() {
                starts += 1;
            }
        } else if session.stop().is_ok() {
            stops += 1;
        }

        // Then: Parity matches state after every step
        let idle = session.state() == SessionState::Idle;
        assert_eq!(idle, starts == stops);
    }

    assert_eq!(starts, 3);
    assert_eq!(stops, 3);
    assert_eq!(tracker.acquisitions(), tracker.releases());
}
