use crate::audio::{CaptureBuffer, ChunkSink, DeviceFault};

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::mpsc;

/// WHAT: Buffer respects its sample limit
/// WHY: Prevents unbounded memory growth during long recordings
#[test]
fn given_buffer_at_max_capacity_when_adding_chunk_then_oldest_discarded() {
    // Given: A buffer limited to 100 samples, filled with ten 0.0 chunks
    let mut buf = CaptureBuffer::with_limit(100);
    for _ in 0..10 {
        buf.push(&[0.0f32; 10]);
    }
    assert_eq!(buf.sample_count(), 100);

    // When: Adding one more chunk of 1.0 beyond the limit
    buf.push(&[1.0f32; 4]);

    // Then: The oldest chunk is gone and the newest samples are preserved
    assert_eq!(buf.sample_count(), 94);
    assert_eq!(buf.chunk_count(), 10);
    let samples = buf.drain();
    assert_eq!(samples.len(), 94);
    assert!((samples[samples.len() - 1] - 1.0).abs() < f32::EPSILON);
    assert!(samples[..90].iter().all(|s| s.abs() < f32::EPSILON));
}

/// WHAT: Draining concatenates chunks in arrival order
/// WHY: The finalized blob must be the capture in the order it was heard
#[test]
fn given_several_chunks_when_draining_then_samples_in_order_and_buffer_empty() {
    // Given: Chunks pushed in order, one of them empty
    let mut buf = CaptureBuffer::default();
    buf.push(&[0.1, 0.2]);
    buf.push(&[]);
    buf.push(&[0.3]);
    buf.push(&[0.4, 0.5]);

    // When: Draining the buffer
    let samples = buf.drain();

    // Then: Samples are contiguous, ordered, and the buffer is reset
    assert_eq!(samples, vec![0.1, 0.2, 0.3, 0.4, 0.5]);
    assert_eq!(buf.chunk_count(), 0);
    assert_eq!(buf.sample_count(), 0);
}

fn sink() -> (
    ChunkSink,
    Arc<Mutex<CaptureBuffer>>,
    Arc<AtomicBool>,
    mpsc::UnboundedReceiver<DeviceFault>,
) {
    let buffer = Arc::new(Mutex::new(CaptureBuffer::default()));
    let released = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = ChunkSink::new(Arc::clone(&buffer), Arc::clone(&released), tx);
    (sink, buffer, released, rx)
}

/// WHAT: A released sink drops late chunks and faults
/// WHY: A callback in flight during stop must not write into a finished capture
#[test]
#[allow(clippy::unwrap_used)]
fn given_released_sink_when_pushing_or_faulting_then_ignored() {
    // Given: A sink whose session has released the device
    let (sink, buffer, released, mut faults) = sink();
    sink.push(&[0.5; 4]);
    released.store(true, Ordering::Release);

    // When: The platform delivers another chunk and an error
    sink.push(&[0.9; 4]);
    sink.fault("stream closed");

    // Then: Only the pre-release chunk is buffered and no fault is queued
    assert!(sink.is_released());
    assert_eq!(buffer.lock().unwrap().sample_count(), 4);
    assert!(faults.try_recv().is_err());
}

/// WHAT: A live sink forwards faults to the session
/// WHY: Device disconnection has to reach the controller to stop the timer
#[test]
#[allow(clippy::unwrap_used)]
fn given_live_sink_when_faulting_then_fault_queued() {
    // Given: A live sink
    let (sink, _buffer, _released, mut faults) = sink();

    // When: The platform reports an error
    sink.fault("device unplugged");

    // Then: The fault is delivered with its reason
    let fault = faults.try_recv().unwrap();
    assert_eq!(fault.reason, "device unplugged");
}
