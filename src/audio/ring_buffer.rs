// Wait-free SPSC ring buffer for audio samples
//
// One producer (the APU on the emulation thread), one consumer (the audio
// callback). Both sides are wait-free: a full buffer drops the sample, an
// empty buffer returns None and the caller plays silence. Capacity is
// rounded up to a power of two so the index math is a mask.
//
// Head and tail are monotonically increasing positions; the difference is
// the fill level. The producer publishes with a release store of `tail`
// after writing the slot; the consumer acquires `tail` before reading, and
// symmetrically for `head`. Each index has a single writer, which is what
// makes plain load/store pairs sufficient.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared {
    buffer: UnsafeCell<Box<[f32]>>,
    mask: usize,
    /// Next position the consumer will read; written only by the consumer
    head: AtomicUsize,
    /// Next position the producer will write; written only by the producer
    tail: AtomicUsize,
}

// The UnsafeCell is only reached from the single producer (slots past head)
// and the single consumer (slots before tail), never concurrently for the
// same slot.
unsafe impl Sync for Shared {}
unsafe impl Send for Shared {}

/// Constructor namespace for the ring's two endpoints
pub struct RingBuffer;

impl RingBuffer {
    /// Create a ring with at least `capacity` slots (rounded up to a power
    /// of two).
    pub fn with_capacity(capacity: usize) -> (Producer, Consumer) {
        let capacity = capacity.next_power_of_two();
        let shared = Arc::new(Shared {
            buffer: UnsafeCell::new(vec![0.0; capacity].into_boxed_slice()),
            mask: capacity - 1,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        });
        (
            Producer {
                shared: Arc::clone(&shared),
            },
            Consumer { shared },
        )
    }
}

/// Write end; owned by the emulation thread
pub struct Producer {
    shared: Arc<Shared>,
}

impl Producer {
    /// Push one sample. Returns false (dropping the sample) when the ring
    /// is full.
    pub fn push(&mut self, sample: f32) -> bool {
        let shared = &*self.shared;
        let tail = shared.tail.load(Ordering::Relaxed);
        let head = shared.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) > shared.mask {
            return false;
        }
        unsafe {
            (*shared.buffer.get())[tail & shared.mask] = sample;
        }
        shared.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }

    /// Samples currently queued
    pub fn len(&self) -> usize {
        let shared = &*self.shared;
        shared
            .tail
            .load(Ordering::Relaxed)
            .wrapping_sub(shared.head.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.mask + 1
    }
}

/// Read end; owned by the audio callback
pub struct Consumer {
    shared: Arc<Shared>,
}

impl Consumer {
    /// Pop one sample, or None when the ring is empty (underrun: the caller
    /// substitutes silence).
    pub fn pop(&mut self) -> Option<f32> {
        let shared = &*self.shared;
        let head = shared.head.load(Ordering::Relaxed);
        let tail = shared.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let sample = unsafe { (*shared.buffer.get())[head & shared.mask] };
        shared.head.store(head.wrapping_add(1), Ordering::Release);
        Some(sample)
    }

    /// Samples currently queued
    pub fn len(&self) -> usize {
        let shared = &*self.shared;
        shared
            .tail
            .load(Ordering::Acquire)
            .wrapping_sub(shared.head.load(Ordering::Relaxed))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
