// Audio - the sample path from the APU to the host device
//
// The APU produces mono f32 samples into a wait-free single-producer
// single-consumer ring buffer; the cpal output callback drains it from the
// audio thread. The ring is the only object shared between the emulation
// thread and the audio thread.

#[cfg(feature = "audio")]
pub mod output;
pub mod ring_buffer;

#[cfg(feature = "audio")]
pub use output::AudioOutput;
pub use ring_buffer::{Consumer, Producer, RingBuffer};

/// Ring capacity in samples; at 44.1 kHz this is ~185 ms of headroom
pub const RING_CAPACITY: usize = 8192;
