// APU channels
//
// Pulse x2, triangle, noise, and the delta-modulation channel, composed from
// the shared components.

mod dmc;
mod noise;
mod pulse;
mod triangle;

pub use dmc::Dmc;
pub use noise::Noise;
pub use pulse::Pulse;
pub use triangle::Triangle;
