// Display - winit window and pixels surface
//
// The host side of the emulator: a 256x240 surface scaled by an integer
// factor, redrawn at the monitor's pace, with the emulation advanced by
// wall-clock time each redraw.

pub mod keyboard;
mod window;

pub use keyboard::{KeyboardMapping, KeyboardState};
pub use window::run;
