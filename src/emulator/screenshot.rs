// Screenshot capture - timestamped PNG of the front framebuffer

use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use chrono::Local;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Write the framebuffer (256x240 0xAARRGGBB words) to
/// `famicore_YYYYmmdd_HHMMSS.png` in the working directory. Returns the
/// path written.
pub fn save_screenshot(frame: &[u32]) -> Result<PathBuf, std::io::Error> {
    let name = format!("famicore_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
    let path = PathBuf::from(name);

    let file = File::create(&path)?;
    let writer = BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut data = Vec::with_capacity(frame.len() * 4);
    for &pixel in frame {
        data.push((pixel >> 16) as u8); // R
        data.push((pixel >> 8) as u8); // G
        data.push(pixel as u8); // B
        data.push((pixel >> 24) as u8); // A
    }

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    png_writer
        .write_image_data(&data)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    info!("screenshot saved to {}", path.display());
    Ok(path)
}
