//! Still images of what a signal looks like on an X/Y display.
//!
//! Each sample lights one pixel and repeated hits add up, so slow beam
//! segments come out brighter than fast transits, the same way phosphor
//! behaves.

use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};

use crate::{Result, Signal};

/// Half-width of the plotted area in signal units. Slightly larger than the
/// normalised drawing so edge strokes stay visible.
pub const PREVIEW_EXTENT: f32 = 1.1;

/// Brightness added per sample landing on a pixel.
const HIT: u8 = 64;

/// Plots `signal` into a `size` by `size` image, Y up.
pub fn render_preview(signal: &Signal, size: u32) -> GrayImage {
    let mut image = GrayImage::new(size, size);
    if size == 0 {
        return image;
    }

    let scale = size as f32 / (2.0 * PREVIEW_EXTENT);
    let mut plotted = 0usize;
    for sample in signal.samples() {
        let col = ((sample.x + PREVIEW_EXTENT) * scale).floor();
        let row = ((PREVIEW_EXTENT - sample.y) * scale).floor();
        if !(0.0..size as f32).contains(&col) || !(0.0..size as f32).contains(&row) {
            continue;
        }

        let Luma([value]) = image.get_pixel_mut(col as u32, row as u32);
        *value = value.saturating_add(HIT);
        plotted += 1;
    }

    tracing::debug!(size, plotted, skipped = signal.len() - plotted, "rendered preview");
    image
}

/// Renders a preview and saves it as PNG.
pub fn save_preview(path: impl AsRef<Path>, signal: &Signal, size: u32) -> Result<()> {
    let path = path.as_ref();
    render_preview(signal, size).save_with_format(path, ImageFormat::Png)?;
    tracing::info!(path = %path.display(), size, "wrote preview");
    Ok(())
}
