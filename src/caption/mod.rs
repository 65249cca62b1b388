use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::PathBuf;
use thiserror::Error;

mod font;

pub use font::load_caption_font;

pub const CAPTION_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const CAPTION_STROKE: Rgba<u8> = Rgba([0, 0, 0, 255]);

const MIN_GLYPH_HEIGHT_PX: u32 = 12;
const MIN_STROKE_RADIUS_PX: i32 = 2;
const MAX_STROKE_RADIUS_PX: i32 = 4;

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error(
        "no usable caption font; install DejaVu or Liberation Sans, or set font_path in config.json"
    )]
    FontUnavailable,
    #[error("failed to load caption font from {path}: {source}")]
    FontLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("caption font data is not a valid font: {path}")]
    FontInvalid { path: PathBuf },
}

pub type CaptionResult<T> = std::result::Result<T, CaptionError>;

/// Draw the two caption strings onto `image` in place: a black stroke pass
/// then a white fill pass, so the text stays legible over arbitrary
/// backgrounds. Empty strings draw nothing.
pub fn draw_captions(image: &mut RgbaImage, font: &FontArc, top: &str, bottom: &str) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let glyph_height = glyph_height_for(height);
    let scale = PxScale::from(glyph_height as f32);
    let (top_baseline, bottom_baseline) = caption_baselines(height);

    draw_caption_line(image, font, scale, top, width, top_baseline, glyph_height);
    draw_caption_line(image, font, scale, bottom, width, bottom_baseline, glyph_height);
}

fn draw_caption_line(
    image: &mut RgbaImage,
    font: &FontArc,
    scale: PxScale,
    text: &str,
    image_width: u32,
    baseline: i32,
    glyph_height: u32,
) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    let (text_width, text_height) = text_size(scale, font, text);
    let x = centered_x(image_width, text_width);
    // draw_text_mut anchors at the glyph top, the baseline sits below it
    let y = baseline - text_height as i32;

    for (dx, dy) in stroke_offsets(stroke_radius_for(glyph_height)) {
        draw_text_mut(image, CAPTION_STROKE, x + dx, y + dy, scale, font, text);
    }
    draw_text_mut(image, CAPTION_FILL, x, y, scale, font, text);
}

/// Baseline anchors for the two captions: the top one at 1/7 of the image
/// height, the bottom one 1/14 of the height above the bottom edge.
pub(crate) fn caption_baselines(height: u32) -> (i32, i32) {
    let top = (height / 7) as i32;
    let bottom = (height - height / 14) as i32;
    (top, bottom)
}

pub(crate) fn centered_x(image_width: u32, text_width: u32) -> i32 {
    (image_width as i32 - text_width as i32) / 2
}

/// Glyph height scales with the bitmap so a display-sized decode gets
/// legible meme text.
pub(crate) fn glyph_height_for(image_height: u32) -> u32 {
    (image_height / 8).max(MIN_GLYPH_HEIGHT_PX)
}

pub(crate) fn stroke_radius_for(glyph_height: u32) -> i32 {
    (glyph_height as i32 / 16).clamp(MIN_STROKE_RADIUS_PX, MAX_STROKE_RADIUS_PX)
}

/// Offsets forming a filled disc minus the origin; stamping the stroke pass
/// at each offset approximates a round stroke of the given radius.
pub(crate) fn stroke_offsets(radius: i32) -> Vec<(i32, i32)> {
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if (dx, dy) != (0, 0) && dx * dx + dy * dy <= radius * radius {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}
