use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use image::{imageops, ImageReader, RgbaImage};
use thiserror::Error;

/// Display viewport the decode is sized for, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("target dimensions must be positive, got {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },
    #[error("failed to read photo source: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode photo: {0}")]
    Decode(#[from] image::ImageError),
}

pub type ResizeResult<T> = std::result::Result<T, ResizeError>;

/// EXIF orientation reduced to the rotations the resizer applies. Mirrored
/// and undefined orientation codes decode as `Normal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    pub fn from_exif_code(code: u32) -> Self {
        match code {
            3 => Self::Rotate180,
            6 => Self::Rotate90,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    pub fn apply(self, image: RgbaImage) -> RgbaImage {
        match self {
            Self::Normal => image,
            Self::Rotate90 => imageops::rotate90(&image),
            Self::Rotate180 => imageops::rotate180(&image),
            Self::Rotate270 => imageops::rotate270(&image),
        }
    }
}

/// Integer divisor that brings the native size down to roughly the target.
/// The decode only guarantees approximately `1/factor` dimensions.
pub fn downsample_factor(native_width: u32, native_height: u32, target: TargetSize) -> u32 {
    let height_ratio = div_ceil(native_height, target.height);
    let width_ratio = div_ceil(native_width, target.width);

    if height_ratio > 1 || width_ratio > 1 {
        height_ratio.max(width_ratio)
    } else {
        1
    }
}

fn div_ceil(value: u32, divisor: u32) -> u32 {
    value.div_ceil(divisor.max(1))
}

/// Decode `source` at a size bounded by `target`, corrected for the EXIF
/// orientation carried by the source itself.
///
/// The source is read three times: a header-only bounds probe, the pixel
/// decode, and the metadata read. `Seek` stands in for mark/reset between
/// the passes.
pub fn shrink_to_fit<R: BufRead + Seek>(mut source: R, target: TargetSize) -> ResizeResult<RgbaImage> {
    if target.width == 0 || target.height == 0 {
        return Err(ResizeError::InvalidTarget {
            width: target.width,
            height: target.height,
        });
    }

    let (native_width, native_height) = ImageReader::new(&mut source)
        .with_guessed_format()?
        .into_dimensions()?;
    let factor = downsample_factor(native_width, native_height, target);

    source.seek(SeekFrom::Start(0))?;
    let decoded = ImageReader::new(&mut source)
        .with_guessed_format()?
        .decode()?
        .into_rgba8();
    let reduced = if factor > 1 {
        let width = (native_width / factor).max(1);
        let height = (native_height / factor).max(1);
        imageops::resize(&decoded, width, height, imageops::FilterType::Triangle)
    } else {
        decoded
    };

    source.seek(SeekFrom::Start(0))?;
    let orientation = read_orientation(&mut source);
    if orientation != Orientation::Normal {
        tracing::debug!(?orientation, "correcting camera sensor orientation");
    }
    Ok(orientation.apply(reduced))
}

/// Convenience wrapper for on-disk photo sources.
pub fn shrink_file(path: &Path, target: TargetSize) -> ResizeResult<RgbaImage> {
    let reader = BufReader::new(File::open(path)?);
    shrink_to_fit(reader, target)
}

/// Orientation is read from the same bytes as the pixel data. Sources without
/// readable metadata (most gallery-picked PNGs) are left unrotated.
fn read_orientation<R: BufRead + Seek>(source: &mut R) -> Orientation {
    match exif::Reader::new().read_from_container(source) {
        Ok(metadata) => metadata
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from_exif_code)
            .unwrap_or_default(),
        Err(err) => {
            tracing::debug!("no usable orientation metadata: {err}");
            Orientation::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::GenericImageView;
    use std::io::Cursor;

    fn png_source(width: u32, height: u32) -> Cursor<Vec<u8>> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
        let mut cursor = Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, image::ImageFormat::Png)
            .expect("png encode should work");
        cursor.set_position(0);
        cursor
    }

    /// APP1 segment holding a minimal little-endian TIFF block with a single
    /// orientation tag, the way camera firmware writes it.
    fn exif_orientation_segment(code: u8) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(b"Exif\0\0");
        // TIFF header: "II", magic 42, IFD0 at offset 8
        payload.extend_from_slice(&[0x49, 0x49, 0x2a, 0x00, 0x08, 0x00, 0x00, 0x00]);
        // IFD0: one entry, tag 0x0112 (orientation), type SHORT, count 1
        payload.extend_from_slice(&[0x01, 0x00]);
        payload.extend_from_slice(&[
            0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, code, 0x00, 0x00, 0x00,
        ]);
        // no next IFD
        payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut segment = vec![0xff, 0xe1];
        segment.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
        segment.extend_from_slice(&payload);
        segment
    }

    fn jpeg_source_with_orientation(width: u32, height: u32, code: u8) -> Cursor<Vec<u8>> {
        let image = image::RgbImage::from_pixel(width, height, image::Rgb([80, 120, 40]));
        let mut plain = Vec::new();
        image
            .write_with_encoder(JpegEncoder::new_with_quality(&mut plain, 85))
            .expect("jpeg encode should work");

        // splice the EXIF segment right after the SOI marker
        let mut tagged = plain[..2].to_vec();
        tagged.extend_from_slice(&exif_orientation_segment(code));
        tagged.extend_from_slice(&plain[2..]);
        Cursor::new(tagged)
    }

    #[test]
    fn factor_is_max_of_ceil_ratios_when_oversized() {
        assert_eq!(downsample_factor(4000, 3000, TargetSize::new(1000, 750)), 4);
        assert_eq!(downsample_factor(4000, 1000, TargetSize::new(1000, 750)), 4);
        assert_eq!(downsample_factor(1000, 4000, TargetSize::new(1000, 750)), 6);
        assert_eq!(downsample_factor(1001, 750, TargetSize::new(1000, 750)), 2);
    }

    #[test]
    fn factor_is_one_when_native_already_fits() {
        assert_eq!(downsample_factor(800, 600, TargetSize::new(1000, 750)), 1);
        assert_eq!(downsample_factor(1000, 750, TargetSize::new(1000, 750)), 1);
    }

    #[test]
    fn orientation_codes_map_to_rotations() {
        assert_eq!(Orientation::from_exif_code(3), Orientation::Rotate180);
        assert_eq!(Orientation::from_exif_code(6), Orientation::Rotate90);
        assert_eq!(Orientation::from_exif_code(8), Orientation::Rotate270);
        assert_eq!(Orientation::from_exif_code(1), Orientation::Normal);
        assert_eq!(Orientation::from_exif_code(0), Orientation::Normal);
        assert_eq!(Orientation::from_exif_code(2), Orientation::Normal);
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let image = RgbaImage::new(30, 20);
        assert_eq!(Orientation::Rotate90.apply(image.clone()).dimensions(), (20, 30));
        assert_eq!(Orientation::Rotate180.apply(image.clone()).dimensions(), (30, 20));
        assert_eq!(Orientation::Rotate270.apply(image).dimensions(), (20, 30));
    }

    #[test]
    fn shrink_reduces_oversized_source_near_target() {
        let shrunk = shrink_to_fit(png_source(64, 48), TargetSize::new(16, 12))
            .expect("shrink should work");
        assert_eq!(shrunk.dimensions(), (16, 12));
    }

    #[test]
    fn shrink_keeps_source_that_already_fits() {
        let shrunk = shrink_to_fit(png_source(64, 48), TargetSize::new(640, 480))
            .expect("shrink should work");
        assert_eq!(shrunk.dimensions(), (64, 48));
    }

    #[test]
    fn shrink_applies_orientation_carried_by_the_source() {
        let shrunk = shrink_to_fit(
            jpeg_source_with_orientation(30, 20, 6),
            TargetSize::new(640, 480),
        )
        .expect("shrink should work");
        // orientation 6 is a quarter turn clockwise
        assert_eq!(shrunk.dimensions(), (20, 30));
    }

    #[test]
    fn shrink_leaves_upright_source_unrotated() {
        let shrunk = shrink_to_fit(
            jpeg_source_with_orientation(30, 20, 1),
            TargetSize::new(640, 480),
        )
        .expect("shrink should work");
        assert_eq!(shrunk.dimensions(), (30, 20));
    }

    #[test]
    fn shrink_rejects_zero_target() {
        let err = shrink_to_fit(png_source(8, 8), TargetSize::new(0, 10))
            .expect_err("zero width target should fail");
        assert!(matches!(err, ResizeError::InvalidTarget { width: 0, height: 10 }));
    }

    #[test]
    fn quality_85_jpeg_round_trip_preserves_dimensions() {
        let rgb = image::RgbImage::from_pixel(320, 200, image::Rgb([120, 64, 32]));
        let mut encoded = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, 85))
            .expect("jpeg encode should work");

        let decoded = image::load_from_memory(&encoded).expect("jpeg decode should work");
        assert_eq!(decoded.dimensions(), (320, 200));
    }
}
