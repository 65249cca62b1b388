use std::path::Path;

use ab_glyph::FontArc;

use super::{CaptionError, CaptionResult};

/// Bold sans faces commonly present on desktop installs, probed in order.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/noto/NotoSans-Bold.ttf",
];

/// Load the caption face from the configured path, or the first candidate
/// found on the system when no path is configured.
pub fn load_caption_font(configured: Option<&Path>) -> CaptionResult<FontArc> {
    if let Some(path) = configured {
        return load_font_file(path);
    }

    for candidate in SYSTEM_FONT_CANDIDATES {
        let path = Path::new(candidate);
        if path.exists() {
            tracing::debug!(path = candidate, "using system caption font");
            return load_font_file(path);
        }
    }

    Err(CaptionError::FontUnavailable)
}

fn load_font_file(path: &Path) -> CaptionResult<FontArc> {
    let data = std::fs::read(path).map_err(|source| CaptionError::FontLoad {
        path: path.to_path_buf(),
        source,
    })?;
    FontArc::try_from_vec(data).map_err(|_| CaptionError::FontInvalid {
        path: path.to_path_buf(),
    })
}
