/// Compile-time layout tokens — not user-overridable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleTokens {
    pub spacing_4: i32,
    pub spacing_8: i32,
    pub spacing_12: i32,
    pub capture_viewport_width: i32,
    pub capture_viewport_height: i32,
    pub capture_window_width: i32,
    pub capture_window_height: i32,
    pub caption_window_width: i32,
    pub caption_window_height: i32,
    pub toast_duration_ms: u32,
}

pub const LAYOUT_TOKENS: StyleTokens = StyleTokens {
    spacing_4: 4,
    spacing_8: 8,
    spacing_12: 12,
    capture_viewport_width: 640,
    capture_viewport_height: 480,
    capture_window_width: 720,
    capture_window_height: 640,
    caption_window_width: 760,
    caption_window_height: 720,
    toast_duration_ms: 2_000,
};
