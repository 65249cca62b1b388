/// Screen-level application state. `PhotoReady` means a photo has been
/// captured or imported and the caption screen may be opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppState {
    #[default]
    Idle,
    PhotoReady,
    Captioning,
}
