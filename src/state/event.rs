use super::model::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Start,
    PhotoCaptured,
    OpenCaptionEditor,
    CloseCaptionEditor,
}

/// One recorded transition, ordered by insertion into the machine history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: Option<AppState>,
    pub event: AppEvent,
    pub to: AppState,
}

impl StateTransition {
    pub fn new(from: Option<AppState>, event: AppEvent, to: AppState) -> Self {
        Self { from, event, to }
    }
}
