use super::error::{StateError, StateResult};
use super::{event::StateTransition, AppEvent, AppState};

#[derive(Debug)]
pub struct StateMachine {
    state: AppState,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: AppState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn can_transition(&self, event: AppEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: AppEvent) -> Option<AppState> {
        use AppEvent::*;
        match (self.state, event) {
            (AppState::Idle, Start) => Some(AppState::Idle),
            (AppState::Idle, PhotoCaptured) => Some(AppState::PhotoReady),
            // Retaking or re-importing a photo keeps the screen ready.
            (AppState::PhotoReady, PhotoCaptured) => Some(AppState::PhotoReady),
            (AppState::PhotoReady, OpenCaptionEditor) => Some(AppState::Captioning),
            (AppState::Captioning, CloseCaptionEditor) => Some(AppState::PhotoReady),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: AppEvent) -> StateResult<AppState> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(Some(self.state), event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }
}

#[cfg(test)]
impl StateMachine {
    fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AppState::{:?}", self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_editor_requires_a_captured_photo() {
        let mut machine = StateMachine::new();
        assert!(machine.can_transition(AppEvent::Start));
        assert!(machine.can_transition(AppEvent::PhotoCaptured));
        assert!(!machine.can_transition(AppEvent::OpenCaptionEditor));
        assert!(!machine.can_transition(AppEvent::CloseCaptionEditor));

        let _ = machine
            .transition(AppEvent::PhotoCaptured)
            .expect("idle -> photo ready should transition");

        assert!(machine.can_transition(AppEvent::OpenCaptionEditor));
        assert!(machine.can_transition(AppEvent::PhotoCaptured));
        assert!(!machine.can_transition(AppEvent::Start));
    }

    #[test]
    fn transition_records_history_with_ordered_entries() {
        let mut machine = StateMachine::new();
        let _ = machine
            .transition(AppEvent::Start)
            .expect("start should work");
        let _ = machine
            .transition(AppEvent::PhotoCaptured)
            .expect("photo captured should work");
        let _ = machine
            .transition(AppEvent::OpenCaptionEditor)
            .expect("open caption editor should work");
        let _ = machine
            .transition(AppEvent::CloseCaptionEditor)
            .expect("close caption editor should work");

        assert_eq!(machine.state(), AppState::PhotoReady);
        assert_eq!(machine.history().len(), 4);
        assert_eq!(
            machine.history()[0],
            StateTransition::new(Some(AppState::Idle), AppEvent::Start, AppState::Idle)
        );
        assert_eq!(
            machine.history()[1],
            StateTransition::new(
                Some(AppState::Idle),
                AppEvent::PhotoCaptured,
                AppState::PhotoReady
            )
        );
        assert_eq!(
            machine.history()[2],
            StateTransition::new(
                Some(AppState::PhotoReady),
                AppEvent::OpenCaptionEditor,
                AppState::Captioning
            )
        );
        assert_eq!(
            machine.history()[3],
            StateTransition::new(
                Some(AppState::Captioning),
                AppEvent::CloseCaptionEditor,
                AppState::PhotoReady
            )
        );
    }

    #[test]
    fn retake_keeps_photo_ready_state() {
        let mut machine = StateMachine::new();
        let _ = machine
            .transition(AppEvent::PhotoCaptured)
            .expect("first capture should work");
        let state = machine
            .transition(AppEvent::PhotoCaptured)
            .expect("retake should work");
        assert_eq!(state, AppState::PhotoReady);
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = StateMachine::new();

        let err = machine
            .transition(AppEvent::CloseCaptionEditor)
            .expect_err("idle -> close caption editor should fail");
        assert!(matches!(
            err,
            StateError::InvalidStateTransition {
                from: AppState::Idle,
                event: AppEvent::CloseCaptionEditor
            }
        ));
        assert_eq!(machine.state(), AppState::Idle);
        assert!(machine.history().is_empty());
    }
}
