use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::camera::{self, PhotoArtifact};
use crate::config::AppConfig;
use crate::resize::{self, TargetSize};
use crate::state::AppEvent;
use crate::storage::StorageService;
use crate::ui::StyleTokens;
use gtk4::prelude::*;
use gtk4::ApplicationWindow;
use image::RgbaImage;

use super::caption_screen::{self, CaptionScreenParams};
use super::capture_screen::CaptureScreenUi;
use super::worker::spawn_worker_action;
use super::SharedMachine;

pub(super) type SharedPhoto = Rc<RefCell<Option<PhotoArtifact>>>;
pub(super) type SharedBitmap = Rc<RefCell<Option<RgbaImage>>>;

/// Click-handler executor for the capture screen. Cheap to clone; every
/// clone shares the same session state.
#[derive(Clone)]
pub(super) struct CaptureActions {
    machine: SharedMachine,
    storage: Rc<StorageService>,
    config: Rc<AppConfig>,
    photo: SharedPhoto,
    displayed: SharedBitmap,
    ui: CaptureScreenUi,
    window: ApplicationWindow,
    tokens: StyleTokens,
}

impl CaptureActions {
    pub(super) fn new(
        machine: SharedMachine,
        storage: Rc<StorageService>,
        config: Rc<AppConfig>,
        ui: CaptureScreenUi,
        window: ApplicationWindow,
        tokens: StyleTokens,
    ) -> Self {
        Self {
            machine,
            storage,
            config,
            photo: Rc::new(RefCell::new(None)),
            displayed: Rc::new(RefCell::new(None)),
            ui,
            window,
            tokens,
        }
    }

    /// Run the external camera command off the UI thread, then decode the
    /// fresh capture sized to the viewport.
    pub(super) fn capture_photo_async(&self) {
        let target = match self.storage.prepare_capture_target() {
            Ok(target) => target,
            Err(err) => {
                tracing::warn!(?err, "could not prepare capture target");
                self.ui.show_toast(&format!("Capture failed: {err}"));
                return;
            }
        };
        let command = self.config.camera_command();

        let capture_actions = self.clone();
        spawn_worker_action(
            move || camera::capture_photo(&command, &target),
            move |result| match result {
                Ok(artifact) => capture_actions.photo_ready(artifact),
                Err(err) => {
                    tracing::warn!(?err, "camera capture failed");
                    capture_actions
                        .ui
                        .show_toast(&format!("Capture failed: {err}"));
                }
            },
        );
    }

    /// Native file picker for the gallery flow.
    pub(super) fn pick_photo(&self) {
        let filter = gtk4::FileFilter::new();
        filter.set_name(Some("Images"));
        filter.add_pixbuf_formats();

        let dialog = gtk4::FileDialog::builder().title("Pick a picture").build();
        dialog.set_default_filter(Some(&filter));

        let capture_actions = self.clone();
        dialog.open(
            Some(&self.window),
            gtk4::gio::Cancellable::NONE,
            move |result| match result {
                Ok(file) => match file.path() {
                    Some(path) => capture_actions.receive_external_photo(path),
                    None => capture_actions.ui.show_toast("Picked file has no local path"),
                },
                // cancelling the dialog also lands here
                Err(err) => tracing::debug!("file pick dismissed: {err}"),
            },
        );
    }

    /// Shared entry point for picked files and externally shared images.
    pub(super) fn receive_external_photo(&self, path: PathBuf) {
        let capture_actions = self.clone();
        spawn_worker_action(
            move || camera::import_photo(&path),
            move |result| match result {
                Ok(artifact) => capture_actions.photo_ready(artifact),
                Err(err) => {
                    tracing::warn!(?err, "photo import failed");
                    capture_actions
                        .ui
                        .show_toast(&format!("Could not open image: {err}"));
                }
            },
        );
    }

    fn photo_ready(&self, artifact: PhotoArtifact) {
        if let Err(err) = self.machine.borrow_mut().transition(AppEvent::PhotoCaptured) {
            tracing::warn!(?err, "photo arrived in a state that cannot accept it");
            self.ui.show_toast("Close the caption editor before retaking");
            return;
        }

        tracing::info!(
            photo_id = artifact.photo_id,
            width = artifact.width,
            height = artifact.height,
            "photo ready"
        );
        let source_path = artifact.source_path.clone();
        *self.photo.borrow_mut() = Some(artifact);

        let target = self.viewport_target();
        let capture_actions = self.clone();
        spawn_worker_action(
            move || resize::shrink_file(&source_path, target),
            move |result| match result {
                Ok(bitmap) => {
                    capture_actions.ui.show_photo(&bitmap);
                    capture_actions.ui.mark_photo_ready();
                    *capture_actions.displayed.borrow_mut() = Some(bitmap);
                }
                Err(err) => {
                    tracing::warn!(?err, "viewport decode failed");
                    capture_actions
                        .ui
                        .show_toast(&format!("Could not decode photo: {err}"));
                }
            },
        );
    }

    /// Advance to the caption screen; only allowed once a photo is ready.
    pub(super) fn open_caption_editor(&self) {
        let Some(artifact) = self.photo.borrow().clone() else {
            self.ui.show_toast("Select a picture first");
            return;
        };
        if let Err(err) = self
            .machine
            .borrow_mut()
            .transition(AppEvent::OpenCaptionEditor)
        {
            tracing::warn!(?err, "caption editor blocked");
            self.ui.show_toast("Caption editor is already open");
            return;
        }

        caption_screen::present_caption_window(
            &self.window,
            CaptionScreenParams {
                machine: self.machine.clone(),
                storage: self.storage.clone(),
                font_path: self.config.font_path.clone(),
                artifact,
                viewport: self.viewport_target(),
                initial_bitmap: self.displayed.borrow().clone(),
                tokens: self.tokens,
            },
        );
    }

    /// Decode target from the realized viewport, falling back to the layout
    /// tokens before the first allocation.
    fn viewport_target(&self) -> TargetSize {
        let width = self.ui.photo_picture.width();
        let height = self.ui.photo_picture.height();
        if width > 0 && height > 0 {
            TargetSize::new(width as u32, height as u32)
        } else {
            TargetSize::new(
                self.tokens.capture_viewport_width as u32,
                self.tokens.capture_viewport_height as u32,
            )
        }
    }
}
