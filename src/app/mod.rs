use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use crate::config::load_app_config;
use crate::error::AppResult;
use crate::state::{AppEvent, AppState, StateMachine};
use crate::storage::StorageService;
use crate::ui::LAYOUT_TOKENS;
use gtk4::gdk_pixbuf::{Colorspace, Pixbuf};
use gtk4::gio::ApplicationFlags;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::{Application, ApplicationWindow, Label};
use image::RgbaImage;

mod actions;
mod caption_screen;
mod capture_screen;
mod runtime_css;
mod worker;

use self::actions::CaptureActions;
use self::capture_screen::{build_capture_screen, connect_capture_controls};

const APP_ID: &str = "io.github.ethereum13.Memely";

pub(crate) type SharedMachine = Rc<RefCell<StateMachine>>;

pub struct App {
    machine: SharedMachine,
}

impl App {
    pub fn new() -> Self {
        Self {
            machine: Rc::new(RefCell::new(StateMachine::new())),
        }
    }

    pub fn state(&self) -> AppState {
        self.machine.borrow().state()
    }

    /// Build the GTK application and run it to completion. `HANDLES_OPEN`
    /// lets an externally shared image arrive as a command-line path.
    pub fn start(&mut self) -> AppResult<()> {
        let _ = self.machine.borrow_mut().transition(AppEvent::Start)?;

        let application = Application::builder()
            .application_id(APP_ID)
            .flags(ApplicationFlags::HANDLES_OPEN)
            .build();

        application.connect_startup(|_| runtime_css::install());

        {
            let machine = self.machine.clone();
            application.connect_activate(move |application| {
                present_capture_window(application, &machine, None);
            });
        }
        {
            let machine = self.machine.clone();
            application.connect_open(move |application, files, _hint| {
                let shared = files.first().and_then(|file| file.path());
                if shared.is_none() {
                    tracing::warn!("open request without a local file path");
                }
                present_capture_window(application, &machine, shared);
            });
        }

        let exit = application.run();
        tracing::debug!(?exit, "gtk main loop finished");
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn present_capture_window(
    application: &Application,
    machine: &SharedMachine,
    shared: Option<PathBuf>,
) {
    let storage = match StorageService::with_default_paths() {
        Ok(storage) => Rc::new(storage),
        Err(err) => {
            tracing::error!(?err, "storage unavailable; cannot present capture screen");
            crate::notification::send(format!("Storage unavailable: {err}"));
            return;
        }
    };
    let config = Rc::new(load_app_config());

    let ui = build_capture_screen(LAYOUT_TOKENS);
    let window = ApplicationWindow::builder()
        .application(application)
        .title("Memely")
        .default_width(LAYOUT_TOKENS.capture_window_width)
        .default_height(LAYOUT_TOKENS.capture_window_height)
        .child(&ui.root)
        .build();

    let capture_actions = CaptureActions::new(
        machine.clone(),
        storage,
        config,
        ui.clone(),
        window.clone(),
        LAYOUT_TOKENS,
    );
    connect_capture_controls(&ui, &capture_actions);
    window.present();

    if let Some(path) = shared {
        tracing::info!(path = %path.display(), "received externally shared image");
        capture_actions.receive_external_photo(path);
    }
}

/// Pack an RGBA bitmap into a pixbuf for display.
fn pixbuf_from_rgba(image: &RgbaImage) -> Option<Pixbuf> {
    let width = i32::try_from(image.width()).ok()?;
    let height = i32::try_from(image.height()).ok()?;
    let rowstride = width.checked_mul(4)?;
    let bytes = glib::Bytes::from_owned(image.clone().into_raw());
    Some(Pixbuf::from_bytes(
        &bytes,
        Colorspace::Rgb,
        true,
        8,
        width,
        height,
        rowstride,
    ))
}

fn show_toast(label: &Label, message: &str, duration_ms: u32) {
    tracing::debug!(message, "toast");
    label.set_text(message);
    label.set_visible(true);

    let label = label.clone();
    glib::timeout_add_local_once(Duration::from_millis(u64::from(duration_ms)), move || {
        label.set_visible(false);
    });
}
