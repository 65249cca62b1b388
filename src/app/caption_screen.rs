use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use ab_glyph::FontArc;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::{
    Align, ApplicationWindow, Box as GtkBox, Button, Entry, Frame, Label, Orientation, Picture,
    Window,
};
use image::RgbaImage;

use crate::camera::PhotoArtifact;
use crate::caption::{draw_captions, load_caption_font};
use crate::resize::{self, TargetSize};
use crate::state::AppEvent;
use crate::storage::StorageService;
use crate::ui::StyleTokens;

use super::worker::spawn_worker_action;
use super::{pixbuf_from_rgba, show_toast, SharedMachine};

/// Everything the caption screen needs, passed explicitly by the capture
/// screen rather than smuggled through global state.
pub(super) struct CaptionScreenParams {
    pub(super) machine: SharedMachine,
    pub(super) storage: Rc<StorageService>,
    pub(super) font_path: Option<PathBuf>,
    pub(super) artifact: PhotoArtifact,
    pub(super) viewport: TargetSize,
    pub(super) initial_bitmap: Option<RgbaImage>,
    pub(super) tokens: StyleTokens,
}

#[derive(Clone)]
struct CaptionScreenUi {
    root: GtkBox,
    preview: Picture,
    top_entry: Entry,
    bottom_entry: Entry,
    apply_button: Button,
    save_button: Button,
    toast_label: Label,
    toast_duration_ms: u32,
}

impl CaptionScreenUi {
    fn show_bitmap(&self, bitmap: &RgbaImage) {
        match pixbuf_from_rgba(bitmap) {
            Some(pixbuf) => self.preview.set_pixbuf(Some(&pixbuf)),
            None => tracing::warn!("composed bitmap does not fit a pixbuf"),
        }
    }

    fn show_toast(&self, message: &str) {
        show_toast(&self.toast_label, message, self.toast_duration_ms);
    }
}

/// Per-session caption state: the display-sized base decode, the latest
/// composed copy, and whether a caption has been applied at all.
#[derive(Clone)]
struct CaptionSession {
    base: Rc<RefCell<Option<RgbaImage>>>,
    composed: Rc<RefCell<Option<RgbaImage>>>,
    edited: Rc<Cell<bool>>,
}

pub(super) fn present_caption_window(parent: &ApplicationWindow, params: CaptionScreenParams) {
    let CaptionScreenParams {
        machine,
        storage,
        font_path,
        artifact,
        viewport,
        initial_bitmap,
        tokens,
    } = params;

    let ui = build_caption_screen(tokens);
    let window = Window::builder()
        .transient_for(parent)
        .title("Add caption")
        .default_width(tokens.caption_window_width)
        .default_height(tokens.caption_window_height)
        .child(&ui.root)
        .build();

    let session = CaptionSession {
        base: Rc::new(RefCell::new(initial_bitmap)),
        composed: Rc::new(RefCell::new(None)),
        edited: Rc::new(Cell::new(false)),
    };

    match session.base.borrow().as_ref() {
        Some(bitmap) => ui.show_bitmap(bitmap),
        // not decoded at target size yet; show the file and decode lazily
        None => ui.preview.set_filename(Some(&artifact.source_path)),
    }

    connect_apply(&ui, &session, &artifact, viewport, font_path);
    connect_save(&ui, &session, &storage, artifact.photo_id.clone());

    {
        let machine = machine.clone();
        window.connect_close_request(move |_| {
            if let Err(err) = machine.borrow_mut().transition(AppEvent::CloseCaptionEditor) {
                tracing::warn!(?err, "caption editor closed out of order");
            }
            glib::Propagation::Proceed
        });
    }

    window.present();
}

fn connect_apply(
    ui: &CaptionScreenUi,
    session: &CaptionSession,
    artifact: &PhotoArtifact,
    viewport: TargetSize,
    font_path: Option<PathBuf>,
) {
    let handler_ui = ui.clone();
    let handler_session = session.clone();
    let source_path = artifact.source_path.clone();

    ui.apply_button.connect_clicked(move |_| {
        let font = match load_caption_font(font_path.as_deref()) {
            Ok(font) => font,
            Err(err) => {
                tracing::warn!(?err, "caption font unavailable");
                handler_ui.show_toast(&err.to_string());
                return;
            }
        };

        if handler_session.base.borrow().is_some() {
            apply_captions(&handler_ui, &handler_session, &font);
            return;
        }

        // first apply on an un-decoded photo: decode at the viewport size now
        let path = source_path.clone();
        let worker_ui = handler_ui.clone();
        let worker_session = handler_session.clone();
        spawn_worker_action(
            move || resize::shrink_file(&path, viewport),
            move |result| match result {
                Ok(bitmap) => {
                    *worker_session.base.borrow_mut() = Some(bitmap);
                    apply_captions(&worker_ui, &worker_session, &font);
                }
                Err(err) => {
                    tracing::warn!(?err, "lazy viewport decode failed");
                    worker_ui.show_toast(&format!("Could not decode photo: {err}"));
                }
            },
        );
    });
}

fn apply_captions(ui: &CaptionScreenUi, session: &CaptionSession, font: &FontArc) {
    let top = ui.top_entry.text().to_string();
    let bottom = ui.bottom_entry.text().to_string();

    // mutable copy; the base stays pristine so captions can be re-applied
    let Some(mut bitmap) = session.base.borrow().clone() else {
        return;
    };
    draw_captions(&mut bitmap, font, &top, &bottom);

    ui.show_bitmap(&bitmap);
    *session.composed.borrow_mut() = Some(bitmap);
    session.edited.set(true);
}

fn connect_save(
    ui: &CaptionScreenUi,
    session: &CaptionSession,
    storage: &Rc<StorageService>,
    photo_id: String,
) {
    let handler_ui = ui.clone();
    let handler_session = session.clone();
    let handler_storage = storage.clone();

    ui.save_button.connect_clicked(move |_| {
        if !handler_session.edited.get() {
            handler_ui.show_toast("Apply a caption before saving");
            return;
        }
        let Some(bitmap) = handler_session.composed.borrow().clone() else {
            handler_ui.show_toast("Apply a caption before saving");
            return;
        };

        // the storage permission analogue: only probed at save time
        if let Err(err) = handler_storage.ensure_pictures_writable() {
            tracing::warn!(?err, "pictures directory rejected the save");
            handler_ui.show_toast(&err.to_string());
            return;
        }

        let worker_ui = handler_ui.clone();
        // the worker thread needs an owned service, not the Rc handle
        let worker_storage = StorageService::clone(&handler_storage);
        let photo_id = photo_id.clone();
        spawn_worker_action(
            move || worker_storage.save_meme(&bitmap, &photo_id),
            move |result| match result {
                Ok(path) => {
                    worker_ui.show_toast("Meme saved");
                    crate::notification::send(format!("Meme saved to {}", path.display()));
                }
                Err(err) => {
                    tracing::warn!(?err, "meme save failed");
                    worker_ui.show_toast("Save failed");
                }
            },
        );
    });
}

fn build_caption_screen(tokens: StyleTokens) -> CaptionScreenUi {
    let root = GtkBox::new(Orientation::Vertical, tokens.spacing_12);
    root.set_margin_top(tokens.spacing_12);
    root.set_margin_bottom(tokens.spacing_12);
    root.set_margin_start(tokens.spacing_12);
    root.set_margin_end(tokens.spacing_12);

    let preview = Picture::new();
    preview.set_can_shrink(true);
    preview.set_hexpand(true);
    preview.set_vexpand(true);

    let preview_frame = Frame::new(None);
    preview_frame.add_css_class("photo-frame");
    preview_frame.set_child(Some(&preview));

    let top_entry = Entry::new();
    top_entry.set_placeholder_text(Some("TOP TEXT"));
    top_entry.set_hexpand(true);
    let bottom_entry = Entry::new();
    bottom_entry.set_placeholder_text(Some("BOTTOM TEXT"));
    bottom_entry.set_hexpand(true);

    let entry_row = GtkBox::new(Orientation::Horizontal, tokens.spacing_8);
    entry_row.append(&top_entry);
    entry_row.append(&bottom_entry);

    let apply_button = Button::with_label("Write It On");
    apply_button.add_css_class("primary-button");
    apply_button.set_hexpand(true);
    let save_button = Button::with_label("Save to Pictures");
    save_button.set_hexpand(true);

    let button_row = GtkBox::new(Orientation::Horizontal, tokens.spacing_8);
    button_row.append(&apply_button);
    button_row.append(&save_button);

    let toast_label = Label::new(Some(""));
    toast_label.add_css_class("toast-badge");
    toast_label.set_halign(Align::Start);
    toast_label.set_visible(false);

    root.append(&preview_frame);
    root.append(&entry_row);
    root.append(&button_row);
    root.append(&toast_label);

    CaptionScreenUi {
        root,
        preview,
        top_entry,
        bottom_entry,
        apply_button,
        save_button,
        toast_label,
        toast_duration_ms: tokens.toast_duration_ms,
    }
}
