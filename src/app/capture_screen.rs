use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Button, Frame, Label, Orientation, Picture};
use image::RgbaImage;

use crate::ui::StyleTokens;

use super::actions::CaptureActions;
use super::{pixbuf_from_rgba, show_toast};

#[derive(Clone)]
pub(super) struct CaptureScreenUi {
    pub(super) root: GtkBox,
    pub(super) photo_picture: Picture,
    pub(super) ready_label: Label,
    pub(super) toast_label: Label,
    pub(super) take_photo_button: Button,
    pub(super) pick_photo_button: Button,
    pub(super) caption_button: Button,
    toast_duration_ms: u32,
}

impl CaptureScreenUi {
    pub(super) fn show_photo(&self, bitmap: &RgbaImage) {
        match pixbuf_from_rgba(bitmap) {
            Some(pixbuf) => self.photo_picture.set_pixbuf(Some(&pixbuf)),
            None => tracing::warn!("decoded bitmap does not fit a pixbuf"),
        }
    }

    pub(super) fn mark_photo_ready(&self) {
        self.ready_label.set_visible(true);
    }

    pub(super) fn show_toast(&self, message: &str) {
        show_toast(&self.toast_label, message, self.toast_duration_ms);
    }
}

pub(super) fn build_capture_screen(tokens: StyleTokens) -> CaptureScreenUi {
    let root = GtkBox::new(Orientation::Vertical, tokens.spacing_12);
    root.set_margin_top(tokens.spacing_12);
    root.set_margin_bottom(tokens.spacing_12);
    root.set_margin_start(tokens.spacing_12);
    root.set_margin_end(tokens.spacing_12);

    let title_label = Label::new(Some("Memely"));
    title_label.add_css_class("memely-title");
    title_label.set_halign(Align::Start);
    title_label.set_xalign(0.0);

    let hint_label = Label::new(Some(
        "Take a photo or pick one from disk, then add your caption.",
    ));
    hint_label.add_css_class("memely-hint");
    hint_label.set_halign(Align::Start);
    hint_label.set_xalign(0.0);
    hint_label.set_wrap(true);

    let photo_picture = Picture::new();
    photo_picture.set_can_shrink(true);
    photo_picture.set_size_request(tokens.capture_viewport_width, tokens.capture_viewport_height);
    photo_picture.set_hexpand(true);
    photo_picture.set_vexpand(true);

    let photo_frame = Frame::new(None);
    photo_frame.add_css_class("photo-frame");
    photo_frame.set_child(Some(&photo_picture));

    let ready_label = Label::new(Some("Looking good!"));
    ready_label.add_css_class("ready-badge");
    ready_label.set_halign(Align::Start);
    ready_label.set_visible(false);

    let take_photo_button = Button::with_label("Take Photo");
    take_photo_button.add_css_class("primary-button");
    take_photo_button.set_hexpand(true);
    let pick_photo_button = Button::with_label("Pick Picture");
    pick_photo_button.set_hexpand(true);
    let caption_button = Button::with_label("Add Caption");
    caption_button.set_hexpand(true);

    let button_row = GtkBox::new(Orientation::Horizontal, tokens.spacing_8);
    button_row.append(&take_photo_button);
    button_row.append(&pick_photo_button);
    button_row.append(&caption_button);

    let toast_label = Label::new(Some(""));
    toast_label.add_css_class("toast-badge");
    toast_label.set_halign(Align::Start);
    toast_label.set_visible(false);

    root.append(&title_label);
    root.append(&hint_label);
    root.append(&photo_frame);
    root.append(&ready_label);
    root.append(&button_row);
    root.append(&toast_label);

    CaptureScreenUi {
        root,
        photo_picture,
        ready_label,
        toast_label,
        take_photo_button,
        pick_photo_button,
        caption_button,
        toast_duration_ms: tokens.toast_duration_ms,
    }
}

/// Each control binds its own callback.
pub(super) fn connect_capture_controls(ui: &CaptureScreenUi, actions: &CaptureActions) {
    {
        let capture_actions = actions.clone();
        ui.take_photo_button.connect_clicked(move |_| {
            capture_actions.capture_photo_async();
        });
    }
    {
        let capture_actions = actions.clone();
        ui.pick_photo_button.connect_clicked(move |_| {
            capture_actions.pick_photo();
        });
    }
    {
        let capture_actions = actions.clone();
        ui.caption_button.connect_clicked(move |_| {
            capture_actions.open_caption_editor();
        });
    }
}
