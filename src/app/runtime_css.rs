use gtk4::gdk::Display;

const RUNTIME_CSS: &str = "
.memely-title { font-size: 18px; font-weight: 700; }
.memely-hint { font-size: 12px; opacity: 0.7; }
.photo-frame { border-radius: 8px; }
.ready-badge { color: #2ec27e; font-weight: 700; }
.toast-badge {
    background-color: rgba(0, 0, 0, 0.75);
    color: #ffffff;
    border-radius: 8px;
    padding: 4px 10px;
}
.primary-button { font-weight: 600; }
";

pub(super) fn install() {
    let Some(display) = Display::default() else {
        tracing::warn!("no default display; skipping css install");
        return;
    };

    let provider = gtk4::CssProvider::new();
    provider.load_from_data(RUNTIME_CSS);
    gtk4::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}
