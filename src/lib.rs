pub mod app;
pub mod camera;
pub mod caption;
mod config;
pub mod error;
pub mod logging;
pub mod notification;
pub mod resize;
pub mod state;
pub mod storage;
pub mod ui;
pub use error::{AppError, AppResult};

/// Entrypoint used by the binary and integration harnesses.
pub fn run() -> AppResult<()> {
    logging::init();
    tracing::info!("starting Memely");

    let mut app = app::App::new();
    app.start()?;

    tracing::info!("shutdown with state={:?}", app.state());
    Ok(())
}
