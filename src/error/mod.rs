use crate::camera::CameraError;
use crate::caption::CaptionError;
use crate::resize::ResizeError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error(transparent)]
    Caption(#[from] CaptionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
