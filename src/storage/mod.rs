use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

const APP_DATA_DIR: &str = "memely";
const CAPTURE_SUBDIR: &str = "images";
const CAPTURE_FILE_NAME: &str = "default_image.jpg";
const PICTURES_SUBDIR: &str = "Pictures";
const MEME_FILE_PREFIX: &str = "meme_";

pub const MEME_JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("photo id is empty")]
    MissingPhotoId,
    #[error("Pictures directory is not writable: {path}")]
    PicturesNotWritable { path: PathBuf },
    #[error("failed to encode meme jpeg: {0}")]
    Encode(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone)]
pub struct StorageService {
    data_dir: PathBuf,
    pictures_dir: PathBuf,
}

impl StorageService {
    pub const fn with_paths(data_dir: PathBuf, pictures_dir: PathBuf) -> Self {
        Self {
            data_dir,
            pictures_dir,
        }
    }

    pub fn with_default_paths() -> StorageResult<Self> {
        let home = std::env::var("HOME").map_err(|_| StorageError::MissingHomeDirectory)?;
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Path::new(&home).join(".local").join("share"))
            .join(APP_DATA_DIR);
        let pictures_dir = Path::new(&home).join(PICTURES_SUBDIR);

        fs::create_dir_all(&data_dir)?;

        Ok(Self::with_paths(data_dir, pictures_dir))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn pictures_dir(&self) -> &Path {
        &self.pictures_dir
    }

    /// Fixed companion path the camera command writes into.
    pub fn capture_target_path(&self) -> PathBuf {
        self.data_dir.join(CAPTURE_SUBDIR).join(CAPTURE_FILE_NAME)
    }

    /// Clear any stale capture and make sure its directory exists.
    pub fn prepare_capture_target(&self) -> StorageResult<PathBuf> {
        let path = self.capture_target_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(StorageError::Io(err)),
        }
        Ok(path)
    }

    fn validate_photo_id(photo_id: &str) -> StorageResult<()> {
        if photo_id.is_empty() {
            return Err(StorageError::MissingPhotoId);
        }
        Ok(())
    }

    pub fn allocate_meme_path(&self, photo_id: &str) -> StorageResult<PathBuf> {
        Self::validate_photo_id(photo_id)?;
        Ok(self
            .pictures_dir
            .join(format!("{MEME_FILE_PREFIX}{photo_id}.jpg")))
    }

    /// The deferred half of the storage permission protocol: the Pictures
    /// directory is only created and probed when the user actually saves.
    pub fn ensure_pictures_writable(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.pictures_dir)?;
        let metadata = fs::metadata(&self.pictures_dir)?;
        if metadata.permissions().readonly() {
            return Err(StorageError::PicturesNotWritable {
                path: self.pictures_dir.clone(),
            });
        }
        Ok(())
    }

    /// Encode the composed bitmap as a quality-85 JPEG under Pictures.
    pub fn save_meme(&self, image: &RgbaImage, photo_id: &str) -> StorageResult<PathBuf> {
        let target = self.allocate_meme_path(photo_id)?;
        self.ensure_pictures_writable()?;

        // JPEG carries no alpha channel
        let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
        let file = File::create(&target)?;
        let mut writer = BufWriter::new(file);
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, MEME_JPEG_QUALITY))?;
        // a drop-time flush would swallow trailing write errors
        writer.flush()?;

        tracing::info!(path = %target.display(), "meme saved");
        Ok(target)
    }
}
