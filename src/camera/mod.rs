use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Token in the configured capture command that is replaced by the capture
/// target path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

pub const DEFAULT_CAMERA_COMMAND: &[&str] = &["fswebcam", "--no-banner", OUTPUT_PLACEHOLDER];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoArtifact {
    pub photo_id: String,
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub created_at: u64,
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera command is empty")]
    EmptyCameraCommand,
    #[error("camera command failed: {command}")]
    CommandFailed { command: String, message: String },
    #[error("camera command io error: {command}")]
    CommandIo {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("camera produced no file at {path}")]
    CaptureMissing { path: PathBuf },
    #[error("failed to read photo dimensions: {message}")]
    ImageReadFailed { message: String },
    #[error("invalid photo artifact: {message}")]
    InvalidPhotoArtifact { message: String },
}

pub trait CameraBackend {
    fn run_capture(&self, command: &[String]) -> Result<(), CameraError>;
    fn image_dimensions(&self, path: &Path) -> Result<(u32, u32), CameraError>;
}

#[derive(Default)]
pub struct SystemCameraBackend;

impl CameraBackend for SystemCameraBackend {
    fn run_capture(&self, command: &[String]) -> Result<(), CameraError> {
        let (program, args) = command.split_first().ok_or(CameraError::EmptyCameraCommand)?;
        let rendered = command.join(" ");
        tracing::debug!(command = rendered, "running camera capture command");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| CameraError::CommandIo {
                command: rendered.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(CameraError::CommandFailed {
                command: rendered,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn image_dimensions(&self, path: &Path) -> Result<(u32, u32), CameraError> {
        image::image_dimensions(path).map_err(|err| CameraError::ImageReadFailed {
            message: err.to_string(),
        })
    }
}

/// Substitute the capture target into the configured command template; a
/// template without the placeholder gets the path appended.
pub fn resolve_capture_command(template: &[String], output: &Path) -> Vec<String> {
    let output_str = output.to_string_lossy();
    let mut resolved: Vec<String> = template
        .iter()
        .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output_str))
        .collect();
    if !template.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
        resolved.push(output_str.into_owned());
    }
    resolved
}

pub fn capture_photo(command_template: &[String], target: &Path) -> Result<PhotoArtifact, CameraError> {
    capture_photo_with(&SystemCameraBackend, command_template, target)
}

pub fn capture_photo_with<B: CameraBackend>(
    backend: &B,
    command_template: &[String],
    target: &Path,
) -> Result<PhotoArtifact, CameraError> {
    if command_template.is_empty() {
        return Err(CameraError::EmptyCameraCommand);
    }

    let command = resolve_capture_command(command_template, target);
    backend.run_capture(&command)?;

    if !target.exists() {
        return Err(CameraError::CaptureMissing {
            path: target.to_path_buf(),
        });
    }
    artifact_for(backend, target)
}

/// Build an artifact for a gallery-picked or externally shared image.
pub fn import_photo(path: &Path) -> Result<PhotoArtifact, CameraError> {
    import_photo_with(&SystemCameraBackend, path)
}

pub fn import_photo_with<B: CameraBackend>(
    backend: &B,
    path: &Path,
) -> Result<PhotoArtifact, CameraError> {
    if !path.exists() {
        return Err(CameraError::CaptureMissing {
            path: path.to_path_buf(),
        });
    }
    artifact_for(backend, path)
}

fn artifact_for<B: CameraBackend>(backend: &B, path: &Path) -> Result<PhotoArtifact, CameraError> {
    let (width, height) = backend.image_dimensions(path)?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|err| {
        CameraError::InvalidPhotoArtifact {
            message: format!("system time before unix epoch: {err}"),
        }
    })?;

    Ok(PhotoArtifact {
        photo_id: format!("photo-{}", now.as_nanos()),
        source_path: path.to_path_buf(),
        width,
        height,
        created_at: now.as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedBackend {
        capture_succeeds: bool,
        writes_file: bool,
        dimensions: (u32, u32),
        commands: RefCell<Vec<Vec<String>>>,
    }

    impl ScriptedBackend {
        fn new(capture_succeeds: bool, writes_file: bool) -> Self {
            Self {
                capture_succeeds,
                writes_file,
                dimensions: (640, 480),
                commands: RefCell::new(Vec::new()),
            }
        }
    }

    impl CameraBackend for ScriptedBackend {
        fn run_capture(&self, command: &[String]) -> Result<(), CameraError> {
            self.commands.borrow_mut().push(command.to_vec());
            if !self.capture_succeeds {
                return Err(CameraError::CommandFailed {
                    command: command.join(" "),
                    message: "scripted failure".to_string(),
                });
            }
            if self.writes_file {
                let path = command.last().expect("scripted command has args");
                std::fs::write(path, b"jpeg bytes").expect("write should work");
            }
            Ok(())
        }

        fn image_dimensions(&self, _path: &Path) -> Result<(u32, u32), CameraError> {
            Ok(self.dimensions)
        }
    }

    fn template(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn placeholder_is_substituted_into_the_command() {
        let resolved = resolve_capture_command(
            &template(&["fswebcam", "--no-banner", "{output}"]),
            Path::new("/tmp/shot.jpg"),
        );
        assert_eq!(resolved, template(&["fswebcam", "--no-banner", "/tmp/shot.jpg"]));
    }

    #[test]
    fn command_without_placeholder_gets_the_path_appended() {
        let resolved =
            resolve_capture_command(&template(&["mycam", "-q"]), Path::new("/tmp/shot.jpg"));
        assert_eq!(resolved, template(&["mycam", "-q", "/tmp/shot.jpg"]));
    }

    #[test]
    fn capture_builds_artifact_from_backend_dimensions() {
        let backend = ScriptedBackend::new(true, true);
        let target = std::env::temp_dir().join("memely-camera-capture-test.jpg");
        let _ = std::fs::remove_file(&target);

        let artifact = capture_photo_with(&backend, &template(&["cam", "{output}"]), &target)
            .expect("capture should work");
        assert_eq!(artifact.source_path, target);
        assert_eq!((artifact.width, artifact.height), (640, 480));
        assert!(artifact.photo_id.starts_with("photo-"));
        assert_eq!(backend.commands.borrow().len(), 1);

        let _ = std::fs::remove_file(&target);
    }

    #[test]
    fn capture_without_output_file_is_an_error() {
        let backend = ScriptedBackend::new(true, false);
        let target = std::env::temp_dir().join("memely-camera-missing-test.jpg");
        let _ = std::fs::remove_file(&target);

        let err = capture_photo_with(&backend, &template(&["cam", "{output}"]), &target)
            .expect_err("missing capture file should fail");
        assert!(matches!(err, CameraError::CaptureMissing { .. }));
    }

    #[test]
    fn empty_template_is_rejected_before_spawning() {
        let backend = ScriptedBackend::new(true, false);
        let err = capture_photo_with(&backend, &[], Path::new("/tmp/unused.jpg"))
            .expect_err("empty template should fail");
        assert!(matches!(err, CameraError::EmptyCameraCommand));
        assert!(backend.commands.borrow().is_empty());
    }

    #[test]
    fn import_reads_dimensions_from_the_picked_file() {
        let path = std::env::temp_dir().join("memely-camera-import-test.png");
        let picked = image::RgbaImage::new(32, 16);
        picked.save(&path).expect("png save should work");

        let artifact = import_photo(&path).expect("import should work");
        assert_eq!((artifact.width, artifact.height), (32, 16));
        assert_eq!(artifact.source_path, path);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn import_of_missing_file_is_an_error() {
        let err = import_photo(Path::new("/nonexistent/photo.png"))
            .expect_err("missing file should fail");
        assert!(matches!(err, CameraError::CaptureMissing { .. }));
    }
}
