use std::path::{Path, PathBuf};

use crate::error::{ValidationError, ValidationErrorKind};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// A user-chosen image, read into memory at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    path: PathBuf,
    display_name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl SelectedImage {
    pub fn from_bytes(
        display_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        let display_name = display_name.into();
        Self {
            path: PathBuf::from(&display_name),
            display_name,
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Gates applied before a file becomes the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionPolicy {
    pub max_bytes: u64,
}

impl Default for AcquisitionPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl AcquisitionPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Validates and reads `path`. The size gate runs on metadata, before any bytes are read.
    pub fn acquire(&self, path: &Path) -> Result<SelectedImage, ValidationError> {
        let display_name = path
            .file_name()
            .and_then(|value| value.to_str())
            .filter(|value| !value.is_empty())
            .unwrap_or("image")
            .to_string();

        let metadata = std::fs::metadata(path).map_err(|err| {
            ValidationError::new(
                ValidationErrorKind::Unreadable,
                format!("Cannot open '{}': {err}", path.display()),
            )
        })?;
        if !metadata.is_file() {
            return Err(ValidationError::new(
                ValidationErrorKind::Unreadable,
                format!("'{}' is not a file.", path.display()),
            ));
        }

        let Some(media_type) = mime_for_path(path) else {
            return Err(ValidationError::new(
                ValidationErrorKind::UnsupportedType,
                format!("'{display_name}' is not a supported image type."),
            ));
        };

        if metadata.len() > self.max_bytes {
            return Err(oversize_error(&display_name, metadata.len(), self.max_bytes));
        }

        let bytes = std::fs::read(path).map_err(|err| {
            ValidationError::new(
                ValidationErrorKind::Unreadable,
                format!("Cannot read '{}': {err}", path.display()),
            )
        })?;
        // The file may have grown between the metadata call and the read.
        if bytes.len() as u64 > self.max_bytes {
            return Err(oversize_error(&display_name, bytes.len() as u64, self.max_bytes));
        }

        Ok(SelectedImage {
            path: path.to_path_buf(),
            display_name,
            media_type: media_type.to_string(),
            bytes,
        })
    }
}

fn oversize_error(display_name: &str, size: u64, max_bytes: u64) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::Oversize,
        format!(
            "'{display_name}' is too large ({}); the limit is {}.",
            format_megabytes(size),
            format_megabytes(max_bytes)
        ),
    )
}

pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "svg" => Some("image/svg+xml"),
        "avif" => Some("image/avif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Reply to the host for every drag event: always suppress default navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragResponse {
    pub prevent_default: bool,
}

const SUPPRESS: DragResponse = DragResponse {
    prevent_default: true,
};

/// Tracks the presentation-only "drag active" highlight.
#[derive(Debug, Clone, Default)]
pub struct DropZone {
    drag_active: bool,
}

impl DropZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn drag_enter(&mut self) -> DragResponse {
        self.drag_active = true;
        SUPPRESS
    }

    pub fn drag_over(&mut self) -> DragResponse {
        self.drag_active = true;
        SUPPRESS
    }

    pub fn drag_leave(&mut self) -> DragResponse {
        self.drag_active = false;
        SUPPRESS
    }

    /// Ends the drag and hands back the first dropped file, if any.
    pub fn drop<'a>(&mut self, files: &'a [PathBuf]) -> (DragResponse, Option<&'a Path>) {
        self.drag_active = false;
        (SUPPRESS, files.first().map(PathBuf::as_path))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn acquire_reads_image_and_infers_media_type() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("Sunset.JPG");
        fs::write(&path, b"fake-jpeg")?;

        let image = AcquisitionPolicy::default().acquire(&path)?;
        assert_eq!(image.display_name(), "Sunset.JPG");
        assert_eq!(image.media_type(), "image/jpeg");
        assert_eq!(image.bytes(), b"fake-jpeg");
        assert_eq!(image.size(), 9);
        Ok(())
    }

    #[test]
    fn acquire_rejects_files_over_the_ceiling() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("big.png");
        fs::write(&path, vec![0_u8; 2048])?;

        let err = AcquisitionPolicy::new(1024)
            .acquire(&path)
            .err()
            .ok_or_else(|| anyhow::anyhow!("oversize file accepted"))?;
        assert_eq!(err.kind, ValidationErrorKind::Oversize);
        assert!(err.message.contains("too large"));

        assert!(AcquisitionPolicy::new(2048).acquire(&path).is_ok());
        Ok(())
    }

    #[test]
    fn acquire_rejects_non_images_and_missing_files() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let notes = temp.path().join("notes.txt");
        fs::write(&notes, b"hello")?;

        let policy = AcquisitionPolicy::default();
        let unsupported = policy.acquire(&notes).err().map(|err| err.kind);
        assert_eq!(unsupported, Some(ValidationErrorKind::UnsupportedType));

        let missing = policy
            .acquire(&temp.path().join("nope.png"))
            .err()
            .map(|err| err.kind);
        assert_eq!(missing, Some(ValidationErrorKind::Unreadable));

        let dir = policy.acquire(temp.path()).err().map(|err| err.kind);
        assert_eq!(dir, Some(ValidationErrorKind::Unreadable));
        Ok(())
    }

    #[test]
    fn drop_zone_tracks_drag_active_and_suppresses_navigation() {
        let mut zone = DropZone::new();
        assert!(!zone.is_drag_active());

        assert!(zone.drag_enter().prevent_default);
        assert!(zone.is_drag_active());
        assert!(zone.drag_over().prevent_default);
        assert!(zone.is_drag_active());
        assert!(zone.drag_leave().prevent_default);
        assert!(!zone.is_drag_active());

        zone.drag_over();
        let files = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        let (response, first) = zone.drop(&files);
        assert!(response.prevent_default);
        assert_eq!(first, Some(Path::new("a.png")));
        assert!(!zone.is_drag_active());

        let (_, none) = zone.drop(&[]);
        assert_eq!(none, None);
    }

    #[test]
    fn megabytes_format_with_one_decimal() {
        assert_eq!(format_megabytes(DEFAULT_MAX_UPLOAD_BYTES), "10.0 MB");
        assert_eq!(format_megabytes(1536 * 1024), "1.5 MB");
    }
}
