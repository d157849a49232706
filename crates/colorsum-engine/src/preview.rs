use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::acquisition::SelectedImage;

/// A read-only view of the live preview file. Valid until the manager
/// adopts another image, releases, or is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    id: u64,
    path: PathBuf,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug)]
struct LivePreview {
    handle: PreviewHandle,
    file: NamedTempFile,
}

/// Owns at most one temporary preview file for the current selection.
#[derive(Debug)]
pub struct PreviewResourceManager {
    dir: Option<PathBuf>,
    current: Option<LivePreview>,
    next_id: u64,
    issued: u64,
    revoked: u64,
}

impl Default for PreviewResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewResourceManager {
    pub fn new() -> Self {
        Self {
            dir: None,
            current: None,
            next_id: 1,
            issued: 0,
            revoked: 0,
        }
    }

    /// Places preview files in `dir` instead of the system temp dir.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            current: None,
            next_id: 1,
            issued: 0,
            revoked: 0,
        }
    }

    /// Releases the previous preview, then writes a fresh one for `image`.
    pub fn adopt(&mut self, image: &SelectedImage) -> anyhow::Result<PreviewHandle> {
        self.release();

        let suffix = Path::new(image.display_name())
            .extension()
            .and_then(|value| value.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        let mut builder = tempfile::Builder::new();
        builder.prefix("colorsum-preview-").suffix(&suffix);
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("failed to create preview file")?;
        file.write_all(image.bytes())
            .context("failed to write preview file")?;
        file.flush()?;

        let handle = PreviewHandle {
            id: self.next_id,
            path: file.path().to_path_buf(),
        };
        self.next_id += 1;
        self.issued += 1;
        self.current = Some(LivePreview {
            handle: handle.clone(),
            file,
        });
        Ok(handle)
    }

    /// Revokes the live preview. Returns false when there was nothing to revoke.
    pub fn release(&mut self) -> bool {
        let Some(live) = self.current.take() else {
            return false;
        };
        self.revoked += 1;
        let path = live.handle.path.clone();
        if let Err(err) = live.file.close() {
            eprintln!(
                "colorsum: failed to remove preview {}: {err}",
                path.display()
            );
        }
        true
    }

    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref().map(|live| &live.handle)
    }

    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.current
            .as_ref()
            .is_some_and(|live| live.handle.id == handle.id)
    }

    /// Handles issued and not yet revoked; never more than one.
    pub fn live_count(&self) -> u64 {
        self.issued - self.revoked
    }
}

impl Drop for PreviewResourceManager {
    fn drop(&mut self) {
        self.release();
    }
}
