//! Raster export settings.

use crate::error::{ExportError, ExportResult};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of exported images, without the dot.
pub const PNG_EXTENSION: &str = "png";

/// Target file and pixel size of a raster export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ExportSettings {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }

    /// Settings proposed to the user: no file yet, content size scaled up
    /// so the image is not blurry.
    pub fn suggested(content: Option<Rect>, scale: f64) -> Self {
        let (width, height) = content
            .map(|r| ((r.width() * scale) as u32, (r.height() * scale) as u32))
            .unwrap_or((0, 0));
        Self::new(PathBuf::new(), width, height)
    }

    /// Check the file name and the size against the open interval
    /// `(0, max_size)`.
    pub fn validate(&self, max_size: u32) -> ExportResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ExportError::EmptyFileName);
        }
        let in_range = |v: u32| v > 0 && v < max_size;
        if !in_range(self.width) || !in_range(self.height) {
            return Err(ExportError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Append `.png` unless the path already ends with it (any case).
    pub fn normalized(mut self) -> Self {
        self.path = with_png_extension(&self.path);
        self
    }
}

fn with_png_extension(path: &Path) -> PathBuf {
    let has_png = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case(PNG_EXTENSION))
        .unwrap_or(false);
    if has_png || path.as_os_str().is_empty() {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(PNG_EXTENSION);
    PathBuf::from(name)
}
