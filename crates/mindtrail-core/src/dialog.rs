//! Collaborator interfaces for user dialogs and raster export.

use crate::error::ExportResult;
use crate::export::ExportSettings;
use crate::graph::Graph;
use peniko::Color;
use std::path::PathBuf;

/// Modal dialogs presented by the UI layer.
///
/// Every call blocks until the user answers; `None` means the dialog was
/// dismissed.
pub trait DialogHost {
    /// Ask whether unsaved changes may be thrown away.
    fn confirm_discard_unsaved_changes(&mut self) -> bool;

    fn pick_color(&mut self) -> Option<Color>;

    fn pick_save_file_name(&mut self) -> Option<PathBuf>;

    fn pick_open_file_name(&mut self) -> Option<PathBuf>;

    /// Let the user confirm or adjust the export target.
    fn pick_export_settings(&mut self, suggested: &ExportSettings) -> Option<ExportSettings>;

    /// Show a failure message.
    fn report_error(&mut self, message: &str);
}

/// Renders the graph into an image file.
pub trait ExportService {
    fn export_to_raster(&mut self, graph: &Graph, settings: &ExportSettings) -> ExportResult<()>;
}
