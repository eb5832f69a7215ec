//! Scenario scripts and the scripted collaborators that replay them.

use mindtrail_core::{
    DialogHost, EditorConfig, ExportError, ExportResult, ExportService, ExportSettings, Graph,
    Rgba, UiEvent,
};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Queued answers for every dialog, consumed front to back.
///
/// A `null` entry dismisses the dialog. An exhausted queue behaves like a
/// dismissed dialog and keeps unsaved changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogScript {
    pub discard_changes: VecDeque<bool>,
    pub colors: VecDeque<Option<Rgba>>,
    pub save_file_names: VecDeque<Option<PathBuf>>,
    pub open_file_names: VecDeque<Option<PathBuf>>,
    pub export_settings: VecDeque<Option<ExportSettings>>,
}

/// Behavior of the scripted exporter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportScript {
    /// Fail every export with this message.
    pub fail_with: Option<String>,
}

/// A scripted editing session.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: EditorConfig,
    pub dialogs: DialogScript,
    pub export: ExportScript,
    pub steps: Vec<UiEvent>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a scenario file. Relative paths inside it are resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        let mut scenario = Self::from_json(&json)?;
        if let Some(base) = path.parent() {
            scenario.resolve_paths(base);
        }
        log::debug!(
            "Loaded scenario {} with {} steps",
            path.display(),
            scenario.steps.len()
        );
        Ok(scenario)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        let dialogs = &mut self.dialogs;
        dialogs
            .save_file_names
            .iter_mut()
            .chain(dialogs.open_file_names.iter_mut())
            .flatten()
            .for_each(resolve);
        dialogs
            .export_settings
            .iter_mut()
            .flatten()
            .filter(|s| !s.path.as_os_str().is_empty())
            .for_each(|s| resolve(&mut s.path));
    }
}

/// Dialog host answering from a [`DialogScript`].
#[derive(Debug, Default)]
pub struct ScriptedDialogHost {
    script: DialogScript,
    errors: Vec<String>,
}

impl ScriptedDialogHost {
    pub fn new(script: DialogScript) -> Self {
        Self {
            script,
            errors: Vec::new(),
        }
    }

    /// Messages passed to [`DialogHost::report_error`], in order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl DialogHost for ScriptedDialogHost {
    fn confirm_discard_unsaved_changes(&mut self) -> bool {
        let answer = self.script.discard_changes.pop_front().unwrap_or(false);
        log::debug!("Not-saved dialog answered: discard = {answer}");
        answer
    }

    fn pick_color(&mut self) -> Option<Color> {
        self.script.colors.pop_front().flatten().map(Color::from)
    }

    fn pick_save_file_name(&mut self) -> Option<PathBuf> {
        self.script.save_file_names.pop_front().flatten()
    }

    fn pick_open_file_name(&mut self) -> Option<PathBuf> {
        self.script.open_file_names.pop_front().flatten()
    }

    fn pick_export_settings(&mut self, suggested: &ExportSettings) -> Option<ExportSettings> {
        log::debug!(
            "Export dialog suggested {}x{}",
            suggested.width,
            suggested.height
        );
        self.script.export_settings.pop_front().flatten()
    }

    fn report_error(&mut self, message: &str) {
        log::error!("{message}");
        self.errors.push(message.to_string());
    }
}

/// Export service that records requests instead of rendering.
#[derive(Debug, Default)]
pub struct ScriptedExporter {
    script: ExportScript,
    exported: Vec<ExportSettings>,
}

impl ScriptedExporter {
    pub fn new(script: ExportScript) -> Self {
        Self {
            script,
            exported: Vec::new(),
        }
    }

    pub fn exported(&self) -> &[ExportSettings] {
        &self.exported
    }
}

impl ExportService for ScriptedExporter {
    fn export_to_raster(&mut self, graph: &Graph, settings: &ExportSettings) -> ExportResult<()> {
        if let Some(message) = &self.script.fail_with {
            return Err(ExportError::Failed(message.clone()));
        }
        log::info!(
            "Exporting {} nodes to {} ({}x{})",
            graph.len(),
            settings.path.display(),
            settings.width,
            settings.height
        );
        self.exported.push(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use mindtrail_core::{MenuCommand, MouseButton, PointerEvent};
    use tempfile::tempdir;

    const SCENARIO: &str = r#"{
        "config": { "zoom_step": 25 },
        "dialogs": {
            "discard_changes": [true],
            "colors": [{ "r": 255, "g": 0, "b": 0, "a": 255 }, null],
            "save_file_names": ["out/map"],
            "export_settings": [{ "path": "shot", "width": 640, "height": 480 }]
        },
        "steps": [
            "MainWindowInitialized",
            { "Menu": "SaveAs" },
            { "Pointer": { "Down": { "position": { "x": 1.0, "y": 2.0 }, "button": "Left" } } },
            { "Wheel": { "delta": -1.0 } }
        ]
    }"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        assert_eq!(scenario.config.zoom_step, 25);
        assert_eq!(scenario.config.min_zoom_percent, 10);
        assert_eq!(scenario.export, ExportScript::default());
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(scenario.steps[1], UiEvent::Menu(MenuCommand::SaveAs));
        assert_eq!(
            scenario.steps[2],
            UiEvent::Pointer(PointerEvent::Down {
                position: Point::new(1.0, 2.0),
                button: MouseButton::Left,
            })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Scenario::from_json("{\"steps\": 3}"),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, SCENARIO).unwrap();

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(
            scenario.dialogs.save_file_names[0],
            Some(dir.path().join("out/map"))
        );
        let export = scenario.dialogs.export_settings[0].as_ref().unwrap();
        assert_eq!(export.path, dir.path().join("shot"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = Scenario::load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(ScenarioError::Io(_))));
    }

    #[test]
    fn test_scripted_dialogs_drain_queues() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let mut host = ScriptedDialogHost::new(scenario.dialogs);

        assert!(host.confirm_discard_unsaved_changes());
        assert!(!host.confirm_discard_unsaved_changes());

        let red = host.pick_color().unwrap();
        assert_eq!(Rgba::from(red), Rgba::new(255, 0, 0, 255));
        assert!(host.pick_color().is_none());
        assert!(host.pick_color().is_none());

        assert!(host.pick_open_file_name().is_none());
        host.report_error("boom");
        assert_eq!(host.errors(), ["boom".to_string()]);
    }

    #[test]
    fn test_scripted_exporter() {
        let graph = Graph::new();
        let settings = ExportSettings::new("a.png", 10, 10);

        let mut exporter = ScriptedExporter::default();
        exporter.export_to_raster(&graph, &settings).unwrap();
        assert_eq!(exporter.exported(), [settings.clone()]);

        let mut failing = ScriptedExporter::new(ExportScript {
            fail_with: Some("no space".into()),
        });
        assert_eq!(
            failing.export_to_raster(&graph, &settings),
            Err(ExportError::Failed("no space".into()))
        );
        assert!(failing.exported().is_empty());
    }
}
