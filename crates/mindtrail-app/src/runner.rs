//! Replays a [`Scenario`] through the interaction coordinator.

use crate::scenario::{Scenario, ScriptedDialogHost, ScriptedExporter};
use mindtrail_core::{
    DocumentModel, ExportSettings, InteractionCoordinator, MindMap, Scene, UiEvent, UiRequest,
    WorkflowState,
};
use serde::Serialize;

/// Requests produced by one scenario step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub event: UiEvent,
    pub requests: Vec<UiRequest>,
    /// Workflow state after the step.
    pub state: WorkflowState,
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepRecord>,
    pub final_state: WorkflowState,
    /// True when the window was asked to close before the script ended.
    pub closed: bool,
    pub modified: bool,
    pub node_count: usize,
    pub edge_count: usize,
    pub errors: Vec<String>,
    pub exports: Vec<ExportSettings>,
}

/// Run every step in order. Steps after a close request are skipped.
pub fn run_scenario(scenario: Scenario) -> RunReport {
    let Scenario {
        config,
        dialogs,
        export,
        steps,
    } = scenario;
    let document = MindMap::new(&config);
    let scene = Scene::from_config(&config);
    let mut coordinator = InteractionCoordinator::new(
        config,
        document,
        scene,
        ScriptedDialogHost::new(dialogs),
        ScriptedExporter::new(export),
    );

    let total = steps.len();
    let mut records = Vec::with_capacity(total);
    let mut closed = false;
    for (step, event) in steps.into_iter().enumerate() {
        let requests = coordinator.handle(event);
        closed = requests
            .iter()
            .any(|r| matches!(r, UiRequest::CloseWindow { .. }));
        log::debug!("Step {step}: {event:?} -> {} requests", requests.len());
        records.push(StepRecord {
            step,
            event,
            requests,
            state: coordinator.state(),
        });
        if closed {
            if step + 1 < total {
                log::info!("Window closed, skipping {} remaining steps", total - step - 1);
            }
            break;
        }
    }

    let graph = coordinator.document().graph();
    RunReport {
        steps: records,
        final_state: coordinator.state(),
        closed,
        modified: coordinator.document().is_modified(),
        node_count: graph.len(),
        edge_count: graph.edges.len(),
        errors: coordinator.dialogs().errors().to_vec(),
        exports: coordinator.exporter().exported().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use mindtrail_core::{CursorRequest, MenuCommand, MouseButton, PointerEvent};
    use tempfile::tempdir;

    const DEMO: &str = include_str!("../../../demos/create_and_quit.json");

    fn pointer(event: PointerEvent) -> UiEvent {
        UiEvent::Pointer(event)
    }

    #[test]
    fn test_demo_scenario() {
        let report = run_scenario(Scenario::from_json(DEMO).unwrap());
        assert_eq!(report.final_state, WorkflowState::CloseWindowNow);
        assert!(report.closed);
        assert!(report.modified);
        assert_eq!(report.node_count, 2);
        assert_eq!(report.edge_count, 1);
        assert!(report.errors.is_empty());

        let quit = report.steps.last().unwrap();
        assert!(quit.requests.contains(&UiRequest::WorkflowStateChanged(
            WorkflowState::ShowNotSavedDialog
        )));
        assert_eq!(
            quit.requests.last(),
            Some(&UiRequest::CloseWindow { forced: true })
        );
    }

    #[test]
    fn test_create_child_and_save() {
        let dir = tempdir().unwrap();
        let mut scenario = Scenario::default();
        scenario
            .dialogs
            .save_file_names
            .push_back(Some(dir.path().join("session")));
        // Root node is centered in the default 800x600 viewport, its add
        // handle sits right below it.
        let handle = Point::new(400.0, 337.5);
        scenario.steps = vec![
            UiEvent::MainWindowInitialized,
            pointer(PointerEvent::Down {
                position: handle,
                button: MouseButton::Left,
            }),
            pointer(PointerEvent::Move {
                position: Point::new(400.0, 520.0),
            }),
            pointer(PointerEvent::Up {
                position: Point::new(400.0, 520.0),
                button: MouseButton::Left,
            }),
            UiEvent::Menu(MenuCommand::Save),
            UiEvent::Menu(MenuCommand::Quit),
        ];

        let report = run_scenario(scenario);
        assert_eq!(report.node_count, 2);
        assert!(!report.modified);
        assert!(dir.path().join("session.mtrail").exists());
        assert_eq!(report.final_state, WorkflowState::CloseWindow);
        assert!(report.steps[1]
            .requests
            .contains(&UiRequest::SetCursor(CursorRequest::ClosedHand)));
        assert_eq!(
            report.steps[3].requests,
            vec![UiRequest::SetCursor(CursorRequest::Restore)]
        );
    }

    #[test]
    fn test_steps_after_close_are_skipped() {
        let scenario = Scenario {
            steps: vec![
                UiEvent::MainWindowInitialized,
                UiEvent::Menu(MenuCommand::Quit),
                UiEvent::Menu(MenuCommand::New),
            ],
            ..Default::default()
        };
        let report = run_scenario(scenario);
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.final_state, WorkflowState::CloseWindow);
        assert!(report.closed);
    }

    #[test]
    fn test_failed_export_is_reported() {
        let scenario = Scenario::from_json(
            r#"{
                "dialogs": { "export_settings": [{ "path": "out", "width": 100, "height": 50 }] },
                "export": { "fail_with": "device busy" },
                "steps": ["MainWindowInitialized", { "Menu": "ExportToPng" }]
            }"#,
        )
        .unwrap();
        let report = run_scenario(scenario);
        assert_eq!(report.final_state, WorkflowState::Edit);
        assert!(report.exports.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("device busy"));
    }
}
