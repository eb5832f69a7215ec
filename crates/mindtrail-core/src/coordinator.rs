//! Routes UI events into the workflow machine and the drag controller.
//!
//! The two machines never talk to each other. The coordinator runs the side
//! effect of every transient workflow state, applies drag requests to the
//! document and makes sure a gesture is cancelled before anything else
//! touches the diagram.

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::dialog::{DialogHost, ExportService};
use crate::document::DocumentModel;
use crate::drag::{CursorRequest, DragAction, DragController, DragRequest, DragResponse};
use crate::export::ExportSettings;
use crate::graph::{NodeId, Rgba};
use crate::input::PointerEvent;
use crate::scene::{EntityRef, SceneAdapter};
use crate::workflow::{WorkflowAction, WorkflowState, WorkflowStateMachine};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Main menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuCommand {
    New,
    Open,
    Save,
    SaveAs,
    ExportToPng,
    Quit,
    Undo,
    Redo,
    ZoomIn,
    ZoomOut,
    ZoomToFit,
}

/// Context menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextMenuCommand {
    SetNodeColor,
    DeleteNode,
    SetBackgroundColor,
    /// Create an unconnected node where the background menu was opened.
    CreateFloatingNode,
}

/// Events delivered by the UI layer, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UiEvent {
    MainWindowInitialized,
    Menu(MenuCommand),
    /// Pointer event in screen coordinates.
    Pointer(PointerEvent),
    Wheel { delta: f64 },
    ContextMenu(ContextMenuCommand),
    FocusLost,
    CloseRequested,
    ViewportResized(Size),
}

/// Requests for the UI layer. Positions are in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiRequest {
    WorkflowStateChanged(WorkflowState),
    SetCursor(CursorRequest),
    SetPanning(bool),
    OpenNodeContextMenu {
        node: NodeId,
        position: Point,
        delete_enabled: bool,
    },
    OpenBackgroundContextMenu {
        position: Point,
    },
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
    },
    ViewChanged {
        zoom_percent: i32,
    },
    CloseWindow {
        forced: bool,
    },
}

/// Owns both machines and every collaborator.
pub struct InteractionCoordinator<D, S, H, E> {
    config: EditorConfig,
    workflow: WorkflowStateMachine,
    drag: DragController,
    document: D,
    scene: S,
    camera: Camera,
    dialogs: H,
    exporter: E,
    selected_node: Option<NodeId>,
    /// World position where the background menu was last opened.
    context_position: Option<Point>,
    /// Last pointer position in screen coordinates, for panning.
    last_screen_position: Option<Point>,
}

impl<D, S, H, E> InteractionCoordinator<D, S, H, E>
where
    D: DocumentModel,
    S: SceneAdapter,
    H: DialogHost,
    E: ExportService,
{
    pub fn new(config: EditorConfig, document: D, scene: S, dialogs: H, exporter: E) -> Self {
        Self {
            workflow: WorkflowStateMachine::new(),
            drag: DragController::new(&config),
            camera: Camera::new(&config),
            config,
            document,
            scene,
            dialogs,
            exporter,
            selected_node: None,
            context_position: None,
            last_screen_position: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.workflow.state()
    }

    pub fn workflow(&self) -> &WorkflowStateMachine {
        &self.workflow
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn dialogs(&self) -> &H {
        &self.dialogs
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected_node
    }

    /// Process one UI event to completion.
    pub fn handle(&mut self, event: UiEvent) -> Vec<UiRequest> {
        let mut out = Vec::new();
        match event {
            UiEvent::MainWindowInitialized => {
                self.dispatch(WorkflowAction::MainWindowInitialized, &mut out)
            }
            UiEvent::Menu(command) => {
                self.cancel_drag(&mut out);
                self.on_menu(command, &mut out);
            }
            UiEvent::Pointer(pointer) => self.on_pointer(pointer, &mut out),
            UiEvent::Wheel { delta } => {
                if self.state() == WorkflowState::Edit {
                    self.camera.zoom_wheel(delta);
                    out.push(self.view_changed());
                }
            }
            UiEvent::ContextMenu(command) => {
                self.cancel_drag(&mut out);
                if self.state() == WorkflowState::Edit {
                    self.on_context_menu(command, &mut out);
                }
            }
            UiEvent::FocusLost => self.cancel_drag(&mut out),
            UiEvent::CloseRequested => {
                self.cancel_drag(&mut out);
                self.dispatch(WorkflowAction::QuitSelected, &mut out);
            }
            UiEvent::ViewportResized(size) => self.camera.set_viewport(size),
        }
        out
    }

    /// Feed an action to the workflow machine and run follow-up states
    /// until a resting state is reached.
    fn dispatch(&mut self, action: WorkflowAction, out: &mut Vec<UiRequest>) {
        let mut next = Some(action);
        while let Some(action) = next {
            let before = self.workflow.state();
            let state = self.workflow.dispatch(
                action,
                self.document.is_modified(),
                self.document.can_be_saved(),
            );
            if state != before {
                out.push(UiRequest::WorkflowStateChanged(state));
            }
            next = self.run_state(state, out);
        }
    }

    /// Side effect of entering `state`. Returns the action that resolves it.
    fn run_state(
        &mut self,
        state: WorkflowState,
        out: &mut Vec<UiRequest>,
    ) -> Option<WorkflowAction> {
        match state {
            WorkflowState::Init | WorkflowState::Edit => None,
            WorkflowState::CloseWindow => {
                out.push(UiRequest::CloseWindow { forced: false });
                None
            }
            WorkflowState::CloseWindowNow => {
                out.push(UiRequest::CloseWindow { forced: true });
                None
            }
            WorkflowState::InitializeNewMindMap => {
                self.cancel_drag(out);
                self.document.new_document();
                self.selected_node = None;
                self.reload_scene();
                self.fit_content(false);
                out.push(self.history_changed());
                out.push(self.view_changed());
                Some(WorkflowAction::NewMindMapInitialized)
            }
            WorkflowState::ShowOpenDialog => {
                let Some(path) = self.dialogs.pick_open_file_name() else {
                    return Some(WorkflowAction::FileDialogCanceled);
                };
                match self.document.open(&path) {
                    Ok(()) => {
                        self.selected_node = None;
                        self.reload_scene();
                        self.fit_content(true);
                        out.push(self.history_changed());
                        out.push(self.view_changed());
                        Some(WorkflowAction::MindMapOpened)
                    }
                    Err(e) => {
                        self.report(format!("Failed to open '{}': {e}", path.display()));
                        Some(WorkflowAction::MindMapOpenFailed)
                    }
                }
            }
            WorkflowState::SaveMindMap => match self.document.save() {
                Ok(()) => Some(WorkflowAction::MindMapSaved),
                Err(e) => {
                    self.report(format!("Failed to save mind map: {e}"));
                    Some(WorkflowAction::MindMapSaveFailed)
                }
            },
            WorkflowState::ShowSaveAsDialog => {
                let Some(path) = self.dialogs.pick_save_file_name() else {
                    return Some(WorkflowAction::FileDialogCanceled);
                };
                match self.document.save_as(&path) {
                    Ok(()) => Some(WorkflowAction::MindMapSavedAs),
                    Err(e) => {
                        self.report(format!("Failed to save '{}': {e}", path.display()));
                        Some(WorkflowAction::MindMapSaveAsFailed)
                    }
                }
            }
            WorkflowState::ShowExportDialog => {
                self.export();
                Some(WorkflowAction::ExportedToPng)
            }
            WorkflowState::ShowNotSavedDialog => {
                if self.dialogs.confirm_discard_unsaved_changes() {
                    Some(WorkflowAction::NotSavedDialogDiscarded)
                } else {
                    Some(WorkflowAction::NotSavedDialogCanceled)
                }
            }
        }
    }

    fn export(&mut self) {
        let bounds = self.document.graph().bounds(self.config.node_size());
        let suggested = ExportSettings::suggested(bounds, self.config.export_scale);
        let Some(settings) = self.dialogs.pick_export_settings(&suggested) else {
            return;
        };
        let settings = settings.normalized();
        let result = settings
            .validate(self.config.max_export_size)
            .and_then(|()| self.exporter.export_to_raster(self.document.graph(), &settings));
        match result {
            Ok(()) => log::info!("Exported to {}", settings.path.display()),
            Err(e) => self.report(format!("Failed to export '{}': {e}", settings.path.display())),
        }
    }

    fn on_menu(&mut self, command: MenuCommand, out: &mut Vec<UiRequest>) {
        let action = match command {
            MenuCommand::New => WorkflowAction::NewSelected,
            MenuCommand::Open => WorkflowAction::OpenSelected,
            MenuCommand::Save => WorkflowAction::SaveSelected,
            MenuCommand::SaveAs => WorkflowAction::SaveAsSelected,
            MenuCommand::ExportToPng => WorkflowAction::ExportToPngSelected,
            MenuCommand::Quit => WorkflowAction::QuitSelected,
            MenuCommand::Undo => {
                if self.document.undo() {
                    self.reload_scene();
                }
                out.push(self.history_changed());
                return;
            }
            MenuCommand::Redo => {
                if self.document.redo() {
                    self.reload_scene();
                }
                out.push(self.history_changed());
                return;
            }
            MenuCommand::ZoomIn | MenuCommand::ZoomOut => {
                let steps = if command == MenuCommand::ZoomIn { 1 } else { -1 };
                self.camera.zoom_steps(steps);
                out.push(self.view_changed());
                return;
            }
            MenuCommand::ZoomToFit => {
                self.fit_content(true);
                out.push(self.view_changed());
                return;
            }
        };
        self.dispatch(action, out);
    }

    fn on_context_menu(&mut self, command: ContextMenuCommand, out: &mut Vec<UiRequest>) {
        match command {
            ContextMenuCommand::SetNodeColor => {
                if let Some(node) = self.selected_node {
                    self.set_node_color(node, out);
                }
            }
            ContextMenuCommand::DeleteNode => {
                let Some(node) = self.selected_node else {
                    return;
                };
                if !self.document.can_delete_node(node) {
                    log::warn!("Node {node} cannot be deleted");
                    return;
                }
                self.document.save_undo_point();
                if let Err(e) = self.document.delete_node(node) {
                    log::warn!("Failed to delete node: {e}");
                }
                self.selected_node = None;
                self.reload_scene();
                out.push(self.history_changed());
            }
            ContextMenuCommand::SetBackgroundColor => {
                if let Some(color) = self.dialogs.pick_color() {
                    self.document.save_undo_point();
                    self.document.set_background_color(Rgba::from(color));
                    self.reload_scene();
                    out.push(self.history_changed());
                }
            }
            ContextMenuCommand::CreateFloatingNode => {
                let viewport = self.camera.viewport();
                let center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
                let position = self
                    .context_position
                    .take()
                    .unwrap_or_else(|| self.camera.screen_to_world(center));
                self.document.save_undo_point();
                let node = self.document.create_node(position);
                log::debug!("Created floating node {node}");
                self.reload_scene();
                out.push(self.history_changed());
            }
        }
    }

    fn on_pointer(&mut self, pointer: PointerEvent, out: &mut Vec<UiRequest>) {
        if self.state() != WorkflowState::Edit {
            log::trace!("Pointer event ignored in {:?}", self.state());
            return;
        }
        let screen = pointer.position();
        let world = self.camera.screen_to_world(screen);
        let response = match pointer {
            PointerEvent::Down { button, .. } => {
                self.last_screen_position = Some(screen);
                let hit = self.scene.hit_test(world);
                self.drag.on_pointer_down(button, world, hit, &mut self.scene)
            }
            PointerEvent::Move { .. } => {
                if self.drag.action() == DragAction::Scroll {
                    if let Some(last) = self.last_screen_position {
                        self.camera.pan(screen - last);
                    }
                }
                self.last_screen_position = Some(screen);
                self.drag.on_pointer_move(world, &mut self.scene)
            }
            PointerEvent::Up { .. } => {
                self.last_screen_position = None;
                self.drag.on_pointer_up(&mut self.scene)
            }
        };
        self.apply(response, out);
    }

    /// Force the active gesture to end. No-op when idle.
    fn cancel_drag(&mut self, out: &mut Vec<UiRequest>) {
        if !self.drag.is_active() {
            return;
        }
        self.last_screen_position = None;
        let response = self.drag.cancel(&mut self.scene);
        self.apply(response, out);
    }

    fn apply(&mut self, response: DragResponse, out: &mut Vec<UiRequest>) {
        for request in response.requests {
            match request {
                DragRequest::SaveUndoPoint => {
                    self.document.save_undo_point();
                    out.push(self.history_changed());
                }
                DragRequest::SelectNode(node) => self.selected_node = Some(node),
                DragRequest::OpenNodeContextMenu { node, position } => {
                    out.push(UiRequest::OpenNodeContextMenu {
                        node,
                        position: self.camera.world_to_screen(position),
                        delete_enabled: self.document.can_delete_node(node),
                    });
                }
                DragRequest::OpenBackgroundContextMenu { position } => {
                    self.context_position = Some(position);
                    out.push(UiRequest::OpenBackgroundContextMenu {
                        position: self.camera.world_to_screen(position),
                    });
                }
                DragRequest::SetNodeColor(node) => self.set_node_color(node, out),
                DragRequest::SetPanning(panning) => out.push(UiRequest::SetPanning(panning)),
                DragRequest::CommitNodePosition { node, position } => {
                    if let Err(e) = self.document.set_node_position(node, position) {
                        log::warn!("Failed to move node: {e}");
                    }
                }
                DragRequest::CreateChildNode { parent, position } => {
                    match self.document.create_child_node(parent, position) {
                        Ok(node) => {
                            log::debug!("Created node {node} under {parent}");
                            self.reload_scene();
                        }
                        Err(e) => log::warn!("Failed to create node: {e}"),
                    }
                }
            }
        }
        if let Some(cursor) = response.cursor {
            out.push(UiRequest::SetCursor(cursor));
        }
    }

    fn set_node_color(&mut self, node: NodeId, out: &mut Vec<UiRequest>) {
        let Some(color) = self.dialogs.pick_color() else {
            return;
        };
        let color = Rgba::from(color);
        self.document.save_undo_point();
        match self.document.set_node_color(node, color) {
            Ok(()) => self.scene.set_color(EntityRef::Node(node), color),
            Err(e) => log::warn!("Failed to color node: {e}"),
        }
        out.push(self.history_changed());
    }

    fn reload_scene(&mut self) {
        self.scene.load_graph(self.document.graph());
        if let Some(node) = self.selected_node {
            if !self.document.graph().contains(node) {
                self.selected_node = None;
            }
        }
    }

    /// Center on the content, optionally zooming so that it fits.
    fn fit_content(&mut self, zoom: bool) {
        let Some(bounds) = self.document.graph().bounds(self.config.node_size()) else {
            return;
        };
        if zoom {
            self.camera.zoom_to_fit(bounds);
        } else {
            self.camera.center_on(bounds.center());
        }
    }

    fn report(&mut self, message: String) {
        log::warn!("{message}");
        self.dialogs.report_error(&message);
    }

    fn history_changed(&self) -> UiRequest {
        UiRequest::HistoryChanged {
            can_undo: self.document.is_undoable(),
            can_redo: self.document.is_redoable(),
        }
    }

    fn view_changed(&self) -> UiRequest {
        UiRequest::ViewChanged {
            zoom_percent: self.camera.zoom_percent(),
        }
    }
}
