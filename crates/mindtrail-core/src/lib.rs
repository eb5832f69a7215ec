//! MindTrail Core Library
//!
//! Platform-agnostic interaction core for the MindTrail diagram editor:
//! the document workflow state machine, the pointer-drag controller and the
//! coordinator that routes UI events between them and their collaborators.

pub mod camera;
pub mod config;
pub mod coordinator;
pub mod dialog;
pub mod document;
pub mod drag;
pub mod error;
pub mod export;
pub mod graph;
pub mod input;
pub mod scene;
pub mod workflow;

pub use camera::Camera;
pub use config::EditorConfig;
pub use coordinator::{ContextMenuCommand, InteractionCoordinator, MenuCommand, UiEvent, UiRequest};
pub use dialog::{DialogHost, ExportService};
pub use document::{DocumentModel, MindMap};
pub use drag::{CursorRequest, DragAction, DragController, DragRequest, DragResponse, DragSession};
pub use error::{DocumentError, DocumentResult, ExportError, ExportResult, Fault};
pub use export::ExportSettings;
pub use graph::{Edge, EdgeId, Graph, Node, NodeId, Rgba};
pub use input::{MouseButton, PointerEvent};
pub use scene::{EntityRef, HandleRef, HandleRole, HitTarget, Scene, SceneAdapter};
pub use workflow::{QuitIntent, Transition, WorkflowAction, WorkflowState, WorkflowStateMachine};
