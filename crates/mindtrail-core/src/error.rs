//! Error types for the editor core.

use crate::drag::DragAction;
use crate::workflow::{WorkflowAction, WorkflowState};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Document model errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Document has no file name")]
    NoFileName,
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Raster export errors.
#[derive(Debug, Error, PartialEq)]
pub enum ExportError {
    #[error("Export file name is empty")]
    EmptyFileName,
    #[error("Invalid export size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Export failed: {0}")]
    Failed(String),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Non-fatal conditions absorbed inside the interaction core.
///
/// These are never returned to callers. They exist so every absorbed
/// condition is logged with the same wording.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Fault {
    #[error("Action {action:?} not handled in state {state:?}")]
    InvalidAction {
        action: WorkflowAction,
        state: WorkflowState,
    },
    #[error("Pointer {event} ignored while {action:?}")]
    IllegalDragTransition {
        event: &'static str,
        action: DragAction,
    },
    #[error("{action:?} gesture interrupted")]
    InterruptedDrag { action: DragAction },
    #[error("Source node {node} of the active {action:?} gesture is gone")]
    ContractViolation { node: Uuid, action: DragAction },
}
