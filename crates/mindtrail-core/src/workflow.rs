//! Document workflow state machine.
//!
//! Governs the lifecycle of the open document (new, open, save, export,
//! quit) and guards every destructive flow with the not-saved dialog.
//!
//! ```text
//! NewSelected / OpenSelected / QuitSelected
//!     modified   -> ShowNotSavedDialog (QuitIntent remembers which one)
//!     !modified  -> InitializeNewMindMap / ShowOpenDialog / CloseWindow
//! NotSavedDialogDiscarded -> resumes the path stored in QuitIntent
//! completion and failure actions -> Edit (QuitIntent reset)
//! ```

use crate::error::Fault;
use serde::{Deserialize, Serialize};

/// Lifecycle state of the open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkflowState {
    #[default]
    Init,
    Edit,
    InitializeNewMindMap,
    ShowOpenDialog,
    ShowSaveAsDialog,
    SaveMindMap,
    ShowExportDialog,
    ShowNotSavedDialog,
    CloseWindow,
    CloseWindowNow,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 10] = [
        WorkflowState::Init,
        WorkflowState::Edit,
        WorkflowState::InitializeNewMindMap,
        WorkflowState::ShowOpenDialog,
        WorkflowState::ShowSaveAsDialog,
        WorkflowState::SaveMindMap,
        WorkflowState::ShowExportDialog,
        WorkflowState::ShowNotSavedDialog,
        WorkflowState::CloseWindow,
        WorkflowState::CloseWindowNow,
    ];

    /// States that wait for the next external event instead of running a
    /// side effect.
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            Self::Init | Self::Edit | Self::CloseWindow | Self::CloseWindowNow
        )
    }
}

/// External events fed into the workflow machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowAction {
    NewSelected,
    OpenSelected,
    SaveSelected,
    SaveAsSelected,
    QuitSelected,
    ExportToPngSelected,
    MainWindowInitialized,
    NewMindMapInitialized,
    MindMapOpened,
    MindMapOpenFailed,
    MindMapSaved,
    MindMapSavedAs,
    MindMapSaveFailed,
    MindMapSaveAsFailed,
    ExportedToPng,
    FileDialogCanceled,
    NotSavedDialogAccepted,
    NotSavedDialogDiscarded,
    NotSavedDialogCanceled,
    UndoSelected,
    RedoSelected,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 21] = [
        WorkflowAction::NewSelected,
        WorkflowAction::OpenSelected,
        WorkflowAction::SaveSelected,
        WorkflowAction::SaveAsSelected,
        WorkflowAction::QuitSelected,
        WorkflowAction::ExportToPngSelected,
        WorkflowAction::MainWindowInitialized,
        WorkflowAction::NewMindMapInitialized,
        WorkflowAction::MindMapOpened,
        WorkflowAction::MindMapOpenFailed,
        WorkflowAction::MindMapSaved,
        WorkflowAction::MindMapSavedAs,
        WorkflowAction::MindMapSaveFailed,
        WorkflowAction::MindMapSaveAsFailed,
        WorkflowAction::ExportedToPng,
        WorkflowAction::FileDialogCanceled,
        WorkflowAction::NotSavedDialogAccepted,
        WorkflowAction::NotSavedDialogDiscarded,
        WorkflowAction::NotSavedDialogCanceled,
        WorkflowAction::UndoSelected,
        WorkflowAction::RedoSelected,
    ];
}

/// Why the not-saved dialog was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuitIntent {
    #[default]
    None,
    NewDocument,
    OpenDocument,
    CloseApp,
}

impl QuitIntent {
    pub const ALL: [QuitIntent; 4] = [
        QuitIntent::None,
        QuitIntent::NewDocument,
        QuitIntent::OpenDocument,
        QuitIntent::CloseApp,
    ];
}

/// Result of a single transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: WorkflowState,
    pub quit_intent: QuitIntent,
    /// False when no rule matched; state and intent are then unchanged.
    pub handled: bool,
}

/// Pure transition function.
///
/// The output depends on nothing but the arguments.
pub fn transition(
    state: WorkflowState,
    quit_intent: QuitIntent,
    action: WorkflowAction,
    modified: bool,
    can_be_saved: bool,
) -> Transition {
    let to = |state: WorkflowState, quit_intent: QuitIntent| Transition {
        state,
        quit_intent,
        handled: true,
    };
    // Destructive flows go through the not-saved dialog when there are changes.
    let guarded = |target: WorkflowState, intent: QuitIntent| {
        if modified {
            to(WorkflowState::ShowNotSavedDialog, intent)
        } else {
            to(target, intent)
        }
    };

    match action {
        WorkflowAction::MainWindowInitialized => {
            to(WorkflowState::InitializeNewMindMap, quit_intent)
        }
        WorkflowAction::NewSelected => {
            guarded(WorkflowState::InitializeNewMindMap, QuitIntent::NewDocument)
        }
        WorkflowAction::OpenSelected => {
            guarded(WorkflowState::ShowOpenDialog, QuitIntent::OpenDocument)
        }
        WorkflowAction::QuitSelected => guarded(WorkflowState::CloseWindow, QuitIntent::CloseApp),
        WorkflowAction::SaveSelected => {
            if can_be_saved {
                to(WorkflowState::SaveMindMap, quit_intent)
            } else {
                to(WorkflowState::ShowSaveAsDialog, quit_intent)
            }
        }
        WorkflowAction::SaveAsSelected => to(WorkflowState::ShowSaveAsDialog, quit_intent),
        WorkflowAction::ExportToPngSelected => to(WorkflowState::ShowExportDialog, quit_intent),
        WorkflowAction::NotSavedDialogDiscarded => {
            let state = match quit_intent {
                QuitIntent::CloseApp => WorkflowState::CloseWindowNow,
                QuitIntent::NewDocument => WorkflowState::InitializeNewMindMap,
                QuitIntent::OpenDocument => WorkflowState::ShowOpenDialog,
                QuitIntent::None => WorkflowState::Edit,
            };
            to(state, quit_intent)
        }
        WorkflowAction::ExportedToPng
        | WorkflowAction::NewMindMapInitialized
        | WorkflowAction::NotSavedDialogCanceled
        | WorkflowAction::MindMapOpened
        | WorkflowAction::MindMapOpenFailed
        | WorkflowAction::MindMapSaved
        | WorkflowAction::MindMapSavedAs
        | WorkflowAction::MindMapSaveFailed
        | WorkflowAction::MindMapSaveAsFailed
        | WorkflowAction::FileDialogCanceled => to(WorkflowState::Edit, QuitIntent::None),
        WorkflowAction::NotSavedDialogAccepted
        | WorkflowAction::UndoSelected
        | WorkflowAction::RedoSelected => Transition {
            state,
            quit_intent,
            handled: false,
        },
    }
}

/// Holds the current workflow state and quit intent.
///
/// These two fields are the machine's entire state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowStateMachine {
    state: WorkflowState,
    quit_intent: QuitIntent,
}

impl WorkflowStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn quit_intent(&self) -> QuitIntent {
        self.quit_intent
    }

    /// Apply an action and return the new state.
    ///
    /// Unhandled actions are logged and leave the machine untouched.
    pub fn dispatch(
        &mut self,
        action: WorkflowAction,
        document_modified: bool,
        can_be_saved: bool,
    ) -> WorkflowState {
        let next = transition(
            self.state,
            self.quit_intent,
            action,
            document_modified,
            can_be_saved,
        );
        if !next.handled {
            log::warn!(
                "{}",
                Fault::InvalidAction {
                    action,
                    state: self.state
                }
            );
            return self.state;
        }

        log::debug!(
            "Workflow {:?} --{:?}--> {:?} (quit intent {:?})",
            self.state,
            action,
            next.state,
            next.quit_intent
        );
        self.state = next.state;
        self.quit_intent = next.quit_intent;
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(state: WorkflowState, quit_intent: QuitIntent) -> WorkflowStateMachine {
        WorkflowStateMachine { state, quit_intent }
    }

    #[test]
    fn test_starts_in_init() {
        let sm = WorkflowStateMachine::new();
        assert_eq!(sm.state(), WorkflowState::Init);
        assert_eq!(sm.quit_intent(), QuitIntent::None);
    }

    #[test]
    fn test_main_window_initialized() {
        let mut sm = WorkflowStateMachine::new();
        let state = sm.dispatch(WorkflowAction::MainWindowInitialized, false, false);
        assert_eq!(state, WorkflowState::InitializeNewMindMap);
    }

    #[test]
    fn test_guarded_actions_when_modified() {
        let cases = [
            (WorkflowAction::NewSelected, QuitIntent::NewDocument),
            (WorkflowAction::OpenSelected, QuitIntent::OpenDocument),
            (WorkflowAction::QuitSelected, QuitIntent::CloseApp),
        ];
        for (action, intent) in cases {
            let mut sm = machine_in(WorkflowState::Edit, QuitIntent::None);
            assert_eq!(
                sm.dispatch(action, true, false),
                WorkflowState::ShowNotSavedDialog
            );
            assert_eq!(sm.quit_intent(), intent);
        }
    }

    #[test]
    fn test_guarded_actions_when_clean() {
        let cases = [
            (
                WorkflowAction::NewSelected,
                WorkflowState::InitializeNewMindMap,
                QuitIntent::NewDocument,
            ),
            (WorkflowAction::OpenSelected, WorkflowState::ShowOpenDialog, QuitIntent::OpenDocument),
            (WorkflowAction::QuitSelected, WorkflowState::CloseWindow, QuitIntent::CloseApp),
        ];
        for (action, expected, intent) in cases {
            let mut sm = machine_in(WorkflowState::Edit, QuitIntent::None);
            assert_eq!(sm.dispatch(action, false, true), expected);
            assert_eq!(sm.quit_intent(), intent);
        }
    }

    #[test]
    fn test_discard_resumes_quit_intent() {
        let cases = [
            (QuitIntent::CloseApp, WorkflowState::CloseWindowNow),
            (QuitIntent::NewDocument, WorkflowState::InitializeNewMindMap),
            (QuitIntent::OpenDocument, WorkflowState::ShowOpenDialog),
            (QuitIntent::None, WorkflowState::Edit),
        ];
        for (intent, expected) in cases {
            let mut sm = machine_in(WorkflowState::ShowNotSavedDialog, intent);
            assert_eq!(
                sm.dispatch(WorkflowAction::NotSavedDialogDiscarded, true, false),
                expected
            );
        }
    }

    #[test]
    fn test_save_depends_on_file_name() {
        let mut sm = machine_in(WorkflowState::Edit, QuitIntent::None);
        assert_eq!(
            sm.dispatch(WorkflowAction::SaveSelected, true, false),
            WorkflowState::ShowSaveAsDialog
        );
        let mut sm = machine_in(WorkflowState::Edit, QuitIntent::None);
        assert_eq!(
            sm.dispatch(WorkflowAction::SaveSelected, true, true),
            WorkflowState::SaveMindMap
        );
    }

    #[test]
    fn test_dialog_actions_ignore_modified() {
        let mut sm = machine_in(WorkflowState::Edit, QuitIntent::None);
        assert_eq!(
            sm.dispatch(WorkflowAction::SaveAsSelected, true, true),
            WorkflowState::ShowSaveAsDialog
        );
        assert_eq!(
            sm.dispatch(WorkflowAction::ExportToPngSelected, false, false),
            WorkflowState::ShowExportDialog
        );
    }

    #[test]
    fn test_completion_actions_return_to_edit() {
        let completions = [
            WorkflowAction::ExportedToPng,
            WorkflowAction::NewMindMapInitialized,
            WorkflowAction::NotSavedDialogCanceled,
            WorkflowAction::MindMapOpened,
            WorkflowAction::MindMapOpenFailed,
            WorkflowAction::MindMapSaved,
            WorkflowAction::MindMapSavedAs,
            WorkflowAction::MindMapSaveFailed,
            WorkflowAction::MindMapSaveAsFailed,
            WorkflowAction::FileDialogCanceled,
        ];
        for action in completions {
            let mut sm = machine_in(WorkflowState::ShowNotSavedDialog, QuitIntent::CloseApp);
            assert_eq!(sm.dispatch(action, true, true), WorkflowState::Edit);
            assert_eq!(sm.quit_intent(), QuitIntent::None);
        }
    }

    #[test]
    fn test_unhandled_actions_leave_state_unchanged() {
        for action in [
            WorkflowAction::NotSavedDialogAccepted,
            WorkflowAction::UndoSelected,
            WorkflowAction::RedoSelected,
        ] {
            let mut sm = machine_in(WorkflowState::ShowNotSavedDialog, QuitIntent::OpenDocument);
            assert_eq!(
                sm.dispatch(action, true, false),
                WorkflowState::ShowNotSavedDialog
            );
            assert_eq!(sm.quit_intent(), QuitIntent::OpenDocument);
        }
    }

    #[test]
    fn test_transition_is_deterministic() {
        for state in WorkflowState::ALL {
            for intent in QuitIntent::ALL {
                for action in WorkflowAction::ALL {
                    for modified in [false, true] {
                        for can_be_saved in [false, true] {
                            let first = transition(state, intent, action, modified, can_be_saved);
                            let second = transition(state, intent, action, modified, can_be_saved);
                            assert_eq!(first, second);

                            let mut sm = machine_in(state, intent);
                            assert_eq!(sm.dispatch(action, modified, can_be_saved), first.state);
                            assert_eq!(sm.quit_intent(), first.quit_intent);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_quit_with_changes_then_discard() {
        let mut sm = machine_in(WorkflowState::Edit, QuitIntent::None);
        assert_eq!(
            sm.dispatch(WorkflowAction::QuitSelected, true, false),
            WorkflowState::ShowNotSavedDialog
        );
        assert_eq!(sm.quit_intent(), QuitIntent::CloseApp);
        assert_eq!(
            sm.dispatch(WorkflowAction::NotSavedDialogDiscarded, true, false),
            WorkflowState::CloseWindowNow
        );
    }

    #[test]
    fn test_end_to_end_sequence() {
        let mut sm = WorkflowStateMachine::new();
        let steps = [
            (WorkflowAction::MainWindowInitialized, false, WorkflowState::InitializeNewMindMap),
            (WorkflowAction::NewMindMapInitialized, false, WorkflowState::Edit),
            (WorkflowAction::OpenSelected, false, WorkflowState::ShowOpenDialog),
            (WorkflowAction::MindMapOpened, false, WorkflowState::Edit),
            (WorkflowAction::QuitSelected, true, WorkflowState::ShowNotSavedDialog),
            (WorkflowAction::NotSavedDialogDiscarded, true, WorkflowState::CloseWindowNow),
        ];
        for (action, modified, expected) in steps {
            assert_eq!(sm.dispatch(action, modified, false), expected);
        }
    }
}
