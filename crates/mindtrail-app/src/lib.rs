//! MindTrail Scenario Runner
//!
//! Drives the interaction core from a JSON script instead of a window:
//! scripted dialogs answer every prompt and the produced UI requests are
//! collected into a report.

mod runner;
mod scenario;

pub use runner::{RunReport, StepRecord, run_scenario};
pub use scenario::{
    DialogScript, ExportScript, Scenario, ScenarioError, ScriptedDialogHost, ScriptedExporter,
};
