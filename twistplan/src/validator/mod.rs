//! Plan validation & sanitization engine.
//!
//! Takes an untrusted, loosely structured plan record and produces a
//! typed, auto-corrected copy plus an ordered ledger of findings. The
//! engine never aborts on malformed step content: every bad field
//! degrades to a recorded issue and processing continues, so one bad step
//! never hides problems in the rest of the plan. The only hard stops are
//! structural (`sequence` missing or empty).
//!
//! Pipeline per step: normalize -> numeric constraints -> frame/point
//! consistency, all three writing into the same sanitized step and
//! appending to one shared ledger.

mod consistency;
pub mod issue;
mod normalize;
mod numeric;

use serde_json::Value;

pub use issue::{IssueCode, IssueLedger, IssueLevel, ValidationIssue, ValidationResult};

use crate::points::PointIndex;
use crate::types::{Frame, Plan, Step};

/// Subtasks a plan may use without drawing an advisory.
pub const ALLOWED_SUBTASKS: &[&str] = &[
    "grasp",
    "pre_grasp",
    "move_by_displacement",
    "move_to_pose",
    "rotate",
    "place",
    "release",
];

/// Subtasks whose all-zero steps are filled with a default approach
/// motion instead of merely flagged.
pub const ZERO_FILL_SUBTASKS: &[&str] = &["move_to_pose", "place", "move_by_displacement"];

/// Subtask -> frame hard bindings.
const HARD_FRAME_BY_SUBTASK: &[(&str, Frame)] =
    &[("grasp", Frame::Contact), ("rotate", Frame::Functional)];

/// Non-zero threshold for individual twist/wrench components.
pub(crate) const EPS: f64 = 1e-9;
/// Tighter threshold used for the all-zero degeneracy test.
pub(crate) const ZERO_EPS: f64 = 1e-12;

pub(crate) fn hard_frame_for(subtask: &str) -> Option<Frame> {
    HARD_FRAME_BY_SUBTASK
        .iter()
        .find(|(name, _)| *name == subtask)
        .map(|(_, frame)| *frame)
}

/// Policy knobs for one validation run.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Repair recoverable violations and log them as warnings instead of
    /// raising fatal errors.
    pub auto_fix: bool,
    /// Treat subtasks outside the allowed set as fatal.
    pub strict_subtasks: bool,
    /// Clamp bound for twist components.
    pub max_abs_v: f64,
    /// Clamp bound for wrench components.
    pub max_abs_m: f64,
    /// Soft advisory bound on sequence length.
    pub max_steps: usize,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            auto_fix: true,
            strict_subtasks: false,
            max_abs_v: 3.0,
            max_abs_m: 50.0,
            max_steps: 8,
        }
    }
}

/// Validate one plan record against the point index.
///
/// The caller's value is never mutated; the sanitized plan is built
/// field-by-field from validated (possibly corrected) values. A
/// best-effort sanitized plan is returned even when `ok` is false.
pub fn validate_plan(plan: &Value, index: &PointIndex, opts: &ValidateOptions) -> ValidationResult {
    let mut ledger = IssueLedger::default();
    let mut sanitized = Plan::default();

    match plan.get("task").and_then(Value::as_str) {
        Some(task) if !task.trim().is_empty() => sanitized.task = Some(task.to_string()),
        _ => ledger.warn(
            IssueCode::MissingTask,
            "task",
            "Top-level 'task' is missing/invalid (recommended).",
        ),
    }

    let sequence = match plan.get("sequence").and_then(Value::as_array) {
        Some(sequence) => sequence,
        None => {
            ledger.error(
                IssueCode::NoSequence,
                "sequence",
                "Top-level 'sequence' must be a list.",
            );
            return finish(sanitized, ledger);
        }
    };
    if sequence.is_empty() {
        ledger.error(
            IssueCode::EmptySequence,
            "sequence",
            "Sequence must contain at least one step.",
        );
        return finish(sanitized, ledger);
    }
    if sequence.len() > opts.max_steps {
        ledger.warn(
            IssueCode::TooManySteps,
            "sequence",
            format!(
                "Sequence has {} steps; recommended <= {}.",
                sequence.len(),
                opts.max_steps
            ),
        );
    }

    for (i, raw_step) in sequence.iter().enumerate() {
        let path = format!("sequence[{i}]");
        let raw = match raw_step.as_object() {
            Some(raw) => raw,
            None => {
                ledger.error(IssueCode::StepNotObject, &path, "Each step must be an object.");
                // Placeholder keeps raw/sanitized indices aligned for reports.
                sanitized.sequence.push(Step::default());
                continue;
            }
        };
        let mut step = normalize::normalize_step(raw, &path, opts, &mut ledger);
        numeric::enforce_numeric(raw, &mut step, &path, opts, &mut ledger);
        consistency::check_step(&mut step, &path, index, opts, &mut ledger);
        sanitized.sequence.push(step);
    }

    finish(sanitized, ledger)
}

fn finish(sanitized: Plan, ledger: IssueLedger) -> ValidationResult {
    let ok = !ledger.has_errors();
    ValidationResult {
        ok,
        sanitized,
        issues: ledger.into_issues(),
    }
}
