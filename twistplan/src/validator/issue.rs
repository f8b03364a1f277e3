//! Typed validation findings and the ordered ledger they accumulate in.
//!
//! Issue order is part of the engine's contract: report consumers rely on
//! findings appearing in step order, in the order the pipeline emitted
//! them.

use serde::{Deserialize, Serialize};

use crate::types::Plan;

/// Severity of a validation finding.
///
/// ERROR means an invariant was violated and not (or not allowed to be)
/// auto-corrected; WARN covers auto-corrected violations and advisories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueLevel {
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "WARN")]
    Warn,
}

impl IssueLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warn => "WARN",
        }
    }
}

impl std::fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic identifier of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    MissingTask,
    NoSequence,
    EmptySequence,
    TooManySteps,
    StepNotObject,
    BadSubtask,
    UnknownSubtask,
    SubtaskNotAllowed,
    BadFrame,
    BadActorObj,
    BadTargetObj,
    MissingPointKey,
    PointNotInt,
    PointParsed,
    BadV,
    BadM,
    VmRuleFixed,
    VmRuleViolation,
    ZeroStep,
    ZeroStepFilled,
    ZeroStepNotAllowed,
    DenseTwist,
    FrameHardFixed,
    FrameHardViolation,
    PointIdNotFound,
    PointIdInvalidForObject,
    PointIdInvalidForFrame,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::MissingTask => "MISSING_TASK",
            IssueCode::NoSequence => "NO_SEQUENCE",
            IssueCode::EmptySequence => "EMPTY_SEQUENCE",
            IssueCode::TooManySteps => "TOO_MANY_STEPS",
            IssueCode::StepNotObject => "STEP_NOT_OBJECT",
            IssueCode::BadSubtask => "BAD_SUBTASK",
            IssueCode::UnknownSubtask => "UNKNOWN_SUBTASK",
            IssueCode::SubtaskNotAllowed => "SUBTASK_NOT_ALLOWED",
            IssueCode::BadFrame => "BAD_FRAME",
            IssueCode::BadActorObj => "BAD_ACTOR_OBJ",
            IssueCode::BadTargetObj => "BAD_TARGET_OBJ",
            IssueCode::MissingPointKey => "MISSING_POINT_KEY",
            IssueCode::PointNotInt => "POINT_NOT_INT",
            IssueCode::PointParsed => "POINT_PARSED",
            IssueCode::BadV => "BAD_V",
            IssueCode::BadM => "BAD_M",
            IssueCode::VmRuleFixed => "VM_RULE_FIXED",
            IssueCode::VmRuleViolation => "VM_RULE_VIOLATION",
            IssueCode::ZeroStep => "ZERO_STEP",
            IssueCode::ZeroStepFilled => "ZERO_STEP_FILLED",
            IssueCode::ZeroStepNotAllowed => "ZERO_STEP_NOT_ALLOWED",
            IssueCode::DenseTwist => "DENSE_TWIST",
            IssueCode::FrameHardFixed => "FRAME_HARD_FIXED",
            IssueCode::FrameHardViolation => "FRAME_HARD_VIOLATION",
            IssueCode::PointIdNotFound => "POINT_ID_NOT_FOUND",
            IssueCode::PointIdInvalidForObject => "POINT_ID_INVALID_FOR_OBJECT",
            IssueCode::PointIdInvalidForFrame => "POINT_ID_INVALID_FOR_FRAME",
        }
    }
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation finding. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    pub code: IssueCode,
    pub message: String,
    /// Location locator, e.g. `sequence[2].frame`. Empty for plan-level
    /// findings without a single location.
    #[serde(default)]
    pub path: String,
}

/// Ordered, append-only collection of findings for one validation run.
#[derive(Debug, Default)]
pub struct IssueLedger {
    issues: Vec<ValidationIssue>,
    error_count: usize,
}

impl IssueLedger {
    pub fn error(&mut self, code: IssueCode, path: impl Into<String>, message: impl Into<String>) {
        self.push(IssueLevel::Error, code, path.into(), message.into());
    }

    pub fn warn(&mut self, code: IssueCode, path: impl Into<String>, message: impl Into<String>) {
        self.push(IssueLevel::Warn, code, path.into(), message.into());
    }

    fn push(&mut self, level: IssueLevel, code: IssueCode, path: String, message: String) {
        log::debug!("[validator] {} {} @ {}: {}", level, code, path, message);
        if level == IssueLevel::Error {
            self.error_count += 1;
        }
        self.issues.push(ValidationIssue {
            level,
            code,
            message,
            path,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

/// Outcome of one validation call: the best-effort sanitized plan, the
/// full ordered issue list, and the overall verdict.
///
/// `ok` is false iff at least one ERROR-level finding was recorded;
/// warnings alone never fail a plan. Callers must surface `ok` and the
/// issue list together: several warnings document mutations that changed
/// the plan's meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub sanitized: Plan,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.level == IssueLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.level == IssueLevel::Warn)
    }
}
