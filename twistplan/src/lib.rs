//! twistplan - validation and sanitization of VLM-generated manipulation
//! task plans.
//!
//! The core is the [`validator`] module: it takes an untrusted plan
//! record plus a [`points::PointIndex`] and returns a typed, auto-fixed
//! plan with an ordered issue ledger and an overall pass/fail flag. The
//! surrounding modules are the collaborators of that engine: dataset and
//! object-asset loading, the vision-model client that produces raw plans,
//! report writers, and the adjoint twist-transform calculator.

pub mod config;
pub mod dataset;
pub mod planner;
pub mod points;
pub mod report;
pub mod transform;
pub mod types;
pub mod validator;
pub mod vlm;

pub use points::PointIndex;
pub use types::{Frame, Plan, PointKind, PointValue, Step, Vec6};
pub use validator::{
    validate_plan, IssueCode, IssueLevel, ValidateOptions, ValidationIssue, ValidationResult,
};
