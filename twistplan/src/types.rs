//! Core types for manipulation task plans
//!
//! A plan is an ordered sequence of steps. Each step carries a 6-component
//! twist (`V`, motion command) and wrench (`M`, force command) expressed in
//! the step's reference frame, plus the objects and reference points the
//! step acts on. These records are the *sanitized* representation the
//! validator emits: fields that fail validation are `None`, never echoes of
//! malformed input.

use serde::{Deserialize, Serialize};

/// Fixed-width twist/wrench vector: 3 linear + 3 angular components.
pub type Vec6 = [f64; 6];

/// Reference coordinate system a step's twist/wrench is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frame {
    /// Global frame
    World,
    /// Actor's current contact pose
    Contact,
    /// Actor's task-functional pose
    Functional,
}

impl Frame {
    /// Parse a frame name, tolerating case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "WORLD" => Some(Frame::World),
            "CONTACT" => Some(Frame::Contact),
            "FUNCTIONAL" => Some(Frame::Functional),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frame::World => "WORLD",
            Frame::Contact => "CONTACT",
            Frame::Functional => "FUNCTIONAL",
        }
    }

    /// The point kind a step in this frame is expected to reference.
    /// WORLD imposes no kind constraint.
    pub fn expected_kind(&self) -> Option<PointKind> {
        match self {
            Frame::World => None,
            Frame::Contact => Some(PointKind::Contact),
            Frame::Functional => Some(PointKind::Functional),
        }
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two kinds of named reference points an object exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Contact,
    Functional,
}

impl PointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointKind::Contact => "contact_point",
            PointKind::Functional => "functional_point",
        }
    }
}

impl std::fmt::Display for PointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point identifier as carried by a step.
///
/// Canonical form is an integer id. Inputs may arrive as numeric or
/// prefixed strings ("contact_point_3"); with auto-fix enabled the
/// validator rewrites those to `Id`, otherwise the received text is kept
/// verbatim so a disabled auto-fix never mutates values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Id(i64),
    Text(String),
}

impl PointValue {
    /// The canonical integer id, when this value has one.
    pub fn as_id(&self) -> Option<i64> {
        match self {
            PointValue::Id(id) => Some(*id),
            PointValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for PointValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointValue::Id(id) => write!(f, "{}", id),
            PointValue::Text(s) => f.write_str(s),
        }
    }
}

/// One manipulation action in a plan.
///
/// All fields are nullable: the validator fills each one from validated
/// (possibly corrected) input, and leaves `None` where the input could not
/// be made sense of. Every key is serialized even when null so that a
/// sanitized plan re-enters validation without spurious missing-key
/// findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Normalized subtask name (lowercase, underscores).
    pub subtask: Option<String>,
    pub frame: Option<Frame>,
    pub actor_obj: Option<String>,
    pub target_obj: Option<String>,
    pub actor_point: Option<PointValue>,
    pub target_point: Option<PointValue>,
    /// Twist: 3 linear + 3 angular velocity components.
    #[serde(rename = "V")]
    pub v: Option<Vec6>,
    /// Wrench: 3 linear + 3 angular force/torque components.
    #[serde(rename = "M")]
    pub m: Option<Vec6>,
    pub notes: Option<String>,
}

/// A validated (or partially validated) manipulation task plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub task: Option<String>,
    #[serde(default)]
    pub sequence: Vec<Step>,
}
