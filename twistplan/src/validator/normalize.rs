//! Step normalizer: categorical field canonicalization and point-id
//! coercion.
//!
//! Case/whitespace canonicalization is unconditional; only value-level
//! repairs (rewriting a textual point id to its integer form) are gated by
//! the auto-fix policy.

use serde_json::{Map, Value};

use crate::types::{Frame, PointValue, Step};
use crate::validator::issue::{IssueCode, IssueLedger};
use crate::validator::{ValidateOptions, ALLOWED_SUBTASKS};

/// Prefixes a textual point id may carry before its digits.
const POINT_ID_PREFIXES: &[&str] = &["contact_point_", "functional_point_", "point_"];

/// Build the sanitized step skeleton from one raw step object, recording
/// normalization findings along the way.
pub(super) fn normalize_step(
    raw: &Map<String, Value>,
    path: &str,
    opts: &ValidateOptions,
    ledger: &mut IssueLedger,
) -> Step {
    let mut step = Step::default();

    match raw.get("subtask").and_then(Value::as_str) {
        Some(s) => {
            let subtask = s.trim().to_lowercase().replace(' ', "_");
            if !ALLOWED_SUBTASKS.contains(&subtask.as_str()) {
                if opts.strict_subtasks {
                    ledger.error(
                        IssueCode::SubtaskNotAllowed,
                        format!("{path}.subtask"),
                        format!("Subtask '{subtask}' not allowed."),
                    );
                } else {
                    ledger.warn(
                        IssueCode::UnknownSubtask,
                        format!("{path}.subtask"),
                        format!("Subtask '{subtask}' not in allowed set (will continue)."),
                    );
                }
            }
            step.subtask = Some(subtask);
        }
        None => {
            ledger.error(
                IssueCode::BadSubtask,
                format!("{path}.subtask"),
                "Missing/invalid 'subtask'.",
            );
        }
    }

    match raw.get("frame").and_then(Value::as_str).and_then(Frame::parse) {
        Some(frame) => step.frame = Some(frame),
        None => {
            ledger.error(
                IssueCode::BadFrame,
                format!("{path}.frame"),
                "'frame' must be one of CONTACT, FUNCTIONAL, WORLD.",
            );
        }
    }

    step.actor_obj = object_name(raw, "actor_obj", "actor", IssueCode::BadActorObj, path, ledger);
    step.target_obj = object_name(raw, "target_obj", "target", IssueCode::BadTargetObj, path, ledger);

    step.actor_point = point_field(raw, "actor_point", path, opts, ledger);
    step.target_point = point_field(raw, "target_point", path, opts, ledger);

    step.notes = raw.get("notes").and_then(Value::as_str).map(str::to_string);

    step
}

/// Object-name fields are free-form strings or null; legacy records use
/// `actor`/`target` as the key.
fn object_name(
    raw: &Map<String, Value>,
    key: &str,
    legacy_key: &str,
    code: IssueCode,
    path: &str,
    ledger: &mut IssueLedger,
) -> Option<String> {
    match raw.get(key).or_else(|| raw.get(legacy_key)) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            ledger.warn(
                code,
                format!("{path}.{key}"),
                format!("'{key}' should be a string or null."),
            );
            None
        }
    }
}

fn point_field(
    raw: &Map<String, Value>,
    key: &str,
    path: &str,
    opts: &ValidateOptions,
    ledger: &mut IssueLedger,
) -> Option<PointValue> {
    let value = match raw.get(key) {
        None => {
            ledger.warn(
                IssueCode::MissingPointKey,
                format!("{path}.{key}"),
                format!("Missing '{key}' (allowed to be null)."),
            );
            return None;
        }
        Some(Value::Null) => return None,
        Some(value) => value,
    };

    // Integer input is already canonical.
    if let Some(id) = value.as_i64() {
        return Some(PointValue::Id(id));
    }

    match parse_point_id(value) {
        Some(id) => {
            if opts.auto_fix {
                ledger.warn(
                    IssueCode::PointParsed,
                    format!("{path}.{key}"),
                    format!("Parsed '{key}' string -> int ({id})."),
                );
                Some(PointValue::Id(id))
            } else {
                // Without auto-fix the received text is kept verbatim.
                value.as_str().map(|s| PointValue::Text(s.to_string()))
            }
        }
        None => {
            ledger.error(
                IssueCode::PointNotInt,
                format!("{path}.{key}"),
                format!("'{key}' must be int or null."),
            );
            value.as_str().map(|s| PointValue::Text(s.to_string()))
        }
    }
}

/// Canonical-integer parse of a point id: an integer, a digit string, or a
/// `{contact_point_|functional_point_|point_}<digits>` string.
pub(crate) fn parse_point_id(value: &Value) -> Option<i64> {
    if let Some(id) = value.as_i64() {
        return Some(id);
    }
    let s = value.as_str()?.trim().to_lowercase();
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok();
    }
    for prefix in POINT_ID_PREFIXES {
        if let Some(tail) = s.strip_prefix(prefix) {
            if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
                return tail.parse().ok();
            }
        }
    }
    None
}
