//! Frame/subtask hard bindings and point-id membership.
//!
//! Runs after the numeric pass. The membership check is gated by the
//! possibly-just-corrected frame, so a hard-fixed frame is what decides
//! which point kind a step is expected to reference.

use crate::points::PointIndex;
use crate::types::{Frame, PointValue, Step};
use crate::validator::issue::{IssueCode, IssueLedger};
use crate::validator::{hard_frame_for, ValidateOptions};

pub(super) fn check_step(
    step: &mut Step,
    path: &str,
    index: &PointIndex,
    opts: &ValidateOptions,
    ledger: &mut IssueLedger,
) {
    if let (Some(subtask), Some(frame)) = (step.subtask.clone(), step.frame) {
        if let Some(required) = hard_frame_for(&subtask) {
            if frame != required {
                if opts.auto_fix {
                    step.frame = Some(required);
                    ledger.warn(
                        IssueCode::FrameHardFixed,
                        format!("{path}.frame"),
                        format!("Auto-fixed frame: {frame} -> {required} for '{subtask}'."),
                    );
                } else {
                    ledger.error(
                        IssueCode::FrameHardViolation,
                        format!("{path}.frame"),
                        format!("Subtask '{subtask}' requires frame '{required}'."),
                    );
                }
            }
        }
    }

    let frame = match step.frame {
        Some(frame) => frame,
        None => return,
    };
    check_point(
        index,
        frame,
        "actor_point",
        step.actor_point.as_ref(),
        step.actor_obj.as_deref(),
        path,
        ledger,
    );
    check_point(
        index,
        frame,
        "target_point",
        step.target_point.as_ref(),
        step.target_obj.as_deref(),
        path,
        ledger,
    );
}

fn check_point(
    index: &PointIndex,
    frame: Frame,
    field: &str,
    value: Option<&PointValue>,
    object: Option<&str>,
    path: &str,
    ledger: &mut IssueLedger,
) {
    // Only canonical integer ids are checkable.
    let id = match value.and_then(PointValue::as_id) {
        Some(id) => id,
        None => return,
    };

    let kind = match frame.expected_kind() {
        Some(kind) => kind,
        None => {
            // WORLD imposes no kind constraint; the any-kind union is a
            // lower-confidence tier and only ever warns.
            if !index.union().is_empty() && !index.union().contains_any(id) {
                ledger.warn(
                    IssueCode::PointIdNotFound,
                    format!("{path}.{field}"),
                    format!("{field}={id} not found in any points_info id."),
                );
            }
            return;
        }
    };

    if let Some(sets) = object.and_then(|name| index.object(name)) {
        let allowed = sets.kind_set(kind);
        if !allowed.is_empty() && !allowed.contains(&id) {
            ledger.error(
                IssueCode::PointIdInvalidForObject,
                format!("{path}.{field}"),
                format!(
                    "{field}={id} not in {obj}.{kind} ids.",
                    obj = object.unwrap_or_default()
                ),
            );
        }
        return;
    }

    // No (known) object on the step: fall back to the cross-object union
    // for the expected kind.
    let union = index.union().kind_set(kind);
    if !union.is_empty() && !union.contains(&id) {
        ledger.error(
            IssueCode::PointIdInvalidForFrame,
            format!("{path}.{field}"),
            format!("{field}={id} not valid for frame={frame} (expected {kind})."),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn index() -> PointIndex {
        let mut map = BTreeMap::new();
        map.insert(
            "wrench".to_string(),
            json!({
                "contact_points": [{"id": [0, 1, 2]}],
                "functional_points": [{"id": [0, 1, 2]}]
            }),
        );
        PointIndex::build(&map)
    }

    fn checked(step: &mut Step, opts: &ValidateOptions) -> Vec<IssueCode> {
        let mut ledger = IssueLedger::default();
        check_step(step, "sequence[0]", &index(), opts, &mut ledger);
        ledger.into_issues().iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_hard_frame_fixed_with_auto_fix() {
        let mut step = Step {
            subtask: Some("grasp".to_string()),
            frame: Some(Frame::World),
            ..Step::default()
        };
        let codes = checked(&mut step, &ValidateOptions::default());
        assert_eq!(step.frame, Some(Frame::Contact));
        assert_eq!(codes, vec![IssueCode::FrameHardFixed]);
    }

    #[test]
    fn test_hard_frame_fatal_without_auto_fix() {
        let mut step = Step {
            subtask: Some("rotate".to_string()),
            frame: Some(Frame::World),
            ..Step::default()
        };
        let opts = ValidateOptions {
            auto_fix: false,
            ..ValidateOptions::default()
        };
        let codes = checked(&mut step, &opts);
        assert_eq!(step.frame, Some(Frame::World));
        assert_eq!(codes, vec![IssueCode::FrameHardViolation]);
    }

    #[test]
    fn test_point_invalid_for_object_is_fatal() {
        let mut step = Step {
            subtask: Some("grasp".to_string()),
            frame: Some(Frame::Contact),
            actor_obj: Some("wrench".to_string()),
            actor_point: Some(PointValue::Id(7)),
            ..Step::default()
        };
        let codes = checked(&mut step, &ValidateOptions::default());
        assert_eq!(codes, vec![IssueCode::PointIdInvalidForObject]);
    }

    #[test]
    fn test_point_without_object_checks_kind_union() {
        let mut step = Step {
            subtask: Some("rotate".to_string()),
            frame: Some(Frame::Functional),
            actor_point: Some(PointValue::Id(9)),
            ..Step::default()
        };
        let codes = checked(&mut step, &ValidateOptions::default());
        assert_eq!(codes, vec![IssueCode::PointIdInvalidForFrame]);
    }

    #[test]
    fn test_world_frame_miss_is_warn_only() {
        let mut step = Step {
            subtask: Some("move_to_pose".to_string()),
            frame: Some(Frame::World),
            actor_point: Some(PointValue::Id(99)),
            ..Step::default()
        };
        let codes = checked(&mut step, &ValidateOptions::default());
        assert_eq!(codes, vec![IssueCode::PointIdNotFound]);
    }

    #[test]
    fn test_unknown_object_falls_back_to_union() {
        let mut step = Step {
            subtask: Some("grasp".to_string()),
            frame: Some(Frame::Contact),
            actor_obj: Some("hammer".to_string()),
            actor_point: Some(PointValue::Id(1)),
            ..Step::default()
        };
        // id 1 is in the union, so the fallback accepts it
        let codes = checked(&mut step, &ValidateOptions::default());
        assert!(codes.is_empty());
    }

    #[test]
    fn test_textual_point_is_not_checked() {
        let mut step = Step {
            subtask: Some("grasp".to_string()),
            frame: Some(Frame::Contact),
            actor_obj: Some("wrench".to_string()),
            actor_point: Some(PointValue::Text("contact_point_7".to_string())),
            ..Step::default()
        };
        let opts = ValidateOptions {
            auto_fix: false,
            ..ValidateOptions::default()
        };
        let codes = checked(&mut step, &opts);
        assert!(codes.is_empty());
    }
}
