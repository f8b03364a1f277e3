//! End-to-end validation behavior: the documented scenarios plus the
//! engine-wide invariants (idempotence, VM exclusivity, clamp bounds,
//! fatality monotonicity).

use std::collections::BTreeMap;

use serde_json::{json, Value};
use twistplan::{
    validate_plan, Frame, IssueCode, IssueLevel, PointIndex, PointValue, ValidateOptions,
};

fn index() -> PointIndex {
    let mut map = BTreeMap::new();
    map.insert(
        "wrench".to_string(),
        json!({
            "contact_points": [{"id": [0, 1, 2]}],
            "functional_points": [{"id": [0, 1, 2]}]
        }),
    );
    map.insert(
        "bolt".to_string(),
        json!({
            "contact_points": [{"id": 0}],
            "functional_points": [{"id": [0, 1]}]
        }),
    );
    PointIndex::build(&map)
}

fn step(overrides: Value) -> Value {
    let mut base = json!({
        "subtask": "move_to_pose",
        "frame": "WORLD",
        "actor_obj": "wrench",
        "target_obj": null,
        "actor_point": null,
        "target_point": null,
        "V": [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "M": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "notes": ""
    });
    if let (Some(base_map), Some(over_map)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in over_map {
            base_map.insert(k.clone(), v.clone());
        }
    }
    base
}

fn plan(steps: Vec<Value>) -> Value {
    json!({"task": "Tighten Bolt", "sequence": steps})
}

fn codes(issues: &[twistplan::ValidationIssue]) -> Vec<IssueCode> {
    issues.iter().map(|i| i.code).collect()
}

#[test]
fn scenario_a_grasp_is_normalized_hard_fixed_and_left_zero() {
    let raw = plan(vec![step(json!({
        "subtask": "Grasp",
        "frame": "world",
        "actor_point": "contact_point_2",
        "V": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "M": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    }))]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());

    assert!(result.ok);
    let sanitized = &result.sanitized.sequence[0];
    assert_eq!(sanitized.subtask.as_deref(), Some("grasp"));
    assert_eq!(sanitized.frame, Some(Frame::Contact));
    assert_eq!(sanitized.actor_point, Some(PointValue::Id(2)));
    assert_eq!(sanitized.v, Some([0.0; 6]));
    assert_eq!(sanitized.m, Some([0.0; 6]));

    let codes = codes(&result.issues);
    assert!(codes.contains(&IssueCode::PointParsed));
    assert!(codes.contains(&IssueCode::FrameHardFixed));
    assert!(codes.contains(&IssueCode::ZeroStep));
    assert!(!codes.contains(&IssueCode::ZeroStepFilled));
}

#[test]
fn scenario_b_vm_conflict_zeroes_wrench_with_auto_fix() {
    let raw = plan(vec![step(json!({
        "subtask": "move_by_displacement",
        "V": [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "M": [5.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    }))]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());

    assert!(result.ok);
    assert_eq!(result.sanitized.sequence[0].m, Some([0.0; 6]));
    let fixed: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.code == IssueCode::VmRuleFixed)
        .collect();
    assert_eq!(fixed.len(), 1);
    assert!(fixed[0].message.contains('0'));
}

#[test]
fn scenario_c_vm_conflict_is_fatal_without_auto_fix() {
    let raw = plan(vec![step(json!({
        "subtask": "move_by_displacement",
        "V": [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "M": [5.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    }))]);
    let opts = ValidateOptions {
        auto_fix: false,
        ..ValidateOptions::default()
    };
    let result = validate_plan(&raw, &index(), &opts);

    assert!(!result.ok);
    assert_eq!(
        result.errors().map(|i| i.code).collect::<Vec<_>>(),
        vec![IssueCode::VmRuleViolation]
    );
    // M left unmodified
    assert_eq!(
        result.sanitized.sequence[0].m,
        Some([5.0, 0.0, 0.0, 0.0, 0.0, 0.0])
    );
}

#[test]
fn scenario_d_zero_place_step_gets_default_approach() {
    let raw = plan(vec![step(json!({
        "subtask": "place",
        "V": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "M": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    }))]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());

    assert!(result.ok);
    assert_eq!(
        result.sanitized.sequence[0].v,
        Some([0.0, 0.0, 1.0, 0.0, 0.0, 0.0])
    );
    assert!(codes(&result.issues).contains(&IssueCode::ZeroStepFilled));
}

#[test]
fn scenario_d_zero_place_step_is_fatal_without_auto_fix() {
    let raw = plan(vec![step(json!({
        "subtask": "place",
        "V": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "M": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    }))]);
    let opts = ValidateOptions {
        auto_fix: false,
        ..ValidateOptions::default()
    };
    let result = validate_plan(&raw, &index(), &opts);
    assert!(!result.ok);
    assert!(codes(&result.issues).contains(&IssueCode::ZeroStepNotAllowed));
}

#[test]
fn scenario_e_empty_sequence_short_circuits() {
    let raw = json!({"task": "Tighten Bolt", "sequence": []});
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());

    assert!(!result.ok);
    assert_eq!(codes(&result.issues), vec![IssueCode::EmptySequence]);
    assert!(result.sanitized.sequence.is_empty());
    assert_eq!(result.sanitized.task.as_deref(), Some("Tighten Bolt"));
}

#[test]
fn scenario_f_wrong_kind_point_for_functional_frame_is_fatal() {
    let raw = plan(vec![step(json!({
        "subtask": "rotate",
        "frame": "FUNCTIONAL",
        "actor_obj": "bolt",
        "actor_point": 7,
        "V": [0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
    }))]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());

    assert!(!result.ok);
    assert_eq!(
        result.errors().map(|i| i.code).collect::<Vec<_>>(),
        vec![IssueCode::PointIdInvalidForObject]
    );
}

#[test]
fn vm_exclusivity_holds_on_all_sanitized_output() {
    let raw = plan(vec![
        step(json!({
            "subtask": "move_by_displacement",
            "V": [1.0, 2.0, 0.0, 0.0, 0.5, 0.0],
            "M": [5.0, 0.0, 3.0, 0.0, 10.0, 0.0]
        })),
        step(json!({
            "subtask": "release",
            "V": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "M": [0.0, 0.0, 7.0, 0.0, 0.0, 0.0]
        })),
    ]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());

    for step in &result.sanitized.sequence {
        let (v, m) = (step.v.unwrap(), step.m.unwrap());
        for k in 0..6 {
            assert!(
                !(v[k].abs() > 0.0 && m[k].abs() > 0.0),
                "axis {k} carries both motion and force"
            );
        }
    }
}

#[test]
fn clamp_bounds_hold_on_all_sanitized_output() {
    let raw = plan(vec![step(json!({
        "subtask": "move_by_displacement",
        "V": [99.0, -99.0, 0.0, 4.0, 0.0, 0.0],
        "M": [0.0, 0.0, 0.0, 0.0, 500.0, -500.0]
    }))]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());

    let step = &result.sanitized.sequence[0];
    for component in step.v.unwrap() {
        assert!(component.abs() <= 3.0);
    }
    for component in step.m.unwrap() {
        assert!(component.abs() <= 50.0);
    }
}

#[test]
fn ok_is_false_iff_an_error_was_recorded() {
    let passing = validate_plan(
        &plan(vec![step(json!({}))]),
        &index(),
        &ValidateOptions::default(),
    );
    assert!(passing.ok);
    assert_eq!(passing.errors().count(), 0);

    let failing = validate_plan(
        &plan(vec![step(json!({"frame": "local"}))]),
        &index(),
        &ValidateOptions::default(),
    );
    assert!(!failing.ok);
    assert!(failing.errors().count() > 0);

    // warnings alone never fail a plan
    let warned = validate_plan(
        &plan(vec![step(json!({"subtask": "wiggle"}))]),
        &index(),
        &ValidateOptions::default(),
    );
    assert!(warned.ok);
    assert!(warned.warnings().count() > 0);
}

#[test]
fn revalidating_sanitized_output_adds_no_repair_issues() {
    let raw = plan(vec![
        step(json!({
            "subtask": "Grasp",
            "frame": "world",
            "actor_point": "contact_point_2",
            "V": [0.9, 0.0, 0.0, 0.0, 0.0, 0.0],
            "M": [3.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        })),
        step(json!({
            "subtask": "place",
            "V": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "M": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        })),
        step(json!({
            "subtask": "move_to_pose",
            "V": [9.0, 9.0, 9.0, 0.0, 0.0, 0.0],
            "M": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        })),
    ]);
    let opts = ValidateOptions::default();
    let first = validate_plan(&raw, &index(), &opts);
    assert!(first.ok);

    let sanitized = serde_json::to_value(&first.sanitized).unwrap();
    let second = validate_plan(&sanitized, &index(), &opts);

    assert!(second.ok);
    assert_eq!(
        serde_json::to_value(&second.sanitized).unwrap(),
        sanitized,
        "second pass must not change the plan again"
    );
    // Only static advisories may reappear; nothing that documents a fix.
    for issue in &second.issues {
        assert!(
            matches!(issue.code, IssueCode::DenseTwist | IssueCode::TooManySteps),
            "unexpected issue on revalidation: {} ({})",
            issue.code,
            issue.message
        );
    }
}

#[test]
fn issues_appear_in_step_order() {
    let raw = plan(vec![
        step(json!({"frame": "nowhere"})),
        step(json!({"subtask": "wiggle"})),
    ]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());

    let first_step_issue = result
        .issues
        .iter()
        .position(|i| i.path.starts_with("sequence[0]"))
        .unwrap();
    let second_step_issue = result
        .issues
        .iter()
        .position(|i| i.path.starts_with("sequence[1]"))
        .unwrap();
    assert!(first_step_issue < second_step_issue);
}

#[test]
fn malformed_vectors_do_not_stop_later_steps() {
    let raw = plan(vec![
        step(json!({"V": [1.0, 2.0], "M": "oops"})),
        step(json!({"subtask": "release", "V": [0.0, 1.0, 0.0, 0.0, 0.0, 0.0]})),
    ]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());

    assert!(!result.ok);
    let codes = codes(&result.issues);
    assert!(codes.contains(&IssueCode::BadV));
    assert!(codes.contains(&IssueCode::BadM));
    // step 1 was still fully processed
    assert_eq!(
        result.sanitized.sequence[1].v,
        Some([0.0, 1.0, 0.0, 0.0, 0.0, 0.0])
    );
}

#[test]
fn missing_point_key_warns_but_null_is_legal() {
    let mut no_keys = step(json!({}));
    if let Some(map) = no_keys.as_object_mut() {
        map.remove("actor_point");
        map.remove("target_point");
    }
    let result = validate_plan(&plan(vec![no_keys]), &index(), &ValidateOptions::default());
    assert!(result.ok);
    assert_eq!(
        result
            .issues
            .iter()
            .filter(|i| i.code == IssueCode::MissingPointKey)
            .count(),
        2
    );

    let nulls = validate_plan(&plan(vec![step(json!({}))]), &index(), &ValidateOptions::default());
    assert!(nulls
        .issues
        .iter()
        .all(|i| i.code != IssueCode::MissingPointKey));
}

#[test]
fn unparseable_point_is_fatal() {
    let raw = plan(vec![step(json!({"actor_point": "grip_3"}))]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());
    assert!(!result.ok);
    assert!(result
        .errors()
        .any(|i| i.code == IssueCode::PointNotInt && i.level == IssueLevel::Error));
}

#[test]
fn world_frame_unknown_point_is_warn_only() {
    let raw = plan(vec![step(json!({"actor_point": 42}))]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());
    assert!(result.ok);
    assert!(codes(&result.issues).contains(&IssueCode::PointIdNotFound));
}

#[test]
fn object_unknown_to_index_falls_back_to_kind_union() {
    let raw = plan(vec![step(json!({
        "subtask": "grasp",
        "frame": "CONTACT",
        "actor_obj": "hammer",
        "actor_point": 9,
        "V": [0.0, 0.0, 0.2, 0.0, 0.0, 0.0]
    }))]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());
    assert!(!result.ok);
    assert!(codes(&result.issues).contains(&IssueCode::PointIdInvalidForFrame));
}

#[test]
fn hard_fixed_frame_gates_point_kind_check() {
    // Declared WORLD, but grasp forces CONTACT; id 7 is not a contact
    // point of the wrench, so the corrected frame must drive the check.
    let raw = plan(vec![step(json!({
        "subtask": "grasp",
        "frame": "WORLD",
        "actor_obj": "wrench",
        "actor_point": 7,
        "V": [0.0, 0.0, 0.2, 0.0, 0.0, 0.0]
    }))]);
    let result = validate_plan(&raw, &index(), &ValidateOptions::default());
    assert!(!result.ok);
    let codes = codes(&result.issues);
    assert!(codes.contains(&IssueCode::FrameHardFixed));
    assert!(codes.contains(&IssueCode::PointIdInvalidForObject));
}
