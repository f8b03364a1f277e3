//! Numeric constraint enforcement for the twist/wrench pair.
//!
//! Order matters: clamp, then mutual exclusivity, then degeneracy, then
//! the density advisory. Clamping is silent normalization, not a finding.

use serde_json::{Map, Value};

use crate::types::{Step, Vec6};
use crate::validator::issue::{IssueCode, IssueLedger};
use crate::validator::{ValidateOptions, EPS, ZERO_EPS, ZERO_FILL_SUBTASKS};

pub(super) fn enforce_numeric(
    raw: &Map<String, Value>,
    step: &mut Step,
    path: &str,
    opts: &ValidateOptions,
    ledger: &mut IssueLedger,
) {
    let v = parse_vec6(raw.get("V"));
    let m = parse_vec6(raw.get("M"));
    if v.is_none() {
        ledger.error(
            IssueCode::BadV,
            format!("{path}.V"),
            "'V' must be a list of 6 numbers.",
        );
    }
    if m.is_none() {
        ledger.error(
            IssueCode::BadM,
            format!("{path}.M"),
            "'M' must be a list of 6 numbers.",
        );
    }
    let (mut v, mut m) = match (v, m) {
        (Some(v), Some(m)) => (v, m),
        (v, m) => {
            // A malformed vector skips the remaining numeric checks.
            step.v = v;
            step.m = m;
            return;
        }
    };

    if opts.auto_fix {
        for k in 0..6 {
            v[k] = v[k].clamp(-opts.max_abs_v, opts.max_abs_v);
            m[k] = m[k].clamp(-opts.max_abs_m, opts.max_abs_m);
        }
    }

    // A step commands motion or force along a given axis, never both.
    let violated: Vec<usize> = (0..6)
        .filter(|&k| v[k].abs() > EPS && m[k].abs() > EPS)
        .collect();
    if !violated.is_empty() {
        if opts.auto_fix {
            for &k in &violated {
                m[k] = 0.0;
            }
            ledger.warn(
                IssueCode::VmRuleFixed,
                path,
                format!("Auto-fixed: zeroed M at indices {:?}.", violated),
            );
        } else {
            ledger.error(
                IssueCode::VmRuleViolation,
                path,
                format!("V/M exclusivity violated at indices {:?}.", violated),
            );
        }
    }

    let all_zero = v.iter().all(|x| x.abs() < ZERO_EPS) && m.iter().all(|x| x.abs() < ZERO_EPS);
    if all_zero {
        let fill_subtask = step
            .subtask
            .as_deref()
            .map(|s| ZERO_FILL_SUBTASKS.contains(&s))
            .unwrap_or(false);
        if fill_subtask {
            if opts.auto_fix {
                if let Some(frame) = step.frame {
                    v[2] = 1.0;
                    ledger.warn(
                        IssueCode::ZeroStepFilled,
                        path,
                        format!(
                            "Filled all-zero step with default approach Vz=+1.0 in frame={frame}"
                        ),
                    );
                }
            } else {
                ledger.error(
                    IssueCode::ZeroStepNotAllowed,
                    path,
                    "All-zero V/M not allowed for this subtask.",
                );
            }
        } else {
            ledger.warn(
                IssueCode::ZeroStep,
                path,
                "V and M are all zeros (step may be redundant).",
            );
        }
    }

    // Style advisory: motions should be axis-sparse.
    let nonzero = v.iter().filter(|x| x.abs() > EPS).count();
    if nonzero > 2 {
        ledger.warn(
            IssueCode::DenseTwist,
            path,
            format!("V has {nonzero} non-zero components; prefer sparse."),
        );
    }

    step.v = Some(v);
    step.m = Some(m);
}

/// Exactly six finite numbers, or nothing.
fn parse_vec6(value: Option<&Value>) -> Option<Vec6> {
    let items = value?.as_array()?;
    if items.len() != 6 {
        return None;
    }
    let mut out = [0.0; 6];
    for (slot, item) in out.iter_mut().zip(items) {
        let f = item.as_f64().filter(|f| f.is_finite())?;
        *slot = f;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(raw: Value, subtask: &str, opts: &ValidateOptions) -> (Step, Vec<IssueCode>) {
        let mut step = Step {
            subtask: Some(subtask.to_string()),
            frame: Some(crate::types::Frame::World),
            ..Step::default()
        };
        let mut ledger = IssueLedger::default();
        enforce_numeric(
            raw.as_object().unwrap(),
            &mut step,
            "sequence[0]",
            opts,
            &mut ledger,
        );
        let codes = ledger.into_issues().iter().map(|i| i.code).collect();
        (step, codes)
    }

    #[test]
    fn test_parse_vec6_rejects_wrong_shapes() {
        assert!(parse_vec6(Some(&json!([0, 0, 0, 0, 0]))).is_none());
        assert!(parse_vec6(Some(&json!([0, 0, 0, 0, 0, "x"]))).is_none());
        assert!(parse_vec6(Some(&json!("nope"))).is_none());
        assert!(parse_vec6(None).is_none());
        assert_eq!(
            parse_vec6(Some(&json!([1, 2.5, 0, 0, 0, 0]))),
            Some([1.0, 2.5, 0.0, 0.0, 0.0, 0.0])
        );
    }

    #[test]
    fn test_clamp_applies_only_with_auto_fix() {
        let raw = json!({"V": [9.0, 0, 0, 0, 0, 0], "M": [0, 0, 0, 0, 0, 0]});
        let (step, _) = run(raw.clone(), "move_to_pose", &ValidateOptions::default());
        assert_eq!(step.v.unwrap()[0], 3.0);

        let opts = ValidateOptions {
            auto_fix: false,
            ..ValidateOptions::default()
        };
        let (step, _) = run(raw, "move_to_pose", &opts);
        assert_eq!(step.v.unwrap()[0], 9.0);
    }

    #[test]
    fn test_vm_rule_zeroes_wrench_with_auto_fix() {
        let raw = json!({"V": [1, 0, 0, 0, 0, 0], "M": [5, 0, 0, 0, 0, 0]});
        let (step, codes) = run(raw, "move_by_displacement", &ValidateOptions::default());
        assert_eq!(step.m.unwrap(), [0.0; 6]);
        assert_eq!(codes, vec![IssueCode::VmRuleFixed]);
    }

    #[test]
    fn test_vm_rule_is_fatal_without_auto_fix() {
        let raw = json!({"V": [1, 0, 0, 0, 0, 0], "M": [5, 0, 0, 0, 0, 0]});
        let opts = ValidateOptions {
            auto_fix: false,
            ..ValidateOptions::default()
        };
        let (step, codes) = run(raw, "move_by_displacement", &opts);
        assert_eq!(step.m.unwrap()[0], 5.0);
        assert_eq!(codes, vec![IssueCode::VmRuleViolation]);
    }

    #[test]
    fn test_zero_step_filled_for_fill_subtasks() {
        let raw = json!({"V": [0, 0, 0, 0, 0, 0], "M": [0, 0, 0, 0, 0, 0]});
        let (step, codes) = run(raw, "place", &ValidateOptions::default());
        assert_eq!(step.v.unwrap(), [0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(codes, vec![IssueCode::ZeroStepFilled]);
    }

    #[test]
    fn test_zero_step_warns_for_other_subtasks() {
        let raw = json!({"V": [0, 0, 0, 0, 0, 0], "M": [0, 0, 0, 0, 0, 0]});
        let (step, codes) = run(raw, "grasp", &ValidateOptions::default());
        assert_eq!(step.v.unwrap(), [0.0; 6]);
        assert_eq!(codes, vec![IssueCode::ZeroStep]);
    }

    #[test]
    fn test_dense_twist_advisory() {
        let raw = json!({"V": [1, 1, 1, 0, 0, 0], "M": [0, 0, 0, 0, 0, 0]});
        let (_, codes) = run(raw, "move_to_pose", &ValidateOptions::default());
        assert_eq!(codes, vec![IssueCode::DenseTwist]);
    }
}
