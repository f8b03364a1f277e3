//! Report writers for validation outcomes.
//!
//! Produces the flat-file artifacts downstream tooling consumes: per-step
//! CSV rows for the raw and sanitized plans, the rendered issue log, a
//! raw-vs-validated comparison summary, and a cross-run summary CSV that
//! accumulates one row per validated task.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::Vec6;
use crate::validator::{IssueCode, IssueLevel, ValidationIssue, ValidationResult};

const EPS: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serde(String),
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::Serde(e.to_string())
    }
}

/// One plan step flattened for tabular output.
#[derive(Debug, Clone, Serialize)]
pub struct StepRow {
    pub idx: usize,
    pub subtask: String,
    pub frame: String,
    pub actor_obj: String,
    pub actor_point: String,
    pub target_obj: String,
    pub target_point: String,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub wx: f64,
    pub wy: f64,
    pub wz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
    pub mrx: f64,
    pub mry: f64,
    pub mrz: f64,
    pub notes: String,
}

impl StepRow {
    pub const HEADER: &'static [&'static str] = &[
        "idx",
        "subtask",
        "frame",
        "actor_obj",
        "actor_point",
        "target_obj",
        "target_point",
        "vx",
        "vy",
        "vz",
        "wx",
        "wy",
        "wz",
        "mx",
        "my",
        "mz",
        "mrx",
        "mry",
        "mrz",
        "notes",
    ];

    fn fields(&self) -> Vec<String> {
        let mut out = vec![
            self.idx.to_string(),
            self.subtask.clone(),
            self.frame.clone(),
            self.actor_obj.clone(),
            self.actor_point.clone(),
            self.target_obj.clone(),
            self.target_point.clone(),
        ];
        for x in [
            self.vx, self.vy, self.vz, self.wx, self.wy, self.wz, self.mx, self.my, self.mz,
            self.mrx, self.mry, self.mrz,
        ] {
            out.push(format_number(x));
        }
        out.push(self.notes.clone());
        out
    }
}

/// Flatten a plan value (raw or sanitized) into per-step rows. Non-object
/// steps are skipped; missing vectors render as zeros.
pub fn step_rows(plan: &Value) -> Vec<StepRow> {
    let sequence = match plan.get("sequence").and_then(Value::as_array) {
        Some(sequence) => sequence,
        None => return Vec::new(),
    };
    sequence
        .iter()
        .enumerate()
        .filter(|(_, step)| step.is_object())
        .map(|(idx, step)| {
            let v = list6(step.get("V"));
            let m = list6(step.get("M"));
            StepRow {
                idx,
                subtask: text_field(step.get("subtask")),
                frame: text_field(step.get("frame")),
                actor_obj: text_field(step.get("actor_obj").or_else(|| step.get("actor"))),
                actor_point: point_field(step.get("actor_point")),
                target_obj: text_field(step.get("target_obj").or_else(|| step.get("target"))),
                target_point: point_field(step.get("target_point")),
                vx: v[0],
                vy: v[1],
                vz: v[2],
                wx: v[3],
                wy: v[4],
                wz: v[5],
                mx: m[0],
                my: m[1],
                mz: m[2],
                mrx: m[3],
                mry: m[4],
                mrz: m[5],
                notes: text_field(step.get("notes")),
            }
        })
        .collect()
}

/// Render the issue list as human-readable lines, in ledger order:
/// `[LEVEL] CODE @ path: message`.
pub fn issues_to_text(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| {
            if issue.path.is_empty() {
                format!("[{}] {}: {}", issue.level, issue.code, issue.message)
            } else {
                format!(
                    "[{}] {} @ {}: {}",
                    issue.level, issue.code, issue.path, issue.message
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Count issues per code.
pub fn issue_code_counts(issues: &[ValidationIssue]) -> BTreeMap<IssueCode, usize> {
    let mut counts = BTreeMap::new();
    for issue in issues {
        *counts.entry(issue.code).or_insert(0) += 1;
    }
    counts
}

/// Before/after summary of what validation changed in a plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompareSummary {
    pub steps_raw: usize,
    pub steps_validated: usize,
    pub frame_changed_steps: usize,
    pub subtask_changed_steps: usize,
    pub v_index_changes: usize,
    pub m_index_changes: usize,
    pub point_changed_steps: usize,
    /// Steps where the raw plan had V and M non-zero on the same axis and
    /// the validated plan zeroed the wrench there.
    pub vm_rule_fixed_steps: usize,
    pub frames_world: usize,
    pub frames_contact: usize,
    pub frames_functional: usize,
    /// Validated WORLD-frame steps with a positive linear-Z twist.
    pub world_lift_steps: usize,
}

pub fn compare_raw_validated(raw: &Value, validated: &Value) -> CompareSummary {
    let empty = Vec::new();
    let rseq = raw.get("sequence").and_then(Value::as_array).unwrap_or(&empty);
    let vseq = validated
        .get("sequence")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut summary = CompareSummary {
        steps_raw: rseq.len(),
        steps_validated: vseq.len(),
        ..CompareSummary::default()
    };

    for (rs, vs) in rseq.iter().zip(vseq.iter()) {
        let r_frame = text_field(rs.get("frame")).to_uppercase();
        let v_frame = text_field(vs.get("frame")).to_uppercase();
        if r_frame != v_frame {
            summary.frame_changed_steps += 1;
        }

        let r_subtask = text_field(rs.get("subtask")).to_lowercase();
        let v_subtask = text_field(vs.get("subtask")).to_lowercase();
        if r_subtask != v_subtask {
            summary.subtask_changed_steps += 1;
        }

        let rv = list6(rs.get("V"));
        let rm = list6(rs.get("M"));
        let vv = list6(vs.get("V"));
        let vm = list6(vs.get("M"));

        summary.v_index_changes += (0..6).filter(|&k| (rv[k] - vv[k]).abs() > EPS).count();
        summary.m_index_changes += (0..6).filter(|&k| (rm[k] - vm[k]).abs() > EPS).count();
        if (0..6).any(|k| rv[k].abs() > EPS && rm[k].abs() > EPS && vm[k].abs() < 1e-12) {
            summary.vm_rule_fixed_steps += 1;
        }

        let r_points = (
            point_field(rs.get("actor_point")),
            point_field(rs.get("target_point")),
        );
        let v_points = (
            point_field(vs.get("actor_point")),
            point_field(vs.get("target_point")),
        );
        if r_points != v_points {
            summary.point_changed_steps += 1;
        }
    }

    for vs in vseq {
        let frame = text_field(vs.get("frame")).to_uppercase();
        match frame.as_str() {
            "WORLD" => {
                summary.frames_world += 1;
                if list6(vs.get("V"))[2] > EPS {
                    summary.world_lift_steps += 1;
                }
            }
            "CONTACT" => summary.frames_contact += 1,
            "FUNCTIONAL" => summary.frames_functional += 1,
            _ => {}
        }
    }

    summary
}

/// Cross-run summary row: one line per validated task.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub task: String,
    pub ok: bool,
    pub errors: usize,
    pub warnings: usize,
    #[serde(flatten)]
    pub compare: CompareSummary,
    pub vm_rule_fixed: usize,
    pub frame_hard_fixed: usize,
    pub point_parsed: usize,
    pub zero_step: usize,
}

impl SummaryRow {
    pub const HEADER: &'static [&'static str] = &[
        "task",
        "ok",
        "errors",
        "warnings",
        "steps_raw",
        "steps_validated",
        "frame_changed_steps",
        "subtask_changed_steps",
        "V_index_changes",
        "M_index_changes",
        "point_changed_steps",
        "vm_rule_fixed_steps",
        "frames_WORLD",
        "frames_CONTACT",
        "frames_FUNCTIONAL",
        "world_lift_steps",
        "VM_RULE_FIXED",
        "FRAME_HARD_FIXED",
        "POINT_PARSED",
        "ZERO_STEP",
    ];

    pub fn build(task: &str, raw: &Value, result: &ValidationResult) -> Result<Self, ReportError> {
        let validated = serde_json::to_value(&result.sanitized)?;
        let compare = compare_raw_validated(raw, &validated);
        let counts = issue_code_counts(&result.issues);
        let count = |code: IssueCode| counts.get(&code).copied().unwrap_or(0);
        Ok(SummaryRow {
            task: task.to_string(),
            ok: result.ok,
            errors: result.issues.iter().filter(|i| i.level == IssueLevel::Error).count(),
            warnings: result.issues.iter().filter(|i| i.level == IssueLevel::Warn).count(),
            compare,
            vm_rule_fixed: count(IssueCode::VmRuleFixed),
            frame_hard_fixed: count(IssueCode::FrameHardFixed),
            point_parsed: count(IssueCode::PointParsed),
            zero_step: count(IssueCode::ZeroStep),
        })
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.task.clone(),
            self.ok.to_string(),
            self.errors.to_string(),
            self.warnings.to_string(),
            self.compare.steps_raw.to_string(),
            self.compare.steps_validated.to_string(),
            self.compare.frame_changed_steps.to_string(),
            self.compare.subtask_changed_steps.to_string(),
            self.compare.v_index_changes.to_string(),
            self.compare.m_index_changes.to_string(),
            self.compare.point_changed_steps.to_string(),
            self.compare.vm_rule_fixed_steps.to_string(),
            self.compare.frames_world.to_string(),
            self.compare.frames_contact.to_string(),
            self.compare.frames_functional.to_string(),
            self.compare.world_lift_steps.to_string(),
            self.vm_rule_fixed.to_string(),
            self.frame_hard_fixed.to_string(),
            self.point_parsed.to_string(),
            self.zero_step.to_string(),
        ]
    }
}

/// Single-row markdown table, paste-ready for notes.
pub fn to_markdown(header: &[&str], fields: &[String]) -> String {
    let head = format!("| {} |", header.join(" | "));
    let sep = format!("| {} |", vec!["---"; header.len()].join(" | "));
    let vals = format!("| {} |", fields.join(" | "));
    [head, sep, vals].join("\n")
}

/// Markdown rendering of a cross-run summary row.
pub fn summary_to_markdown(row: &SummaryRow) -> String {
    to_markdown(SummaryRow::HEADER, &row.fields())
}

/// Markdown rendering of a bare comparison (no validation outcome).
pub fn compare_to_markdown(task: &str, summary: &CompareSummary) -> String {
    let header = [
        "task",
        "steps_raw",
        "steps_validated",
        "vm_rule_fixed_steps",
        "frame_changed_steps",
        "V_index_changes",
        "M_index_changes",
    ];
    let fields = vec![
        task.to_string(),
        summary.steps_raw.to_string(),
        summary.steps_validated.to_string(),
        summary.vm_rule_fixed_steps.to_string(),
        summary.frame_changed_steps.to_string(),
        summary.v_index_changes.to_string(),
        summary.m_index_changes.to_string(),
    ];
    to_markdown(&header, &fields)
}

/// Paths of the files one `save_reports` call produced.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub raw_steps_csv: PathBuf,
    pub validated_steps_csv: PathBuf,
    pub issues_txt: PathBuf,
    pub summary_csv: PathBuf,
    pub global_summary_csv: PathBuf,
}

/// Write the full report set for one validated task under
/// `<output_dir>/reports/`.
pub fn save_reports(
    task_name: &str,
    raw_plan: &Value,
    result: &ValidationResult,
    output_dir: &Path,
) -> Result<ReportPaths, ReportError> {
    let reports_dir = output_dir.join("reports");
    fs::create_dir_all(&reports_dir)?;

    let slug = safe_filename(task_name);
    let paths = ReportPaths {
        raw_steps_csv: reports_dir.join(format!("{slug}__steps_raw.csv")),
        validated_steps_csv: reports_dir.join(format!("{slug}__steps_validated.csv")),
        issues_txt: reports_dir.join(format!("{slug}__validator_issues.txt")),
        summary_csv: reports_dir.join(format!("{slug}__validator_summary.csv")),
        global_summary_csv: reports_dir.join("summary.csv"),
    };

    let validated = serde_json::to_value(&result.sanitized)?;
    write_step_csv(&paths.raw_steps_csv, &step_rows(raw_plan))?;
    write_step_csv(&paths.validated_steps_csv, &step_rows(&validated))?;

    let issues_body = if result.issues.is_empty() {
        "[Validator] No issues.\n".to_string()
    } else {
        issues_to_text(&result.issues)
    };
    fs::write(&paths.issues_txt, issues_body)?;

    let row = SummaryRow::build(task_name, raw_plan, result)?;
    write_csv(&paths.summary_csv, SummaryRow::HEADER, &[row.fields()])?;
    append_csv(&paths.global_summary_csv, SummaryRow::HEADER, &row.fields())?;

    Ok(paths)
}

/// Write step rows as CSV (header always present, even for zero rows).
pub fn write_step_csv(path: &Path, rows: &[StepRow]) -> Result<(), ReportError> {
    let rows: Vec<Vec<String>> = rows.iter().map(StepRow::fields).collect();
    write_csv(path, StepRow::HEADER, &rows)
}

fn write_csv(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<(), ReportError> {
    let mut body = csv_line(header.iter().map(|s| s.to_string()));
    for row in rows {
        body.push_str(&csv_line(row.iter().cloned()));
    }
    fs::write(path, body)?;
    Ok(())
}

fn append_csv(path: &Path, header: &[&str], row: &[String]) -> Result<(), ReportError> {
    use std::io::Write;

    let exists = path.exists();
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    if !exists {
        file.write_all(csv_line(header.iter().map(|s| s.to_string())).as_bytes())?;
    }
    file.write_all(csv_line(row.iter().cloned()).as_bytes())?;
    Ok(())
}

fn csv_line(fields: impl Iterator<Item = String>) -> String {
    let mut line = fields.map(|f| csv_escape(&f)).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Filesystem-safe task slug: whitespace collapsed to underscores,
/// anything outside `[A-Za-z0-9_-]` dropped.
pub fn safe_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_space = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push('_');
            }
            last_was_space = true;
        } else {
            last_was_space = false;
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                out.push(c);
            }
        }
    }
    out
}

fn list6(value: Option<&Value>) -> Vec6 {
    let mut out = [0.0; 6];
    if let Some(items) = value.and_then(Value::as_array) {
        if items.len() == 6 {
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = item.as_f64().unwrap_or(0.0);
            }
        }
    }
    out
}

fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn point_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::Null) | None => String::new(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn format_number(x: f64) -> String {
    if x == x.trunc() && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}
