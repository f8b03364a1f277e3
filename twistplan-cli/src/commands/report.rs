//! `report` command: before/after comparison of a validated task.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use twistplan::config::Config;
use twistplan::report::{compare_raw_validated, compare_to_markdown, safe_filename};

use crate::output;

#[derive(Args)]
pub struct ReportArgs {
    /// Task name (prompted for when omitted)
    pub task: Option<String>,

    /// Results directory holding `<task>__raw.json` and `<task>.json`
    /// (defaults to the configured path)
    #[arg(long)]
    pub results: Option<PathBuf>,
}

pub fn execute(config: &Config, args: ReportArgs) -> anyhow::Result<()> {
    let task = super::or_prompt(args.task, "Task Name (exact): ")?;
    let results_dir = args
        .results
        .unwrap_or_else(|| config.paths.results_dir.clone());

    let raw_path = results_dir.join(format!("{task}__raw.json"));
    let validated_path = results_dir.join(format!("{task}.json"));
    anyhow::ensure!(raw_path.exists(), "missing {}", raw_path.display());
    anyhow::ensure!(
        validated_path.exists(),
        "missing {}",
        validated_path.display()
    );

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&raw_path)?)?;
    let validated: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&validated_path)?)?;

    let summary = compare_raw_validated(&raw, &validated);

    // table-1-ready CSV next to the plans
    let out_csv = results_dir.join(format!("{}__validator_summary.csv", safe_filename(&task)));
    let header = "task,steps_raw,steps_validated,vm_rule_fixed_steps,frame_changed_steps,V_index_changes,M_index_changes\n";
    let row = format!(
        "{},{},{},{},{},{},{}\n",
        task,
        summary.steps_raw,
        summary.steps_validated,
        summary.vm_rule_fixed_steps,
        summary.frame_changed_steps,
        summary.v_index_changes,
        summary.m_index_changes
    );
    fs::write(&out_csv, format!("{header}{row}"))?;

    output::section("Validator before/after summary (paste-ready)");
    println!("{}", compare_to_markdown(&task, &summary));
    println!();
    output::kv("saved", &out_csv.display().to_string());
    Ok(())
}
