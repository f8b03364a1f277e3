//! `transform` command: world-frame twist analysis of a validated plan.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use nalgebra::Matrix4;
use twistplan::config::Config;
use twistplan::dataset::ObjectLibrary;
use twistplan::transform::analyze_plan;
use twistplan::Plan;

use crate::output;

#[derive(Args)]
pub struct TransformArgs {
    /// Task name (prompted for when omitted)
    pub task: Option<String>,

    /// Results directory holding `<task>.json` (defaults to the
    /// configured path)
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Objects directory holding per-object model_data1.json files
    /// (defaults to the configured path)
    #[arg(long)]
    pub objects: Option<PathBuf>,
}

pub fn execute(config: &Config, args: TransformArgs) -> anyhow::Result<()> {
    let task = super::or_prompt(args.task, "Task Name (e.g. Tighten Bolt): ")?;
    let results_dir = args
        .results
        .unwrap_or_else(|| config.paths.results_dir.clone());
    let objects_dir = args
        .objects
        .unwrap_or_else(|| config.paths.objects_dir.clone());

    let plan_path = results_dir.join(format!("{task}.json"));
    anyhow::ensure!(plan_path.exists(), "missing {}", plan_path.display());
    let plan: Plan = serde_json::from_str(&fs::read_to_string(&plan_path)?)?;

    // Demo hand pose; real deployments feed the measured pose instead.
    let mut t_world_hand = Matrix4::identity();
    t_world_hand[(0, 3)] = 0.5;
    t_world_hand[(1, 3)] = 0.2;
    t_world_hand[(2, 3)] = 0.8;

    let library = ObjectLibrary::new(objects_dir);
    let twists = analyze_plan(&plan, &t_world_hand, &library)?;

    output::section(&format!("[Task: {task}] world-frame twists"));
    for entry in &twists {
        let subtask = entry.subtask.as_deref().unwrap_or("?");
        let frame = entry
            .frame
            .map(|f| f.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("Step {}: {} ({})", entry.index, subtask, frame);
        match (entry.linear(), entry.angular()) {
            (Some(linear), Some(angular)) => {
                println!(
                    " - linear  (v): [{:.4}, {:.4}, {:.4}]",
                    linear[0], linear[1], linear[2]
                );
                println!(
                    " - angular (w): [{:.4}, {:.4}, {:.4}]",
                    angular[0], angular[1], angular[2]
                );
            }
            _ => println!(" - no twist data for this step"),
        }
        println!("{}", "-".repeat(50));
    }
    Ok(())
}
