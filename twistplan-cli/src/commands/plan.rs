//! `plan` command: run the planning driver end to end.

use clap::Args;
use twistplan::config::Config;
use twistplan::planner::TaskPlanner;
use twistplan::vlm::{OpenAiVisionModel, StubVisionModel, VisionModel};

use crate::output;

#[derive(Args)]
pub struct PlanArgs {
    /// Task name from the dataset (prompted for when omitted)
    #[arg(long)]
    pub task: Option<String>,

    /// Use the deterministic stub model instead of the remote VLM
    #[arg(long)]
    pub stub: bool,
}

pub async fn execute(config: &Config, args: PlanArgs) -> anyhow::Result<()> {
    let task = super::or_prompt(args.task, "Task Name (from dataset): ")?;

    let model: Box<dyn VisionModel> = if args.stub || config.model.provider == "stub" {
        Box::new(StubVisionModel::default())
    } else {
        Box::new(OpenAiVisionModel::new(
            config.model.clone(),
            config.api_key(),
        )?)
    };

    let outcome = TaskPlanner::new(config, model.as_ref()).run(&task).await?;

    output::section("Validator issues");
    output::print_issues(&outcome.result.issues);
    output::print_verdict(&outcome.result);

    output::section("Artifacts");
    output::kv("raw plan", &outcome.raw_path.display().to_string());
    output::kv("validated plan", &outcome.validated_path.display().to_string());
    output::kv(
        "issue log",
        &outcome.reports.issues_txt.display().to_string(),
    );
    output::kv(
        "summary csv",
        &outcome.reports.summary_csv.display().to_string(),
    );
    Ok(())
}
