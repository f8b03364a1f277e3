//! `validate` command: offline validation of an existing plan file.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use twistplan::config::Config;
use twistplan::dataset::ObjectLibrary;
use twistplan::report::save_reports;
use twistplan::{validate_plan, PointIndex, ValidateOptions};

use crate::output;

#[derive(Args)]
pub struct ValidateArgs {
    /// Plan JSON file to validate
    pub plan: PathBuf,

    /// Objects directory holding per-object points_info.json files
    /// (defaults to the configured path)
    #[arg(long)]
    pub objects: Option<PathBuf>,

    /// Object names to index point metadata for (repeatable)
    #[arg(long = "object")]
    pub object_names: Vec<String>,

    /// Report violations instead of repairing them
    #[arg(long)]
    pub no_auto_fix: bool,

    /// Treat unknown subtasks as fatal
    #[arg(long)]
    pub strict: bool,

    /// Also write the CSV/text report set to this directory
    #[arg(long, value_name = "DIR")]
    pub reports: Option<PathBuf>,
}

pub fn execute(config: &Config, args: ValidateArgs) -> anyhow::Result<()> {
    let content = fs::read_to_string(&args.plan)?;
    let raw: serde_json::Value = serde_json::from_str(&content)?;

    let objects_dir = args
        .objects
        .unwrap_or_else(|| config.paths.objects_dir.clone());
    let library = ObjectLibrary::new(objects_dir);
    let points_info = library.points_info_map(&args.object_names)?;
    let index = PointIndex::build(&points_info);

    let mut opts: ValidateOptions = config.validate_options();
    if args.no_auto_fix {
        opts.auto_fix = false;
    }
    if args.strict {
        opts.strict_subtasks = true;
    }

    let result = validate_plan(&raw, &index, &opts);

    output::section("Validator issues");
    output::print_issues(&result.issues);
    output::print_verdict(&result);

    if let Some(dir) = args.reports {
        let task = raw
            .get("task")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("plan")
            .to_string();
        let paths = save_reports(&task, &raw, &result, &dir)?;
        output::section("Reports");
        output::kv("issue log", &paths.issues_txt.display().to_string());
        output::kv("summary csv", &paths.summary_csv.display().to_string());
    }

    if !result.ok {
        std::process::exit(1);
    }
    Ok(())
}
