//! End-to-end planning driver: task lookup, context assembly, model call,
//! validation, persistence, reports.
//!
//! Stages mirror the validation contract: the raw model output is saved
//! untouched, the sanitized plan is what downstream consumers act on, and
//! the issue list travels with both.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::dataset::{DatasetError, ObjectLibrary, TaskDataset, TaskEntry};
use crate::points::PointIndex;
use crate::report::{save_reports, ReportError, ReportPaths};
use crate::validator::{validate_plan, ValidationResult};
use crate::vlm::{ImageAttachment, PlanContext, VisionModel, VlmError};

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Vlm(#[from] VlmError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("IO error: {0}")]
    Io(String),
    #[error("No object images found for task '{0}'")]
    NoImages(String),
}

impl From<std::io::Error> for PlannerError {
    fn from(e: std::io::Error) -> Self {
        PlannerError::Io(e.to_string())
    }
}

/// Everything one driver run produced.
#[derive(Debug)]
pub struct PlannerOutcome {
    pub task: String,
    pub raw_plan: Value,
    pub result: ValidationResult,
    pub raw_path: PathBuf,
    pub validated_path: PathBuf,
    pub reports: ReportPaths,
}

/// Orchestrates one planning run against a vision model.
pub struct TaskPlanner<'a> {
    config: &'a Config,
    model: &'a dyn VisionModel,
}

impl<'a> TaskPlanner<'a> {
    pub fn new(config: &'a Config, model: &'a dyn VisionModel) -> Self {
        Self { config, model }
    }

    pub async fn run(&self, task_name: &str) -> Result<PlannerOutcome, PlannerError> {
        let dataset = TaskDataset::load(&self.config.paths.tasks_csv)?;
        let task = dataset
            .find(task_name)
            .ok_or_else(|| DatasetError::TaskNotFound(task_name.to_string()))?;
        log::info!("[planner] task '{}' with objects {:?}", task.name, task.objects);

        let library = ObjectLibrary::new(&self.config.paths.objects_dir);
        let points_info = library.points_info_map(&task.objects)?;
        let context = self.build_context(task, &library)?;

        let system_prompt = fs::read_to_string(&self.config.paths.system_prompt)?;
        log::info!(
            "[planner] requesting plan from '{}' ({} images attached)",
            self.model.name(),
            context.images.len()
        );
        let raw_plan = self.model.generate_plan(&system_prompt, &context).await?;

        let index = PointIndex::build(&points_info);
        let result = validate_plan(&raw_plan, &index, &self.config.validate_options());
        log::info!(
            "[planner] validation {} with {} issue(s)",
            if result.ok { "passed" } else { "FAILED" },
            result.issues.len()
        );

        let (raw_path, validated_path) = self.persist(&task.name, &raw_plan, &result)?;
        let reports = save_reports(&task.name, &raw_plan, &result, &self.config.paths.results_dir)?;

        Ok(PlannerOutcome {
            task: task.name.clone(),
            raw_plan,
            result,
            raw_path,
            validated_path,
            reports,
        })
    }

    fn build_context(
        &self,
        task: &TaskEntry,
        library: &ObjectLibrary,
    ) -> Result<PlanContext, PlannerError> {
        let mut metadata = String::new();
        let mut images = Vec::new();
        for object in &task.objects {
            if let Some(info) = library.points_info(object)? {
                let rendered = serde_json::to_string_pretty(&info)
                    .map_err(|e| ReportError::Serde(e.to_string()))?;
                metadata.push_str(&format!("\n[Object: {object}]\n{rendered}\n"));
            }
            if let Some(encoded) = library.image_base64(object)? {
                images.push(ImageAttachment::jpeg(encoded));
            }
        }
        if images.is_empty() {
            return Err(PlannerError::NoImages(task.name.clone()));
        }
        Ok(PlanContext {
            task: task.name.clone(),
            description: task.description.clone(),
            object_metadata: metadata,
            images,
        })
    }

    /// Write `<task>__raw.json` (untouched model output) and
    /// `<task>.json` (sanitized) under the results directory.
    fn persist(
        &self,
        task_name: &str,
        raw_plan: &Value,
        result: &ValidationResult,
    ) -> Result<(PathBuf, PathBuf), PlannerError> {
        let results_dir = &self.config.paths.results_dir;
        fs::create_dir_all(results_dir)?;
        let raw_path = results_dir.join(format!("{task_name}__raw.json"));
        let validated_path = results_dir.join(format!("{task_name}.json"));

        write_json(&raw_path, raw_plan)?;
        let sanitized =
            serde_json::to_value(&result.sanitized).map_err(|e| ReportError::Serde(e.to_string()))?;
        write_json(&validated_path, &sanitized)?;
        Ok((raw_path, validated_path))
    }
}

fn write_json(path: &Path, value: &Value) -> Result<(), PlannerError> {
    let body =
        serde_json::to_string_pretty(value).map_err(|e| ReportError::Serde(e.to_string()))?;
    fs::write(path, body)?;
    Ok(())
}
