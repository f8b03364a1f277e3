//! Task dataset and per-object asset loading.
//!
//! The task table is a small CSV (`Tasks`, `Description`, `Objects`
//! columns, quoted fields allowed). Object assets live under an objects
//! directory, one subdirectory per object: `points_info.json` (reference
//! point metadata), `image.jpg` (a pre-extracted camera frame), and
//! `model_data1.json` (rigid-body transforms for the transform
//! calculator).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid JSON in {path}: {message}")]
    Json { path: String, message: String },
    #[error("Dataset is missing column '{0}'")]
    MissingColumn(String),
    #[error("Task '{0}' not found in dataset")]
    TaskNotFound(String),
}

impl From<std::io::Error> for DatasetError {
    fn from(e: std::io::Error) -> Self {
        DatasetError::Io(e.to_string())
    }
}

/// One row of the task table.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEntry {
    pub name: String,
    pub description: String,
    pub objects: Vec<String>,
}

/// The loaded task table.
#[derive(Debug, Clone, Default)]
pub struct TaskDataset {
    tasks: Vec<TaskEntry>,
}

impl TaskDataset {
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, DatasetError> {
        let mut records = parse_csv(content).into_iter();
        let header = records.next().unwrap_or_default();
        let column = |name: &str| -> Result<usize, DatasetError> {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };
        let name_col = column("Tasks")?;
        let desc_col = column("Description")?;
        let objects_col = column("Objects")?;

        let tasks = records
            .filter(|record| record.iter().any(|f| !f.trim().is_empty()))
            .map(|record| {
                let field = |i: usize| record.get(i).map(String::as_str).unwrap_or("");
                TaskEntry {
                    name: field(name_col).trim().to_string(),
                    description: field(desc_col).trim().to_string(),
                    objects: split_object_names(field(objects_col)),
                }
            })
            .collect();
        Ok(TaskDataset { tasks })
    }

    pub fn tasks(&self) -> &[TaskEntry] {
        &self.tasks
    }

    /// Case-insensitive task lookup by name.
    pub fn find(&self, name: &str) -> Option<&TaskEntry> {
        let wanted = name.trim().to_lowercase();
        self.tasks.iter().find(|t| t.name.to_lowercase() == wanted)
    }
}

/// Split a comma-separated object list, stripping stray quotes.
pub fn split_object_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(clean_name)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Trim whitespace and surrounding quote characters from an object name.
pub fn clean_name(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').to_string()
}

/// Minimal quoted-field CSV reader. Handles embedded commas, doubled
/// quotes, CRLF line endings, and space after a separator.
fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => {
                record.push(std::mem::take(&mut field));
                // skipinitialspace: ignore blanks right after a separator
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
            }
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

/// Per-object asset directory access.
#[derive(Debug, Clone)]
pub struct ObjectLibrary {
    root: PathBuf,
}

impl ObjectLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_file(&self, object: &str, file: &str) -> PathBuf {
        self.root.join(object).join(file)
    }

    fn load_json(&self, object: &str, file: &str) -> Result<Option<Value>, DatasetError> {
        let path = self.object_file(object, file);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| DatasetError::Json {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    /// `points_info.json` for one object, if present.
    pub fn points_info(&self, object: &str) -> Result<Option<Value>, DatasetError> {
        self.load_json(object, "points_info.json")
    }

    /// Point metadata for a set of objects; objects without metadata are
    /// silently absent from the map.
    pub fn points_info_map(
        &self,
        objects: &[String],
    ) -> Result<BTreeMap<String, Value>, DatasetError> {
        let mut map = BTreeMap::new();
        for object in objects {
            if let Some(info) = self.points_info(object)? {
                map.insert(object.clone(), info);
            } else {
                log::debug!("[dataset] no points_info.json for object '{}'", object);
            }
        }
        Ok(map)
    }

    /// `model_data1.json` for one object, if present.
    pub fn model_data(&self, object: &str) -> Result<Option<Value>, DatasetError> {
        self.load_json(object, "model_data1.json")
    }

    /// Path of the object's camera frame, when one exists.
    pub fn image_path(&self, object: &str) -> Option<PathBuf> {
        let path = self.object_file(object, "image.jpg");
        path.exists().then_some(path)
    }

    /// Base64-encoded camera frame for one object, if present.
    pub fn image_base64(&self, object: &str) -> Result<Option<String>, DatasetError> {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;

        match self.image_path(object) {
            Some(path) => {
                let bytes = fs::read(path)?;
                Ok(Some(STANDARD.encode(bytes)))
            }
            None => Ok(None),
        }
    }
}
