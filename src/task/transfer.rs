#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context as _;

use crate::error::LisaError;
use crate::task::model::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    /// `.csv` files are CSV; anything else is treated as JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Format::Csv,
            _ => Format::Json,
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = LisaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            other => Err(LisaError::validation(format!(
                "unsupported format '{other}': expected json or csv"
            ))),
        }
    }
}

/// Writes `tasks` to `path`. Returns `false` without touching the file when
/// there is nothing to export.
pub fn export(tasks: &[Task], format: Format, path: &Path) -> anyhow::Result<bool> {
    if tasks.is_empty() {
        return Ok(false);
    }
    match format {
        Format::Json => {
            let mut data = serde_json::to_vec_pretty(tasks)?;
            data.push(b'\n');
            std::fs::write(path, data)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Format::Csv => {
            let mut wtr = csv::Writer::from_path(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            for task in tasks {
                wtr.serialize(task)
                    .with_context(|| format!("failed to write task #{}", task.id))?;
            }
            wtr.flush()
                .with_context(|| format!("failed to flush {}", path.display()))?;
        }
    }
    tracing::info!(path = %path.display(), %format, count = tasks.len(), "exported tasks");
    Ok(true)
}

/// Reads every record in `path`. Content that does not parse is reported as
/// a validation error naming the file; the store is never touched here.
pub fn import(path: &Path, format: Format) -> anyhow::Result<Vec<Task>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "import file not found");
        return Err(LisaError::NotFound(format!("import file not found: {}", path.display())).into());
    }
    let invalid = |detail: String| {
        tracing::warn!(path = %path.display(), "rejected import: {detail}");
        LisaError::validation(format!("could not import {}: {detail}", path.display()))
    };
    let tasks = match format {
        Format::Json => {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_slice(&data).map_err(|e| invalid(e.to_string()))?
        }
        Format::Csv => {
            let mut rdr = csv::Reader::from_path(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let mut tasks = Vec::new();
            for (i, row) in rdr.deserialize::<Task>().enumerate() {
                let task = row.map_err(|e| invalid(format!("row {}: {e}", i + 1)))?;
                tasks.push(task);
            }
            tasks
        }
    };
    Ok(tasks)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub added: Vec<u64>,
    /// Ids already present in the store.
    pub skipped: Vec<u64>,
    /// Records with id 0 or blank text.
    pub rejected: Vec<u64>,
}

/// Appends valid incoming tasks whose id is not already taken, in input
/// order.
pub fn merge(existing: &mut Vec<Task>, incoming: Vec<Task>) -> MergeReport {
    let mut ids: HashSet<u64> = existing.iter().map(|t| t.id).collect();
    let mut report = MergeReport::default();
    for task in incoming {
        if task.id == 0 || task.text.trim().is_empty() {
            report.rejected.push(task.id);
        } else if ids.insert(task.id) {
            report.added.push(task.id);
            existing.push(task);
        } else {
            report.skipped.push(task.id);
        }
    }
    report
}
