#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::task::model::Task;

const BACKUP_STAMP: &[FormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]");

/// Result of [`TaskStore::load_for_update`].
#[derive(Debug, Default)]
pub struct Loaded {
    pub tasks: Vec<Task>,
    /// Where an unparseable task file was moved to.
    pub moved_aside: Option<PathBuf>,
}

/// Flat-file store holding the whole task list as one JSON array.
///
/// There is no locking: the last writer wins.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted tasks in file order. A missing file is an empty
    /// store; unreadable or corrupt data is logged and also treated as empty.
    /// Nothing on disk is touched.
    #[must_use]
    pub fn load(&self) -> Vec<Task> {
        let parsed = self
            .read()
            .and_then(|data| data.map(|d| parse(&d, &self.path)).transpose());
        match parsed {
            Ok(tasks) => tasks.unwrap_or_default(),
            Err(err) => {
                tracing::error!(path = %self.path.display(), "failed to load tasks: {err:#}");
                Vec::new()
            }
        }
    }

    /// Like [`TaskStore::load`], for callers that will save afterwards. A
    /// file that cannot be parsed is moved aside first, so the next save
    /// does not overwrite it. A file that cannot be read is an error.
    pub fn load_for_update(&self) -> anyhow::Result<Loaded> {
        let Some(data) = self.read()? else {
            return Ok(Loaded::default());
        };
        match parse(&data, &self.path) {
            Ok(tasks) => Ok(Loaded {
                tasks,
                moved_aside: None,
            }),
            Err(err) => {
                let backup = self.move_aside()?;
                tracing::error!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    "unparseable task file moved aside: {err:#}"
                );
                Ok(Loaded {
                    tasks: Vec::new(),
                    moved_aside: Some(backup),
                })
            }
        }
    }

    /// `None` when there is no file or it holds only whitespace.
    fn read(&self) -> anyhow::Result<Option<Vec<u8>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(data))
    }

    /// Renames the file to `<name>.corrupt-<utc timestamp>`.
    fn move_aside(&self) -> anyhow::Result<PathBuf> {
        let stamp = OffsetDateTime::now_utc()
            .format(BACKUP_STAMP)
            .context("failed to format backup timestamp")?;
        let name = self
            .path
            .file_name()
            .map_or_else(|| "tasks".into(), |n| n.to_string_lossy().into_owned());
        let mut backup = self.path.with_file_name(format!("{name}.corrupt-{stamp}"));
        let mut n = 1;
        while backup.exists() {
            backup = self
                .path
                .with_file_name(format!("{name}.corrupt-{stamp}-{n}"));
            n += 1;
        }
        std::fs::rename(&self.path, &backup).with_context(|| {
            format!("failed to move {} aside to {}", self.path.display(), backup.display())
        })?;
        Ok(backup)
    }

    /// Replaces the persisted set with `tasks`.
    pub fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(tasks)?;
        std::fs::write(&tmp, &data)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path).with_context(|| {
            format!("failed to rename {} -> {}", tmp.display(), self.path.display())
        })?;
        tracing::info!(path = %self.path.display(), count = tasks.len(), "saved task list");
        Ok(())
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        self.save(&[])
    }

    #[must_use]
    pub fn next_id(tasks: &[Task]) -> u64 {
        tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }
}

fn parse(data: &[u8], path: &Path) -> anyhow::Result<Vec<Task>> {
    serde_json::from_slice(data).with_context(|| format!("failed to parse {}", path.display()))
}
