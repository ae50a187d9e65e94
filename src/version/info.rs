use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fs::{Fs, Layout};

use super::Error;

/// Identity of a concrete task at a specific workflow version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionedTaskId {
    pub task: String,
    pub realization: String,
    pub version: u32,
}

/// The set of concrete tasks that existed at one prior workflow run.
///
/// Persisted as JSON in `versions/<N>/tasks`; parseability is the
/// integrity test for the whole directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowVersionInfo {
    pub version: u32,
    pub tasks: Vec<VersionedTaskId>,
}

impl WorkflowVersionInfo {
    /// Stamp `(task, realization)` pairs with `version`.
    pub fn new<'a, I>(version: u32, tasks: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            version,
            tasks: tasks
                .into_iter()
                .map(|(task, realization)| VersionedTaskId {
                    task: task.to_owned(),
                    realization: realization.to_owned(),
                    version,
                })
                .collect(),
        }
    }

    /// Version recorded for `(task, realization)`, if present.
    pub fn lookup(&self, task: &str, realization: &str) -> Option<u32> {
        self.tasks
            .iter()
            .find(|id| id.task == task && id.realization == realization)
            .map(|id| id.version)
    }

    /// Persist this info under its version directory.
    pub fn write(&self, fs: &Fs, layout: &Layout) -> Result<()> {
        fs.create_dir(layout.version_dir(self.version))?;
        let json = serde_json::to_string_pretty(self)?;
        fs.write_file(layout.version_tasks_file(self.version), &json)
    }

    /// Read one version directory back. Any failure here marks the
    /// directory as corrupt.
    pub(crate) fn load(fs: &Fs, dir: &Path) -> Result<Self> {
        let dir_version: u32 = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::BadDirName(format!("{dir:?}")))?
            .parse()
            .map_err(|_| Error::BadDirName(format!("{dir:?}")))?;

        let text = fs
            .read_to_string(dir.join("tasks"))
            .context("reading tasks file")?;
        let info: Self = serde_json::from_str(&text).context("parsing tasks file")?;

        if info.version != dir_version {
            return Err(Error::VersionMismatch {
                claimed: info.version,
                dir: dir_version,
            }
            .into());
        }
        Ok(info)
    }
}
