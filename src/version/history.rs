use std::time::Duration;

use anyhow::Result;

use unpack::Unpacked;
use util::HashMap;

use crate::fs::{Fs, Layout};

use super::{VersionedTaskId, WorkflowVersionInfo};

/// Pause before deleting a corrupt version directory, in case it is
/// mid-write by a slow filesystem.
const CORRUPT_DELETE_DELAY: Duration = Duration::from_millis(500);

/// All version infos successfully loaded from the versions directory,
/// ordered by version number.
#[derive(Debug, Default)]
pub struct WorkflowVersionHistory {
    infos: Vec<WorkflowVersionInfo>,
}

impl WorkflowVersionHistory {
    /// Load all prior version infos from `versions/`.
    ///
    /// Directories that fail to parse are deleted (after a bounded delay)
    /// with a warning; a single bad directory never aborts startup. This
    /// is the one side-effectful startup phase, so call it exactly once,
    /// before any visitor runs.
    pub fn load(fs: &Fs, layout: &Layout) -> Result<Self> {
        let root = layout.versions_root();
        if !fs.exists(&root) {
            return Ok(Self::default());
        }

        let mut infos = Vec::new();
        for entry in fs.read_dir(&root)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            match WorkflowVersionInfo::load(fs, &path) {
                Ok(info) => infos.push(info),
                Err(e) => {
                    log::warn!("Discarding corrupt version directory {path:?}: {e:#}");
                    std::thread::sleep(CORRUPT_DELETE_DELAY);
                    if let Err(e) = fs.delete_dir(&path) {
                        log::warn!("Unable to delete corrupt version directory {path:?}: {e:#}");
                    }
                }
            }
        }

        infos.sort_by_key(|info| info.version);
        log::debug!("loaded {} workflow version(s)", infos.len());
        Ok(Self { infos })
    }

    pub fn infos(&self) -> &[WorkflowVersionInfo] {
        &self.infos
    }

    /// Highest version seen in a prior run, if any.
    pub fn prev_version(&self) -> Option<u32> {
        self.infos.iter().map(|info| info.version).max()
    }

    /// Version number the current run will record.
    pub fn next_version(&self) -> u32 {
        self.prev_version().map_or(1, |v| v + 1)
    }

    /// Collapse the history into a single lookup view.
    pub fn union(&self) -> UnionWorkflowVersionInfo {
        let mut latest: HashMap<(String, String), u32> = HashMap::default();
        for info in &self.infos {
            for id in &info.tasks {
                let key = (id.task.clone(), id.realization.clone());
                let entry = latest.entry(key).or_insert(id.version);
                if id.version > *entry {
                    *entry = id.version;
                }
            }
        }
        UnionWorkflowVersionInfo {
            latest,
            fallback: self.prev_version().unwrap_or(0),
        }
    }
}

/// View over the whole history answering "what version should I consider
/// the latest of this real task?".
#[derive(Debug)]
pub struct UnionWorkflowVersionInfo {
    latest: HashMap<(String, String), u32>,
    /// Returned for tasks with no prior occurrence (freshly introduced).
    fallback: u32,
}

impl UnionWorkflowVersionInfo {
    /// Highest prior version of `(task, realization)`, or the fallback.
    pub fn lookup(&self, task: &str, realization: &str) -> u32 {
        self.latest
            .get(&(task.to_owned(), realization.to_owned()))
            .copied()
            .unwrap_or(self.fallback)
    }

    pub fn fallback_version(&self) -> u32 {
        self.fallback
    }

    /// Stamp every realized task with the version whose outputs it may
    /// reuse, in emission order.
    pub fn assign(&self, cx: &Unpacked) -> Vec<VersionedTaskId> {
        cx.iter()
            .map(|(id, task)| VersionedTaskId {
                task: cx.task_name(id).to_owned(),
                realization: task.realization.clone(),
                version: self.lookup(cx.task_name(id), &task.realization),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn setup() -> (tempfile::TempDir, Fs, Layout) {
        let dir = tempfile::tempdir().unwrap();
        let fs = Fs::new(dir.path());
        let layout = Layout::new(dir.path(), dir.path());
        (dir, fs, layout)
    }

    #[test]
    fn test_empty_history() {
        let (_dir, fs, layout) = setup();
        let history = WorkflowVersionHistory::load(&fs, &layout).unwrap();
        assert_eq!(history.prev_version(), None);
        assert_eq!(history.next_version(), 1);
        assert_eq!(history.union().fallback_version(), 0);
    }

    #[test]
    fn test_round_trip() {
        let (_dir, fs, layout) = setup();
        let info = WorkflowVersionInfo::new(1, vec![("x", "baseline"), ("y", "small")]);
        info.write(&fs, &layout).unwrap();

        let history = WorkflowVersionHistory::load(&fs, &layout).unwrap();
        assert_eq!(history.infos(), std::slice::from_ref(&info));
        assert_eq!(history.prev_version(), Some(1));
        assert_eq!(history.next_version(), 2);
    }

    #[test]
    fn test_corrupt_dir_is_dropped_and_deleted() {
        let (_dir, fs, layout) = setup();
        WorkflowVersionInfo::new(1, vec![("x", "baseline")])
            .write(&fs, &layout)
            .unwrap();

        // a version dir with an unparseable tasks file
        let corrupt = layout.version_dir(2);
        fs.create_dir(&corrupt).unwrap();
        fs.write_file(corrupt.join("tasks"), "{ not json").unwrap();
        // and one missing its tasks file entirely
        let incomplete = layout.version_dir(3);
        fs.create_dir(&incomplete).unwrap();

        let history = WorkflowVersionHistory::load(&fs, &layout).unwrap();
        assert_eq!(history.prev_version(), Some(1));
        assert!(!corrupt.exists(), "corrupt dir was deleted");
        assert!(!incomplete.exists(), "incomplete dir was deleted");
    }

    #[test]
    fn test_union_prefers_highest_version() {
        let (_dir, fs, layout) = setup();
        WorkflowVersionInfo::new(1, vec![("x", "baseline"), ("y", "baseline")])
            .write(&fs, &layout)
            .unwrap();
        WorkflowVersionInfo::new(2, vec![("x", "baseline")])
            .write(&fs, &layout)
            .unwrap();

        let union = WorkflowVersionHistory::load(&fs, &layout).unwrap().union();
        assert_eq!(union.lookup("x", "baseline"), 2);
        assert_eq!(union.lookup("y", "baseline"), 1);
        // freshly introduced task falls back to the current max
        assert_eq!(union.lookup("z", "baseline"), 2);
        assert_eq!(union.fallback_version(), 2);
    }
}
