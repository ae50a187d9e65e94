use std::path::{Path, PathBuf};

/// Pure mapping from (task name, realization name) to on-disk locations.
///
/// ```text
/// <root>/<task>/<realization>/work/      task CWD
/// <root>/<task>/<realization>/<output>   declared outputs
/// <root>/versions/<N>/tasks              per-version metadata
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    /// Directory containing the workflow file; relative literal input
    /// paths resolve against it.
    workflow_dir: PathBuf,
}

impl Layout {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(root: P, workflow_dir: Q) -> Self {
        Self {
            root: root.into(),
            workflow_dir: workflow_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// $ROOT/task_name
    pub fn task_dir(&self, task: &str) -> PathBuf {
        self.root.join(task)
    }

    /// $ROOT/task_name/realization_name
    pub fn realization_dir(&self, task: &str, realization: &str) -> PathBuf {
        self.task_dir(task).join(realization)
    }

    /// $ROOT/task_name/realization_name/work
    pub fn work(&self, task: &str, realization: &str) -> PathBuf {
        self.realization_dir(task, realization).join("work")
    }

    /// $ROOT/task_name/realization_name/output_name
    pub fn out(&self, task: &str, realization: &str, output: &str) -> PathBuf {
        self.realization_dir(task, realization).join(output)
    }

    /// $ROOT/versions
    pub fn versions_root(&self) -> PathBuf {
        self.root.join("versions")
    }

    /// $ROOT/versions/N
    pub fn version_dir(&self, version: u32) -> PathBuf {
        self.versions_root().join(version.to_string())
    }

    /// $ROOT/versions/N/tasks
    pub fn version_tasks_file(&self, version: u32) -> PathBuf {
        self.version_dir(version).join("tasks")
    }

    /// Resolve a literal input path: absolute paths pass through, relative
    /// paths are relative to the workflow file's directory.
    pub fn resolve_literal(&self, val: &str) -> PathBuf {
        let path = Path::new(val);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workflow_dir.join(path)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = Layout::new("/out", "/conf");
        assert_eq!(
            layout.work("align", "small"),
            PathBuf::from("/out/align/small/work")
        );
        assert_eq!(
            layout.out("align", "small", "scores"),
            PathBuf::from("/out/align/small/scores")
        );
        assert_eq!(
            layout.version_tasks_file(3),
            PathBuf::from("/out/versions/3/tasks")
        );
    }

    #[test]
    fn test_literal_resolution() {
        let layout = Layout::new("/out", "/conf");
        assert_eq!(
            layout.resolve_literal("./corpus.txt"),
            PathBuf::from("/conf/./corpus.txt")
        );
        assert_eq!(
            layout.resolve_literal("/abs/corpus.txt"),
            PathBuf::from("/abs/corpus.txt")
        );
    }
}
