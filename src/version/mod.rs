//! Per-run version metadata: which concrete tasks existed at which integer
//! workflow version, persisted under `versions/<N>/`.

mod info;
pub use info::{VersionedTaskId, WorkflowVersionInfo};

mod history;
pub use history::{UnionWorkflowVersionInfo, WorkflowVersionHistory};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Version directory has a non-numeric name: {0:?}")]
    BadDirName(String),
    #[error("Version file claims version {claimed} but lives in directory {dir}")]
    VersionMismatch { claimed: u32, dir: u32 },
}
