use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const WORKSPACE_DIR: &str = "copilot";
pub const SUMMARY_FILE: &str = "copilot/.workspace";
pub const PIPELINE_MANIFEST: &str = "copilot/pipeline.yml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn workspace_dir(root: &Path) -> PathBuf {
    root.join(WORKSPACE_DIR)
}

pub fn summary_path(root: &Path) -> PathBuf {
    root.join(SUMMARY_FILE)
}

pub fn pipeline_manifest_path(root: &Path) -> PathBuf {
    root.join(PIPELINE_MANIFEST)
}

/// Walk upward from `start` looking for a directory that holds a workspace
/// summary file.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| summary_path(dir).is_file())
        .map(Path::to_path_buf)
}
