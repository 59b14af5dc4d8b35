use copilot_core::paths::find_workspace_root;
use std::path::{Path, PathBuf};

/// Resolve the workspace root directory.
///
/// Priority:
/// 1. `--root` flag / `COPILOT_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `copilot/.workspace`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(&cwd)
}

fn resolve_from(cwd: &Path) -> PathBuf {
    if let Some(root) = find_workspace_root(cwd) {
        return root;
    }
    cwd.ancestors()
        .find(|dir| dir.join(".git").is_dir())
        .unwrap_or(cwd)
        .to_path_buf()
}
