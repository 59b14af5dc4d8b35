//! The local workspace: a `copilot/` directory in a repository that ties it
//! to one application and may hold a pipeline manifest.
//!
//! Layout:
//!   copilot/
//!     .workspace     summary marker (`application: <name>`)
//!     pipeline.yml   pipeline manifest, optional

use crate::error::Result;
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub application: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSourceProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Secret holding the source provider access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSource {
    pub provider: String,
    #[serde(default)]
    pub properties: PipelineSourceProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineManifest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PipelineSource>,
}

impl PipelineManifest {
    pub fn access_token_secret(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|s| s.properties.access_token_secret.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Workspace contract
// ---------------------------------------------------------------------------

pub trait Workspace {
    fn summary(&self) -> Result<Option<WorkspaceSummary>>;
    fn pipeline(&self) -> Result<Option<PipelineManifest>>;
    /// Remove the summary marker. A missing marker is success.
    fn delete_workspace_file(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// LocalWorkspace
// ---------------------------------------------------------------------------

/// Workspace backed by files under `root/copilot/`.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    Ok(Some(serde_yaml::from_str(&data)?))
}

impl Workspace for LocalWorkspace {
    fn summary(&self) -> Result<Option<WorkspaceSummary>> {
        read_yaml(&paths::summary_path(&self.root))
    }

    fn pipeline(&self) -> Result<Option<PipelineManifest>> {
        read_yaml(&paths::pipeline_manifest_path(&self.root))
    }

    fn delete_workspace_file(&self) -> Result<()> {
        let path = paths::summary_path(&self.root);
        if !io::remove_if_exists(&path)? {
            tracing::debug!(path = %path.display(), "workspace file already removed");
        }
        Ok(())
    }
}
