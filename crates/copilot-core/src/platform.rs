//! Contracts for the remote services the workflows drive.
//!
//! Every method takes the [`Session`] it must run under so that a single
//! client value can serve the default account, other regions and
//! environment roles alike.

use crate::error::Result;
use crate::logs::LogQueryService;
use crate::store::ConfigStore;
use crate::types::{Application, RegionalResources, TaskStack};
use std::fmt;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Credential scope for a remote call: a region plus an optional role to assume.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    pub region: String,
    pub role_arn: Option<String>,
}

impl Session {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            role_arn: None,
        }
    }

    pub fn with_role(region: impl Into<String>, role_arn: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            role_arn: Some(role_arn.into()),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role_arn {
            Some(role) => write!(f, "{} ({role})", self.region),
            None => f.write_str(&self.region),
        }
    }
}

pub trait SessionProvider {
    /// Session for the default credential chain and region.
    fn default_session(&self) -> Result<Session>;
    fn with_region(&self, region: &str) -> Result<Session>;
    fn from_role(&self, role_arn: &str, region: &str) -> Result<Session>;
}

// ---------------------------------------------------------------------------
// Deployer
// ---------------------------------------------------------------------------

/// Infrastructure stacks. Deleting a stack that does not exist fails with
/// `CopilotError::StackNotFound`; callers decide whether that is success.
pub trait Deployer {
    fn regional_app_resources(
        &self,
        session: &Session,
        app: &Application,
    ) -> Result<Vec<RegionalResources>>;
    fn list_task_stacks(&self, session: &Session, app: &str, env: &str) -> Result<Vec<TaskStack>>;
    fn delete_task(&self, session: &Session, task: &TaskStack) -> Result<()>;
    fn delete_workload(&self, session: &Session, app: &str, env: &str, name: &str) -> Result<()>;
    fn delete_environment(&self, session: &Session, app: &str, env: &str) -> Result<()>;
    fn delete_pipeline(&self, session: &Session, name: &str) -> Result<()>;
    fn delete_app(&self, session: &Session, app: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Cleanup services
// ---------------------------------------------------------------------------

/// A missing bucket counts as empty.
pub trait BucketEmptier {
    fn empty_bucket(&self, session: &Session, bucket: &str) -> Result<()>;
}

/// A missing repository counts as empty.
pub trait ImageRemover {
    fn clear_repository(&self, session: &Session, repo: &str) -> Result<()>;
}

pub trait ResourceTagger {
    /// Identifiers of live stacks tagged for `app`/`env` that belong to a
    /// service or job.
    fn workload_resources(&self, session: &Session, app: &str, env: &str) -> Result<Vec<String>>;
}

pub trait SecretRemover {
    /// Deleting a missing secret succeeds.
    fn delete_secret(&self, session: &Session, secret: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Every remote collaborator a workflow may need, borrowed for its lifetime.
#[derive(Clone, Copy)]
pub struct Platform<'a> {
    pub store: &'a dyn ConfigStore,
    pub sessions: &'a dyn SessionProvider,
    pub deployer: &'a dyn Deployer,
    pub buckets: &'a dyn BucketEmptier,
    pub images: &'a dyn ImageRemover,
    pub tagger: &'a dyn ResourceTagger,
    pub secrets: &'a dyn SecretRemover,
    pub logs: &'a dyn LogQueryService,
}
