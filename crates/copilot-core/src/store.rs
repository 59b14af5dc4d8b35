//! Configuration store contract: the remote registry of applications,
//! environments and workloads.

use crate::error::Result;
use crate::types::{Application, Environment, Workload, WorkloadKind};

/// CRUD over the records an application owns.
///
/// Lookups of a missing record fail with the matching `*NotFound` error.
/// Deletes of a missing record succeed.
pub trait ConfigStore {
    fn list_applications(&self) -> Result<Vec<Application>>;
    fn get_application(&self, app: &str) -> Result<Application>;
    fn delete_application(&self, app: &str) -> Result<()>;

    fn list_environments(&self, app: &str) -> Result<Vec<Environment>>;
    fn get_environment(&self, app: &str, env: &str) -> Result<Environment>;
    fn delete_environment(&self, app: &str, env: &str) -> Result<()>;

    fn list_services(&self, app: &str) -> Result<Vec<Workload>>;
    fn list_jobs(&self, app: &str) -> Result<Vec<Workload>>;
    fn get_workload(&self, app: &str, name: &str, kind: WorkloadKind) -> Result<Workload>;
    fn delete_workload(&self, app: &str, name: &str, kind: WorkloadKind) -> Result<()>;

    fn list_workloads(&self, app: &str, kind: WorkloadKind) -> Result<Vec<Workload>> {
        match kind {
            WorkloadKind::Service => self.list_services(app),
            WorkloadKind::Job => self.list_jobs(app),
        }
    }
}
