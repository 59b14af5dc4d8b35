use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    #[serde(rename = "account")]
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub app: String,
    pub name: String,
    pub region: String,
    #[serde(rename = "accountID")]
    pub account_id: String,
    #[serde(rename = "managerRoleARN")]
    pub manager_role_arn: String,
    #[serde(rename = "executionRoleARN")]
    pub execution_role_arn: String,
    #[serde(default)]
    pub prod: bool,
}

// ---------------------------------------------------------------------------
// Workload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    #[default]
    Service,
    Job,
}

impl WorkloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadKind::Service => "service",
            WorkloadKind::Job => "job",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service or job belonging to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub app: String,
    pub name: String,
    pub kind: WorkloadKind,
    /// Manifest type, e.g. "Load Balanced Web Service" or "Scheduled Job".
    #[serde(rename = "type")]
    pub workload_type: String,
}

// ---------------------------------------------------------------------------
// Ad-hoc tasks
// ---------------------------------------------------------------------------

pub const TASK_STACK_PREFIX: &str = "task-";
const TASK_REPO_PREFIX: &str = "copilot-";

/// A one-off task deployed into an environment outside the workload model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStack {
    pub name: String,
    pub app: String,
    pub env: String,
}

impl TaskStack {
    /// Build from a stack name of the form `task-{name}`.
    pub fn from_stack_name(stack_name: &str, app: &str, env: &str) -> Option<Self> {
        let name = stack_name.strip_prefix(TASK_STACK_PREFIX)?;
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            app: app.to_string(),
            env: env.to_string(),
        })
    }

    pub fn stack_name(&self) -> String {
        format!("{TASK_STACK_PREFIX}{}", self.name)
    }

    pub fn ecr_repo_name(&self) -> String {
        format!("{TASK_REPO_PREFIX}{}", self.name)
    }
}

// ---------------------------------------------------------------------------
// RegionalResources
// ---------------------------------------------------------------------------

/// Per-region application resources created alongside the application stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalResources {
    pub region: String,
    pub bucket: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_stack_names() {
        let task = TaskStack::from_stack_name("task-db-migrate", "my-app", "test").unwrap();
        assert_eq!(task.name, "db-migrate");
        assert_eq!(task.stack_name(), "task-db-migrate");
        assert_eq!(task.ecr_repo_name(), "copilot-db-migrate");
    }

    #[test]
    fn non_task_stacks_are_rejected() {
        assert!(TaskStack::from_stack_name("my-app-test", "my-app", "test").is_none());
        assert!(TaskStack::from_stack_name("task-", "my-app", "test").is_none());
    }

    #[test]
    fn environment_record_json() {
        let json = r#"{
            "app": "my-app",
            "name": "test",
            "region": "us-west-2",
            "accountID": "123456789012",
            "managerRoleARN": "arn:aws:iam::123456789012:role/my-app-test-EnvManagerRole",
            "executionRoleARN": "arn:aws:iam::123456789012:role/my-app-test-CFNExecutionRole"
        }"#;
        let env: Environment = serde_json::from_str(json).unwrap();
        assert_eq!(env.region, "us-west-2");
        assert!(!env.prod);
    }

    #[test]
    fn workload_kind_display() {
        assert_eq!(WorkloadKind::Service.to_string(), "service");
        assert_eq!(WorkloadKind::Job.to_string(), "job");
    }
}
