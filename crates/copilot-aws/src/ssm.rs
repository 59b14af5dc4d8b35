//! `ConfigStore` on SSM Parameter Store.
//!
//! Records are JSON parameter values:
//!   /copilot/applications/{app}
//!   /copilot/applications/{app}/environments/{env}
//!   /copilot/applications/{app}/components/{name}

use crate::error::AwsError;
use crate::session::AwsClients;
use aws_sdk_ssm::operation::delete_parameter::DeleteParameterError;
use aws_sdk_ssm::operation::get_parameter::GetParameterError;
use aws_sdk_ssm::Client as SsmClient;
use copilot_core::platform::SessionProvider;
use copilot_core::store::ConfigStore;
use copilot_core::types::{Application, Environment, Workload, WorkloadKind};
use copilot_core::{CopilotError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

const ROOT: &str = "/copilot/applications";

/// Workload types deployed as jobs; every other type is a service.
const JOB_TYPES: &[&str] = &["Scheduled Job"];

fn app_key(app: &str) -> String {
    format!("{ROOT}/{app}")
}

fn envs_path(app: &str) -> String {
    format!("{ROOT}/{app}/environments")
}

fn env_key(app: &str, env: &str) -> String {
    format!("{}/{env}", envs_path(app))
}

fn workloads_path(app: &str) -> String {
    format!("{ROOT}/{app}/components")
}

fn workload_key(app: &str, name: &str) -> String {
    format!("{}/{name}", workloads_path(app))
}

#[derive(Debug, Deserialize)]
struct WorkloadRecord {
    app: String,
    name: String,
    #[serde(rename = "type")]
    workload_type: String,
}

impl From<WorkloadRecord> for Workload {
    fn from(r: WorkloadRecord) -> Self {
        let kind = if JOB_TYPES.contains(&r.workload_type.as_str()) {
            WorkloadKind::Job
        } else {
            WorkloadKind::Service
        };
        Workload {
            app: r.app,
            name: r.name,
            kind,
            workload_type: r.workload_type,
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &str) -> std::result::Result<T, AwsError> {
    serde_json::from_str(value).map_err(|source| AwsError::Record {
        key: key.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Parameter access
// ---------------------------------------------------------------------------

async fn parameters_by_path(
    client: &SsmClient,
    path: &str,
) -> std::result::Result<Vec<(String, String)>, AwsError> {
    let mut out = Vec::new();
    let mut next_token: Option<String> = None;
    loop {
        let resp = client
            .get_parameters_by_path()
            .path(path)
            .recursive(false)
            .set_next_token(next_token.take())
            .send()
            .await
            .map_err(AwsError::service("ssm", "GetParametersByPath"))?;
        for p in resp.parameters.unwrap_or_default() {
            if let (Some(name), Some(value)) = (p.name, p.value) {
                out.push((name, value));
            }
        }
        match resp.next_token {
            Some(token) => next_token = Some(token),
            None => return Ok(out),
        }
    }
}

impl AwsClients {
    fn ssm(&self) -> Result<SsmClient> {
        let session = self.default_session()?;
        Ok(SsmClient::new(&self.config(&session)))
    }

    fn get_parameter(&self, key: &str) -> Result<Option<String>> {
        let client = self.ssm()?;
        debug!(key, "ssm get parameter");
        let result = self.block_on(client.get_parameter().name(key).send());
        match result {
            Ok(out) => Ok(out.parameter.and_then(|p| p.value)),
            Err(e) => {
                let err = e.into_service_error();
                if matches!(err, GetParameterError::ParameterNotFound(_)) {
                    Ok(None)
                } else {
                    Err(AwsError::service("ssm", "GetParameter")(err).into())
                }
            }
        }
    }

    /// Values of the direct children of `path`, keyed by parameter name.
    fn parameters_under(&self, path: &str) -> Result<Vec<(String, String)>> {
        let client = self.ssm()?;
        debug!(path, "ssm get parameters by path");
        Ok(self.block_on(parameters_by_path(&client, path))?)
    }

    fn delete_parameter(&self, key: &str) -> Result<()> {
        let client = self.ssm()?;
        debug!(key, "ssm delete parameter");
        match self.block_on(client.delete_parameter().name(key).send()) {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = e.into_service_error();
                if matches!(err, DeleteParameterError::ParameterNotFound(_)) {
                    debug!(key, "parameter already deleted");
                    Ok(())
                } else {
                    Err(AwsError::service("ssm", "DeleteParameter")(err).into())
                }
            }
        }
    }

    fn list_records<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut records = Vec::new();
        for (key, value) in self.parameters_under(path)? {
            records.push(decode(&key, &value)?);
        }
        Ok(records)
    }

    fn list_workload_records(&self, app: &str, kind: WorkloadKind) -> Result<Vec<Workload>> {
        let records: Vec<WorkloadRecord> = self.list_records(&workloads_path(app))?;
        Ok(records
            .into_iter()
            .map(Workload::from)
            .filter(|w| w.kind == kind)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// ConfigStore
// ---------------------------------------------------------------------------

impl ConfigStore for AwsClients {
    fn list_applications(&self) -> Result<Vec<Application>> {
        self.list_records(ROOT)
    }

    fn get_application(&self, app: &str) -> Result<Application> {
        let key = app_key(app);
        match self.get_parameter(&key)? {
            Some(value) => Ok(decode(&key, &value)?),
            None => Err(CopilotError::ApplicationNotFound(app.to_string())),
        }
    }

    fn delete_application(&self, app: &str) -> Result<()> {
        self.delete_parameter(&app_key(app))
    }

    fn list_environments(&self, app: &str) -> Result<Vec<Environment>> {
        self.list_records(&envs_path(app))
    }

    fn get_environment(&self, app: &str, env: &str) -> Result<Environment> {
        let key = env_key(app, env);
        match self.get_parameter(&key)? {
            Some(value) => Ok(decode(&key, &value)?),
            None => Err(CopilotError::EnvironmentNotFound {
                app: app.to_string(),
                env: env.to_string(),
            }),
        }
    }

    fn delete_environment(&self, app: &str, env: &str) -> Result<()> {
        self.delete_parameter(&env_key(app, env))
    }

    fn list_services(&self, app: &str) -> Result<Vec<Workload>> {
        self.list_workload_records(app, WorkloadKind::Service)
    }

    fn list_jobs(&self, app: &str) -> Result<Vec<Workload>> {
        self.list_workload_records(app, WorkloadKind::Job)
    }

    fn get_workload(&self, app: &str, name: &str, kind: WorkloadKind) -> Result<Workload> {
        let key = workload_key(app, name);
        let not_found = || CopilotError::WorkloadNotFound {
            app: app.to_string(),
            name: name.to_string(),
        };
        let value = self.get_parameter(&key)?.ok_or_else(not_found)?;
        let workload = Workload::from(decode::<WorkloadRecord>(&key, &value)?);
        if workload.kind != kind {
            return Err(not_found());
        }
        Ok(workload)
    }

    fn delete_workload(&self, app: &str, name: &str, _kind: WorkloadKind) -> Result<()> {
        self.delete_parameter(&workload_key(app, name))
    }
}
