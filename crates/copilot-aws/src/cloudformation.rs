//! `Deployer` on CloudFormation.
//!
//! Stack names:
//!   {app}-infrastructure-roles   application control plane
//!   {app}-infrastructure         stack set with one instance per region
//!   {app}-{env}                  environment
//!   {app}-{env}-{workload}       service or job
//!   task-{name}                  ad-hoc task
//!   {pipeline}                   pipeline

use crate::error::AwsError;
use crate::session::AwsClients;
use crate::tagging;
use aws_sdk_cloudformation::client::Waiters;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::operation::describe_stacks::DescribeStacksError;
use aws_sdk_cloudformation::operation::list_stack_instances::ListStackInstancesError;
use aws_sdk_cloudformation::types::{Output, Stack, StackSetOperationStatus};
use aws_sdk_cloudformation::Client as CfnClient;
use copilot_core::platform::{Deployer, Session, SessionProvider};
use copilot_core::types::{Application, RegionalResources, TaskStack};
use copilot_core::{CopilotError, Result};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};

const STACK_DELETE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const STACK_SET_POLL_INTERVAL: Duration = Duration::from_secs(3);
const PIPELINE_BUCKET_OUTPUT: &str = "PipelineBucket";

fn app_roles_stack(app: &str) -> String {
    format!("{app}-infrastructure-roles")
}

fn app_stack_set(app: &str) -> String {
    format!("{app}-infrastructure")
}

fn env_stack(app: &str, env: &str) -> String {
    format!("{app}-{env}")
}

fn workload_stack(app: &str, env: &str, name: &str) -> String {
    format!("{app}-{env}-{name}")
}

/// CloudFormation reports a missing stack as a generic validation error.
fn is_missing_stack(err: &DescribeStacksError) -> bool {
    err.code() == Some("ValidationError")
        && err.message().is_some_and(|m| m.contains("does not exist"))
}

fn pipeline_bucket(outputs: &[Output]) -> Option<String> {
    outputs
        .iter()
        .find(|o| o.output_key.as_deref() == Some(PIPELINE_BUCKET_OUTPUT))
        .and_then(|o| o.output_value.clone())
}

// ---------------------------------------------------------------------------
// Stack operations
// ---------------------------------------------------------------------------

async fn describe_stack(client: &CfnClient, name: &str) -> Result<Stack> {
    let out = client
        .describe_stacks()
        .stack_name(name)
        .send()
        .await
        .map_err(|e| {
            let err = e.into_service_error();
            if is_missing_stack(&err) {
                CopilotError::StackNotFound(name.to_string())
            } else {
                AwsError::service("cloudformation", "DescribeStacks")(err).into()
            }
        })?;
    out.stacks
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| CopilotError::StackNotFound(name.to_string()))
}

/// Delete `name` and wait for the deletion to finish.
async fn delete_stack(client: &CfnClient, name: &str) -> Result<()> {
    describe_stack(client, name).await?;
    info!(stack = name, "deleting stack");
    client
        .delete_stack()
        .stack_name(name)
        .send()
        .await
        .map_err(AwsError::service("cloudformation", "DeleteStack"))?;
    client
        .wait_until_stack_delete_complete()
        .stack_name(name)
        .wait(STACK_DELETE_TIMEOUT)
        .await
        .map_err(AwsError::service("cloudformation", "WaitUntilStackDeleteComplete"))?;
    debug!(stack = name, "stack deleted");
    Ok(())
}

/// Stack set instances as (account, region, stack id). A missing stack set has none.
async fn stack_set_instances(
    client: &CfnClient,
    stack_set: &str,
) -> Result<Vec<(Option<String>, String, Option<String>)>> {
    let mut instances = Vec::new();
    let mut next_token: Option<String> = None;
    loop {
        let resp = match client
            .list_stack_instances()
            .stack_set_name(stack_set)
            .set_next_token(next_token.take())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let err = e.into_service_error();
                if matches!(err, ListStackInstancesError::StackSetNotFoundException(_)) {
                    debug!(stack_set, "stack set not found");
                    return Ok(Vec::new());
                }
                return Err(AwsError::service("cloudformation", "ListStackInstances")(err).into());
            }
        };
        for summary in resp.summaries.unwrap_or_default() {
            if let Some(region) = summary.region {
                instances.push((summary.account, region, summary.stack_id));
            }
        }
        match resp.next_token {
            Some(token) => next_token = Some(token),
            None => return Ok(instances),
        }
    }
}

async fn wait_for_stack_set_operation(
    client: &CfnClient,
    stack_set: &str,
    operation_id: &str,
) -> Result<()> {
    loop {
        let resp = client
            .describe_stack_set_operation()
            .stack_set_name(stack_set)
            .operation_id(operation_id)
            .send()
            .await
            .map_err(AwsError::service("cloudformation", "DescribeStackSetOperation"))?;
        let status = resp.stack_set_operation.and_then(|op| op.status);
        match status {
            Some(StackSetOperationStatus::Succeeded) => return Ok(()),
            Some(StackSetOperationStatus::Running)
            | Some(StackSetOperationStatus::Queued)
            | Some(StackSetOperationStatus::Stopping)
            | None => tokio::time::sleep(STACK_SET_POLL_INTERVAL).await,
            Some(other) => {
                return Err(AwsError::StackSetOperation {
                    stack_set: stack_set.to_string(),
                    operation_id: operation_id.to_string(),
                    status: other.as_str().to_string(),
                }
                .into())
            }
        }
    }
}

/// Remove every instance of the application stack set, then the set itself.
async fn delete_stack_set(client: &CfnClient, stack_set: &str) -> Result<()> {
    let instances = stack_set_instances(client, stack_set).await?;
    if !instances.is_empty() {
        let accounts: BTreeSet<String> = instances.iter().filter_map(|(a, _, _)| a.clone()).collect();
        let regions: BTreeSet<String> = instances.iter().map(|(_, r, _)| r.clone()).collect();
        info!(stack_set, regions = regions.len(), "deleting stack set instances");
        let resp = client
            .delete_stack_instances()
            .stack_set_name(stack_set)
            .set_accounts(Some(accounts.into_iter().collect()))
            .set_regions(Some(regions.into_iter().collect()))
            .retain_stacks(false)
            .send()
            .await
            .map_err(AwsError::service("cloudformation", "DeleteStackInstances"))?;
        if let Some(operation_id) = resp.operation_id {
            wait_for_stack_set_operation(client, stack_set, &operation_id).await?;
        }
    }

    match client.delete_stack_set().stack_set_name(stack_set).send().await {
        Ok(_) => Ok(()),
        Err(e) => {
            let err = e.into_service_error();
            if err.code() == Some("StackSetNotFoundException") {
                Ok(())
            } else {
                Err(AwsError::service("cloudformation", "DeleteStackSet")(err).into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Deployer
// ---------------------------------------------------------------------------

impl AwsClients {
    pub(crate) fn cloudformation(&self, session: &Session) -> CfnClient {
        CfnClient::new(&self.config(session))
    }

    fn delete_stack_in(&self, session: &Session, name: &str) -> Result<()> {
        let client = self.cloudformation(session);
        self.block_on(delete_stack(&client, name))
    }
}

impl Deployer for AwsClients {
    fn regional_app_resources(
        &self,
        session: &Session,
        app: &Application,
    ) -> Result<Vec<RegionalResources>> {
        let client = self.cloudformation(session);
        let stack_set = app_stack_set(&app.name);
        let instances = self.block_on(stack_set_instances(&client, &stack_set))?;

        let mut resources = Vec::new();
        for (_, region, stack_id) in instances {
            let Some(stack_id) = stack_id else { continue };
            let regional = self.cloudformation(&self.with_region(&region)?);
            let stack = match self.block_on(describe_stack(&regional, &stack_id)) {
                Ok(stack) => stack,
                Err(e) if e.is_stack_not_found() => continue,
                Err(e) => return Err(e),
            };
            if let Some(bucket) = pipeline_bucket(stack.outputs.as_deref().unwrap_or_default()) {
                resources.push(RegionalResources { region, bucket });
            }
        }
        Ok(resources)
    }

    fn list_task_stacks(&self, session: &Session, app: &str, env: &str) -> Result<Vec<TaskStack>> {
        let arns = self.block_on(tagging::task_stack_arns(&self.tagging(session), app, env))?;
        Ok(arns
            .iter()
            .filter_map(|arn| tagging::stack_name_from_arn(arn))
            .filter_map(|name| TaskStack::from_stack_name(name, app, env))
            .collect())
    }

    fn delete_task(&self, session: &Session, task: &TaskStack) -> Result<()> {
        self.delete_stack_in(session, &task.stack_name())
    }

    fn delete_workload(&self, session: &Session, app: &str, env: &str, name: &str) -> Result<()> {
        self.delete_stack_in(session, &workload_stack(app, env, name))
    }

    fn delete_environment(&self, session: &Session, app: &str, env: &str) -> Result<()> {
        self.delete_stack_in(session, &env_stack(app, env))
    }

    fn delete_pipeline(&self, session: &Session, name: &str) -> Result<()> {
        self.delete_stack_in(session, name)
    }

    fn delete_app(&self, session: &Session, app: &str) -> Result<()> {
        let client = self.cloudformation(session);
        self.block_on(async {
            delete_stack_set(&client, &app_stack_set(app)).await?;
            delete_stack(&client, &app_roles_stack(app)).await
        })
    }
}
