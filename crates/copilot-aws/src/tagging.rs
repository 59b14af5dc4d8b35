//! Resource Groups Tagging: find what is deployed into an environment.

use crate::error::AwsError;
use crate::session::AwsClients;
use aws_sdk_resourcegroupstagging::types::TagFilter;
use aws_sdk_resourcegroupstagging::Client as TaggingClient;
use copilot_core::platform::{ResourceTagger, Session};
use copilot_core::Result;
use tracing::debug;

pub(crate) const APP_TAG: &str = "copilot-application";
pub(crate) const ENV_TAG: &str = "copilot-environment";
pub(crate) const SERVICE_TAG: &str = "copilot-service";
pub(crate) const TASK_TAG: &str = "copilot-task";
const STACK_RESOURCE_TYPE: &str = "cloudformation:stack";

fn tag(key: &str, value: Option<&str>) -> TagFilter {
    TagFilter::builder()
        .key(key)
        .set_values(value.map(|v| vec![v.to_string()]))
        .build()
}

/// Stack name out of `arn:aws:cloudformation:{region}:{account}:stack/{name}/{id}`.
pub(crate) fn stack_name_from_arn(arn: &str) -> Option<&str> {
    let (_, resource) = arn.rsplit_once(':')?;
    let mut parts = resource.split('/');
    match (parts.next(), parts.next()) {
        (Some("stack"), Some(name)) if !name.is_empty() => Some(name),
        _ => None,
    }
}

/// Tag filters plus the resource type a lookup is restricted to.
struct TagQuery {
    filters: Vec<TagFilter>,
    resource_type: &'static str,
}

/// CloudFormation stacks of services and jobs deployed to `app`/`env`.
fn workload_stacks(app: &str, env: &str) -> TagQuery {
    TagQuery {
        filters: vec![
            tag(APP_TAG, Some(app)),
            tag(ENV_TAG, Some(env)),
            tag(SERVICE_TAG, None),
        ],
        resource_type: STACK_RESOURCE_TYPE,
    }
}

/// CloudFormation stacks of one-off tasks run in `app`/`env`.
fn task_stacks(app: &str, env: &str) -> TagQuery {
    TagQuery {
        filters: vec![
            tag(APP_TAG, Some(app)),
            tag(ENV_TAG, Some(env)),
            tag(TASK_TAG, None),
        ],
        resource_type: STACK_RESOURCE_TYPE,
    }
}

/// ARNs of resources matching `query`.
async fn tagged_arns(
    client: &TaggingClient,
    query: TagQuery,
) -> std::result::Result<Vec<String>, AwsError> {
    let mut arns = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let resp = client
            .get_resources()
            .set_tag_filters(Some(query.filters.clone()))
            .resource_type_filters(query.resource_type)
            .set_pagination_token(token.take())
            .send()
            .await
            .map_err(AwsError::service("tagging", "GetResources"))?;
        arns.extend(
            resp.resource_tag_mapping_list
                .unwrap_or_default()
                .into_iter()
                .filter_map(|m| m.resource_arn),
        );
        match resp.pagination_token.filter(|t| !t.is_empty()) {
            Some(next) => token = Some(next),
            None => return Ok(arns),
        }
    }
}

pub(crate) async fn task_stack_arns(
    client: &TaggingClient,
    app: &str,
    env: &str,
) -> std::result::Result<Vec<String>, AwsError> {
    tagged_arns(client, task_stacks(app, env)).await
}

impl AwsClients {
    pub(crate) fn tagging(&self, session: &Session) -> TaggingClient {
        TaggingClient::new(&self.config(session))
    }
}

impl ResourceTagger for AwsClients {
    fn workload_resources(&self, session: &Session, app: &str, env: &str) -> Result<Vec<String>> {
        let arns = self.block_on(tagged_arns(&self.tagging(session), workload_stacks(app, env)))?;
        debug!(app, env, count = arns.len(), "tagged workload resources");
        Ok(arns)
    }
}
