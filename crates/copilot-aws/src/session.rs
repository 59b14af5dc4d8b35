//! Credential sessions and the blocking bridge onto the async SDK.

use crate::error::AwsError;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use copilot_core::platform::{Platform, Session, SessionProvider};
use copilot_core::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use tracing::debug;

/// Live AWS collaborators.
///
/// SDK configuration is loaded lazily, once per [`Session`]. Role sessions
/// assume the role the first time they are used.
pub struct AwsClients {
    runtime: tokio::runtime::Runtime,
    base: SdkConfig,
    configs: Mutex<HashMap<Session, SdkConfig>>,
}

impl AwsClients {
    /// Load the default credential chain and region from the environment.
    pub fn from_env() -> std::result::Result<Self, AwsError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(AwsError::Runtime)?;
        let base = runtime.block_on(aws_config::defaults(BehaviorVersion::latest()).load());
        Ok(Self {
            runtime,
            base,
            configs: Mutex::new(HashMap::new()),
        })
    }

    /// Every collaborator a workflow needs, served by these clients.
    pub fn platform(&self) -> Platform<'_> {
        Platform {
            store: self,
            sessions: self,
            deployer: self,
            buckets: self,
            images: self,
            tagger: self,
            secrets: self,
            logs: self,
        }
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// SDK configuration for `session`, built on first use.
    pub(crate) fn config(&self, session: &Session) -> SdkConfig {
        let mut configs = self.configs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(config) = configs.get(session) {
            return config.clone();
        }
        debug!(session = %session, "loading AWS configuration");
        let config = self.block_on(self.load(session));
        configs.insert(session.clone(), config.clone());
        config
    }

    async fn load(&self, session: &Session) -> SdkConfig {
        let region = Region::new(session.region.clone());
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region.clone());
        if let Some(role_arn) = &session.role_arn {
            let provider = AssumeRoleProvider::builder(role_arn.clone())
                .region(region)
                .session_name(role_session_name())
                .configure(&self.base)
                .build()
                .await;
            loader = loader.credentials_provider(provider);
        }
        loader.load().await
    }
}

fn role_session_name() -> String {
    format!("copilot-{}", uuid::Uuid::new_v4().simple())
}

impl SessionProvider for AwsClients {
    fn default_session(&self) -> Result<Session> {
        let region = self.base.region().ok_or(AwsError::NoRegion)?;
        Ok(Session::new(region.to_string()))
    }

    fn with_region(&self, region: &str) -> Result<Session> {
        Ok(Session::new(region))
    }

    fn from_role(&self, role_arn: &str, region: &str) -> Result<Session> {
        Ok(Session::with_role(region, role_arn))
    }
}
