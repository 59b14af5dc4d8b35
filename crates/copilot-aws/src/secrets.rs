//! `SecretRemover` on Secrets Manager.

use crate::error::AwsError;
use crate::session::AwsClients;
use aws_sdk_secretsmanager::operation::delete_secret::DeleteSecretError;
use aws_sdk_secretsmanager::Client as SecretsClient;
use copilot_core::platform::{SecretRemover, Session};
use copilot_core::Result;
use tracing::{debug, info};

impl SecretRemover for AwsClients {
    fn delete_secret(&self, session: &Session, secret: &str) -> Result<()> {
        let client = SecretsClient::new(&self.config(session));
        let result = self.block_on(
            client
                .delete_secret()
                .secret_id(secret)
                .force_delete_without_recovery(true)
                .send(),
        );
        match result {
            Ok(_) => {
                info!(secret, "deleted secret");
                Ok(())
            }
            Err(e) => {
                let err = e.into_service_error();
                if matches!(err, DeleteSecretError::ResourceNotFoundException(_)) {
                    debug!(secret, "secret already deleted");
                    Ok(())
                } else {
                    Err(AwsError::service("secretsmanager", "DeleteSecret")(err).into())
                }
            }
        }
    }
}
