//! `ImageRemover` on ECR.

use crate::error::AwsError;
use crate::session::AwsClients;
use aws_sdk_ecr::operation::list_images::ListImagesError;
use aws_sdk_ecr::types::{ImageFailure, ImageFailureCode, ImageIdentifier};
use aws_sdk_ecr::Client as EcrClient;
use copilot_core::platform::{ImageRemover, Session};
use copilot_core::Result;
use tracing::{debug, info};

/// BatchDeleteImage accepts at most this many image IDs per call.
const DELETE_BATCH: usize = 100;

/// All image IDs in `repo`, or `None` when the repository does not exist.
async fn list_images(
    client: &EcrClient,
    repo: &str,
) -> std::result::Result<Option<Vec<ImageIdentifier>>, AwsError> {
    let mut images = Vec::new();
    let mut next_token: Option<String> = None;
    loop {
        let resp = match client
            .list_images()
            .repository_name(repo)
            .set_next_token(next_token.take())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let err = e.into_service_error();
                if matches!(err, ListImagesError::RepositoryNotFoundException(_)) {
                    return Ok(None);
                }
                return Err(AwsError::service("ecr", "ListImages")(err));
            }
        };
        images.extend(resp.image_ids.unwrap_or_default());
        match resp.next_token {
            Some(token) => next_token = Some(token),
            None => return Ok(Some(images)),
        }
    }
}

async fn clear_repository(client: &EcrClient, repo: &str) -> std::result::Result<(), AwsError> {
    let Some(images) = list_images(client, repo).await? else {
        debug!(repo, "repository does not exist, nothing to clear");
        return Ok(());
    };
    let count = images.len();
    for chunk in images.chunks(DELETE_BATCH) {
        let resp = client
            .batch_delete_image()
            .repository_name(repo)
            .set_image_ids(Some(chunk.to_vec()))
            .send()
            .await
            .map_err(AwsError::service("ecr", "BatchDeleteImage"))?;
        check_deleted(repo, &resp.failures.unwrap_or_default())?;
    }
    info!(repo, count, "cleared repository");
    Ok(())
}

/// BatchDeleteImage reports per-image failures in a successful response.
/// Images that are already gone count as deleted.
fn check_deleted(repo: &str, failures: &[ImageFailure]) -> std::result::Result<(), AwsError> {
    let failed: Vec<&ImageFailure> = failures
        .iter()
        .filter(|f| f.failure_code() != Some(&ImageFailureCode::ImageNotFound))
        .collect();
    let Some(first) = failed.first() else {
        return Ok(());
    };
    let image = first
        .image_id()
        .and_then(|id| id.image_digest().or(id.image_tag()))
        .unwrap_or("<unknown image>");
    let reason = match (first.failure_code(), first.failure_reason()) {
        (Some(code), Some(reason)) => format!("{}: {reason}", code.as_str()),
        (Some(code), None) => code.as_str().to_string(),
        (None, Some(reason)) => reason.to_string(),
        (None, None) => "unknown error".to_string(),
    };
    Err(AwsError::PartialDelete {
        target: format!("repository {repo}"),
        failed: failed.len(),
        first: image.to_string(),
        reason,
    })
}

impl ImageRemover for AwsClients {
    fn clear_repository(&self, session: &Session, repo: &str) -> Result<()> {
        let client = EcrClient::new(&self.config(session));
        Ok(self.block_on(clear_repository(&client, repo))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(digest: &str, code: ImageFailureCode, reason: &str) -> ImageFailure {
        ImageFailure::builder()
            .image_id(ImageIdentifier::builder().image_digest(digest).build())
            .failure_code(code)
            .failure_reason(reason)
            .build()
    }

    #[test]
    fn missing_images_count_as_deleted() {
        let failures = vec![failure(
            "sha256:aaa",
            ImageFailureCode::ImageNotFound,
            "Requested image not found",
        )];
        assert!(check_deleted("my-app/web", &failures).is_ok());
    }

    #[test]
    fn refused_images_fail_the_clear() {
        let failures = vec![
            failure("sha256:aaa", ImageFailureCode::ImageNotFound, "Requested image not found"),
            failure("sha256:bbb", ImageFailureCode::KmsError, "key disabled"),
        ];
        let err = check_deleted("my-app/web", &failures).unwrap_err();
        assert!(matches!(err, AwsError::PartialDelete { failed: 1, .. }));
        let msg = err.to_string();
        assert!(msg.contains("repository my-app/web"));
        assert!(msg.contains("sha256:bbb"));
        assert!(msg.contains("KmsError: key disabled"));
    }
}
