//! `BucketEmptier` on S3: delete every object version and delete marker.

use crate::error::AwsError;
use crate::session::AwsClients;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::types::{Delete, Error as DeleteError, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;
use copilot_core::platform::{BucketEmptier, Session};
use copilot_core::Result;
use tracing::{debug, info};

/// Upper bound of keys per DeleteObjects request.
const DELETE_BATCH: usize = 1000;

fn identifier(key: String, version_id: Option<String>) -> std::result::Result<ObjectIdentifier, AwsError> {
    ObjectIdentifier::builder()
        .key(key)
        .set_version_id(version_id)
        .build()
        .map_err(AwsError::build("ObjectIdentifier"))
}

async fn bucket_exists(client: &S3Client, bucket: &str) -> std::result::Result<bool, AwsError> {
    match client.head_bucket().bucket(bucket).send().await {
        Ok(_) => Ok(true),
        Err(e) => {
            let err = e.into_service_error();
            if matches!(err, HeadBucketError::NotFound(_)) {
                Ok(false)
            } else {
                Err(AwsError::service("s3", "HeadBucket")(err))
            }
        }
    }
}

async fn delete_batch(
    client: &S3Client,
    bucket: &str,
    objects: Vec<ObjectIdentifier>,
) -> std::result::Result<(), AwsError> {
    let delete = Delete::builder()
        .set_objects(Some(objects))
        .quiet(true)
        .build()
        .map_err(AwsError::build("Delete"))?;
    let resp = client
        .delete_objects()
        .bucket(bucket)
        .delete(delete)
        .send()
        .await
        .map_err(AwsError::service("s3", "DeleteObjects"))?;
    check_deleted(bucket, &resp.errors.unwrap_or_default())
}

/// DeleteObjects reports per-key failures in a successful response.
fn check_deleted(bucket: &str, errors: &[DeleteError]) -> std::result::Result<(), AwsError> {
    let Some(first) = errors.first() else {
        return Ok(());
    };
    let reason = match (first.code(), first.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => "unknown error".to_string(),
    };
    Err(AwsError::PartialDelete {
        target: format!("bucket {bucket}"),
        failed: errors.len(),
        first: first.key().unwrap_or("<unknown key>").to_string(),
        reason,
    })
}

/// Delete all versions of all objects. A missing bucket is already empty.
async fn empty_bucket(client: &S3Client, bucket: &str) -> std::result::Result<(), AwsError> {
    if !bucket_exists(client, bucket).await? {
        debug!(bucket, "bucket does not exist, nothing to empty");
        return Ok(());
    }

    let mut key_marker: Option<String> = None;
    let mut version_marker: Option<String> = None;
    let mut deleted = 0;
    loop {
        let resp = client
            .list_object_versions()
            .bucket(bucket)
            .set_key_marker(key_marker.take())
            .set_version_id_marker(version_marker.take())
            .send()
            .await
            .map_err(AwsError::service("s3", "ListObjectVersions"))?;

        let mut objects = Vec::new();
        for v in resp.versions.unwrap_or_default() {
            if let Some(key) = v.key {
                objects.push(identifier(key, v.version_id)?);
            }
        }
        for m in resp.delete_markers.unwrap_or_default() {
            if let Some(key) = m.key {
                objects.push(identifier(key, m.version_id)?);
            }
        }

        while !objects.is_empty() {
            let rest = objects.split_off(objects.len().min(DELETE_BATCH));
            deleted += objects.len();
            delete_batch(client, bucket, objects).await?;
            objects = rest;
        }

        if resp.is_truncated == Some(true) {
            key_marker = resp.next_key_marker;
            version_marker = resp.next_version_id_marker;
        } else {
            break;
        }
    }

    info!(bucket, count = deleted, "emptied bucket");
    Ok(())
}

impl BucketEmptier for AwsClients {
    fn empty_bucket(&self, session: &Session, bucket: &str) -> Result<()> {
        let client = S3Client::new(&self.config(session));
        Ok(self.block_on(empty_bucket(&client, bucket))?)
    }
}
