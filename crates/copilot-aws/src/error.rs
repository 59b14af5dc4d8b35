use aws_sdk_cloudformation::error::DisplayErrorContext;
use copilot_core::CopilotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AwsError {
    #[error("{service} {operation} failed: {message}")]
    Service {
        service: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("no AWS region configured: set AWS_REGION or a profile region")]
    NoRegion,

    #[error("invalid {what} request: {message}")]
    Build { what: &'static str, message: String },

    #[error("malformed parameter {key}: {source}")]
    Record {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{failed} item(s) could not be deleted from {target}, first {first}: {reason}")]
    PartialDelete {
        target: String,
        failed: usize,
        first: String,
        reason: String,
    },

    #[error("stack set operation {operation_id} on {stack_set} ended as {status}")]
    StackSetOperation {
        stack_set: String,
        operation_id: String,
        status: String,
    },
}

impl AwsError {
    /// Map an SDK error into a `Service` error, keeping the full SDK context.
    pub(crate) fn service<E: std::error::Error>(
        service: &'static str,
        operation: &'static str,
    ) -> impl FnOnce(E) -> AwsError {
        move |err| AwsError::Service {
            service,
            operation,
            message: DisplayErrorContext(&err).to_string(),
        }
    }

    pub(crate) fn build<E: std::error::Error>(what: &'static str) -> impl FnOnce(E) -> AwsError {
        move |err| AwsError::Build {
            what,
            message: err.to_string(),
        }
    }
}

impl From<AwsError> for CopilotError {
    fn from(err: AwsError) -> Self {
        CopilotError::remote(err)
    }
}
