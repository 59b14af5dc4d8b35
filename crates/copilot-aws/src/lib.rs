//! Live implementations of the `copilot-core` collaborator
//! traits on top of the AWS SDK.
//!
//! A single [`AwsClients`] value implements every trait. Calls are blocking:
//! each one drives the async SDK on a private current-thread runtime.
//!
//! | Trait | Service |
//! |---|---|
//! | `ConfigStore` | SSM Parameter Store |
//! | `Deployer` | CloudFormation (+ Resource Groups Tagging for tasks) |
//! | `BucketEmptier` | S3 |
//! | `ImageRemover` | ECR |
//! | `ResourceTagger` | Resource Groups Tagging |
//! | `SecretRemover` | Secrets Manager |
//! | `LogQueryService` | CloudWatch Logs |

pub mod error;
pub mod session;

mod cloudformation;
mod ecr;
mod logs;
mod s3;
mod secrets;
mod ssm;
mod tagging;

pub use error::AwsError;
pub use session::AwsClients;
