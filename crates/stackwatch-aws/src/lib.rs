//! AWS CloudFormation backend for stackwatch
//!
//! This crate implements the `StackApi` trait on top of the `aws` CLI,
//! so stackwatch can watch CloudFormation stacks without linking the SDK.
//!
//! # Requirements
//!
//! - `aws` CLI v2 must be installed
//! - Credentials are resolved by the CLI (environment, profiles, SSO)
//!
//! # Example
//!
//! ```ignore
//! use stackwatch_aws::{AwsCli, CloudFormationCli};
//! use stackwatch_core::StackApi;
//!
//! let api = CloudFormationCli::new(AwsCli::new().with_region("us-east-1"));
//!
//! // Check authentication
//! let auth = api.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//! ```

pub mod awscli;
pub mod error;
pub mod provider;

pub use awscli::{AwsCli, CallerIdentity, ChangeSetType, StackDescription};
pub use error::{AwsError, Result};
pub use provider::CloudFormationCli;
