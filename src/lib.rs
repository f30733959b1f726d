//! Command-line front end for the clean-serverless stack.
//!
//! Loads a [`StackConfig`], composes the topology and writes the synthesized
//! CloudFormation template and image manifest. The wizard behind `init`
//! produces a starter configuration file.
//!
//! [`StackConfig`]: clean_serverless_config::StackConfig

pub mod commands;
mod init;

pub use init::{init_tracing, load_env_file, EnvFile};
