//! npm-release-check - create a GitHub release for an unpublished npm package version

pub mod commands;
pub mod config;
pub mod error;
pub mod github;
pub mod manifest;
pub mod registry;
pub mod release;
pub mod slug;
pub mod subprocess;
pub mod telemetry;
