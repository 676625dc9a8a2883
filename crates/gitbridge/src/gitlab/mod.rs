//! GitLab adapter.
//!
//! # Module Structure
//!
//! - [`types`] - v4 REST payloads
//! - [`convert`] - payload to domain model conversion (`iid` to `number`,
//!   `opened` to open, merged detection)
//! - `client` - [`GitLabClient`], the [`PlatformClient`](crate::platform::PlatformClient) implementation
//!
//! Projects are addressed by their URL-encoded full path, so nested groups
//! (`group/subgroup/project`) work as repository owners.

mod client;
pub mod convert;
pub mod types;

pub use client::GitLabClient;
