//! GitHub adapter.
//!
//! # Module Structure
//!
//! - [`types`] - REST payloads as returned by GitHub
//! - [`convert`] - payload to domain model conversion
//! - `client` - [`GitHubClient`], the [`PlatformClient`](crate::platform::PlatformClient) implementation
//!
//! GitHub's issues endpoint also returns pull requests; the client filters
//! them out so an [`Issue`](crate::platform::Issue) is never a pull request.

mod client;
pub mod convert;
pub mod types;

pub use client::GitHubClient;
