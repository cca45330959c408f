//! Quire GitHub - GitHub integration for Quire
//!
//! This crate implements the hosting seam of `quire-core` against the
//! GitHub REST API: git data (refs, trees, blobs, commits), pull requests,
//! forks, and the organization's document catalog.

mod client;
mod error;
mod git;
mod host;
mod pr;
mod repos;

pub use client::GitHubClient;
pub use error::{Error, Result};
