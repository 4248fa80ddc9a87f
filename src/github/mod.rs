//! GitHub access for the pull request description.
//!
//! The pull request description (the body of its backing issue) hosts the
//! embedded presentation. This module parses pull request URLs, validates
//! tokens, and reads and writes the description through Octocrab, mapping
//! failures into [`GithubError`] so callers never see Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
mod models;

pub use error::GithubError;
pub use gateway::{HostTextGateway, OctocrabGateway};
pub use locator::{
    PersonalAccessToken, PullRequestLocator, PullRequestNumber, RepositoryName, RepositoryOwner,
};

#[cfg(test)]
pub use gateway::MockHostTextGateway;
