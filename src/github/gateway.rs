//! Gateways that read and write the pull request description.
//!
//! The description is the host text carrying the embedded presentation.
//! [`HostTextGateway`] is the seam the session depends on; the Octocrab
//! implementation talks to the REST API and tests substitute mocks.

use async_trait::async_trait;
use http::{StatusCode, Uri};
use octocrab::Octocrab;

use super::error::GithubError;
use super::locator::{PersonalAccessToken, PullRequestLocator};
use super::models::{ApiIssue, ApiIssueBodyUpdate};

/// Reads and writes the text that hosts the embedded presentation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostTextGateway: Send + Sync {
    /// Fetches the current host text.
    async fn fetch_host_text(&self) -> Result<String, GithubError>;

    /// Replaces the host text.
    async fn write_host_text(&self, text: &str) -> Result<(), GithubError>;
}

/// Octocrab-backed gateway bound to one pull request.
pub struct OctocrabGateway {
    client: Octocrab,
    issue_path: String,
}

impl OctocrabGateway {
    /// Wraps an existing Octocrab client.
    #[must_use]
    pub fn new(client: Octocrab, locator: &PullRequestLocator) -> Self {
        Self {
            client,
            issue_path: locator.issue_path(),
        }
    }

    /// Builds an authenticated client for the host of `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidUrl`] when the API base cannot be parsed
    /// or [`GithubError::Api`] when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: &PullRequestLocator,
    ) -> Result<Self, GithubError> {
        let base_uri: Uri = locator
            .api_base()
            .as_str()
            .parse::<Uri>()
            .map_err(|error| GithubError::InvalidUrl(error.to_string()))?;

        let client = Octocrab::builder()
            .personal_token(token.value())
            .base_uri(base_uri)
            .map_err(|error| GithubError::Api {
                message: format!("build client failed: {error}"),
            })?
            .build()
            .map_err(|error| map_octocrab_error("build client", &error))?;

        Ok(Self::new(client, locator))
    }
}

#[async_trait]
impl HostTextGateway for OctocrabGateway {
    async fn fetch_host_text(&self) -> Result<String, GithubError> {
        self.client
            .get::<ApiIssue, _, _>(&self.issue_path, None::<&()>)
            .await
            .map(ApiIssue::into_host_text)
            .map_err(|error| map_octocrab_error("read description", &error))
    }

    async fn write_host_text(&self, text: &str) -> Result<(), GithubError> {
        self.client
            .patch::<ApiIssue, _, _>(&self.issue_path, Some(&ApiIssueBodyUpdate { body: text }))
            .await
            .map(|_| ())
            .map_err(|error| map_octocrab_error("update description", &error))
    }
}

const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Maps Octocrab errors onto [`GithubError`] variants.
pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> GithubError {
    if let octocrab::Error::GitHub { source, .. } = error {
        let message = format!(
            "{operation} failed: GitHub returned {status} {detail}",
            status = source.status_code,
            detail = source.message
        );
        return if is_auth_failure(source.status_code) {
            GithubError::Authentication { message }
        } else {
            GithubError::Api { message }
        };
    }

    if is_network_error(error) {
        return GithubError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    GithubError::Api {
        message: format!("{operation} failed: {error}"),
    }
}
