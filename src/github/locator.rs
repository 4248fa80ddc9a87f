//! Pull request URL parsing and the identity wrappers derived from it.

use url::Url;

use super::error::GithubError;

/// Repository owner, e.g. `octocat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    fn new(value: &str) -> Result<Self, GithubError> {
        non_empty(value).map(Self)
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name, e.g. `hello-world`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    fn new(value: &str) -> Result<Self, GithubError> {
        non_empty(value).map(Self)
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Pull request number. Pull requests are issues, so this also addresses
/// the issue whose description carries the embedded presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    fn parse(segment: &str) -> Result<Self, GithubError> {
        match segment.parse::<u64>() {
            Ok(0) | Err(_) => Err(GithubError::InvalidPullRequestNumber),
            Ok(value) => Ok(Self(value)),
        }
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Personal access token, trimmed and guaranteed non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates and trims the supplied token.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::MissingToken`] when the token is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, GithubError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GithubError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for PersonalAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PersonalAccessToken(***)")
    }
}

/// A pull request on github.com or a GitHub Enterprise host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
    number: PullRequestNumber,
}

impl PullRequestLocator {
    /// Parses `https://<host>/<owner>/<repo>/pull/<number>[/...]`.
    ///
    /// Trailing segments such as `/files` (the diff page) are ignored. The
    /// API base is `https://api.github.com` for github.com and
    /// `<scheme>://<host>/api/v3` for every other host.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidUrl`] when the input is not a URL,
    /// [`GithubError::MissingPathSegments`] when the path is not a pull
    /// request path, and [`GithubError::InvalidPullRequestNumber`] when the
    /// number is not a positive integer.
    ///
    /// # Example
    ///
    /// ```
    /// use storyline::github::PullRequestLocator;
    ///
    /// let locator = PullRequestLocator::parse("https://github.com/octo/repo/pull/12/files")
    ///     .expect("should parse diff page URL");
    /// assert_eq!(locator.number().get(), 12);
    /// ```
    pub fn parse(input: &str) -> Result<Self, GithubError> {
        let parsed = Url::parse(input).map_err(|error| GithubError::InvalidUrl(error.to_string()))?;

        let segments: Vec<&str> = parsed
            .path_segments()
            .ok_or(GithubError::MissingPathSegments)?
            .collect();

        let [owner, repository, "pull", number, ..] = segments.as_slice() else {
            return Err(GithubError::MissingPathSegments);
        };
        if number.is_empty() {
            return Err(GithubError::MissingPathSegments);
        }

        Ok(Self {
            api_base: api_base_for(&parsed)?,
            owner: RepositoryOwner::new(owner)?,
            repository: RepositoryName::new(repository)?,
            number: PullRequestNumber::parse(number)?,
        })
    }

    /// API base URL derived from the pull request host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Pull request number.
    #[must_use]
    pub const fn number(&self) -> PullRequestNumber {
        self.number
    }

    /// REST path of the issue backing the pull request.
    pub(crate) fn issue_path(&self) -> String {
        format!(
            "/repos/{owner}/{repository}/issues/{number}",
            owner = self.owner.as_str(),
            repository = self.repository.as_str(),
            number = self.number.get()
        )
    }
}

fn non_empty(value: &str) -> Result<String, GithubError> {
    if value.is_empty() {
        return Err(GithubError::MissingPathSegments);
    }
    Ok(value.to_owned())
}

fn api_base_for(parsed: &Url) -> Result<Url, GithubError> {
    let host = parsed
        .host_str()
        .ok_or_else(|| GithubError::InvalidUrl("URL must include a host".to_owned()))?;

    if host.eq_ignore_ascii_case("github.com") {
        return Url::parse("https://api.github.com")
            .map_err(|error| GithubError::InvalidUrl(error.to_string()));
    }

    let mut api_base = parsed.clone();
    api_base.set_path("api/v3");
    api_base.set_query(None);
    api_base.set_fragment(None);
    Ok(api_base)
}
