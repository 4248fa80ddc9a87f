//! Application configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach, lowest to highest
//! precedence:
//!
//! 1. **Defaults** – built-in application defaults
//! 2. **Configuration file** – `.storyline.toml` in the current or home
//!    directory, or `storyline.toml` in the XDG config directory
//! 3. **Environment variables** – `STORYLINE_*`, plus `GITHUB_TOKEN` as a
//!    token fallback
//! 4. **Command-line arguments**
//!
//! ```toml
//! pr_url = "https://github.com/owner/repo/pull/123"
//! token = "ghp_example"
//! save_frequency = "manual"
//! ```

use std::env;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::GithubError;
use crate::model::{Context, FileRef};
use crate::session::{ParseSaveFrequencyError, SaveFrequency};

/// What the binary does after loading the presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Replace the presentation with the contents of a JSON file.
    Import,
    /// Remove every visual.
    Clear,
    /// Add a comment, or edit the comment already anchored at that line.
    Add,
    /// Remove one visual.
    Remove,
    /// Move one visual to a new position.
    Move,
    /// Print the embedded document as JSON.
    Export,
    /// Write the presentation back without changing it.
    Save,
    /// Print the ordered annotations.
    Summary,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use storyline::StorylineConfig;
///
/// let config = StorylineConfig::load().expect("failed to load configuration");
/// let pr_url = config.require_pr_url().expect("PR URL required");
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "STORYLINE",
    discovery(
        dotfile_name = ".storyline.toml",
        config_file_name = "storyline.toml",
        app_name = "storyline"
    )
)]
pub struct StorylineConfig {
    /// Pull request whose description hosts the presentation.
    ///
    /// CLI `--pr-url`/`-u`, environment `STORYLINE_PR_URL`.
    #[ortho_config(cli_short = 'u')]
    pub pr_url: Option<String>,

    /// Personal access token for the GitHub API.
    ///
    /// CLI `--token`/`-t`, environment `STORYLINE_TOKEN` or `GITHUB_TOKEN`.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// `auto` saves after every change, `manual` only with `--save`.
    #[ortho_config(cli_short = 'f')]
    pub save_frequency: Option<String>,

    /// Writes the presentation back even in manual mode.
    #[ortho_config(cli_short = 's')]
    pub save: bool,

    /// Prints the embedded document as JSON.
    #[ortho_config(cli_short = 'e')]
    pub export: bool,

    /// JSON file whose envelope replaces the presentation.
    #[ortho_config(cli_short = 'i')]
    pub import_path: Option<String>,

    /// Anchor of a comment to add, as `<file>:<line>`.
    #[ortho_config(cli_short = 'a')]
    pub add_at: Option<String>,

    /// Text for the comment added with `add_at`.
    #[ortho_config(cli_short = 'x')]
    pub text: Option<String>,

    /// Zero-based target position for `add_at` and `move_id`.
    #[ortho_config(cli_short = 'p')]
    pub position: Option<usize>,

    /// Identity of the visual to remove.
    #[ortho_config(cli_short = 'r')]
    pub remove_id: Option<String>,

    /// Identity of the visual to move to `position`.
    #[ortho_config(cli_short = 'm')]
    pub move_id: Option<String>,

    /// Removes every visual.
    #[ortho_config(cli_short = 'c')]
    pub clear: bool,

    /// Enables debug logging on stderr.
    #[ortho_config(cli_short = 'v')]
    pub verbose: bool,
}

impl StorylineConfig {
    /// Resolves the GitHub token, falling back to `GITHUB_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::MissingToken`] when no token is available.
    pub fn resolve_token(&self) -> Result<String, GithubError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(GithubError::MissingToken)
    }

    /// Returns the pull request URL.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::MissingPullRequestUrl`] when it is unset.
    pub fn require_pr_url(&self) -> Result<&str, GithubError> {
        self.pr_url
            .as_deref()
            .ok_or(GithubError::MissingPullRequestUrl)
    }

    /// Parses `save_frequency`, defaulting to automatic saves.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::Configuration`] for unknown names.
    pub fn resolve_save_frequency(&self) -> Result<SaveFrequency, GithubError> {
        let Some(value) = self.save_frequency.as_deref() else {
            return Ok(SaveFrequency::default());
        };
        value
            .parse()
            .map_err(|error: ParseSaveFrequencyError| configuration(&error.to_string()))
    }

    /// Determines the operation from the populated fields.
    ///
    /// Destructive and editing operations take precedence over read-only
    /// ones so that a stray `--export` never hides an edit.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.import_path.is_some() {
            OperationMode::Import
        } else if self.clear {
            OperationMode::Clear
        } else if self.add_at.is_some() {
            OperationMode::Add
        } else if self.remove_id.is_some() {
            OperationMode::Remove
        } else if self.move_id.is_some() {
            OperationMode::Move
        } else if self.export {
            OperationMode::Export
        } else if self.save {
            OperationMode::Save
        } else {
            OperationMode::Summary
        }
    }

    /// Parses `add_at` into a comment anchor.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::Configuration`] when `add_at` is unset or not
    /// of the form `<file>:<line>`.
    pub fn require_anchor(&self) -> Result<Context, GithubError> {
        let raw = self
            .add_at
            .as_deref()
            .ok_or_else(|| configuration("an anchor is required (use --add-at <file>:<line>)"))?;
        let (filename, line) = raw
            .rsplit_once(':')
            .ok_or_else(|| configuration(&format!("anchor `{raw}` must be <file>:<line>")))?;
        if filename.trim().is_empty() {
            return Err(configuration(&format!("anchor `{raw}` has no file name")));
        }
        let line_no = line
            .trim()
            .parse::<u64>()
            .map_err(|_| configuration(&format!("anchor `{raw}` has an invalid line number")))?;
        Ok(Context::new(FileRef::new(filename.trim()), line_no))
    }

    /// Returns the position required by [`OperationMode::Move`].
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::Configuration`] when `position` is unset.
    pub fn require_position(&self) -> Result<usize, GithubError> {
        self.position
            .ok_or_else(|| configuration("a target position is required (use --position)"))
    }
}

fn configuration(message: &str) -> GithubError {
    GithubError::Configuration {
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests;
