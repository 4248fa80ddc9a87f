//! Wire models for the issue endpoint backing a pull request.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssue {
    pub(super) body: Option<String>,
}

impl ApiIssue {
    /// GitHub reports an empty description as `null`.
    pub(super) fn into_host_text(self) -> String {
        self.body.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct ApiIssueBodyUpdate<'text> {
    pub(super) body: &'text str,
}
