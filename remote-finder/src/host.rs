use serde::{Deserialize, Serialize};
use std::fmt;

/// Base URL of one remote time-series server.
///
/// Compared by string value: two hosts are the same grouping key only when
/// their configured URLs are identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteHost(String);

impl RemoteHost {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self(base_url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins the base URL and an endpoint path ("metrics/find", "render")
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.0.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

impl fmt::Display for RemoteHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteHost {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RemoteHost {
    fn from(value: String) -> Self {
        Self(value)
    }
}
