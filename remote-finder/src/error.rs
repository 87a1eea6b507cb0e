//! Error types for the remote finder
//!
//! Two families live here:
//! - `ParseError`: a remote host answered, but the body does not follow the
//!   raw render line grammar or names a window too wide to fill. Always
//!   surfaced to the caller.
//! - `FinderError`: everything else. Per-host transport failures are built by
//!   the client layer and swallowed by the finder/reader; only parse errors
//!   and caller mistakes escape the public operations.

use crate::RemoteHost;

/// Malformed `meta|datapoints` line returned by a render endpoint
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("raw line has no single '|' separator: {0:?}")]
    MissingSeparator(String),
    #[error("raw line meta has {found} comma fields, expected {expected}: {meta:?}")]
    FieldCount {
        expected: usize,
        found: usize,
        meta: String,
    },
    #[error("raw line field '{field}' is not an integer: {value:?}")]
    InvalidInteger { field: &'static str, value: String },
    #[error("raw line datapoint is neither a number nor None: {0:?}")]
    InvalidDatapoint(String),
    #[error("raw line step must be positive, got {0}")]
    InvalidStep(i64),
    #[error("window [{start}, {end}) at step {step} is too large to fill")]
    WindowTooLarge { start: i64, end: i64, step: i64 },
    #[error("render body for a single series has {0} lines")]
    UnexpectedLines(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    #[error("protocol error: {0}")]
    Parse(#[from] ParseError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("host {host} answered with status {status}")]
    Status { host: RemoteHost, status: u16 },
    #[error("host {host} returned an undecodable find body: {source}")]
    Decode {
        host: RemoteHost,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = FinderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_convert_into_finder_errors() {
        let parse = FinderError::from(ParseError::InvalidStep(0));
        assert!(matches!(parse, FinderError::Parse(ParseError::InvalidStep(0))));
        assert!(parse.to_string().contains("step must be positive"));

        let lines = FinderError::from(ParseError::UnexpectedLines(2));
        assert_eq!(
            lines.to_string(),
            "protocol error: render body for a single series has 2 lines"
        );
    }

    #[test]
    fn test_status_error_names_host() {
        let status = FinderError::Status {
            host: RemoteHost::new("http://a"),
            status: 500,
        };
        assert_eq!(status.to_string(), "host http://a answered with status 500");
    }
}
