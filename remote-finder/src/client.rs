//! HTTP access to remote time-series hosts
//!
//! Thin wrapper around a shared `reqwest::Client` that knows the two
//! endpoints the finder needs:
//! - `GET  {host}/metrics/find?format=completer&query={pattern}`
//! - `POST {host}/render` (form: target..., format=raw, from, until)
//!
//! Every method returns a `FinderError` on transport failure, timeout,
//! non-200 status or undecodable body. Deciding whether such a failure is
//! fatal is left to the caller.

use crate::config::RemoteConf;
use crate::error::{FinderError, Result};
use crate::RemoteHost;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of a completer-format find response
#[derive(Debug, Deserialize)]
struct FindResponse {
    metrics: Vec<MetricEntry>,
}

/// One match from a find query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub path: String,
    pub is_leaf: bool,
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
}

impl RemoteClient {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("remote-finder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    pub fn from_config(conf: &RemoteConf) -> Result<Self> {
        Self::new(conf.timeout(), conf.connect_timeout())
    }

    /// Path completion query against one host
    pub async fn find(&self, host: &RemoteHost, pattern: &str) -> Result<Vec<MetricEntry>> {
        let response = self
            .http
            .get(host.endpoint("metrics/find"))
            .query(&[("format", "completer"), ("query", pattern)])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(FinderError::Status {
                host: host.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        let parsed: FindResponse =
            serde_json::from_slice(&body).map_err(|source| FinderError::Decode {
                host: host.clone(),
                source,
            })?;
        Ok(parsed.metrics)
    }

    /// Raw render of one or more targets; returns the body text as is
    pub async fn render<S: AsRef<str>>(
        &self,
        host: &RemoteHost,
        targets: &[S],
        from: i64,
        until: i64,
    ) -> Result<String> {
        let response = self
            .http
            .post(host.endpoint("render"))
            .form(&render_form(targets, from, until))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(FinderError::Status {
                host: host.clone(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Form fields of a raw render request, one `target` pair per path
fn render_form<S: AsRef<str>>(targets: &[S], from: i64, until: i64) -> Vec<(&'static str, String)> {
    let mut form: Vec<(&'static str, String)> = targets
        .iter()
        .map(|target| ("target", target.as_ref().to_string()))
        .collect();
    form.push(("format", "raw".to_string()));
    form.push(("from", from.to_string()));
    form.push(("until", until.to_string()));
    form
}
