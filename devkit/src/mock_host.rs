/*!
Mock remote host for development without a Graphite server

Serves `/metrics/find` and `/render` on an ephemeral localhost port, answers
from canned data and records every request it receives so tests can assert on
the exact query/form fields sent.
*/

use crate::fixtures::{completer_body, raw_line};
use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Find,
    Render,
}

/// One request as seen by the mock host
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub endpoint: Endpoint,
    /// Query string (find) or form body (render) pairs, in wire order
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// All values of a repeated field, e.g. every `target`
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values(key).into_iter().next()
    }
}

#[derive(Debug, Clone)]
struct Behaviour {
    find_status: u16,
    find_body: Option<String>,
    metrics: Vec<(String, bool)>,
    render_status: u16,
    render_body: Option<String>,
    series: Vec<(String, String)>,
    delay: Duration,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            find_status: 200,
            find_body: None,
            metrics: Vec::new(),
            render_status: 200,
            render_body: None,
            series: Vec::new(),
            delay: Duration::ZERO,
        }
    }
}

struct MockState {
    behaviour: Behaviour,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockState {
    fn record(&self, endpoint: Endpoint, raw: &[u8]) -> Vec<(String, String)> {
        let params: Vec<(String, String)> = serde_urlencoded::from_bytes(raw).unwrap_or_default();
        self.requests.lock().unwrap().push(RecordedRequest {
            endpoint,
            params: params.clone(),
        });
        params
    }
}

/// Canned behaviour of a mock host, consumed by `start`
#[derive(Debug, Clone, Default)]
pub struct MockHostBuilder {
    behaviour: Behaviour,
}

impl MockHostBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry returned by every find query
    pub fn metric(mut self, path: &str, is_leaf: bool) -> Self {
        self.behaviour.metrics.push((path.to_string(), is_leaf));
        self
    }

    /// Series served by render when `path` is among the requested targets
    pub fn series(
        mut self,
        path: &str,
        start: i64,
        end: i64,
        step: i64,
        points: &[Option<f64>],
    ) -> Self {
        let line = raw_line(path, start, end, step, points);
        self.behaviour.series.push((path.to_string(), line));
        self
    }

    /// Fixed find body, bypassing `metric`
    pub fn find_body(mut self, body: impl Into<String>) -> Self {
        self.behaviour.find_body = Some(body.into());
        self
    }

    /// Fixed render body, bypassing `series`
    pub fn render_body(mut self, body: impl Into<String>) -> Self {
        self.behaviour.render_body = Some(body.into());
        self
    }

    pub fn find_status(mut self, status: u16) -> Self {
        self.behaviour.find_status = status;
        self
    }

    pub fn render_status(mut self, status: u16) -> Self {
        self.behaviour.render_status = status;
        self
    }

    /// Delay applied before answering any request
    pub fn delay(mut self, delay: Duration) -> Self {
        self.behaviour.delay = delay;
        self
    }

    pub async fn start(self) -> Result<MockRemoteHost> {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(MockState {
            behaviour: self.behaviour,
            requests: requests.clone(),
        });

        let app = Router::new()
            .route("/metrics/find", get(find))
            .route("/render", post(render))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                log::warn!("[mock] server on {} stopped: {}", addr, e);
            }
        });

        log::info!("[mock] remote host listening on http://{}", addr);
        Ok(MockRemoteHost {
            url: format!("http://{}", addr),
            requests,
            shutdown: Some(shutdown_tx),
        })
    }
}

/// Running mock host; stops serving when dropped
pub struct MockRemoteHost {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockRemoteHost {
    pub fn builder() -> MockHostBuilder {
        MockHostBuilder::new()
    }

    /// Base URL to put in the finder's remote list
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, endpoint: Endpoint) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|req| req.endpoint == endpoint)
            .collect()
    }

    /// Targets of every render call, one vector per call
    pub fn render_targets(&self) -> Vec<Vec<String>> {
        self.requests_to(Endpoint::Render)
            .iter()
            .map(|req| req.values("target").into_iter().map(str::to_string).collect())
            .collect()
    }
}

impl Drop for MockRemoteHost {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// URL of a localhost port nothing listens on (connection refused)
pub fn unreachable_host_url() -> Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

async fn find(State(state): State<Arc<MockState>>, RawQuery(query): RawQuery) -> Response {
    state.record(Endpoint::Find, query.unwrap_or_default().as_bytes());
    let b = &state.behaviour;
    if !b.delay.is_zero() {
        tokio::time::sleep(b.delay).await;
    }

    let status = StatusCode::from_u16(b.find_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match &b.find_body {
        Some(body) => body.clone(),
        None => {
            let entries: Vec<(&str, bool)> =
                b.metrics.iter().map(|(p, leaf)| (p.as_str(), *leaf)).collect();
            completer_body(&entries).to_string()
        }
    };
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn render(State(state): State<Arc<MockState>>, body: Bytes) -> Response {
    let params = state.record(Endpoint::Render, &body);
    let b = &state.behaviour;
    if !b.delay.is_zero() {
        tokio::time::sleep(b.delay).await;
    }

    let status = StatusCode::from_u16(b.render_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let text = match &b.render_body {
        Some(text) => text.clone(),
        None => {
            let lines: Vec<&str> = params
                .iter()
                .filter(|(k, _)| k == "target")
                .filter_map(|(_, target)| {
                    b.series
                        .iter()
                        .find(|(path, _)| path == target)
                        .map(|(_, line)| line.as_str())
                })
                .collect();
            if lines.is_empty() {
                String::new()
            } else {
                format!("{}\n", lines.join("\n"))
            }
        }
    };
    (status, [(header::CONTENT_TYPE, "text/plain")], text).into_response()
}
