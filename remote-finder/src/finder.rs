/**
 * REMOTE FINDER - Fan-out over the configured remote time-series hosts
 *
 * ROLE:
 * Resolves glob-style metric patterns to branch/leaf nodes and performs the
 * batched series fetch for leaves, whatever the number of hosts behind them.
 *
 * OPERATION:
 * - find_nodes: one completer query per host, all in flight at once, results
 *   yielded lazily in host-configuration order
 * - fetch_multi: group leaves by owning host, one raw render per host group,
 *   merge bodies in host-configuration order after every call returned
 * - A host that fails, times out or returns nothing contributes nothing
 * - A host that answers with a malformed raw line fails the whole fetch
 */

use crate::client::{MetricEntry, RemoteClient};
use crate::config::FinderConfig;
use crate::error::Result;
use crate::node::{BranchNode, LeafNode, Node, FETCH_MULTI_TAG};
use crate::reader::RemoteReader;
use crate::wire::{default_multi_fill, parse_raw_line, SeriesMap, TimeInfo, DEFAULT_STEP};
use crate::RemoteHost;
use futures::future::join_all;
use futures::stream::{self, Stream, StreamExt};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Already-parsed query handed over by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindQuery {
    pub pattern: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl FindQuery {
    pub fn new(pattern: impl Into<String>, start_time: Option<i64>, end_time: Option<i64>) -> Self {
        Self {
            pattern: pattern.into(),
            start_time,
            end_time,
        }
    }
}

/// Leaves owned by one host, requested in a single render call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostGroup {
    pub host: RemoteHost,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RemoteFinder {
    remotes: Vec<RemoteHost>,
    client: RemoteClient,
}

impl RemoteFinder {
    pub fn new(config: &FinderConfig) -> Result<Self> {
        let client = RemoteClient::from_config(&config.remote)?;
        Ok(Self::with_client(config.remote.remotes.clone(), client))
    }

    pub fn with_client(remotes: Vec<RemoteHost>, client: RemoteClient) -> Self {
        Self { remotes, client }
    }

    pub fn remotes(&self) -> &[RemoteHost] {
        &self.remotes
    }

    pub fn fetch_multi_tag(&self) -> &'static str {
        FETCH_MULTI_TAG
    }

    /// Lazy stream of the nodes every host reports for `query.pattern`.
    ///
    /// Hosts are queried concurrently once the stream is polled, but results
    /// come out grouped per host in configuration order. Duplicate paths from
    /// different hosts are all yielded.
    pub fn find_nodes(&self, query: FindQuery) -> impl Stream<Item = Node> + Send {
        debug!(
            finder = "remote",
            start = ?query.start_time,
            end = ?query.end_time,
            pattern = %query.pattern,
            "find_nodes"
        );

        let client = self.client.clone();
        let concurrency = self.remotes.len().max(1);
        stream::iter(self.remotes.clone())
            .map(move |host| find_on_host(client.clone(), host, query.clone()))
            .buffered(concurrency)
            .flat_map(stream::iter)
    }

    /// Collects `find_nodes` into a vector
    pub async fn find_all(&self, query: FindQuery) -> Vec<Node> {
        self.find_nodes(query).collect().await
    }

    /// Batched fetch of `nodes` over `[start_time, end_time)`.
    ///
    /// The returned mapping has an entry for every distinct requested path.
    /// When several hosts answer, the TimeInfo of the last host in
    /// configuration order wins. When no host answers at all, every path is
    /// mapped to absent values at the default 60s step.
    pub async fn fetch_multi<'a, I>(
        &self,
        nodes: I,
        start_time: i64,
        end_time: i64,
    ) -> Result<(TimeInfo, SeriesMap)>
    where
        I: IntoIterator<Item = &'a LeafNode>,
    {
        let groups = group_by_host(&self.remotes, nodes);
        debug!(
            reader = "remote",
            start = start_time,
            end = end_time,
            hosts = groups.len(),
            "fetch_multi"
        );

        let requested: BTreeSet<&str> = groups
            .iter()
            .flat_map(|group| group.paths.iter().map(String::as_str))
            .collect();

        let bodies = join_all(
            groups
                .iter()
                .map(|group| render_group(&self.client, group, start_time, end_time)),
        )
        .await;

        merge_bodies(start_time, end_time, requested, bodies)
    }
}

async fn find_on_host(client: RemoteClient, host: RemoteHost, query: FindQuery) -> Vec<Node> {
    match client.find(&host, &query.pattern).await {
        Ok(entries) => entries
            .into_iter()
            .map(|entry| to_node(&client, &host, &query, entry))
            .collect(),
        Err(e) => {
            warn!(
                host = %host,
                pattern = %query.pattern,
                error = %e,
                "find failed, skipping host"
            );
            Vec::new()
        }
    }
}

fn to_node(
    client: &RemoteClient,
    host: &RemoteHost,
    query: &FindQuery,
    entry: MetricEntry,
) -> Node {
    if !entry.is_leaf {
        return Node::Branch(BranchNode::from_find_path(&entry.path));
    }
    let reader = RemoteReader::new(
        client.clone(),
        host.clone(),
        entry.path.clone(),
        query.start_time,
        query.end_time,
    );
    Node::Leaf(LeafNode::new(entry.path, reader))
}

/// Partitions leaves by owning host.
///
/// Groups follow the host's position in `remotes`; hosts missing from the
/// list come after, in first-appearance order. A path is listed once per
/// group.
pub fn group_by_host<'a, I>(remotes: &[RemoteHost], nodes: I) -> Vec<HostGroup>
where
    I: IntoIterator<Item = &'a LeafNode>,
{
    let mut groups: Vec<HostGroup> = Vec::new();
    let mut slots: HashMap<RemoteHost, usize> = HashMap::new();

    for node in nodes {
        let host = node.reader().remote_uri();
        let slot = *slots.entry(host.clone()).or_insert_with(|| {
            groups.push(HostGroup {
                host: host.clone(),
                paths: Vec::new(),
            });
            groups.len() - 1
        });
        let paths = &mut groups[slot].paths;
        if !paths.contains(&node.path) {
            paths.push(node.path.clone());
        }
    }

    // stable: unknown hosts keep their first-appearance order
    groups.sort_by_key(|group| {
        remotes
            .iter()
            .position(|remote| remote == &group.host)
            .unwrap_or(usize::MAX)
    });
    groups
}

async fn render_group(
    client: &RemoteClient,
    group: &HostGroup,
    start_time: i64,
    end_time: i64,
) -> Option<String> {
    match client.render(&group.host, group.paths.as_slice(), start_time, end_time).await {
        Ok(body) if body.is_empty() => None,
        Ok(body) => Some(body),
        Err(e) => {
            warn!(
                host = %group.host,
                targets = group.paths.len(),
                error = %e,
                "render failed, skipping host"
            );
            None
        }
    }
}

/// Single merge point for the per-host bodies, applied in group order
fn merge_bodies<'a, P>(
    start_time: i64,
    end_time: i64,
    requested: P,
    bodies: Vec<Option<String>>,
) -> Result<(TimeInfo, SeriesMap)>
where
    P: IntoIterator<Item = &'a str>,
{
    let mut time_info = None;
    let mut series = SeriesMap::new();

    for body in bodies.into_iter().flatten() {
        for line in body.lines().map(str::trim_end).filter(|line| !line.is_empty()) {
            let parsed = parse_raw_line(line)?;
            time_info = Some(parsed.time_info);
            series.insert(parsed.path, parsed.points);
        }
    }

    let Some(time_info) = time_info else {
        return Ok(default_multi_fill(start_time, end_time, DEFAULT_STEP, requested)?);
    };

    let missing: Vec<&str> = requested
        .into_iter()
        .filter(|path| !series.contains_key(*path))
        .collect();
    if !missing.is_empty() {
        let points = time_info.empty_points()?;
        for path in missing {
            series.insert(path.to_string(), points.clone());
        }
    }
    Ok((time_info, series))
}
