//! remote-finder - command line front end
//!
//! Loads the remote host list from YAML, then either resolves a pattern
//! (`find`) or bulk-fetches every leaf matching one or more patterns
//! (`fetch`). Output is JSON on stdout, logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use remote_finder::config::{load_config, load_config_from};
use remote_finder::{FindQuery, FinderConfig, LeafNode, Node, RemoteFinder, SeriesMap, TimeInfo};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "remote-finder", version, about = "Query remote Graphite hosts")]
struct Cli {
    /// YAML config file (defaults to $REMOTE_FINDER_CONFIG or remote-finder.yaml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List branch and leaf nodes matching a pattern on every host
    Find {
        pattern: String,
        #[arg(long)]
        from: Option<i64>,
        #[arg(long)]
        until: Option<i64>,
    },
    /// Fetch every leaf matching the patterns in one batched call per host
    Fetch {
        #[arg(required = true)]
        patterns: Vec<String>,
        #[arg(long)]
        from: Option<i64>,
        #[arg(long)]
        until: Option<i64>,
    },
}

#[derive(Serialize)]
struct NodeView<'a> {
    path: &'a str,
    is_leaf: bool,
    host: Option<&'a str>,
}

fn to_view(node: &Node) -> NodeView<'_> {
    NodeView {
        path: node.path(),
        is_leaf: node.is_leaf(),
        host: node.as_leaf().map(|leaf| leaf.reader().remote_uri().as_str()),
    }
}

#[derive(Serialize)]
struct FetchView {
    time_info: TimeInfo,
    series: SeriesMap,
}

/// `--until` defaults to now, `--from` to one hour before it
fn resolve_window(from: Option<i64>, until: Option<i64>) -> (i64, i64) {
    let until = until.unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp());
    let from = from.unwrap_or(until - 3600);
    (from, until)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("remote_finder=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg: FinderConfig = match &cli.config {
        Some(path) => load_config_from(path).await,
        None => load_config().await,
    };
    if cfg.remote.remotes.is_empty() {
        anyhow::bail!("no remote hosts configured (remote.remotes is empty)");
    }
    info!(hosts = cfg.remote.remotes.len(), "loaded remote hosts");

    let finder = RemoteFinder::new(&cfg).context("failed to build HTTP client")?;

    match cli.command {
        Command::Find { pattern, from, until } => {
            let mut nodes = Box::pin(finder.find_nodes(FindQuery::new(pattern, from, until)));
            while let Some(node) = nodes.next().await {
                println!("{}", serde_json::to_string(&to_view(&node))?);
            }
        }
        Command::Fetch { patterns, from, until } => {
            let (start, end) = resolve_window(from, until);
            let mut leaves: Vec<LeafNode> = Vec::new();
            for pattern in patterns {
                let nodes = finder
                    .find_all(FindQuery::new(pattern, Some(start), Some(end)))
                    .await;
                leaves.extend(nodes.into_iter().filter_map(Node::into_leaf));
            }
            info!(leaves = leaves.len(), start, end, "fetching series");

            let (time_info, series) = finder
                .fetch_multi(&leaves, start, end)
                .await
                .context("remote host returned malformed render data")?;
            println!("{}", serde_json::to_string_pretty(&FetchView { time_info, series })?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_window_defaults() {
        assert_eq!(resolve_window(Some(10), Some(20)), (10, 20));
        assert_eq!(resolve_window(None, Some(7200)), (3600, 7200));
    }

    #[test]
    fn test_cli_parses_fetch() {
        let cli = Cli::parse_from([
            "remote-finder",
            "fetch",
            "a.*",
            "b.c",
            "--from",
            "0",
            "--until",
            "60",
        ]);
        match cli.command {
            Command::Fetch { patterns, from, until } => {
                assert_eq!(patterns, vec!["a.*", "b.c"]);
                assert_eq!((from, until), (Some(0), Some(60)));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
