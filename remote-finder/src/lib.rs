//! Remote finder - metric discovery and series fetch across remote hosts
//!
//! Resolves metric-name patterns and time-series data from a set of remote
//! Graphite-compatible servers and merges their answers, so a caller does not
//! need to know how many hosts were consulted:
//! - `RemoteFinder::find_nodes`: completer query fanned out to every host
//! - `RemoteFinder::fetch_multi`: one batched raw render per host
//! - `RemoteReader`: interval and fetch queries for one (host, path) pair
//! - `wire::parse_raw_line`: parser for the `meta|datapoints` render format
//!
//! Unreachable or silent hosts degrade to "no data" (all-absent series);
//! hosts answering with a malformed protocol line raise `FinderError::Parse`.

pub mod client;
pub mod config;
pub mod error;
pub mod finder;
pub mod host;
pub mod intervals;
pub mod node;
pub mod reader;
pub mod wire;

pub use client::{MetricEntry, RemoteClient};
pub use config::{load_config, FinderConfig, RemoteConf};
pub use error::{FinderError, ParseError, Result};
pub use finder::{group_by_host, FindQuery, HostGroup, RemoteFinder};
pub use host::RemoteHost;
pub use intervals::{Interval, IntervalSet};
pub use node::{BranchNode, LeafNode, Node, FETCH_MULTI_TAG};
pub use reader::RemoteReader;
pub use wire::{parse_raw_line, Points, RawSeries, SeriesMap, TimeInfo, DEFAULT_STEP, MAX_POINTS};
