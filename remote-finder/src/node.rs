use crate::error::Result;
use crate::intervals::IntervalSet;
use crate::reader::RemoteReader;
use crate::wire::{Points, TimeInfo};

/// Tag a host framework uses to route bulk fetches of these leaves back to
/// `RemoteFinder::fetch_multi`
pub const FETCH_MULTI_TAG: &str = "remote-graphite-api";

/// Namespace prefix; carries its path only and cannot be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNode {
    pub path: String,
}

impl BranchNode {
    /// Builds a branch from a find result, dropping one trailing separator
    pub fn from_find_path(path: &str) -> Self {
        let path = path
            .strip_suffix('.')
            .or_else(|| path.strip_suffix('/'))
            .unwrap_or(path);
        Self { path: path.to_string() }
    }
}

/// Concrete series owning the reader it was discovered with
#[derive(Debug, Clone)]
pub struct LeafNode {
    pub path: String,
    reader: RemoteReader,
}

impl LeafNode {
    pub fn new(path: impl Into<String>, reader: RemoteReader) -> Self {
        Self { path: path.into(), reader }
    }

    pub fn reader(&self) -> &RemoteReader {
        &self.reader
    }

    pub fn fetch_multi_tag(&self) -> &'static str {
        FETCH_MULTI_TAG
    }

    pub fn intervals(&self) -> IntervalSet {
        self.reader.get_intervals()
    }

    pub async fn fetch(&self, start_time: i64, end_time: i64) -> Result<(TimeInfo, Points)> {
        self.reader.fetch(start_time, end_time).await
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Branch(BranchNode),
    Leaf(LeafNode),
}

impl Node {
    pub fn path(&self) -> &str {
        match self {
            Node::Branch(branch) => &branch.path,
            Node::Leaf(leaf) => &leaf.path,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Branch(_) => None,
        }
    }

    pub fn into_leaf(self) -> Option<LeafNode> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Branch(_) => None,
        }
    }
}
