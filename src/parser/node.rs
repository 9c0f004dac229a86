//! Per-node accumulation of required attributes and tags.

use std::collections::HashMap;

use crate::cursor::Attributes;
use crate::error::FaultReason;

pub const NODE: &str = "node";
pub const TAG: &str = "tag";

/// Tag key to value, last write wins.
pub type TagMap = HashMap<String, String>;

/// The six mandatory `node` attributes, still in their textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNodeAttributes {
    pub id: String,
    pub version: String,
    pub changeset: String,
    pub timestamp: String,
    pub lon: String,
    pub lat: String,
}

impl RawNodeAttributes {
    pub fn from_attributes(attributes: &Attributes) -> Result<Self, FaultReason> {
        let required = |name: &'static str| {
            attributes
                .get(name)
                .map(str::to_string)
                .ok_or(FaultReason::MissingAttribute(name))
        };

        Ok(Self {
            id: required("id")?,
            version: required("version")?,
            changeset: required("changeset")?,
            timestamp: required("timestamp")?,
            lon: required("lon")?,
            lat: required("lat")?,
        })
    }
}

/// State owned by a node between its start and end tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFrame {
    section: String,
    node_id: Option<String>,
    attributes: Result<RawNodeAttributes, FaultReason>,
    tags: TagMap,
    depth: usize,
}

impl NodeFrame {
    pub fn open(section: String, attributes: &Attributes) -> Self {
        Self {
            section,
            node_id: attributes.get("id").map(str::to_string),
            attributes: RawNodeAttributes::from_attributes(attributes),
            tags: TagMap::new(),
            depth: 0,
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Nesting depth below the node's own start token.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Records a `tag` element; both `k` and `v` must be present.
    pub fn absorb_tag(&mut self, attributes: &Attributes) {
        if let (Some(key), Some(value)) = (attributes.get("k"), attributes.get("v")) {
            self.tags.insert(key.to_string(), value.to_string());
        }
    }

    pub fn descend(&mut self) {
        self.depth += 1;
    }

    pub fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn finish(self) -> CompletedNode {
        CompletedNode {
            section: self.section,
            node_id: self.node_id,
            attributes: self.attributes,
            tags: self.tags,
        }
    }

    /// Closes a node cut off by the end of the stream.
    pub fn truncate(self) -> CompletedNode {
        CompletedNode {
            attributes: Err(FaultReason::Truncated),
            ..self.finish()
        }
    }
}

/// A node whose end token has been seen, ready for filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedNode {
    pub section: String,
    pub node_id: Option<String>,
    pub attributes: Result<RawNodeAttributes, FaultReason>,
    pub tags: TagMap,
}
