//! Error types for changeset parsing.
//!
//! Stream-level problems are fatal and surface as [`ParseError`]. Problems
//! with a single node never abort the run; they are collected as
//! [`NodeFault`] values next to the output buckets.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while opening or reading the changeset stream.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to open changeset file at {path:?}")]
    Open {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to read changeset XML near byte {position}")]
    Stream {
        #[source]
        source: quick_xml::Error,
        position: u64,
    },
}

/// Why a single node was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultReason {
    MissingAttribute(&'static str),
    InvalidInteger {
        attribute: &'static str,
        value: String,
    },
    InvalidDecimal {
        attribute: &'static str,
        value: String,
    },
    InvalidCoordinate {
        lon: String,
        lat: String,
    },
    InvalidTimestamp {
        value: String,
    },
    /// The stream ended before the node's closing tag.
    Truncated,
}

impl FaultReason {
    /// Short machine-readable code for logs and summaries.
    pub fn code(&self) -> &'static str {
        match self {
            FaultReason::MissingAttribute(_) => "missing_attribute",
            FaultReason::InvalidInteger { .. } => "invalid_integer",
            FaultReason::InvalidDecimal { .. } => "invalid_decimal",
            FaultReason::InvalidCoordinate { .. } => "invalid_coordinate",
            FaultReason::InvalidTimestamp { .. } => "invalid_timestamp",
            FaultReason::Truncated => "truncated",
        }
    }
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultReason::MissingAttribute(name) => write!(f, "missing attribute '{name}'"),
            FaultReason::InvalidInteger { attribute, value } => {
                write!(f, "attribute '{attribute}' is not an integer: {value:?}")
            }
            FaultReason::InvalidDecimal { attribute, value } => {
                write!(f, "attribute '{attribute}' is not a decimal: {value:?}")
            }
            FaultReason::InvalidCoordinate { lon, lat } => {
                write!(f, "coordinate out of range: lon={lon} lat={lat}")
            }
            FaultReason::InvalidTimestamp { value } => {
                write!(f, "timestamp is not RFC 3339: {value:?}")
            }
            FaultReason::Truncated => write!(f, "stream ended inside the node"),
        }
    }
}

/// A node that passed the inclusion filter but could not be turned into a
/// point of interest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node {} in <{section}>: {reason}", .node_id.as_deref().unwrap_or("?"))]
pub struct NodeFault {
    /// Raw `id` attribute, when the node carried one.
    pub node_id: Option<String>,
    pub section: String,
    pub reason: FaultReason,
}
