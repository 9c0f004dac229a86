//! Routing of completed nodes into output buckets.

use time::UtcOffset;

use crate::error::NodeFault;
use crate::parser::node::CompletedNode;
use crate::parser::section::ChangeSection;
use crate::poi::{AmenityFilter, PointOfInterest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Created,
    Updated,
    Deleted,
    Malformed,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Created,
        Bucket::Updated,
        Bucket::Deleted,
        Bucket::Malformed,
    ];

    pub fn for_section(section: &ChangeSection) -> Self {
        match section {
            ChangeSection::Create => Bucket::Created,
            ChangeSection::Modify => Bucket::Updated,
            ChangeSection::Delete => Bucket::Deleted,
            ChangeSection::Unknown(_) => Bucket::Malformed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bucket::Created => "created",
            Bucket::Updated => "updated",
            Bucket::Deleted => "deleted",
            Bucket::Malformed => "malformed",
        }
    }
}

/// The four output sequences plus faults for abandoned nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    created: Vec<PointOfInterest>,
    updated: Vec<PointOfInterest>,
    deleted: Vec<PointOfInterest>,
    malformed: Vec<PointOfInterest>,
    faults: Vec<NodeFault>,
}

impl Buckets {
    pub fn created(&self) -> &[PointOfInterest] {
        &self.created
    }

    pub fn updated(&self) -> &[PointOfInterest] {
        &self.updated
    }

    pub fn deleted(&self) -> &[PointOfInterest] {
        &self.deleted
    }

    pub fn malformed(&self) -> &[PointOfInterest] {
        &self.malformed
    }

    pub fn faults(&self) -> &[NodeFault] {
        &self.faults
    }

    pub fn get(&self, bucket: Bucket) -> &[PointOfInterest] {
        match bucket {
            Bucket::Created => &self.created,
            Bucket::Updated => &self.updated,
            Bucket::Deleted => &self.deleted,
            Bucket::Malformed => &self.malformed,
        }
    }

    pub fn push(&mut self, bucket: Bucket, poi: PointOfInterest) {
        match bucket {
            Bucket::Created => self.created.push(poi),
            Bucket::Updated => self.updated.push(poi),
            Bucket::Deleted => self.deleted.push(poi),
            Bucket::Malformed => self.malformed.push(poi),
        }
    }

    pub fn record_fault(&mut self, fault: NodeFault) {
        self.faults.push(fault);
    }

    /// Number of records across all four buckets.
    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len() + self.malformed.len()
    }

    pub fn clear(&mut self) {
        self.created.clear();
        self.updated.clear();
        self.deleted.clear();
        self.malformed.clear();
        self.faults.clear();
    }
}

/// Applies the inclusion filter and appends accepted nodes to their bucket.
#[derive(Debug, Clone)]
pub struct Classifier {
    filter: AmenityFilter,
    date_offset: UtcOffset,
}

impl Classifier {
    pub fn new(filter: AmenityFilter, date_offset: UtcOffset) -> Self {
        Self {
            filter,
            date_offset,
        }
    }

    /// Returns the bucket the node landed in, or `None` if it was dropped.
    pub fn classify(&self, node: CompletedNode, buckets: &mut Buckets) -> Option<Bucket> {
        let Some(category) = self.filter.category(&node.tags) else {
            tracing::debug!(
                "Skipping node {} in <{}>: no accepted amenity or shop tag",
                node.node_id.as_deref().unwrap_or("?"),
                node.section
            );
            return None;
        };

        let assembled = node.attributes.and_then(|raw| {
            PointOfInterest::assemble(&raw, &node.tags, category, &node.section, self.date_offset)
        });

        match assembled {
            Ok(poi) => {
                let bucket = Bucket::for_section(&ChangeSection::classify(&node.section));
                if bucket == Bucket::Malformed {
                    tracing::warn!(
                        "Node {} found in unrecognised section <{}>",
                        poi.node_id,
                        node.section
                    );
                }
                tracing::debug!("Node {} ({}) -> {}", poi.node_id, category, bucket.label());
                buckets.push(bucket, poi);
                Some(bucket)
            }
            Err(reason) => {
                let fault = NodeFault {
                    node_id: node.node_id,
                    section: node.section,
                    reason,
                };
                tracing::warn!("Dropping {}", fault);
                buckets.record_fault(fault);
                None
            }
        }
    }
}
