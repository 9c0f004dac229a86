//! Point-of-interest records and the tag-based inclusion rule.

use geo::BoundingRect;
use geo_types::{Point, Rect};
use std::collections::HashSet;
use time::{OffsetDateTime, UtcOffset};

use crate::error::FaultReason;
use crate::metadata::{parse_timestamp, render_date};
use crate::parser::node::{RawNodeAttributes, TagMap};

/// An accepted node, classified by the section it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub node_id: i64,
    pub version: i64,
    pub changeset: i64,
    pub lon: f64,
    pub lat: f64,
    /// Envelope of the node position (x = lon, y = lat).
    pub bounds: Rect<f64>,
    pub timestamp: OffsetDateTime,
    /// Calendar date of `timestamp` in the configured offset.
    pub date: String,
    /// Section name the node was found in.
    pub change: String,
    /// Amenity or shop type.
    pub category: String,
    pub name: Option<String>,
    pub postcode: Option<String>,
    pub opening_hours: Option<String>,
    pub operator: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub wheelchair: bool,
}

impl PointOfInterest {
    pub fn location(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Builds a record from raw attributes and the node's tags.
    pub fn assemble(
        raw: &RawNodeAttributes,
        tags: &TagMap,
        category: &str,
        change: &str,
        date_offset: UtcOffset,
    ) -> Result<Self, FaultReason> {
        let node_id = parse_integer("id", &raw.id)?;
        let version = parse_integer("version", &raw.version)?;
        let changeset = parse_integer("changeset", &raw.changeset)?;
        let lon = parse_decimal("lon", &raw.lon)?;
        let lat = parse_decimal("lat", &raw.lat)?;
        let location = validated_point(lon, lat).ok_or_else(|| FaultReason::InvalidCoordinate {
            lon: raw.lon.clone(),
            lat: raw.lat.clone(),
        })?;

        let invalid_timestamp = || FaultReason::InvalidTimestamp {
            value: raw.timestamp.clone(),
        };
        let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(invalid_timestamp)?;
        let date = render_date(timestamp, date_offset).ok_or_else(invalid_timestamp)?;

        let tag = |key: &str| tags.get(key).cloned();

        Ok(Self {
            node_id,
            version,
            changeset,
            lon,
            lat,
            bounds: location.bounding_rect(),
            timestamp,
            date,
            change: change.to_string(),
            category: category.to_string(),
            name: tag("name:en").or_else(|| tag("name")),
            postcode: tag("addr:postcode"),
            opening_hours: tag("opening_hours"),
            operator: tag("operator"),
            street: tag("addr:street"),
            city: tag("addr:city"),
            country: tag("addr:country"),
            wheelchair: tags.get("wheelchair").is_some_and(|value| value == "yes"),
        })
    }
}

fn parse_integer(attribute: &'static str, value: &str) -> Result<i64, FaultReason> {
    value.parse().map_err(|_| FaultReason::InvalidInteger {
        attribute,
        value: value.to_string(),
    })
}

fn parse_decimal(attribute: &'static str, value: &str) -> Result<f64, FaultReason> {
    value.parse().map_err(|_| FaultReason::InvalidDecimal {
        attribute,
        value: value.to_string(),
    })
}

fn validated_point(lon: f64, lat: f64) -> Option<Point<f64>> {
    (lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat))
    .then(|| Point::new(lon, lat))
}

/// Inclusion rule: an accepted `amenity` value, or any `shop` tag.
#[derive(Debug, Clone, Default)]
pub struct AmenityFilter {
    accepted: HashSet<String>,
}

impl AmenityFilter {
    pub fn new<I, S>(accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: accepted.into_iter().map(Into::into).collect(),
        }
    }

    pub fn accepts(&self, tags: &TagMap) -> bool {
        let amenity_match = tags
            .get("amenity")
            .is_some_and(|amenity| self.accepted.contains(amenity));
        amenity_match || tags.contains_key("shop")
    }

    /// Category of an accepted node: the amenity value, else the shop value.
    pub fn category<'t>(&self, tags: &'t TagMap) -> Option<&'t str> {
        if !self.accepts(tags) {
            return None;
        }
        tags.get("amenity")
            .or_else(|| tags.get("shop"))
            .map(String::as_str)
    }
}
