use anyhow::Result;
use geo_types::Geometry;
use ::geojson::Feature;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::classify::Bucket;
use crate::metadata::format_timestamp;
use crate::poi::PointOfInterest;

pub mod geojson;
pub mod geojsonl;

pub use self::geojson::GeoJsonSink;
pub use self::geojsonl::GeoJsonlSink;

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl From<ColumnValue> for Value {
    fn from(value: ColumnValue) -> Self {
        match value {
            ColumnValue::String(val) => Value::String(val),
            ColumnValue::Integer(val) => Value::from(val),
            ColumnValue::Float(val) => Value::from(val),
            ColumnValue::Bool(val) => Value::Bool(val),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FeatureRow {
    pub geometry: Geometry<f64>,
    /// `[min_x, min_y, max_x, max_y]`
    pub bbox: Option<Vec<f64>>,
    pub columns: BTreeMap<String, ColumnValue>,
}

impl FeatureRow {
    pub fn from_poi(poi: &PointOfInterest, bucket: Bucket) -> Self {
        let mut columns = BTreeMap::new();
        let mut put = |name: &str, value: ColumnValue| {
            columns.insert(name.to_string(), value);
        };

        put("id", ColumnValue::Integer(poi.node_id));
        put("version", ColumnValue::Integer(poi.version));
        put("changeset", ColumnValue::Integer(poi.changeset));
        if let Some(timestamp) = format_timestamp(poi.timestamp) {
            put("timestamp", ColumnValue::String(timestamp));
        }
        put("date", ColumnValue::String(poi.date.clone()));
        put("change", ColumnValue::String(poi.change.clone()));
        put("bucket", ColumnValue::String(bucket.label().to_string()));
        put("category", ColumnValue::String(poi.category.clone()));
        put("wheelchair", ColumnValue::Bool(poi.wheelchair));

        let optional = [
            ("name", &poi.name),
            ("postcode", &poi.postcode),
            ("opening_hours", &poi.opening_hours),
            ("operator", &poi.operator),
            ("street", &poi.street),
            ("city", &poi.city),
            ("country", &poi.country),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                put(name, ColumnValue::String(value.clone()));
            }
        }

        let min = poi.bounds.min();
        let max = poi.bounds.max();
        Self {
            geometry: Geometry::Point(poi.location()),
            bbox: Some(vec![min.x, min.y, max.x, max.y]),
            columns,
        }
    }

    pub fn into_feature(self) -> Feature {
        let properties: Map<String, Value> = self
            .columns
            .into_iter()
            .map(|(name, value)| (name, Value::from(value)))
            .collect();

        Feature {
            bbox: self.bbox,
            geometry: Some(::geojson::Geometry::from(&self.geometry)),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

pub trait DataSink: Send {
    fn add_feature(&mut self, row: FeatureRow) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}
