//! Extracts points of interest from OpenStreetMap change documents.
//!
//! A change document groups `node` elements into `create`, `modify` and
//! `delete` sections. [`ChangesetParser`] walks the XML once, keeps nodes
//! carrying an accepted `amenity` or any `shop` tag, and sorts the resulting
//! [`PointOfInterest`] records into buckets by section.
//!
//! ```
//! use changepoi::{ChangesetParser, ParserOptions};
//!
//! let xml = r#"<osmChange><create>
//!   <node id="1" version="1" changeset="10" timestamp="2021-01-01T00:00:00Z" lon="13.4" lat="52.5">
//!     <tag k="amenity" v="bank"/>
//!   </node>
//! </create></osmChange>"#;
//!
//! let mut parser = ChangesetParser::from_xml(xml, ParserOptions::with_amenities(["bank"]));
//! let buckets = parser.run()?;
//! assert_eq!(buckets.created()[0].category, "bank");
//! # Ok::<(), changepoi::ParseError>(())
//! ```

pub mod app;
pub mod classify;
pub mod config;
pub mod cursor;
pub mod error;
pub mod metadata;
pub mod parser;
pub mod poi;
pub mod sinks;

pub use classify::{Bucket, Buckets};
pub use config::ParserOptions;
pub use error::{FaultReason, NodeFault, ParseError};
pub use parser::ChangesetParser;
pub use poi::PointOfInterest;
