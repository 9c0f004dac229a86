use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use time::UtcOffset;

use crate::metadata::parse_utc_offset;

/// Construction parameters for a changeset parser.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Accepted `amenity` values. `shop` nodes bypass this set.
    pub accepted_amenities: BTreeSet<String>,
    /// Additional element names treated as sections. Nodes inside them are
    /// routed to the malformed bucket.
    pub extra_sections: Vec<String>,
    /// Offset used when rendering the calendar date of a timestamp.
    pub date_offset: UtcOffset,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            accepted_amenities: BTreeSet::new(),
            extra_sections: Vec::new(),
            date_offset: UtcOffset::UTC,
        }
    }
}

impl ParserOptions {
    pub fn with_amenities<I, S>(amenities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted_amenities: amenities.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn extra_section(mut self, name: impl Into<String>) -> Self {
        self.extra_sections.push(name.into());
        self
    }

    pub fn date_offset(mut self, offset: UtcOffset) -> Self {
        self.date_offset = offset;
        self
    }
}

/// Filter file as written by users.
///
/// ```yaml
/// amenities: [atm, bank]
/// sections: [renumber]
/// utc_offset: "+01:00"
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub utc_offset: Option<String>,
}

impl FilterConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()
            .with_context(|| format!("Config: Failed to read filters from {path:?}"))?;
        Ok(settings.try_deserialize()?)
    }

    pub fn utc_offset(&self) -> anyhow::Result<Option<UtcOffset>> {
        self.utc_offset
            .as_deref()
            .map(|raw| {
                parse_utc_offset(raw)
                    .with_context(|| format!("Config: invalid utc_offset {raw:?}"))
            })
            .transpose()
    }

    /// Builds parser options; `fallback_offset` applies when the file has none.
    pub fn to_options(&self, fallback_offset: UtcOffset) -> anyhow::Result<ParserOptions> {
        Ok(ParserOptions {
            accepted_amenities: self.amenities.iter().cloned().collect(),
            extra_sections: self.sections.clone(),
            date_offset: self.utc_offset()?.unwrap_or(fallback_offset),
        })
    }
}
