//! Section recognition for `create`, `modify` and `delete` groupings.

use std::collections::HashSet;
use std::fmt;

const CREATE: &str = "create";
const MODIFY: &str = "modify";
const DELETE: &str = "delete";

/// Edit intent of the section enclosing a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeSection {
    Create,
    Modify,
    Delete,
    Unknown(String),
}

impl ChangeSection {
    /// Case-insensitive classification of a section element name.
    pub fn classify(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            CREATE => ChangeSection::Create,
            MODIFY => ChangeSection::Modify,
            DELETE => ChangeSection::Delete,
            _ => ChangeSection::Unknown(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChangeSection::Create => CREATE,
            ChangeSection::Modify => MODIFY,
            ChangeSection::Delete => DELETE,
            ChangeSection::Unknown(name) => name,
        }
    }
}

impl fmt::Display for ChangeSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides which start tokens open a section.
///
/// The three keywords match case-sensitively. Extra names registered by the
/// caller are also tracked; nodes found under them end up in the malformed
/// bucket unless the name happens to be a keyword in another case.
#[derive(Debug, Clone, Default)]
pub struct SectionGate {
    extra: HashSet<String>,
}

impl SectionGate {
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra: extra.into_iter().map(Into::into).collect(),
        }
    }

    pub fn opens(&self, name: &str) -> bool {
        matches!(name, CREATE | MODIFY | DELETE) || self.extra.contains(name)
    }
}
