//! Stream settings shared by the reader and the sorted-stream algorithms
//!
//! Values come from the command line, which in turn reads `MARC_*` environment variables
//! (optionally from a `.env` file, see [`load_env_file`]).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::natural_order::OrderKind;
use crate::raw_record::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Control field holding the record identifier
    #[serde(with = "tag_serde")]
    pub id_tag: Tag,
    /// Fold consecutive same-identifier records into one combined record
    pub combine_records: bool,
    /// Order all inputs are expected to be sorted in
    pub order: OrderKind,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            id_tag: Tag::CONTROL_NUMBER,
            combine_records: true,
            order: OrderKind::Natural,
        }
    }
}

impl StreamConfig {
    /// Build from the textual forms used on the command line.
    pub fn from_parts(id_tag: &str, combine_records: bool, order: &str) -> Result<Self> {
        Ok(Self {
            id_tag: id_tag.parse()?,
            combine_records,
            order: order.parse()?,
        })
    }

    pub fn with_combine(mut self, combine_records: bool) -> Self {
        self.combine_records = combine_records;
        self
    }

    pub fn with_id_tag(mut self, id_tag: Tag) -> Self {
        self.id_tag = id_tag;
        self
    }

    pub fn with_order(mut self, order: OrderKind) -> Self {
        self.order = order;
        self
    }
}

/// Load a `.env` file from the working directory (or a parent) if there is one.
///
/// Must run before command line parsing so clap's `env` fallbacks see the values.
pub fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("⚠️  Ignoring unreadable .env file: {e}"),
    }
}

mod tag_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::raw_record::Tag;

    pub fn serialize<S: Serializer>(tag: &Tag, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(tag.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Tag, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
