//! Persisted scene document format (JSON).
//!
//! A document declares exactly one of `root` (a standalone scene name) or
//! `inherits` (a relative URI of an ancestor scene), plus a flat map of
//! entity records keyed by entity name. Sibling order is reconstructed from
//! `parent`/`index` pairs, never from nesting.

pub mod uri;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::Error;
use crate::core::types::Result;

/// Static mode values a document may declare. Absence means "inherits".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStaticMode {
    Static,
    Dynamic,
}

/// One component entry: inline `props` or an external `src` reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

/// One entity entry in the flat document map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(
        rename = "staticMode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub static_mode: Option<DocStaticMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentRecord>,
}

/// The persisted scene document.
///
/// Entity insertion order is preserved (`IndexMap`); the ordering algorithm
/// relies on it for stable tie-breaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub entities: IndexMap<String, EntityRecord>,
}

impl SceneDocument {
    /// Parse a document from JSON text, enforcing the root/inherits contract.
    pub fn parse(url: &str, text: &str) -> Result<Self> {
        let doc: SceneDocument =
            serde_json::from_str(text).map_err(|e| Error::SceneLoader {
                url: url.to_string(),
                reason: format!("damaged: {e}"),
            })?;
        doc.validate(url)?;
        Ok(doc)
    }

    /// A document must declare exactly one of `root` or `inherits`.
    pub fn validate(&self, url: &str) -> Result<()> {
        match (&self.root, &self.inherits) {
            (Some(_), Some(_)) => Err(Error::Config(format!(
                "{url}: declares both \"root\" and \"inherits\""
            ))),
            (None, None) => Err(Error::Config(format!(
                "{url}: declares neither \"root\" nor \"inherits\""
            ))),
            _ => Ok(()),
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
