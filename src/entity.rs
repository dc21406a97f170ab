//! Entity records held by the store
//!
//! Authors and books share one shape: a string `id` plus opaque attributes.
//! The store never looks past the `id`.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which collection an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Kind {
    #[display("authors")]
    Authors,
    #[display("books")]
    Books,
}

/// A stored record: `id` plus arbitrary attributes, serialized flat
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Attributes to merge over an existing record
pub type Patch = Map<String, Value>;

impl Entity {
    /// Create an entity with no attributes
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style attribute setter. An `id` key is ignored.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "id" {
            self.fields.insert(key, value.into());
        }
        self
    }

    /// Build an entity stored under `id` from its JSON attributes. Any `id`
    /// inside the object is replaced.
    pub fn from_object(id: impl Into<String>, mut object: Map<String, Value>) -> Self {
        object.remove("id");
        Self {
            id: id.into(),
            fields: object,
        }
    }

    /// Drop an `id` that was put into the attributes directly
    pub fn normalize(&mut self) {
        self.fields.remove("id");
    }

    /// Look up an attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Shallow-merge `patch` over this record. A patch `id` is ignored.
    pub fn merge(&mut self, mut patch: Patch) {
        patch.remove("id");
        self.fields.extend(patch);
    }
}
