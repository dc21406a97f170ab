use serde_json::{Value, json};
use thiserror::Error;

use crate::entity::{Entity, Kind, Patch};
use crate::store::{Store, StoreError};

/// One store operation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List every entity of a collection
    List(Kind),
    /// Get one entity by id
    Get(Kind, String),
    /// Add (or replace) an entity
    Add(Kind, Entity),
    /// Merge a patch into an entity
    Update(Kind, String, Patch),
    /// Delete an entity by id
    Delete(Kind, String),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid JSON argument: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parse a command line argument into a JSON object
pub fn parse_object(raw: &str) -> Result<serde_json::Map<String, Value>, CommandError> {
    match serde_json::from_str(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(CommandError::NotAnObject(other.to_string())),
    }
}

impl Command {
    /// Build an `Add` command from its JSON argument
    pub fn add(kind: Kind, raw: &str) -> Result<Self, CommandError> {
        let object = parse_object(raw)?;
        let entity = serde_json::from_value(Value::Object(object))?;
        Ok(Command::Add(kind, entity))
    }

    /// Build an `Update` command from its JSON patch argument
    pub fn update(kind: Kind, id: impl Into<String>, raw: &str) -> Result<Self, CommandError> {
        Ok(Command::Update(kind, id.into(), parse_object(raw)?))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Command::List(kind)
            | Command::Get(kind, _)
            | Command::Add(kind, _)
            | Command::Update(kind, _, _)
            | Command::Delete(kind, _) => *kind,
        }
    }

    /// Execute the command on the given store and return the response
    pub async fn execute(self, store: &Store) -> Result<Value, CommandError> {
        let collection = store.collection(self.kind());
        let response = match self {
            Command::List(_) => serde_json::to_value(collection.list().await)?,
            Command::Get(_, id) => match collection.get(&id).await {
                Some(entity) => serde_json::to_value(entity)?,
                None => Value::Null,
            },
            Command::Add(_, entity) => serde_json::to_value(collection.add(entity).await?)?,
            Command::Update(_, id, patch) => {
                serde_json::to_value(collection.update(&id, patch).await?)?
            }
            Command::Delete(_, id) => json!({ "deleted": collection.delete(&id).await? }),
        };
        Ok(response)
    }
}
