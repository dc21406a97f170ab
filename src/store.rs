use std::collections::BTreeMap;
use std::io;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{Backend, FileBackend};
use crate::config::{Config, UpdatePolicy};
use crate::encoding;
use crate::entity::{Entity, Kind, Patch};

/// Errors returned by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backing file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{kind} entity has an empty id")]
    MissingId { kind: Kind },
    #[error("{kind} entity '{id}' not found")]
    NotFound { kind: Kind, id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Default)]
struct State {
    authors: BTreeMap<String, Entity>,
    books: BTreeMap<String, Entity>,
}

impl State {
    fn collection(&self, kind: Kind) -> &BTreeMap<String, Entity> {
        match kind {
            Kind::Authors => &self.authors,
            Kind::Books => &self.books,
        }
    }

    fn collection_mut(&mut self, kind: Kind) -> &mut BTreeMap<String, Entity> {
        match kind {
            Kind::Authors => &mut self.authors,
            Kind::Books => &mut self.books,
        }
    }

    /// Put back what was stored under `id` before a failed write
    fn restore(&mut self, kind: Kind, id: &str, previous: Option<Entity>) {
        let entries = self.collection_mut(kind);
        match previous {
            Some(entity) => {
                entries.insert(id.to_string(), entity);
            }
            None => {
                entries.remove(id);
            }
        }
    }
}

/// Authors and books held in memory and mirrored to one JSON file.
///
/// A single lock covers both collections and the file write, so every
/// mutation and the snapshot that follows it happen as one unit. If the
/// write fails the mutation is undone before the error is returned.
pub struct Store {
    state: Mutex<State>,
    backend: Box<dyn Backend>,
    update_policy: UpdatePolicy,
}

impl Store {
    /// Open the store described by `config` and load its backing file
    pub async fn open(config: &Config) -> StoreResult<Self> {
        Self::with_backend(FileBackend::new(&config.db_path), config.update_policy).await
    }

    /// Open a store over any backend and load it
    pub async fn with_backend(
        backend: impl Backend + 'static,
        update_policy: UpdatePolicy,
    ) -> StoreResult<Self> {
        let store = Self {
            state: Mutex::new(State::default()),
            backend: Box::new(backend),
            update_policy,
        };
        store.init().await?;
        Ok(store)
    }

    /// Load the backing file, or create it from the current state.
    ///
    /// An unreadable or unparsable file is handled like a missing one and
    /// gets overwritten. Collections that are missing or malformed inside an
    /// otherwise valid document load empty.
    pub async fn init(&self) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let location = self.backend.describe();

        let bytes = match self.backend.read().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!("No database at {}, creating it", location);
                return self.persist(&state).await;
            }
            Err(e) => {
                warn!("Failed to read database at {}: {}, creating it", location, e);
                return self.persist(&state).await;
            }
        };

        let snapshot = match encoding::decode(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Database at {} is unusable ({}), resetting it", location, e);
                return self.persist(&state).await;
            }
        };

        for kind in &snapshot.skipped {
            warn!(
                "Collection '{}' in {} missing or malformed, loading it empty",
                kind, location
            );
        }

        state.authors = snapshot.authors;
        state.books = snapshot.books;
        info!(
            "Loaded {} authors and {} books from {}",
            state.authors.len(),
            state.books.len(),
            location
        );
        Ok(())
    }

    /// Write the full state to the backing file
    pub async fn save(&self) -> StoreResult<()> {
        let state = self.state.lock().await;
        self.persist(&state).await
    }

    async fn persist(&self, state: &State) -> StoreResult<()> {
        let bytes = encoding::encode(&state.authors, &state.books)?;
        self.backend.write(&bytes).await?;
        debug!(
            "Saved snapshot ({} authors, {} books, {} bytes)",
            state.authors.len(),
            state.books.len(),
            bytes.len()
        );
        Ok(())
    }

    /// Persist after a mutation of `id`, undoing it if the write fails
    async fn commit(
        &self,
        state: &mut State,
        kind: Kind,
        id: &str,
        previous: Option<Entity>,
    ) -> StoreResult<()> {
        if let Err(e) = self.persist(state).await {
            warn!("Save failed after changing {} '{}', rolling back: {}", kind, id, e);
            state.restore(kind, id, previous);
            return Err(e);
        }
        Ok(())
    }

    /// Insert `entity`, replacing any entity with the same id
    pub async fn add(&self, kind: Kind, mut entity: Entity) -> StoreResult<Entity> {
        entity.normalize();
        if entity.id.is_empty() {
            return Err(StoreError::MissingId { kind });
        }

        let mut state = self.state.lock().await;
        let id = entity.id.clone();
        let previous = state.collection_mut(kind).insert(id.clone(), entity.clone());
        self.commit(&mut state, kind, &id, previous).await?;
        Ok(entity)
    }

    /// Merge `patch` over the entity stored under `id`. The id itself can
    /// never change; an `id` in the patch is dropped.
    pub async fn update(&self, kind: Kind, id: &str, patch: Patch) -> StoreResult<Entity> {
        if id.is_empty() {
            return Err(StoreError::MissingId { kind });
        }

        let mut state = self.state.lock().await;
        let previous = state.collection(kind).get(id).cloned();

        let mut entity = match (&previous, self.update_policy) {
            (Some(current), _) => current.clone(),
            (None, UpdatePolicy::Upsert) => Entity::new(id),
            (None, UpdatePolicy::Reject) => {
                return Err(StoreError::NotFound {
                    kind,
                    id: id.to_string(),
                });
            }
        };
        entity.merge(patch);

        state.collection_mut(kind).insert(id.to_string(), entity);
        self.commit(&mut state, kind, id, previous).await?;

        state
            .collection(kind)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })
    }

    /// Remove the entity stored under `id`. Returns whether one existed.
    pub async fn delete(&self, kind: Kind, id: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let previous = state.collection_mut(kind).remove(id);
        let existed = previous.is_some();
        self.commit(&mut state, kind, id, previous).await?;
        Ok(existed)
    }

    /// Get the entity stored under `id`
    pub async fn get(&self, kind: Kind, id: &str) -> Option<Entity> {
        let state = self.state.lock().await;
        state.collection(kind).get(id).cloned()
    }

    /// All entities of a collection, ordered by id
    pub async fn list(&self, kind: Kind) -> Vec<Entity> {
        let state = self.state.lock().await;
        state.collection(kind).values().cloned().collect()
    }

    /// Number of entities in a collection
    pub async fn len(&self, kind: Kind) -> usize {
        let state = self.state.lock().await;
        state.collection(kind).len()
    }

    pub fn authors(&self) -> Collection<'_> {
        Collection {
            store: self,
            kind: Kind::Authors,
        }
    }

    pub fn books(&self) -> Collection<'_> {
        Collection {
            store: self,
            kind: Kind::Books,
        }
    }

    pub fn collection(&self, kind: Kind) -> Collection<'_> {
        Collection {
            store: self,
            kind,
        }
    }
}

/// Operations bound to one collection of a [`Store`]
#[derive(Clone, Copy)]
pub struct Collection<'a> {
    store: &'a Store,
    kind: Kind,
}

impl Collection<'_> {
    pub async fn add(&self, entity: Entity) -> StoreResult<Entity> {
        self.store.add(self.kind, entity).await
    }

    pub async fn update(&self, id: &str, patch: Patch) -> StoreResult<Entity> {
        self.store.update(self.kind, id, patch).await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.store.delete(self.kind, id).await
    }

    pub async fn get(&self, id: &str) -> Option<Entity> {
        self.store.get(self.kind, id).await
    }

    pub async fn list(&self) -> Vec<Entity> {
        self.store.list(self.kind).await
    }

    pub async fn len(&self) -> usize {
        self.store.len(self.kind).await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
