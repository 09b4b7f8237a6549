//! Application contexts owning the inspection collection.
//!
//! A tracker holds the current [`Inspections`] value and the persistence
//! collaborator it mirrors to. Mutations always land in memory first;
//! persistence is best effort, and a failed write is logged rather than
//! returned.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::inspections::Inspections;
use crate::record::{InspectionForm, InspectionRecord, RecordId};
use crate::storage::{KeyValueStore, LocalStore};
use crate::sync::{Authenticator, CollectionPath, DocumentStore, Snapshot, UserId};

/// Tracker backed by a single local blob.
#[derive(Debug)]
pub struct LocalTracker<S> {
    inspections: Inspections,
    store: LocalStore<S>,
}

impl<S: KeyValueStore> LocalTracker<S> {
    /// Load the stored collection; unreadable data starts an empty one.
    pub fn open(store: LocalStore<S>) -> Self {
        let inspections = load_or_empty(&store);
        Self { inspections, store }
    }

    /// Replace the in-memory collection with what is stored.
    pub fn reload(&mut self) {
        self.inspections = load_or_empty(&self.store);
    }

    /// Add a record, or update `editing_id` in place, then persist.
    ///
    /// # Errors
    ///
    /// Returns the validation error when the form is rejected; nothing is
    /// changed or written in that case. Persistence failures are not errors.
    pub fn submit(
        &mut self,
        form: &InspectionForm,
        editing_id: Option<&RecordId>,
    ) -> Result<InspectionRecord> {
        let (inspections, record) = self.inspections.upsert(form, editing_id)?;
        self.inspections = inspections;
        self.persist();
        Ok(record)
    }

    /// Remove a record and persist. Returns whether a record was removed.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.inspections.len();
        self.inspections = self.inspections.remove(id);
        self.persist();
        self.inspections.len() < before
    }

    /// The current collection.
    #[must_use]
    pub fn inspections(&self) -> &Inspections {
        &self.inspections
    }

    /// Records due for an ITV, soonest first.
    #[must_use]
    pub fn upcoming(&self) -> Vec<&InspectionRecord> {
        self.inspections.upcoming()
    }

    /// The persistence collaborator.
    #[must_use]
    pub fn store(&self) -> &LocalStore<S> {
        &self.store
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(self.inspections.records()) {
            error!("Failed to save inspections: {}", e);
        }
    }
}

fn load_or_empty<S: KeyValueStore>(store: &LocalStore<S>) -> Inspections {
    match store.load() {
        Ok(records) => Inspections::replace_all(records),
        Err(e) => {
            error!("Failed to load inspections, starting empty: {}", e);
            Inspections::new()
        }
    }
}

/// Tracker backed by a per-user remote document collection.
///
/// Local changes are applied optimistically and written per document; the
/// next snapshot from the store replaces the whole collection.
#[derive(Debug)]
pub struct RemoteTracker<D> {
    inspections: Inspections,
    store: D,
    path: CollectionPath,
    snapshots: mpsc::UnboundedReceiver<Snapshot>,
}

impl<D: DocumentStore> RemoteTracker<D> {
    /// Sign in and subscribe to the user's inspection collection.
    ///
    /// Uses token sign-in when `config.auth_token` is set, anonymous otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if sign-in or the subscription fails.
    pub async fn connect<A>(auth: &A, store: D, config: &SyncConfig) -> Result<Self>
    where
        A: Authenticator + ?Sized,
    {
        let user = auth.sign_in(config.auth_token.as_deref()).await?;
        let path = CollectionPath::inspections(config.app_id.clone(), user);

        let (tx, snapshots) = mpsc::unbounded_channel();
        store.subscribe(&path, tx).await?;
        info!("Subscribed to {}", path);

        Ok(Self {
            inspections: Inspections::new(),
            store,
            path,
            snapshots,
        })
    }

    /// Replace the collection with a snapshot, skipping invalid documents.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let records = snapshot.documents.into_iter().filter_map(|doc| {
            match InspectionRecord::from_document(&doc.id, doc.data) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping document {}: {}", self.path.document(&doc.id), e);
                    None
                }
            }
        });
        self.inspections = Inspections::replace_all(records.collect::<Vec<_>>());
    }

    /// Wait for the next snapshot and apply it.
    ///
    /// Returns `false` once the store has closed the subscription.
    pub async fn next_snapshot(&mut self) -> bool {
        match self.snapshots.recv().await {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Apply every snapshot already delivered, returning how many were applied.
    pub fn drain_snapshots(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(snapshot) = self.snapshots.try_recv() {
            self.apply_snapshot(snapshot);
            applied += 1;
        }
        applied
    }

    /// Add or update a record and write its document.
    ///
    /// # Errors
    ///
    /// Returns the validation error when the form is rejected; nothing is
    /// changed or written in that case. Write failures are not errors.
    pub async fn submit(
        &mut self,
        form: &InspectionForm,
        editing_id: Option<&RecordId>,
    ) -> Result<InspectionRecord> {
        let (inspections, record) = self.inspections.upsert(form, editing_id)?;
        self.inspections = inspections;

        let written = match record.to_document() {
            Ok(data) => self.store.set_document(&self.path, &record.id, data).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            error!("Failed to save {}: {}", self.path.document(&record.id), e);
        }
        Ok(record)
    }

    /// Remove a record and delete its document. Returns whether a record was
    /// removed locally.
    pub async fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.inspections.len();
        self.inspections = self.inspections.remove(id);
        if let Err(e) = self.store.delete_document(&self.path, id).await {
            error!("Failed to delete {}: {}", self.path.document(id), e);
        }
        self.inspections.len() < before
    }

    /// The signed-in user.
    #[must_use]
    pub fn user(&self) -> &UserId {
        self.path.user()
    }

    /// The subscribed collection.
    #[must_use]
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// The current collection.
    #[must_use]
    pub fn inspections(&self) -> &Inspections {
        &self.inspections
    }

    /// Records due for an ITV, soonest first.
    #[must_use]
    pub fn upcoming(&self) -> Vec<&InspectionRecord> {
        self.inspections.upcoming()
    }

    /// The document store.
    #[must_use]
    pub fn store(&self) -> &D {
        &self.store
    }
}
