//! In-process implementations of the sync traits.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::record::RecordId;

use super::{Authenticator, CollectionPath, Document, DocumentStore, Snapshot, UserId};

/// Issues random user ids anonymously and fixed ids for known tokens.
#[derive(Debug, Default)]
pub struct MemoryAuthenticator {
    tokens: HashMap<String, UserId>,
}

impl MemoryAuthenticator {
    /// Create an authenticator that knows no tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` and sign it in as `user`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user: UserId) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl Authenticator for MemoryAuthenticator {
    async fn sign_in_anonymously(&self) -> Result<UserId> {
        let user = UserId::from(Uuid::new_v4().to_string());
        debug!("Signed in anonymously as {}", user);
        Ok(user)
    }

    async fn sign_in_with_token(&self, token: &str) -> Result<UserId> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| Error::AuthFailed("unknown token".to_string()))
    }
}

#[derive(Debug, Default)]
struct Collection {
    documents: BTreeMap<RecordId, Value>,
    subscribers: Vec<mpsc::UnboundedSender<Snapshot>>,
}

impl Collection {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            documents: self
                .documents
                .iter()
                .map(|(id, data)| Document {
                    id: id.clone(),
                    data: data.clone(),
                })
                .collect(),
        }
    }

    fn publish(&mut self) {
        self.subscribers.retain(|tx| !tx.is_closed());
        let snapshot = self.snapshot();
        for tx in &self.subscribers {
            // A receiver dropped since the retain above is pruned next time
            let _ = tx.send(snapshot.clone());
        }
        trace!("Published snapshot to {} subscribers", self.subscribers.len());
    }
}

/// A [`DocumentStore`] kept in process memory, ordered by document id.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<CollectionPath, Collection>>,
    fail_writes: AtomicBool,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write or delete fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Read one document directly, bypassing subscriptions.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn document(&self, path: &CollectionPath, id: &RecordId) -> Result<Option<Value>> {
        Ok(self
            .lock()?
            .get(path)
            .and_then(|collection| collection.documents.get(id).cloned()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<CollectionPath, Collection>>> {
        self.collections
            .lock()
            .map_err(|_| Error::internal("document store lock poisoned"))
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(Error::sync("document store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn subscribe(
        &self,
        path: &CollectionPath,
        tx: mpsc::UnboundedSender<Snapshot>,
    ) -> Result<()> {
        let mut collections = self.lock()?;
        let collection = collections.entry(path.clone()).or_default();
        tx.send(collection.snapshot())
            .map_err(|_| Error::sync("subscriber closed before first snapshot"))?;
        collection.subscribers.push(tx);
        debug!("Subscribed to {}", path);
        Ok(())
    }

    async fn set_document(&self, path: &CollectionPath, id: &RecordId, data: Value) -> Result<()> {
        self.check_writable()?;
        let mut collections = self.lock()?;
        let collection = collections.entry(path.clone()).or_default();
        collection.documents.insert(id.clone(), data);
        collection.publish();
        debug!("Set document {}", path.document(id));
        Ok(())
    }

    async fn delete_document(&self, path: &CollectionPath, id: &RecordId) -> Result<()> {
        self.check_writable()?;
        let mut collections = self.lock()?;
        if let Some(collection) = collections.get_mut(path) {
            if collection.documents.remove(id).is_some() {
                collection.publish();
                debug!("Deleted document {}", path.document(id));
            }
        }
        Ok(())
    }
}
