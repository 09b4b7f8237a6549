//! Remote document sync surface.
//!
//! The remote flavour keeps one document per inspection record in a per-user
//! collection and receives the whole collection back as live snapshots. The
//! real backend and its sign-in flow live outside this crate; they plug in
//! through [`Authenticator`] and [`DocumentStore`].

mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::record::RecordId;

pub use memory::{MemoryAuthenticator, MemoryDocumentStore};

/// Identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Location of a user's inspection collection:
/// `artifacts/{app_id}/users/{user}/inspections`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    app_id: String,
    user: UserId,
}

impl CollectionPath {
    /// The inspection collection for `user` under `app_id`.
    #[must_use]
    pub fn inspections(app_id: impl Into<String>, user: UserId) -> Self {
        Self {
            app_id: app_id.into(),
            user,
        }
    }

    /// The user owning the collection.
    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Full path of one document in the collection.
    #[must_use]
    pub fn document(&self, id: &RecordId) -> String {
        format!("{self}/{id}")
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "artifacts/{}/users/{}/inspections",
            self.app_id, self.user
        )
    }
}

/// One document: its key and its body (the record without its id).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document key.
    pub id: RecordId,
    /// Document body.
    pub data: Value,
}

/// The full contents of a collection at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Every document in the collection.
    pub documents: Vec<Document>,
}

/// Sign-in capability for the document store.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Sign in without credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if anonymous sign-in is refused.
    async fn sign_in_anonymously(&self) -> Result<UserId>;

    /// Sign in with a token issued by the hosting environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected.
    async fn sign_in_with_token(&self, token: &str) -> Result<UserId>;

    /// Sign in with `token` when one is provided, anonymously otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen sign-in method fails.
    async fn sign_in(&self, token: Option<&str>) -> Result<UserId> {
        match token {
            Some(token) => self.sign_in_with_token(token).await,
            None => self.sign_in_anonymously().await,
        }
    }
}

/// A per-user document collection with live snapshots.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribe to a collection.
    ///
    /// The current snapshot is sent right away and a fresh one after every
    /// change. The subscription ends when `tx`'s receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    async fn subscribe(
        &self,
        path: &CollectionPath,
        tx: mpsc::UnboundedSender<Snapshot>,
    ) -> Result<()>;

    /// Create or replace one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn set_document(&self, path: &CollectionPath, id: &RecordId, data: Value)
        -> Result<()>;

    /// Delete one document; deleting a missing document succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    async fn delete_document(&self, path: &CollectionPath, id: &RecordId) -> Result<()>;
}

/// Share one store between several trackers.
#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn subscribe(
        &self,
        path: &CollectionPath,
        tx: mpsc::UnboundedSender<Snapshot>,
    ) -> Result<()> {
        (**self).subscribe(path, tx).await
    }

    async fn set_document(&self, path: &CollectionPath, id: &RecordId, data: Value)
        -> Result<()> {
        (**self).set_document(path, id, data).await
    }

    async fn delete_document(&self, path: &CollectionPath, id: &RecordId) -> Result<()> {
        (**self).delete_document(path, id).await
    }
}
