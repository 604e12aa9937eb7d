//! Bookmarked events ("saved set") for anonymous and signed-in viewers.
//!
//! Anonymous viewers keep their ids in the local store under their device
//! namespace. Signed-in viewers keep theirs in the `bookmarks` table and work
//! against an in-memory mirror that only changes once the remote write has
//! succeeded. The two never mix unless the viewer asks for a merge.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::local_store::{LocalStore, SAVED_KEY, device_key};
use crate::viewer::Viewer;

const TOGGLE_FAILED: &str = "Could not update your saved events. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub event_id: String,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl ToggleOutcome {
    fn applied(event_id: &str, saved: bool) -> Self {
        Self {
            event_id: event_id.to_string(),
            saved,
            notice: None,
        }
    }

    /// The saved set could not be read at all, so nothing is known to be saved.
    pub fn unavailable(event_id: &str) -> Self {
        Self::failed(event_id, false)
    }

    fn failed(event_id: &str, saved: bool) -> Self {
        Self {
            event_id: event_id.to_string(),
            saved,
            notice: Some(TOGGLE_FAILED.to_string()),
        }
    }
}

pub trait SavedStore {
    fn ids(&self) -> impl Future<Output = Vec<String>> + Send;

    /// Flips membership of `event_id`. Failures leave the set as it was and
    /// come back as a notice on the outcome.
    fn toggle(&mut self, event_id: &str) -> impl Future<Output = ToggleOutcome> + Send;
}

pub struct LocalSavedSet {
    store: LocalStore,
    key: String,
}

impl LocalSavedSet {
    pub fn new(store: LocalStore, device: &str) -> Self {
        Self {
            store,
            key: device_key(device, SAVED_KEY),
        }
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        self.store.remove(&self.key).await?;
        Ok(())
    }
}

impl SavedStore for LocalSavedSet {
    async fn ids(&self) -> Vec<String> {
        self.store.get::<Vec<String>>(&self.key).await.unwrap_or_default()
    }

    async fn toggle(&mut self, event_id: &str) -> ToggleOutcome {
        let result = self
            .store
            .update::<Vec<String>, bool>(&self.key, |ids| {
                if ids.iter().any(|id| id == event_id) {
                    ids.retain(|id| id != event_id);
                    false
                } else {
                    ids.push(event_id.to_string());
                    true
                }
            })
            .await;
        match result {
            Ok(saved) => ToggleOutcome::applied(event_id, saved),
            Err(e) => {
                tracing::warn!(event_id, error = %e, "failed to write local saved set");
                let saved = self.ids().await.iter().any(|id| id == event_id);
                ToggleOutcome::failed(event_id, saved)
            }
        }
    }
}

pub struct RemoteSavedSet {
    pool: SqlitePool,
    user_id: String,
    mirror: Vec<String>,
}

impl RemoteSavedSet {
    pub async fn load(pool: SqlitePool, user_id: &str) -> Result<Self, AppError> {
        let mirror = db::list_bookmark_ids(&pool, user_id).await?;
        Ok(Self {
            pool,
            user_id: user_id.to_string(),
            mirror,
        })
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.mirror.iter().any(|id| id == event_id)
    }

    /// Adds every id from `local` the account does not have yet, then clears
    /// the local set. Returns how many ids were added.
    pub async fn merge_from(&mut self, local: &LocalSavedSet) -> Result<usize, AppError> {
        let mut added = 0;
        for id in local.ids().await {
            if self.contains(&id) {
                continue;
            }
            db::insert_bookmark(&self.pool, &self.user_id, &id).await?;
            self.mirror.push(id);
            added += 1;
        }
        local.clear().await?;
        tracing::info!(user_id = %self.user_id, added, "merged anonymous saved events into account");
        Ok(added)
    }
}

impl SavedStore for RemoteSavedSet {
    async fn ids(&self) -> Vec<String> {
        self.mirror.clone()
    }

    async fn toggle(&mut self, event_id: &str) -> ToggleOutcome {
        let was_saved = self.contains(event_id);
        let result = if was_saved {
            db::delete_bookmark(&self.pool, &self.user_id, event_id).await
        } else {
            db::insert_bookmark(&self.pool, &self.user_id, event_id).await
        };
        match result {
            Ok(()) => {
                if was_saved {
                    self.mirror.retain(|id| id != event_id);
                } else {
                    self.mirror.push(event_id.to_string());
                }
                ToggleOutcome::applied(event_id, !was_saved)
            }
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, event_id, error = %e, "bookmark write failed");
                ToggleOutcome::failed(event_id, was_saved)
            }
        }
    }
}

/// The saved set a viewer works with, picked by whether they are signed in.
pub enum SavedSet {
    Anonymous(LocalSavedSet),
    Authenticated(RemoteSavedSet),
}

impl SavedSet {
    pub async fn for_viewer(pool: &SqlitePool, store: &LocalStore, viewer: &Viewer) -> Result<Self, AppError> {
        Ok(match &viewer.user_id {
            Some(user_id) => SavedSet::Authenticated(RemoteSavedSet::load(pool.clone(), user_id).await?),
            None => SavedSet::Anonymous(LocalSavedSet::new(store.clone(), &viewer.device)),
        })
    }

    /// Namespace used to serialize toggles from the same owner.
    pub fn owner_key(viewer: &Viewer) -> String {
        match &viewer.user_id {
            Some(user_id) => format!("user:{user_id}"),
            None => format!("device:{}", viewer.device),
        }
    }
}

impl SavedStore for SavedSet {
    async fn ids(&self) -> Vec<String> {
        match self {
            SavedSet::Anonymous(local) => local.ids().await,
            SavedSet::Authenticated(remote) => remote.ids().await,
        }
    }

    async fn toggle(&mut self, event_id: &str) -> ToggleOutcome {
        match self {
            SavedSet::Anonymous(local) => local.toggle(event_id).await,
            SavedSet::Authenticated(remote) => remote.toggle(event_id).await,
        }
    }
}

/// Toggles currently being applied, keyed by owner and event id.
#[derive(Clone, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

/// Held for the duration of one toggle; releases its key on drop.
pub struct InFlightPermit {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InFlight {
    /// `None` when a toggle for the same owner and event is still running.
    pub fn try_acquire(&self, owner: &str, event_id: &str) -> Option<InFlightPermit> {
        let key = format!("{owner}/{event_id}");
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightPermit {
            keys: Arc::clone(&self.keys),
            key,
        })
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.remove(&self.key);
    }
}
