//! Per-user conversation threads
//!
//! The store maps a user identifier to the remote thread that holds their
//! conversation. Threads are created lazily on first use and kept for the
//! lifetime of the process; nothing is persisted or evicted.
//!
//! A single store is shared by `Arc` across every request. Workflows for the
//! same user are serialized with [`ConversationStore::lock_user`] so that two
//! concurrent requests never race to create or drive the same thread.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

use crate::error::Result;
use crate::providers::AssistantClient;

/// Remote thread identifier
pub type ThreadId = String;

/// Process-wide map from user id to conversation thread
#[derive(Debug, Default)]
pub struct ConversationStore {
    threads: RwLock<HashMap<String, ThreadId>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConversationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the workflow lock for `user_id`
    ///
    /// Hold the returned guard for the whole request. Requests for other
    /// users are not blocked.
    pub async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Thread currently assigned to `user_id`
    pub async fn get_thread(&self, user_id: &str) -> Option<ThreadId> {
        self.threads.read().await.get(user_id).cloned()
    }

    /// Assign `thread_id` to `user_id`, replacing any previous thread
    pub async fn set_thread(&self, user_id: &str, thread_id: impl Into<ThreadId>) {
        let thread_id = thread_id.into();
        debug!("Assigning thread {} to user {}", thread_id, user_id);
        self.threads
            .write()
            .await
            .insert(user_id.to_string(), thread_id);
    }

    /// Forget the thread of `user_id`, returning it if one was assigned
    ///
    /// The next request from this user starts a fresh conversation. The
    /// user's workflow lock is dropped too unless a request holds or awaits it.
    pub async fn remove_thread(&self, user_id: &str) -> Option<ThreadId> {
        {
            let mut locks = self.locks.lock().await;
            if locks
                .get(user_id)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
            {
                locks.remove(user_id);
            }
        }
        self.threads.write().await.remove(user_id)
    }

    #[cfg(test)]
    async fn lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Existing thread for `user_id`, or a new one created through `client`
    ///
    /// Callers that may run concurrently for the same user must hold
    /// [`ConversationStore::lock_user`] around this call.
    ///
    /// # Errors
    ///
    /// Returns error if the remote service fails to create the thread
    pub async fn get_or_create_thread(
        &self,
        user_id: &str,
        client: &dyn AssistantClient,
    ) -> Result<ThreadId> {
        if let Some(thread_id) = self.get_thread(user_id).await {
            debug!("Reusing thread {} for user {}", thread_id, user_id);
            return Ok(thread_id);
        }

        let thread = client.create_thread().await?;
        info!("Created thread {} for user {}", thread.id, user_id);
        self.set_thread(user_id, thread.id.clone()).await;
        Ok(thread.id)
    }

    /// Number of users with an assigned thread
    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }

    /// True if no user has a thread yet
    pub async fn is_empty(&self) -> bool {
        self.threads.read().await.is_empty()
    }
}
