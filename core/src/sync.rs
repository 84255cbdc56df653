//! Remote adapter and optimistic coordinator.
//!
//! `RemoteTodos` pairs a `TodoClient` with a `Transport` and converts wire
//! posts into todos. `SyncCoordinator` drives a `TodoStore` through the
//! begin/commit/rollback cycle for each remote mutation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::TodoClient;
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::error::{ApiError, TodoError};
use crate::http::{HttpRequest, HttpResponse};
use crate::store::{PendingMutation, TodoStore};
use crate::transport::Transport;
#[cfg(feature = "http")]
use crate::transport::UreqTransport;
use crate::types::{NewTodo, PostPage, PostPayload, Todo, TodoPatch};

/// What to do with the local change when its remote call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollbackPolicy {
    /// Undo the local change and return the error.
    #[default]
    Restore,
    /// Keep the local change and only log the failure. Local and remote state
    /// may diverge until the next refresh.
    KeepLocal,
}

/// One page of todos from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage {
    pub items: Vec<Todo>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl RemotePage {
    /// Convert a parsed wire page, filling missing timestamps with `now`.
    pub fn from_posts(page: PostPage, now: DateTime<Utc>) -> Self {
        Self {
            items: page.posts.into_iter().map(|p| p.into_todo(now)).collect(),
            current_page: page.current_page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            has_next_page: page.has_next_page,
            has_previous_page: page.has_previous_page,
        }
    }
}

/// Blocking access to the posts resource, speaking in todos.
pub struct RemoteTodos<T> {
    client: TodoClient,
    transport: T,
    clock: Arc<dyn Clock>,
}

impl<T: Transport> RemoteTodos<T> {
    pub fn new(client: TodoClient, transport: T, clock: Arc<dyn Clock>) -> Self {
        Self { client, transport, clock }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.path, "remote call");
        self.transport.execute(&request)
    }

    pub fn fetch_all(&self) -> Result<Vec<Todo>, ApiError> {
        let response = self.send(self.client.build_list_todos())?;
        let now = self.clock.now();
        let posts = self.client.parse_list_todos(response)?;
        Ok(posts.into_iter().map(|p| p.into_todo(now)).collect())
    }

    pub fn fetch_one(&self, id: &str) -> Result<Todo, ApiError> {
        let response = self.send(self.client.build_get_todo(id))?;
        Ok(self.client.parse_get_todo(response)?.into_todo(self.clock.now()))
    }

    pub fn create(&self, payload: &PostPayload) -> Result<Todo, ApiError> {
        let response = self.send(self.client.build_create_todo(payload)?)?;
        Ok(self.client.parse_create_todo(response)?.into_todo(self.clock.now()))
    }

    pub fn update(&self, id: &str, payload: &PostPayload) -> Result<Todo, ApiError> {
        let response = self.send(self.client.build_update_todo(id, payload)?)?;
        Ok(self.client.parse_update_todo(response)?.into_todo(self.clock.now()))
    }

    pub fn delete(&self, id: &str) -> Result<(), ApiError> {
        let response = self.send(self.client.build_delete_todo(id))?;
        self.client.parse_delete_todo(response)
    }

    pub fn search(&self, query: &str) -> Result<Vec<Todo>, ApiError> {
        let response = self.send(self.client.build_search_todos(query))?;
        let now = self.clock.now();
        let posts = self.client.parse_search_todos(response)?;
        Ok(posts.into_iter().map(|p| p.into_todo(now)).collect())
    }

    /// `page` is 1-based.
    pub fn fetch_page(&self, page: u32, limit: u32) -> Result<RemotePage, ApiError> {
        let response = self.send(self.client.build_list_page(page, limit))?;
        let page = self.client.parse_list_page(response, page, limit)?;
        Ok(RemotePage::from_posts(page, self.clock.now()))
    }
}

/// Applies mutations locally first, then remotely, settling each per policy.
///
/// Records whose id is still temporary never reach the server; their create
/// has not been confirmed, so there is nothing remote to change yet.
pub struct SyncCoordinator<T> {
    remote: RemoteTodos<T>,
    policy: RollbackPolicy,
}

impl<T: Transport> SyncCoordinator<T> {
    pub fn new(remote: RemoteTodos<T>, policy: RollbackPolicy) -> Self {
        Self { remote, policy }
    }

    /// Base URL and rollback policy from `config`, I/O through `transport`.
    pub fn with_config(config: &ClientConfig, transport: T, clock: Arc<dyn Clock>) -> Self {
        Self::new(RemoteTodos::new(config.client(), transport, clock), config.rollback)
    }

    pub fn remote(&self) -> &RemoteTodos<T> {
        &self.remote
    }

    pub fn policy(&self) -> RollbackPolicy {
        self.policy
    }

    /// Replace the collection with the server's. Failures land in
    /// `store.error()` and are also returned.
    pub fn refresh(&self, store: &mut TodoStore) -> Result<(), ApiError> {
        store.begin_fetch();
        match self.remote.fetch_all() {
            Ok(todos) => {
                info!(count = todos.len(), "todos fetched");
                store.fetch_succeeded(todos);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "fetching todos failed");
                store.fetch_failed(&err);
                Err(err)
            }
        }
    }

    /// Returns the id the record ends up with: the server's on success, the
    /// temporary one if the failure was kept locally.
    pub fn create(&self, store: &mut TodoStore, input: NewTodo) -> Result<String, TodoError> {
        let input = input.trimmed();
        let payload = PostPayload::from(&input);
        let pending = store.begin_create(input)?;
        let temp_id = pending.id().to_string();
        match self.remote.create(&payload) {
            Ok(server) => {
                if store.commit(pending, Some(&server)) {
                    Ok(server.id)
                } else {
                    Ok(temp_id)
                }
            }
            Err(err) => {
                self.settle_failure(store, pending, err)?;
                Ok(temp_id)
            }
        }
    }

    /// `Ok(false)` when the id is unknown.
    pub fn update(&self, store: &mut TodoStore, id: &str, patch: TodoPatch) -> Result<bool, TodoError> {
        let Some(pending) = store.begin_update(id, patch)? else {
            return Ok(false);
        };
        let Some(payload) = store.get(id).filter(|t| !t.is_temporary()).map(PostPayload::from) else {
            store.commit(pending, None);
            return Ok(true);
        };
        match self.remote.update(id, &payload) {
            Ok(_) => {
                store.commit(pending, None);
                Ok(true)
            }
            Err(err) => {
                self.settle_failure(store, pending, err)?;
                Ok(true)
            }
        }
    }

    /// Flip `completed`. Returns the new value, `None` for an unknown id.
    pub fn toggle(&self, store: &mut TodoStore, id: &str) -> Result<Option<bool>, TodoError> {
        let Some(completed) = store.get(id).map(|t| !t.completed) else {
            return Ok(None);
        };
        self.update(store, id, TodoPatch::default().completed(completed))?;
        Ok(Some(completed))
    }

    /// `Ok(false)` when the id is unknown.
    pub fn delete(&self, store: &mut TodoStore, id: &str) -> Result<bool, TodoError> {
        let Some(pending) = store.begin_delete(id) else {
            return Ok(false);
        };
        if let PendingMutation::Delete { original, .. } = &pending {
            if original.is_temporary() {
                store.commit(pending, None);
                return Ok(true);
            }
        }
        match self.remote.delete(id) {
            Ok(()) => {
                store.commit(pending, None);
                Ok(true)
            }
            Err(err) => {
                self.settle_failure(store, pending, err)?;
                Ok(true)
            }
        }
    }

    fn settle_failure(
        &self,
        store: &mut TodoStore,
        pending: PendingMutation,
        err: ApiError,
    ) -> Result<(), TodoError> {
        match self.policy {
            RollbackPolicy::Restore => {
                warn!(id = pending.id(), error = %err, "remote mutation failed, rolling back");
                store.rollback(pending);
                Err(err.into())
            }
            RollbackPolicy::KeepLocal => {
                warn!(id = pending.id(), error = %err, "remote mutation failed, keeping local change");
                Ok(())
            }
        }
    }
}

#[cfg(feature = "http")]
impl SyncCoordinator<UreqTransport> {
    /// Blocking coordinator honouring every network setting in `config`.
    pub fn from_config(config: &ClientConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(config, UreqTransport::new(config.timeout()), clock)
    }
}
