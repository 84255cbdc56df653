//! The single owner of the todo collection and its UI-state flags.
//!
//! # Design
//! `TodoStore` is a plain value: whoever creates it owns it and passes
//! `&mut` to whatever needs to mutate. Every operation is keyed by record id
//! and a missing id is a silent no-op, so remote completions can be applied in
//! any order.
//!
//! Optimistic remote mutations are split in two. `begin_*` applies the local
//! change and returns a [`PendingMutation`]; once the remote call settles the
//! owner calls [`TodoStore::confirm_create`] (creates only) or
//! [`TodoStore::rollback`]. `SyncCoordinator` wires this up for blocking
//! transports; hosts with their own async I/O call the halves directly.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::debounce::{Debouncer, DEFAULT_SEARCH_DEBOUNCE};
use crate::error::ApiError;
use crate::filter::{apply_filters, DateFilter, FilterConfig, SortKey, SortOrder, StatusFilter, TimeFilter};
use crate::pagination::{Pagination, DEFAULT_PAGE_SIZE};
use crate::persist::{self, KeyValueStorage, PersistError};
use crate::types::{NewTodo, Todo, TodoPatch, TEMP_ID_PREFIX};
use crate::validate::{validate_new, validate_patch, ValidationErrors};

/// Tunables for a store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub page_size: usize,
    /// How many rows `finish_load_more` adds to the window.
    pub load_more_step: usize,
    pub search_debounce: std::time::Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            load_more_step: DEFAULT_PAGE_SIZE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

/// Local half of an in-flight remote mutation, kept until the call settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingMutation {
    Create {
        temp_id: String,
    },
    Update {
        id: String,
        patch: TodoPatch,
        original: Todo,
        applied_at: DateTime<Utc>,
    },
    Delete {
        original: Todo,
        index: usize,
    },
}

impl PendingMutation {
    /// Id of the record the mutation touched.
    pub fn id(&self) -> &str {
        match self {
            PendingMutation::Create { temp_id } => temp_id,
            PendingMutation::Update { id, .. } => id,
            PendingMutation::Delete { original, .. } => &original.id,
        }
    }
}

pub struct TodoStore {
    todos: Vec<Todo>,
    loading: bool,
    error: Option<String>,
    filters: FilterConfig,
    pagination: Pagination,
    search_input: Debouncer<String>,
    options: StoreOptions,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoStore")
            .field("todos", &self.todos.len())
            .field("loading", &self.loading)
            .field("error", &self.error)
            .field("filters", &self.filters)
            .field("pagination", &self.pagination)
            .finish_non_exhaustive()
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl TodoStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_options(clock, StoreOptions::default())
    }

    pub fn with_options(clock: Arc<dyn Clock>, options: StoreOptions) -> Self {
        Self {
            todos: Vec::new(),
            loading: false,
            error: None,
            filters: FilterConfig::default(),
            pagination: Pagination::with_page_size(options.page_size),
            search_input: Debouncer::new(options.search_debounce),
            options,
            clock,
        }
    }

    /// Seed the collection, e.g. from persisted data.
    pub fn with_todos(mut self, todos: Vec<Todo>) -> Self {
        self.replace_all(todos);
        self
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filters(&self) -> &FilterConfig {
        &self.filters
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The full filtered and sorted list.
    pub fn visible(&self) -> Vec<Todo> {
        apply_filters(&self.todos, &self.filters, self.clock.local_now())
    }

    /// The part of [`visible`](Self::visible) inside the pagination window.
    pub fn page_items(&self) -> Vec<Todo> {
        let mut visible = self.visible();
        visible.truncate(self.pagination.window(&visible).len());
        visible
    }

    pub fn filter_summary(&self) -> String {
        self.filters.to_string()
    }

    // -----------------------------------------------------------------------
    // Local CRUD
    // -----------------------------------------------------------------------

    /// Validate and prepend a new todo. Returns its id.
    pub fn add(&mut self, input: NewTodo) -> Result<String, ValidationErrors> {
        let input = input.trimmed();
        validate_new(&input, self.clock.today())?;
        let id = Uuid::new_v4().to_string();
        self.insert_new(id.clone(), input);
        Ok(id)
    }

    /// Merge `patch` into the record. `Ok(false)` when the id is unknown.
    pub fn update(&mut self, id: &str, patch: &TodoPatch) -> Result<bool, ValidationErrors> {
        let patch = patch.clone().trimmed();
        validate_patch(&patch, self.clock.today())?;
        let now = self.clock.now();
        let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) else {
            debug!(id, "update of unknown todo ignored");
            return Ok(false);
        };
        patch.apply_to(todo);
        todo.updated_at = now.max(todo.created_at);
        self.sync_pagination();
        Ok(true)
    }

    pub fn delete(&mut self, id: &str) -> Option<Todo> {
        let index = self.todos.iter().position(|t| t.id == id)?;
        let removed = self.todos.remove(index);
        self.sync_pagination();
        Some(removed)
    }

    /// Flip `completed`. Returns the new value, `None` for an unknown id.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let now = self.clock.now();
        let todo = self.todos.iter_mut().find(|t| t.id == id)?;
        todo.completed = !todo.completed;
        todo.updated_at = now.max(todo.created_at);
        let completed = todo.completed;
        self.sync_pagination();
        Some(completed)
    }

    pub fn replace_all(&mut self, todos: Vec<Todo>) {
        self.todos = todos;
        self.sync_pagination();
    }

    fn insert_new(&mut self, id: String, input: NewTodo) {
        let now = self.clock.now();
        let todo = Todo {
            id,
            name: input.name,
            description: input.description,
            due_date: input.due_date,
            time: input.time,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        debug!(id = %todo.id, "todo added");
        self.todos.insert(0, todo);
        self.sync_pagination();
    }

    // -----------------------------------------------------------------------
    // Fetch lifecycle
    // -----------------------------------------------------------------------

    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn fetch_succeeded(&mut self, todos: Vec<Todo>) {
        self.loading = false;
        self.replace_all(todos);
    }

    pub fn fetch_failed(&mut self, error: &ApiError) {
        self.loading = false;
        self.error = Some(error.to_string());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Empty collection, default filters and pagination.
    pub fn reset(&mut self) {
        self.todos.clear();
        self.loading = false;
        self.error = None;
        self.filters = FilterConfig::default();
        self.search_input.cancel();
        self.pagination = Pagination::with_page_size(self.options.page_size);
    }

    // -----------------------------------------------------------------------
    // Filters and sort
    // -----------------------------------------------------------------------

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.filters.search_query = query.into();
        self.sync_pagination();
    }

    /// Record a keystroke; the text reaches the filter once typing pauses.
    pub fn type_search(&mut self, text: impl Into<String>, now: Instant) {
        self.search_input.push(text.into(), now);
    }

    /// Apply debounced search text if its quiet period is over.
    pub fn flush_search(&mut self, now: Instant) -> bool {
        match self.search_input.poll(now) {
            Some(query) => {
                self.set_search_query(query);
                true
            }
            None => false,
        }
    }

    /// When the pending search text becomes due.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search_input.deadline()
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filters.status = status;
        self.sync_pagination();
    }

    pub fn set_date_filter(&mut self, date: DateFilter) {
        self.filters.date = date;
        self.sync_pagination();
    }

    pub fn set_time_filter(&mut self, time: TimeFilter) {
        self.filters.time = time;
        self.sync_pagination();
    }

    pub fn set_sort(&mut self, key: SortKey, order: SortOrder) {
        self.filters.sort_by = key;
        self.filters.sort_order = order;
    }

    pub fn set_filters(&mut self, filters: FilterConfig) {
        self.filters = filters;
        self.sync_pagination();
    }

    /// Reset search, status, date and time filters (the sort stays) and go
    /// back to the first page.
    pub fn clear_filters(&mut self) {
        self.search_input.cancel();
        self.filters = FilterConfig {
            sort_by: self.filters.sort_by,
            sort_order: self.filters.sort_order,
            ..FilterConfig::default()
        };
        self.pagination.current_page = 0;
        self.sync_pagination();
    }

    // -----------------------------------------------------------------------
    // Pagination
    // -----------------------------------------------------------------------

    pub fn set_page_size(&mut self, page_size: usize) {
        self.pagination.set_page_size(page_size);
    }

    pub fn set_current_page(&mut self, page: usize) {
        self.pagination.set_current_page(page);
    }

    pub fn next_page(&mut self) -> bool {
        self.pagination.next_page()
    }

    pub fn previous_page(&mut self) -> bool {
        self.pagination.previous_page()
    }

    /// Start revealing more rows. `false` if already loading or at the end.
    pub fn begin_load_more(&mut self) -> bool {
        if self.pagination.is_loading_more || !self.pagination.has_next_page {
            return false;
        }
        self.pagination.is_loading_more = true;
        true
    }

    /// Widen the window by `load_more_step` rows.
    pub fn finish_load_more(&mut self) {
        if !self.pagination.is_loading_more {
            return;
        }
        self.pagination.is_loading_more = false;
        let widened = self.pagination.page_size + self.options.load_more_step.max(1);
        self.pagination.set_page_size(widened);
    }

    fn sync_pagination(&mut self) {
        let total = apply_filters(&self.todos, &self.filters, self.clock.local_now()).len();
        self.pagination.recompute(total);
    }

    // -----------------------------------------------------------------------
    // Optimistic remote mutations
    // -----------------------------------------------------------------------

    /// Prepend `input` under a temporary id.
    pub fn begin_create(&mut self, input: NewTodo) -> Result<PendingMutation, ValidationErrors> {
        let input = input.trimmed();
        validate_new(&input, self.clock.today())?;
        let temp_id = format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4());
        self.insert_new(temp_id.clone(), input);
        Ok(PendingMutation::Create { temp_id })
    }

    /// Apply `patch` locally. `Ok(None)` when the id is unknown.
    pub fn begin_update(
        &mut self,
        id: &str,
        patch: TodoPatch,
    ) -> Result<Option<PendingMutation>, ValidationErrors> {
        let patch = patch.trimmed();
        validate_patch(&patch, self.clock.today())?;
        let now = self.clock.now();
        let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        let original = todo.clone();
        patch.apply_to(todo);
        todo.updated_at = now.max(todo.created_at);
        let applied_at = todo.updated_at;
        self.sync_pagination();
        Ok(Some(PendingMutation::Update { id: id.to_string(), patch, original, applied_at }))
    }

    pub fn begin_delete(&mut self, id: &str) -> Option<PendingMutation> {
        let index = self.todos.iter().position(|t| t.id == id)?;
        let original = self.todos.remove(index);
        self.sync_pagination();
        Some(PendingMutation::Delete { original, index })
    }

    /// Swap a temporary id for the one the server assigned.
    ///
    /// Returns `false` if the temporary record is gone or another record
    /// already holds `server_id`; the temporary id is kept in the latter case.
    pub fn confirm_create(&mut self, temp_id: &str, server_id: &str) -> bool {
        if self.todos.iter().any(|t| t.id == server_id) {
            warn!(temp_id, server_id, "server id already in use, keeping temporary id");
            return false;
        }
        match self.todos.iter_mut().find(|t| t.id == temp_id) {
            Some(todo) => {
                todo.id = server_id.to_string();
                true
            }
            None => {
                debug!(temp_id, "created todo was removed before the server answered");
                false
            }
        }
    }

    /// Settle a mutation the server accepted. Creates adopt the id of
    /// `server`; updates and deletes are already reflected locally.
    pub fn commit(&mut self, pending: PendingMutation, server: Option<&Todo>) -> bool {
        match (pending, server) {
            (PendingMutation::Create { temp_id }, Some(server)) => {
                self.confirm_create(&temp_id, &server.id)
            }
            (PendingMutation::Create { temp_id }, None) => {
                warn!(temp_id, "create committed without a server record, keeping temporary id");
                false
            }
            (PendingMutation::Update { .. } | PendingMutation::Delete { .. }, _) => true,
        }
    }

    /// Undo the local half of a failed remote mutation.
    ///
    /// An update restores only the fields its patch wrote, so a later edit to
    /// other fields survives. A deleted record goes back to its old position.
    pub fn rollback(&mut self, pending: PendingMutation) {
        match pending {
            PendingMutation::Create { temp_id } => {
                self.todos.retain(|t| t.id != temp_id);
            }
            PendingMutation::Update { id, patch, original, applied_at } => {
                let now = self.clock.now();
                if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
                    patch.revert_from(&original).apply_to(todo);
                    todo.updated_at = if todo.updated_at == applied_at {
                        original.updated_at
                    } else {
                        now.max(todo.created_at)
                    };
                }
            }
            PendingMutation::Delete { original, index } => {
                if self.get(&original.id).is_none() {
                    let index = index.min(self.todos.len());
                    self.todos.insert(index, original);
                }
            }
        }
        self.sync_pagination();
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write the collection (and nothing else) to `storage`.
    pub fn save(&self, storage: &dyn KeyValueStorage) -> Result<(), PersistError> {
        persist::save_todos(storage, &self.todos)
    }

    /// Replace the collection with what `storage` holds. Returns whether
    /// anything was found.
    pub fn load(&mut self, storage: &dyn KeyValueStorage) -> Result<bool, PersistError> {
        match persist::load_todos(storage)? {
            Some(todos) => {
                self.replace_all(todos);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
