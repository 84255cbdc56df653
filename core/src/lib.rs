//! Core of a mobile todo client.
//!
//! # Overview
//! - `store`: the single owner of the todo collection, its UI flags, and the
//!   optimistic begin/commit/rollback cycle.
//! - `filter`: a pure search/status/date/time/sort pipeline over a slice of
//!   todos.
//! - `client`: builds `HttpRequest` values and parses `HttpResponse` values for
//!   the remote posts resource without touching the network (host-does-IO).
//! - `transport` and `sync`: an I/O seam, a blocking ureq implementation, and
//!   the coordinator that pairs remote calls with store mutations.
//! - `persist`: key-value storage for the collection across restarts.
//!
//! # Design
//! Nothing here reads the wall clock or the network implicitly. Time comes from
//! a `Clock`, requests go through a `Transport`, search debounce is driven by
//! caller-supplied instants, so every piece is testable without threads.

pub mod client;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod http;
pub mod pagination;
pub mod persist;
pub mod store;
pub mod sync;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::TodoClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, TodoError};
pub use filter::{apply_filters, DateFilter, FilterConfig, SortKey, SortOrder, StatusFilter, TimeFilter};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pagination::Pagination;
pub use persist::{FileStorage, KeyValueStorage, MemoryStorage, PersistError};
pub use store::{PendingMutation, StoreOptions, TodoStore};
pub use sync::{RemotePage, RemoteTodos, RollbackPolicy, SyncCoordinator};
#[cfg(feature = "http")]
pub use transport::UreqTransport;
pub use transport::Transport;
pub use types::{NewTodo, Post, PostPage, PostPayload, Todo, TodoPatch};
pub use validate::{Field, FieldError, ValidationErrors};
