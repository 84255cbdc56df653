//! C-ABI wrapper around `todo-core`.
//!
//! # Overview
//! Exposes the posts adapter and the filter pipeline through `extern "C"`
//! functions, so a native mobile UI can build requests, execute them with its
//! own networking stack, parse the responses, and derive the displayed list
//! without linking serde or an HTTP client.
//!
//! # Design
//! - Every `extern "C"` body runs under `catch_unwind`; panics never cross
//!   the boundary.
//! - `build_*` / `parse_*` mirror `TodoClient` one to one. Parsed posts are
//!   converted to todos with the system clock filling missing timestamps.
//! - One `FfiTodoResult` envelope (`FfiDataTag` + `void* data`) carries
//!   every success payload and every error.
//! - The caller owns all returned pointers and releases them with the
//!   matching `todo_free_*` function.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::NaiveDateTime;
use todo_core::filter::{apply_filters, FilterConfig};
use todo_core::sync::RemotePage;
use todo_core::validate::validate_new;
use todo_core::{Clock, HttpResponse, SystemClock, Todo, TodoClient};

use types::*;

fn now() -> chrono::DateTime<chrono::Utc> {
    SystemClock.now()
}

/// Run `f` with the client and the host's response, mapping null arguments
/// and panics into result envelopes.
fn parse_with<F>(
    op: &str,
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
    f: F,
) -> *mut FfiTodoResult
where
    F: FnOnce(&TodoClient, HttpResponse) -> *mut FfiTodoResult,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiTodoResult::null_arg("client");
        }
        if response.is_null() {
            return FfiTodoResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let response = unsafe { &*response }.to_core();
        f(&client.inner, response)
    }))
    .unwrap_or_else(|_| FfiTodoResult::panic(op))
}

/// Run `f` with the client, returning null for a null client or a panic.
fn build_with<F>(client: *const FfiTodoClient, f: F) -> *mut FfiHttpRequest
where
    F: FnOnce(&TodoClient) -> Option<todo_core::HttpRequest>,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        f(&client.inner).map_or(std::ptr::null_mut(), FfiHttpRequest::from_core)
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client bound to `base_url`.
///
/// Returns null if `base_url` is null or not UTF-8. Free the result with
/// `todo_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_client_new(base_url: *const c_char) -> *mut FfiTodoClient {
    catch_unwind(|| match unsafe { read_str(base_url) } {
        Some(url) => Box::into_raw(Box::new(FfiTodoClient { inner: TodoClient::new(url) })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `todo_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_client_free(client: *mut FfiTodoClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Returns null if `client` is null. Free with `todo_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_build_list_todos(client: *const FfiTodoClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_list_todos()))
}

/// Returns null if `client` or `id` is null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_build_get_todo(
    client: *const FfiTodoClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| unsafe { read_str(id) }.map(|id| c.build_get_todo(id)))
}

/// Returns null if an argument is null or `input` cannot be read. Inputs are
/// not validated here; call `todo_validate_input` first.
#[unsafe(no_mangle)]
pub extern "C" fn todo_build_create_todo(
    client: *const FfiTodoClient,
    input: *const FfiTodoInput,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        if input.is_null() {
            return None;
        }
        let payload = unsafe { &*input }.to_payload().ok()?;
        c.build_create_todo(&payload).ok()
    })
}

/// PUT the full record. Returns null if an argument is null or unreadable.
#[unsafe(no_mangle)]
pub extern "C" fn todo_build_update_todo(
    client: *const FfiTodoClient,
    id: *const c_char,
    input: *const FfiTodoInput,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let id = unsafe { read_str(id) }?;
        if input.is_null() {
            return None;
        }
        let payload = unsafe { &*input }.to_payload().ok()?;
        c.build_update_todo(id, &payload).ok()
    })
}

/// Returns null if `client` or `id` is null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_build_delete_todo(
    client: *const FfiTodoClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| unsafe { read_str(id) }.map(|id| c.build_delete_todo(id)))
}

/// Server-side full-text search. Returns null if an argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_build_search_todos(
    client: *const FfiTodoClient,
    query: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| unsafe { read_str(query) }.map(|q| c.build_search_todos(q)))
}

/// One server page; `page` is 1-based.
#[unsafe(no_mangle)]
pub extern "C" fn todo_build_list_page(
    client: *const FfiTodoClient,
    page: u32,
    limit: u32,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_list_page(page, limit)))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// `data_tag = TodoList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn todo_parse_list_todos(
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiTodoResult {
    parse_with("todo_parse_list_todos", client, response, |c, resp| {
        match c.parse_list_todos(resp) {
            Ok(posts) => {
                let now = now();
                FfiTodoResult::ok_todo_list(posts.into_iter().map(|p| p.into_todo(now)).collect())
            }
            Err(e) => FfiTodoResult::from_error(e),
        }
    })
}

/// `data_tag = Todo` on success.
#[unsafe(no_mangle)]
pub extern "C" fn todo_parse_get_todo(
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiTodoResult {
    parse_with("todo_parse_get_todo", client, response, |c, resp| {
        match c.parse_get_todo(resp) {
            Ok(post) => FfiTodoResult::ok_todo(post.into_todo(now())),
            Err(e) => FfiTodoResult::from_error(e),
        }
    })
}

/// `data_tag = Todo` on success; `id` is the server-assigned id.
#[unsafe(no_mangle)]
pub extern "C" fn todo_parse_create_todo(
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiTodoResult {
    parse_with("todo_parse_create_todo", client, response, |c, resp| {
        match c.parse_create_todo(resp) {
            Ok(post) => FfiTodoResult::ok_todo(post.into_todo(now())),
            Err(e) => FfiTodoResult::from_error(e),
        }
    })
}

/// `data_tag = Todo` on success.
#[unsafe(no_mangle)]
pub extern "C" fn todo_parse_update_todo(
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiTodoResult {
    parse_with("todo_parse_update_todo", client, response, |c, resp| {
        match c.parse_update_todo(resp) {
            Ok(post) => FfiTodoResult::ok_todo(post.into_todo(now())),
            Err(e) => FfiTodoResult::from_error(e),
        }
    })
}

/// `data_tag = None` on any 2xx.
#[unsafe(no_mangle)]
pub extern "C" fn todo_parse_delete_todo(
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiTodoResult {
    parse_with("todo_parse_delete_todo", client, response, |c, resp| {
        match c.parse_delete_todo(resp) {
            Ok(()) => FfiTodoResult::ok_empty(),
            Err(e) => FfiTodoResult::from_error(e),
        }
    })
}

/// `data_tag = TodoList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn todo_parse_search_todos(
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiTodoResult {
    parse_with("todo_parse_search_todos", client, response, |c, resp| {
        match c.parse_search_todos(resp) {
            Ok(posts) => {
                let now = now();
                FfiTodoResult::ok_todo_list(posts.into_iter().map(|p| p.into_todo(now)).collect())
            }
            Err(e) => FfiTodoResult::from_error(e),
        }
    })
}

/// `data_tag = TodoPage` on success. Pass the same `page`/`limit` used to
/// build the request; include the response headers so `x-total-count` is seen.
#[unsafe(no_mangle)]
pub extern "C" fn todo_parse_list_page(
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
    page: u32,
    limit: u32,
) -> *mut FfiTodoResult {
    parse_with("todo_parse_list_page", client, response, |c, resp| {
        match c.parse_list_page(resp, page, limit) {
            Ok(parsed) => FfiTodoResult::ok_todo_page(RemotePage::from_posts(parsed, now())),
            Err(e) => FfiTodoResult::from_error(e),
        }
    })
}

// ---------------------------------------------------------------------------
// Validation and the filter pipeline
// ---------------------------------------------------------------------------

/// Check form input against today's date. `data_tag = None` when valid;
/// `Validation` with per-field messages otherwise.
#[unsafe(no_mangle)]
pub extern "C" fn todo_validate_input(input: *const FfiTodoInput) -> *mut FfiTodoResult {
    catch_unwind(AssertUnwindSafe(|| {
        if input.is_null() {
            return FfiTodoResult::null_arg("input");
        }
        let (new_todo, _) = match unsafe { &*input }.to_new_todo() {
            Ok(parsed) => parsed,
            Err(msg) => return FfiTodoResult::validation(msg),
        };
        match validate_new(&new_todo, SystemClock.today()) {
            Ok(()) => FfiTodoResult::ok_empty(),
            Err(errors) => FfiTodoResult::validation(errors.to_string()),
        }
    }))
    .unwrap_or_else(|_| FfiTodoResult::panic("todo_validate_input"))
}

/// Run the filter/sort pipeline over a JSON array of todos.
///
/// `filters_json` is a filter config object (missing keys take defaults).
/// `now` is a local `YYYY-MM-DDTHH:MM:SS`; null means the system clock.
/// `data_tag = Json` with the filtered array on success.
#[unsafe(no_mangle)]
pub extern "C" fn todo_apply_filters_json(
    todos_json: *const c_char,
    filters_json: *const c_char,
    now: *const c_char,
) -> *mut FfiTodoResult {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(todos_json) = (unsafe { read_str(todos_json) }) else {
            return FfiTodoResult::null_arg("todos_json");
        };
        let Some(filters_json) = (unsafe { read_str(filters_json) }) else {
            return FfiTodoResult::null_arg("filters_json");
        };
        let todos: Vec<Todo> = match serde_json::from_str(todos_json) {
            Ok(t) => t,
            Err(e) => return FfiTodoResult::invalid_arg(format!("todos_json: {e}")),
        };
        let config: FilterConfig = match serde_json::from_str(filters_json) {
            Ok(c) => c,
            Err(e) => return FfiTodoResult::invalid_arg(format!("filters_json: {e}")),
        };
        let now = match unsafe { read_str(now) } {
            None => SystemClock.local_now(),
            Some(raw) => match raw.parse::<NaiveDateTime>() {
                Ok(n) => n,
                Err(e) => return FfiTodoResult::invalid_arg(format!("now: {e}")),
            },
        };
        match serde_json::to_string(&apply_filters(&todos, &config, now)) {
            Ok(json) => FfiTodoResult::ok_json(json),
            Err(e) => FfiTodoResult::invalid_arg(format!("serializing result: {e}")),
        }
    }))
    .unwrap_or_else(|_| FfiTodoResult::panic("todo_apply_filters_json"))
}

/// Human-readable summary of a filter config, e.g. for a header line.
/// Returns null on null or invalid input. Free with `todo_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_filter_summary(filters_json: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        let config: Option<FilterConfig> =
            unsafe { read_str(filters_json) }.and_then(|raw| serde_json::from_str(raw).ok());
        config.map_or(std::ptr::null_mut(), |c| c_string(c.to_string()))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `todo_build_*` function. Safe with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.path);
        free_c_string(req.body);
        for h in unsafe { from_raw_parts(req.headers, req.headers_len) } {
            free_c_string(h.key);
            free_c_string(h.value);
        }
    });
}

/// Free a result from any parse, validate or filter function. Safe with
/// null. `data_tag` decides what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_result(result: *mut FfiTodoResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Todo => {
                let todo = unsafe { Box::from_raw(result.data.cast::<FfiTodo>()) };
                todo.free_fields();
            }
            FfiDataTag::TodoList => {
                let list = unsafe { Box::from_raw(result.data.cast::<FfiTodoList>()) };
                list.free_items();
            }
            FfiDataTag::TodoPage => {
                let page = unsafe { Box::from_raw(result.data.cast::<FfiTodoPage>()) };
                page.list.free_items();
            }
            FfiDataTag::Json => free_c_string(result.data.cast()),
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c_string(s));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
