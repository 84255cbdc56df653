//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: `*mut c_char`
//! instead of `String` (null for `None`), raw pointer plus length instead of
//! `Vec`, and enums with explicit discriminants. Conversions live here so
//! `lib.rs` stays focused on the `extern "C"` surface.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use chrono::NaiveDate;
use todo_core::error::ApiError;
use todo_core::http::HttpMethod;
use todo_core::sync::RemotePage;
use todo_core::types::{NewTodo, PostPayload, Todo};

/// Opaque handle to a `TodoClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiTodoClient {
    pub(crate) inner: todo_core::TodoClient,
}

/// Copy `s` into a C string. Interior NUL bytes are dropped rather than
/// failing the whole conversion.
pub(crate) fn c_string(s: String) -> *mut c_char {
    let c = CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|&b| b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    c.into_raw()
}

pub(crate) fn c_string_opt(s: Option<String>) -> *mut c_char {
    s.map_or(std::ptr::null_mut(), c_string)
}

/// Borrow a caller-owned C string. `None` for null or non-UTF-8 input.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Release a string created by [`c_string`]. Null is ignored.
pub(crate) fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

/// Hand a vector to C as pointer plus length; empty becomes null.
fn into_raw_parts<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let mut items = items.into_boxed_slice();
    let len = items.len() as u32;
    let ptr = items.as_mut_ptr();
    std::mem::forget(items);
    (ptr, len)
}

/// Take back a vector produced by [`into_raw_parts`].
///
/// # Safety
/// `ptr`/`len` must come from `into_raw_parts` and not have been freed.
pub(crate) unsafe fn from_raw_parts<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A header as a pair of C strings. Used in both directions.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request for the host to execute. Free with `todo_free_request`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: todo_core::HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader { key: c_string(k), value: c_string(v) })
            .collect();
        let (headers, headers_len) = into_raw_parts(headers);
        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body: c_string_opt(req.body),
        }))
    }
}

// ---------------------------------------------------------------------------
// Inputs (caller-owned, read only)
// ---------------------------------------------------------------------------

/// The host's response to a request. The FFI layer reads but never frees it.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub headers: *const FfiHeader,
    pub headers_len: u32,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    pub(crate) fn to_core(&self) -> todo_core::HttpResponse {
        let headers = if self.headers.is_null() || self.headers_len == 0 {
            Vec::new()
        } else {
            let raw = unsafe { std::slice::from_raw_parts(self.headers, self.headers_len as usize) };
            raw.iter()
                .filter_map(|h| {
                    let key = unsafe { read_str(h.key) }?;
                    let value = unsafe { read_str(h.value) }?;
                    Some((key.to_string(), value.to_string()))
                })
                .collect()
        };
        todo_core::HttpResponse {
            status: self.status,
            headers,
            body: unsafe { read_str(self.body) }.unwrap_or("").to_string(),
        }
    }
}

/// Form fields for create and update. Null optional fields mean "unset";
/// `due_date` is `YYYY-MM-DD`, `time` is `HH:MM`.
#[repr(C)]
pub struct FfiTodoInput {
    pub name: *const c_char,
    pub description: *const c_char,
    pub due_date: *const c_char,
    pub time: *const c_char,
    pub completed: bool,
}

impl FfiTodoInput {
    /// Read the fields. `Err` names the field that could not be read.
    pub(crate) fn to_new_todo(&self) -> Result<(NewTodo, bool), String> {
        let name = unsafe { read_str(self.name) }.ok_or("name is required")?;
        let due_date = match unsafe { read_str(self.due_date) } {
            None => None,
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| format!("dueDate {raw:?} is not YYYY-MM-DD"))?,
            ),
        };
        let input = NewTodo {
            name: name.to_string(),
            description: unsafe { read_str(self.description) }.map(str::to_string),
            due_date,
            time: unsafe { read_str(self.time) }.map(str::to_string),
        };
        Ok((input.trimmed(), self.completed))
    }

    pub(crate) fn to_payload(&self) -> Result<PostPayload, String> {
        let (input, completed) = self.to_new_todo()?;
        Ok(PostPayload { completed, ..PostPayload::from(&input) })
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiTodoResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    BadRequest = 1,
    Unauthorized = 2,
    Forbidden = 3,
    NotFound = 4,
    ServerError = 5,
    Network = 6,
    Unknown = 7,
    Deserialization = 8,
    Serialization = 9,
    Validation = 10,
    InvalidArg = 11,
    NullArg = 12,
    Panic = 13,
}

/// Tells `todo_free_result` what `FfiTodoResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Todo = 1,
    TodoList = 2,
    TodoPage = 3,
    /// `data` is a NUL-terminated JSON string.
    Json = 4,
}

/// A todo as seen from C. Optional fields are null when unset; timestamps
/// are RFC 3339.
#[repr(C)]
pub struct FfiTodo {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub description: *mut c_char,
    pub due_date: *mut c_char,
    pub time: *mut c_char,
    pub completed: bool,
    pub created_at: *mut c_char,
    pub updated_at: *mut c_char,
}

impl From<Todo> for FfiTodo {
    fn from(todo: Todo) -> Self {
        FfiTodo {
            id: c_string(todo.id),
            name: c_string(todo.name),
            description: c_string_opt(todo.description),
            due_date: c_string_opt(todo.due_date.map(|d| d.to_string())),
            time: c_string_opt(todo.time),
            completed: todo.completed,
            created_at: c_string(todo.created_at.to_rfc3339()),
            updated_at: c_string(todo.updated_at.to_rfc3339()),
        }
    }
}

impl FfiTodo {
    /// Free the string fields, not the struct itself.
    pub(crate) fn free_fields(&self) {
        for ptr in [
            self.id,
            self.name,
            self.description,
            self.due_date,
            self.time,
            self.created_at,
            self.updated_at,
        ] {
            free_c_string(ptr);
        }
    }
}

#[repr(C)]
pub struct FfiTodoList {
    pub items: *mut FfiTodo,
    pub len: u32,
}

impl FfiTodoList {
    fn from_todos(todos: Vec<Todo>) -> Self {
        let (items, len) = into_raw_parts(todos.into_iter().map(FfiTodo::from).collect());
        FfiTodoList { items, len }
    }

    pub(crate) fn free_items(&self) {
        for item in unsafe { from_raw_parts(self.items, self.len) } {
            item.free_fields();
        }
    }
}

/// One server page plus its paging metadata.
#[repr(C)]
pub struct FfiTodoPage {
    pub list: FfiTodoList,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Result envelope for every parse and query function.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data` holds
/// the payload named by `data_tag`. On failure `error_message` is a
/// human-readable C string and `data` is null.
#[repr(C)]
pub struct FfiTodoResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiTodoResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiTodoResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn err(error_code: FfiErrorCode, http_status: u16, message: String) -> *mut Self {
        Box::into_raw(Box::new(FfiTodoResult {
            error_code,
            error_message: c_string(message),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_todo(todo: Todo) -> *mut Self {
        let todo = Box::new(FfiTodo::from(todo));
        Self::ok(FfiDataTag::Todo, Box::into_raw(todo).cast())
    }

    pub(crate) fn ok_todo_list(todos: Vec<Todo>) -> *mut Self {
        let list = Box::new(FfiTodoList::from_todos(todos));
        Self::ok(FfiDataTag::TodoList, Box::into_raw(list).cast())
    }

    pub(crate) fn ok_todo_page(page: RemotePage) -> *mut Self {
        let page = Box::new(FfiTodoPage {
            list: FfiTodoList::from_todos(page.items),
            current_page: page.current_page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            has_next_page: page.has_next_page,
            has_previous_page: page.has_previous_page,
        });
        Self::ok(FfiDataTag::TodoPage, Box::into_raw(page).cast())
    }

    pub(crate) fn ok_json(json: String) -> *mut Self {
        Self::ok(FfiDataTag::Json, c_string(json).cast())
    }

    pub(crate) fn ok_empty() -> *mut Self {
        Self::ok(FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let code = match &err {
            ApiError::BadRequest { .. } => FfiErrorCode::BadRequest,
            ApiError::Unauthorized => FfiErrorCode::Unauthorized,
            ApiError::Forbidden => FfiErrorCode::Forbidden,
            ApiError::NotFound => FfiErrorCode::NotFound,
            ApiError::ServerError { .. } => FfiErrorCode::ServerError,
            ApiError::Network(_) => FfiErrorCode::Network,
            ApiError::Unknown { .. } => FfiErrorCode::Unknown,
            ApiError::Deserialization(_) => FfiErrorCode::Deserialization,
            ApiError::Serialization(_) => FfiErrorCode::Serialization,
        };
        Self::err(code, err.status().unwrap_or(0), err.to_string())
    }

    pub(crate) fn validation(message: String) -> *mut Self {
        Self::err(FfiErrorCode::Validation, 0, message)
    }

    pub(crate) fn invalid_arg(message: String) -> *mut Self {
        Self::err(FfiErrorCode::InvalidArg, 0, message)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::err(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    pub(crate) fn panic(op: &str) -> *mut Self {
        Self::err(FfiErrorCode::Panic, 0, format!("panic in {op}"))
    }
}
