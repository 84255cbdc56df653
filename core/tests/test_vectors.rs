//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and either an expected parse result or an expected error variant. Parsed
//! JSON is compared instead of raw strings so field order does not matter.

use todo_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, Post, PostPayload, TodoClient};

const BASE_URL: &str = "http://localhost:3000";

fn client() -> TodoClient {
    TodoClient::new(BASE_URL)
}

fn load(raw: &str) -> Vec<serde_json::Value> {
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn string_pairs(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .map(|pairs| {
            pairs
                .iter()
                .map(|h| {
                    let arr = h.as_array().unwrap();
                    (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Check method, path, optional headers and optional JSON body.
fn assert_request(name: &str, req: &HttpRequest, expected: &serde_json::Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");
    if let Some(headers) = expected.get("headers") {
        assert_eq!(req.headers, string_pairs(headers), "{name}: headers");
    }
    match expected.get("body") {
        Some(body) => {
            let actual: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn simulated(case: &serde_json::Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: string_pairs(&sim["headers"]),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

fn assert_error(name: &str, err: ApiError, expected: &str) {
    let ok = match expected {
        "BadRequest" => matches!(err, ApiError::BadRequest { .. }),
        "Unauthorized" => matches!(err, ApiError::Unauthorized),
        "Forbidden" => matches!(err, ApiError::Forbidden),
        "NotFound" => matches!(err, ApiError::NotFound),
        "ServerError" => matches!(err, ApiError::ServerError { .. }),
        other => panic!("{name}: unknown expected_error: {other}"),
    };
    assert!(ok, "{name}: expected {expected}, got {err:?}");
}

fn expected_error(case: &serde_json::Value) -> Option<&str> {
    case.get("expected_error").and_then(|e| e.as_str())
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/create.json")) {
        let name = case["name"].as_str().unwrap();
        let input: PostPayload = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_create_todo(&input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let post = c.parse_create_todo(simulated(&case)).unwrap();
        let expected: Post = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(post, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/list.json")) {
        let name = case["name"].as_str().unwrap();

        let req = c.build_list_todos();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_list_todos(simulated(&case));
        match expected_error(&case) {
            Some(expected) => assert_error(name, result.unwrap_err(), expected),
            None => {
                let expected: Vec<Post> = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[test]
fn get_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/get.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();

        let req = c.build_get_todo(id);
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_get_todo(simulated(&case));
        match expected_error(&case) {
            Some(expected) => assert_error(name, result.unwrap_err(), expected),
            None => {
                let expected: Post = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn update_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/update.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();
        let input: PostPayload = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_update_todo(id, &input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_update_todo(simulated(&case));
        match expected_error(&case) {
            Some(expected) => assert_error(name, result.unwrap_err(), expected),
            None => {
                let expected: Post = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/delete.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();

        let req = c.build_delete_todo(id);
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_delete_todo(simulated(&case));
        match expected_error(&case) {
            Some(expected) => assert_error(name, result.unwrap_err(), expected),
            None => assert!(result.is_ok(), "{name}: expected success"),
        }
    }
}

// ---------------------------------------------------------------------------
// Search and paging
// ---------------------------------------------------------------------------

#[test]
fn search_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/search.json")) {
        let name = case["name"].as_str().unwrap();
        let query = case["input_query"].as_str().unwrap();

        let req = c.build_search_todos(query);
        assert_request(name, &req, &case["expected_request"]);

        let posts = c.parse_search_todos(simulated(&case)).unwrap();
        let expected: Vec<Post> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(posts, expected, "{name}: parsed result");
    }
}

#[test]
fn page_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/page.json")) {
        let name = case["name"].as_str().unwrap();
        let page = case["input_page"].as_u64().unwrap() as u32;
        let limit = case["input_limit"].as_u64().unwrap() as u32;

        let req = c.build_list_page(page, limit);
        assert_request(name, &req, &case["expected_request"]);

        let parsed = c.parse_list_page(simulated(&case), page, limit).unwrap();
        let expected = &case["expected_result"];
        let posts: Vec<Post> = serde_json::from_value(expected["posts"].clone()).unwrap();
        assert_eq!(parsed.posts, posts, "{name}: posts");
        assert_eq!(u64::from(parsed.current_page), expected["currentPage"].as_u64().unwrap(), "{name}: currentPage");
        assert_eq!(u64::from(parsed.total_pages), expected["totalPages"].as_u64().unwrap(), "{name}: totalPages");
        assert_eq!(parsed.total_items, expected["totalItems"].as_u64().unwrap(), "{name}: totalItems");
        assert_eq!(parsed.has_next_page, expected["hasNextPage"].as_bool().unwrap(), "{name}: hasNextPage");
        assert_eq!(
            parsed.has_previous_page,
            expected["hasPreviousPage"].as_bool().unwrap(),
            "{name}: hasPreviousPage"
        );
    }
}
