//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or errors. Comparing parsed JSON (not raw
//! strings) avoids false negatives from field-ordering differences.

use serde_json::Value;
use todo_sync_core::{
    ApiError, CreateTodo, Credentials, HttpMethod, HttpRequest, HttpResponse, LoginResponse, Todo,
    TodoClient, TodoId, UpdateTodo,
};

const BASE_URL: &str = "http://localhost:5000";

fn client() -> TodoClient {
    TodoClient::new(BASE_URL)
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(sim["status"].as_u64().unwrap() as u16, sim["body"].as_str().unwrap())
}

fn assert_error(name: &str, err: &ApiError, expected: &Value) {
    let kind_matches = match expected["kind"].as_str().unwrap() {
        "NotFound" => matches!(err, ApiError::NotFound { .. }),
        "Unauthorized" => matches!(err, ApiError::Unauthorized { .. }),
        "Http" => matches!(err, ApiError::Http { .. }),
        other => panic!("{name}: unknown expected_error kind: {other}"),
    };
    assert!(kind_matches, "{name}: got {err:?}");
    assert_eq!(err.server_message(), expected["message"].as_str(), "{name}: message");
}

fn token(case: &Value) -> &str {
    case["token"].as_str().unwrap()
}

fn id(case: &Value) -> TodoId {
    serde_json::from_value(case["input_id"].clone()).unwrap()
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/login.json")) {
        let name = case["name"].as_str().unwrap();
        let input: Credentials = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_login(&input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_login(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected),
            None => {
                let expected: LoginResponse =
                    serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
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

        let req = c.build_list_items(token(&case));
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_list_items(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected),
            None => {
                let expected: Vec<Todo> =
                    serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/create.json")) {
        let name = case["name"].as_str().unwrap();
        let input: CreateTodo = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_create_item(token(&case), &input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_create_item(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected),
            None => {
                let expected: Todo = serde_json::from_value(case["expected_result"].clone()).unwrap();
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
        let input: UpdateTodo = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_update_item(token(&case), &id(&case), &input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_update_item(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected),
            None => {
                let expected: Todo = serde_json::from_value(case["expected_result"].clone()).unwrap();
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

        let req = c.build_delete_item(token(&case), &id(&case));
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_delete_item(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => assert_error(name, &result.unwrap_err(), expected),
            None => assert!(result.is_ok(), "{name}: expected success"),
        }
    }
}
