//! Full CRUD lifecycle test against a live in-process server.
//!
//! # Design
//! Starts the todo server on a random port with an in-memory store, then
//! exercises every client operation over real HTTP using ureq. Validates
//! that request building and response parsing agree with the actual server.

use std::sync::Arc;

use todo_core::{
    ApiError, CreateTodo, HttpMethod, HttpResponse, ListTodosParams, TodoClient, UpdateTodo,
};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
fn execute(req: todo_core::HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Put, Some(body)) => {
            agent.put(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Put, None) => agent.put(&req.path).send_empty(),
        (HttpMethod::Patch, Some(body)) => {
            agent.patch(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Patch, None) => agent.patch(&req.path).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse {
        status,
        headers: Vec::new(),
        body,
    }
}

/// Bind a random port and serve the todo API from a background thread.
fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            let app = todo_server::app(Arc::new(todo_server::MemoryStore::new()));
            todo_server::run(listener, app, std::future::pending()).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn crud_lifecycle() {
    let client = TodoClient::new(&spawn_server());

    // Health.
    let health = client.parse_health(execute(client.build_health())).unwrap();
    assert_eq!(health.status, "ok");

    // List: empty.
    let req = client.build_list_todos(&ListTodosParams::default());
    let list = client.parse_list_todos(execute(req)).unwrap();
    assert!(list.todos.is_empty(), "expected empty list");
    assert_eq!(list.limit, 20);

    // Create with defaults.
    let create_input = CreateTodo {
        title: "Integration test".to_string(),
        ..CreateTodo::default()
    };
    let req = client.build_create_todo(&create_input).unwrap();
    let created = client.parse_create_todo(execute(req)).unwrap();
    assert_eq!(created.title, "Integration test");
    assert_eq!(created.description, "");
    assert!(!created.completed);
    assert_eq!(created.created_at, created.updated_at);
    let id = created.id;

    // Empty title is rejected by the server.
    let req = client.build_create_todo(&CreateTodo::default()).unwrap();
    let err = client.parse_create_todo(execute(req)).unwrap_err();
    assert_eq!(err.code(), Some("VALIDATION_ERROR"));

    // Get round-trips.
    let fetched = client.parse_get_todo(execute(client.build_get_todo(id))).unwrap();
    assert_eq!(fetched, created);

    // Update description only.
    let update_input = UpdateTodo {
        description: Some("with details".to_string()),
        ..UpdateTodo::default()
    };
    let req = client.build_update_todo(id, &update_input).unwrap();
    let updated = client.parse_update_todo(execute(req)).unwrap();
    assert_eq!(updated.title, "Integration test");
    assert_eq!(updated.description, "with details");
    assert!(!updated.completed);
    assert!(updated.updated_at >= created.updated_at);

    // Toggle sets the given value.
    let req = client.build_toggle_completion(id, true).unwrap();
    assert!(client.parse_toggle_completion(execute(req)).unwrap().completed);
    let req = client.build_toggle_completion(id, false).unwrap();
    assert!(!client.parse_toggle_completion(execute(req)).unwrap().completed);

    // Filtered list.
    let params = ListTodosParams {
        completed: Some(true),
        ..ListTodosParams::default()
    };
    let list = client.parse_list_todos(execute(client.build_list_todos(&params))).unwrap();
    assert_eq!(list.total, 0);

    // Delete.
    client.parse_delete_todo(execute(client.build_delete_todo(id))).unwrap();

    // Get after delete: NotFound.
    let err = client.parse_get_todo(execute(client.build_get_todo(id))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Delete again: NotFound.
    let err = client.parse_delete_todo(execute(client.build_delete_todo(id))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // List: empty again.
    let req = client.build_list_todos(&ListTodosParams::default());
    let list = client.parse_list_todos(execute(req)).unwrap();
    assert!(list.todos.is_empty(), "expected empty list after delete");
    assert_eq!(list.total, 0);
}
