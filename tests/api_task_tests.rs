//! 任务 API 集成测试

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{create_test_app, register_and_login, send};

#[tokio::test]
async fn test_task_crud() {
    let app = create_test_app();
    let (account_id, token) = register_and_login(&app, "a@x.io", "pw123").await;

    // 创建
    let (status, task) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({
            "title": "Write report",
            "description": "Quarterly numbers",
            "category": "Work"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["userId"], account_id.as_str());
    let id = task["id"].as_str().unwrap().to_string();

    // 读取
    let (status, fetched) = send(&app, "GET", &format!("/api/tasks/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id.as_str());

    // 部分更新
    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/tasks/{}", id),
        Some(&token),
        Some(json!({ "status": "in-progress" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in-progress");
    assert_eq!(updated["title"], "Write report");
    assert_eq!(updated["category"], "Work");

    // 删除
    let (status, _) = send(&app, "DELETE", &format!("/api/tasks/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/tasks/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_is_taken_from_token_not_body() {
    let app = create_test_app();
    let (alice_id, alice) = register_and_login(&app, "alice@example.com", "pw123").await;
    let (bob_id, _) = register_and_login(&app, "bob@example.com", "pw456").await;

    let (status, task) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&alice),
        Some(json!({ "title": "Mine", "userId": bob_id })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["userId"], alice_id.as_str());
}

#[tokio::test]
async fn test_cross_account_access_is_not_found() {
    let app = create_test_app();
    let (_, alice) = register_and_login(&app, "alice@example.com", "pw123").await;
    let (_, bob) = register_and_login(&app, "bob@example.com", "pw456").await;

    let (_, task) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&alice),
        Some(json!({ "title": "Alice only" })),
    )
    .await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, _) = send(&app, "GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "PATCH", &uri, Some(&bob), Some(json!({ "title": "Hijacked" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 列表中也看不到
    let (_, list) = send(&app, "GET", "/api/tasks", Some(&bob), None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);

    // Alice 的任务保持不变
    let (status, unchanged) = send(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["title"], "Alice only");
}

#[tokio::test]
async fn test_list_search_and_order() {
    let app = create_test_app();
    let (_, token) = register_and_login(&app, "a@x.io", "pw123").await;

    for (title, description) in [
        ("Buy groceries", "Milk and eggs"),
        ("Write report", "Quarterly numbers"),
        ("Call plumber", "Kitchen sink leak"),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({ "title": title, "description": description })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, all) = send(&app, "GET", "/api/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Call plumber", "Write report", "Buy groceries"]);

    let (_, by_title) = send(&app, "GET", "/api/tasks?title=REPORT", Some(&token), None).await;
    assert_eq!(by_title.as_array().unwrap().len(), 1);
    assert_eq!(by_title[0]["title"], "Write report");

    let (_, by_description) =
        send(&app, "GET", "/api/tasks?description=sink", Some(&token), None).await;
    assert_eq!(by_description.as_array().unwrap().len(), 1);
    assert_eq!(by_description[0]["title"], "Call plumber");

    let (_, empty_filter) = send(&app, "GET", "/api/tasks?title=", Some(&token), None).await;
    assert_eq!(empty_filter.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_overdue_flag() {
    let app = create_test_app();
    let (_, token) = register_and_login(&app, "a@x.io", "pw123").await;

    let (_, late) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "Late", "deadline": "2000-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(late["overdue"], true);

    let (_, done) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "Done", "deadline": "2000-01-01T00:00:00Z", "status": "completed" })),
    )
    .await;
    assert_eq!(done["overdue"], false);

    let (_, no_deadline) =
        send(&app, "POST", "/api/tasks", Some(&token), Some(json!({ "title": "Whenever" }))).await;
    assert_eq!(no_deadline["overdue"], false);
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let app = create_test_app();
    let (_, token) = register_and_login(&app, "a@x.io", "pw123").await;

    let (status, _) =
        send(&app, "POST", "/api/tasks", Some(&token), Some(json!({ "title": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "x", "status": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/tasks/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
