//! API Integration Tests
//!
//! Exercises the full router against a real Postgres database. Run with a
//! schema-migrated database and DATABASE_URL set:
//!
//! ```sh
//! cargo test -- --ignored
//! ```

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{body_json, body_text, build_app, send, setup_test_db, signup_and_login};

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_auth_flow() {
    let pool = setup_test_db().await;
    let app = build_app(pool);

    let token = signup_and_login(&app, "Alice", "alice@example.com", "hunter2").await;

    // Profile reflects the signup
    let response = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["name"], "Alice");
    assert_eq!(me["email"], "alice@example.com");

    // Token verifies
    let response = send(&app, "GET", "/api/auth/verify", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    // Name is the only mutable profile field
    let response = send(
        &app,
        "PUT",
        "/api/auth/me",
        Some(&token),
        Some(json!({ "name": "Alice B" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["user"]["name"], "Alice B");
    assert_eq!(updated["user"]["email"], "alice@example.com");
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_duplicate_email_conflicts() {
    let pool = setup_test_db().await;
    let app = build_app(pool);

    signup_and_login(&app, "Alice", "dup@example.com", "hunter2").await;

    let response = send(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Mallory", "email": "dup@example.com", "password": "pw" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_login_failures_share_shape() {
    let pool = setup_test_db().await;
    let app = build_app(pool);

    signup_and_login(&app, "Alice", "shape@example.com", "hunter2").await;

    let wrong_password = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "shape@example.com", "password": "wrong" })),
    )
    .await;
    let unknown_email = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown_email.status(), StatusCode::BAD_REQUEST);

    // Same payload shape either way: a single message field
    let a = body_json(wrong_password).await;
    let b = body_json(unknown_email).await;
    assert!(a["message"].is_string());
    assert!(b["message"].is_string());
    assert_eq!(a.as_object().unwrap().len(), 1);
    assert_eq!(b.as_object().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_protected_routes_require_token() {
    let pool = setup_test_db().await;
    let app = build_app(pool);

    for uri in [
        "/api/auth/me",
        "/api/transactions",
        "/api/transactions/summary",
        "/api/budgets/2024-03",
    ] {
        let response = send(&app, "GET", uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let response = send(&app, "GET", "/api/auth/me", Some("bogus.token.here"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_cross_user_scoping() {
    let pool = setup_test_db().await;
    let app = build_app(pool);

    let token_a = signup_and_login(&app, "Alice", "a@example.com", "pw-a").await;
    let token_b = signup_and_login(&app, "Bob", "b@example.com", "pw-b").await;

    // Alice creates a transaction and a budget
    let response = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token_a),
        Some(json!({
            "type": "expense", "amount": 500, "category": "Food",
            "date": "2024-03-01", "note": "lunch"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let txn_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "POST",
        "/api/budgets",
        Some(&token_a),
        Some(json!({ "category": "Food", "limit": 100, "month": "2024-03" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let budget_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Bob sees none of it
    let response = send(&app, "GET", "/api/transactions", Some(&token_b), None).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);

    let response = send(&app, "GET", "/api/budgets/2024-03", Some(&token_b), None).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);

    // Bob cannot mutate or delete Alice's records even with their ids;
    // the store reports not-found rather than forbidden
    let response = send(
        &app,
        "PUT",
        &format!("/api/transactions/{}", txn_id),
        Some(&token_b),
        Some(json!({ "amount": 1 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/transactions/{}", txn_id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/budgets/{}", budget_id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Alice's records survived Bob's attempts
    let response = send(&app, "GET", "/api/transactions", Some(&token_a), None).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = send(&app, "GET", "/api/budgets/2024-03", Some(&token_a), None).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_create_then_search_round_trip() {
    let pool = setup_test_db().await;
    let app = build_app(pool);

    let token = signup_and_login(&app, "Alice", "search@example.com", "pw").await;

    let response = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({
            "type": "expense", "amount": 500, "category": "Food",
            "date": "2024-03-01", "note": "lunch"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Unrelated records must not match
    for body in [
        json!({ "type": "expense", "amount": 30, "category": "Travel",
                "date": "2024-03-05", "note": "bus" }),
        json!({ "type": "expense", "amount": 80, "category": "Food",
                "date": "2024-04-02", "note": "groceries" }),
    ] {
        let response =
            send(&app, "POST", "/api/transactions", Some(&token), Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(
        &app,
        "GET",
        "/api/transactions/search?category=Food&startDate=2024-03-01&endDate=2024-03-31",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let results = body_json(response).await;
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["note"], "lunch");

    // Keyword matching is a case-insensitive substring over notes
    let response = send(
        &app,
        "GET",
        "/api/transactions/search?keyword=LUNCH",
        Some(&token),
        None,
    )
    .await;
    let results = body_json(response).await;
    assert_eq!(results.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_summary_and_budget_progress() {
    let pool = setup_test_db().await;
    let app = build_app(pool);

    let token = signup_and_login(&app, "Alice", "summary@example.com", "pw").await;

    for body in [
        json!({ "type": "income", "amount": 1000, "category": "Salary",
                "date": "2024-03-01" }),
        json!({ "type": "expense", "amount": 85, "category": "Food",
                "date": "2024-03-10", "note": "groceries" }),
    ] {
        let response =
            send(&app, "POST", "/api/transactions", Some(&token), Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&app, "GET", "/api/transactions/summary", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["income"], "1000");
    assert_eq!(summary["expense"], "85");
    assert_eq!(summary["savings"], "915");
    assert_eq!(summary["categoryBreakdown"].as_array().unwrap().len(), 2);
    assert_eq!(summary["categoryBreakdown"][0]["_id"], "Food");

    let response = send(
        &app,
        "POST",
        "/api/budgets",
        Some(&token),
        Some(json!({ "category": "Food", "limit": 100, "month": "2024-03" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "GET",
        "/api/budgets/progress/2024-03",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report[0]["spent"], "85");
    assert_eq!(report[0]["status"], "approaching");
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_csv_export() {
    let pool = setup_test_db().await;
    let app = build_app(pool);

    let token = signup_and_login(&app, "Alice", "csv@example.com", "pw").await;

    for i in 0..3 {
        let response = send(
            &app,
            "POST",
            "/api/transactions",
            Some(&token),
            Some(json!({
                "type": "expense", "amount": 10 + i, "category": "Food",
                "date": "2024-03-01", "note": format!("row {}", i)
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(
        &app,
        "GET",
        "/api/transactions/export/csv",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv"
    );
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("attachment"));

    let text = body_text(response).await;
    assert_eq!(text.lines().count(), 4, "header plus one line per record");
    assert!(text.starts_with("id,userId,type,amount,category,date,note"));
}
