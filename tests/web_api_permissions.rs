//! Web API Permission Tests
//!
//! Integration tests for role grants and how they gate file and folder operations.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{
    assert_not_found_or_no_access, create_folder, create_test_app, grant, id_of,
    register_and_login, upload,
};

#[tokio::test]
async fn test_viewer_grant_allows_read_only() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;
    let file_id = upload(&app.server, &alice, "notes.txt", b"hello", None).await;

    let response = grant(
        &app.server,
        &alice,
        &bob,
        json!({ "file_id": file_id }),
        "viewer",
    )
    .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["role"], "viewer");
    assert_eq!(body["data"]["user_id"], json!(bob.id));
    assert_eq!(body["data"]["file_id"], json!(file_id));
    assert!(body["data"]["folder_id"].is_null());

    app.server
        .get(&format!("/api/files/{}/url", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .await
        .assert_status_ok();

    let response = app
        .server
        .patch(&format!("/api/files/{}", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .json(&json!({ "name": "mine.txt" }))
        .await;
    assert_not_found_or_no_access(&response);
}

#[tokio::test]
async fn test_editor_grant_allows_write_but_not_delete() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;
    let file_id = upload(&app.server, &alice, "notes.txt", b"hello", None).await;

    grant(&app.server, &alice, &bob, json!({ "file_id": file_id }), "editor")
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .patch(&format!("/api/files/{}", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .json(&json!({ "name": "edited.txt" }))
        .await
        .assert_status_ok();

    app.server
        .post(&format!("/api/files/{}/trash", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .await
        .assert_status_ok();

    let response = app
        .server
        .delete(&format!("/api/files/{}", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    assert_not_found_or_no_access(&response);

    // Editors cannot re-share through grants either
    let carol = register_and_login(&app.server, "carol@example.com").await;
    let response = grant(&app.server, &bob, &carol, json!({ "file_id": file_id }), "viewer").await;
    assert_not_found_or_no_access(&response);
}

#[tokio::test]
async fn test_owner_grant_allows_delete() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;
    let file_id = upload(&app.server, &alice, "notes.txt", b"hello", None).await;

    grant(&app.server, &alice, &bob, json!({ "file_id": file_id }), "owner")
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .delete(&format!("/api/files/{}", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_folder_grant_does_not_cascade() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;

    let folder = create_folder(&app.server, &alice, "Team", None).await;
    let file_id = upload(&app.server, &alice, "plan.txt", b"x", Some(folder)).await;

    grant(&app.server, &alice, &bob, json!({ "folder_id": folder }), "editor")
        .await
        .assert_status(StatusCode::CREATED);

    // The folder itself is writable
    app.server
        .patch(&format!("/api/folders/{}", folder))
        .add_header(AUTHORIZATION, bob.bearer())
        .json(&json!({ "name": "Team 2" }))
        .await
        .assert_status_ok();

    // Its contents are not
    let response = app
        .server
        .get(&format!("/api/files/{}/url", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    assert_not_found_or_no_access(&response);
}

#[tokio::test]
async fn test_grant_target_must_be_exactly_one_object() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;
    let folder = create_folder(&app.server, &alice, "Docs", None).await;
    let file_id = upload(&app.server, &alice, "a.txt", b"x", None).await;

    let both = grant(
        &app.server,
        &alice,
        &bob,
        json!({ "file_id": file_id, "folder_id": folder }),
        "viewer",
    )
    .await;
    both.assert_status_bad_request();

    let neither = grant(&app.server, &alice, &bob, json!({}), "viewer").await;
    neither.assert_status_bad_request();
}

#[tokio::test]
async fn test_grant_rejected_for_non_owner_and_unknown_user() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;
    let file_id = upload(&app.server, &alice, "a.txt", b"x", None).await;

    // Bob cannot grant himself access to Alice's file
    let response = grant(&app.server, &bob, &bob, json!({ "file_id": file_id }), "owner").await;
    assert_not_found_or_no_access(&response);

    let response = app
        .server
        .post("/api/permissions")
        .add_header(AUTHORIZATION, alice.bearer())
        .json(&json!({
            "target_user_id": Uuid::new_v4(),
            "file_id": file_id,
            "role": "viewer"
        }))
        .await;
    response.assert_status_bad_request();

    let response = app
        .server
        .post("/api/permissions")
        .add_header(AUTHORIZATION, alice.bearer())
        .json(&json!({
            "target_user_id": bob.id,
            "file_id": file_id,
            "role": "admin"
        }))
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_grant_by_stranger_does_not_reveal_unknown_users() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;
    let file_id = upload(&app.server, &alice, "a.txt", b"x", None).await;

    for target_user_id in [Uuid::new_v4(), alice.id] {
        let response = app
            .server
            .post("/api/permissions")
            .add_header(AUTHORIZATION, bob.bearer())
            .json(&json!({
                "target_user_id": target_user_id,
                "file_id": file_id,
                "role": "viewer"
            }))
            .await;
        assert_not_found_or_no_access(&response);
    }
}

#[tokio::test]
async fn test_malformed_grant_body_uses_error_envelope() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;

    let response = app
        .server
        .post("/api/permissions")
        .add_header(AUTHORIZATION, alice.bearer())
        .json(&json!({ "file_id": "not-a-uuid", "role": "viewer" }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_list_and_revoke_grants() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;
    let carol = register_and_login(&app.server, "carol@example.com").await;
    let file_id = upload(&app.server, &alice, "a.txt", b"x", None).await;

    let bob_grant = id_of(
        &grant(&app.server, &alice, &bob, json!({ "file_id": file_id }), "viewer")
            .await
            .json(),
    );

    // Viewers can see who else has access
    let response = app
        .server
        .get("/api/permissions")
        .add_query_param("file_id", file_id)
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Strangers cannot
    let response = app
        .server
        .get("/api/permissions")
        .add_query_param("file_id", file_id)
        .add_header(AUTHORIZATION, carol.bearer())
        .await;
    assert_not_found_or_no_access(&response);

    // Viewers cannot revoke
    let response = app
        .server
        .delete(&format!("/api/permissions/{}", bob_grant))
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    assert_not_found_or_no_access(&response);

    app.server
        .delete(&format!("/api/permissions/{}", bob_grant))
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .assert_status_ok();

    let response = app
        .server
        .get(&format!("/api/files/{}/url", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    assert_not_found_or_no_access(&response);

    let response = app
        .server
        .delete(&format!("/api/permissions/{}", bob_grant))
        .add_header(AUTHORIZATION, alice.bearer())
        .await;
    assert_not_found_or_no_access(&response);
}

#[tokio::test]
async fn test_move_checks_destination_role() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;

    let shared = create_folder(&app.server, &alice, "Shared", None).await;
    grant(&app.server, &alice, &bob, json!({ "folder_id": shared }), "viewer")
        .await
        .assert_status(StatusCode::CREATED);

    // Read on the destination is enough for a file
    let file_id = upload(&app.server, &bob, "b.txt", b"x", None).await;
    app.server
        .patch(&format!("/api/move/files/{}", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .json(&json!({ "new_folder_id": shared }))
        .await
        .assert_status_ok();

    // A folder needs write on its new parent
    let bob_folder = create_folder(&app.server, &bob, "Mine", None).await;
    let response = app
        .server
        .patch(&format!("/api/move/folders/{}", bob_folder))
        .add_header(AUTHORIZATION, bob.bearer())
        .json(&json!({ "new_parent_id": shared }))
        .await;
    assert_not_found_or_no_access(&response);
}

#[tokio::test]
async fn test_viewer_cannot_move_shared_file_into_own_folder() {
    let app = create_test_app().await;
    let alice = register_and_login(&app.server, "alice@example.com").await;
    let bob = register_and_login(&app.server, "bob@example.com").await;
    let file_id = upload(&app.server, &alice, "a.txt", b"x", None).await;
    let bob_folder = create_folder(&app.server, &bob, "Mine", None).await;

    grant(&app.server, &alice, &bob, json!({ "file_id": file_id }), "viewer")
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .patch(&format!("/api/move/files/{}", file_id))
        .add_header(AUTHORIZATION, bob.bearer())
        .json(&json!({ "new_folder_id": bob_folder }))
        .await;
    assert_not_found_or_no_access(&response);

    let body: Value = app
        .server
        .get("/api/files")
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], json!(file_id));
    assert!(files[0]["folder_id"].is_null());
}
