//! Drives a real listening server over HTTP with `NotesClient`.
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use uuid::Uuid;

use likhlo_api::AppStateInner;
use likhlo_client::{ClientError, NotesClient};
use likhlo_db::Database;
use likhlo_types::api::UpdateNoteRequest;

async fn spawn_server() -> String {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "client-test-secret".into(),
        token_ttl: chrono::Duration::hours(1),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, likhlo_api::router(state)).await.unwrap();
    });

    format!("http://{}", addr)
}

fn client(base: &str) -> NotesClient {
    NotesClient::new(base, Duration::from_secs(10)).unwrap()
}

#[tokio::test]
async fn example_scenario_over_http() {
    let base = spawn_server().await;

    let mut al = client(&base);
    al.sign_up("al", "al@x.com", "p1").await.unwrap();
    let mut bo = client(&base);
    bo.sign_up("bo", "bo@x.com", "p2").await.unwrap();
    assert_eq!(al.user_count().await.unwrap(), 2);

    let note = al.create_note("shopping", "milk, eggs").await.unwrap();
    let fetched = al.get_note(note.id).await.unwrap();
    assert_eq!(fetched.title, "shopping");
    assert_eq!(fetched.content, "milk, eggs");

    let err = bo.get_note(note.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    al.delete_note(note.id).await.unwrap();
    let err = al.get_note(note.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn update_search_and_list() {
    let base = spawn_server().await;
    let mut c = client(&base);
    c.sign_up("al", "al@x.com", "p1").await.unwrap();

    let note = c.create_note("draft", "first version").await.unwrap();
    let updated = c
        .update_note(
            note.id,
            &UpdateNoteRequest {
                title: Some("Final".into()),
                content: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, note.id);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.content, "first version");

    let hit = c.search("FINAL").await.unwrap().unwrap();
    assert_eq!(hit.id, note.id);
    assert!(c.search("missing").await.unwrap().is_none());

    let err = c.search("   ").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let notes = c.list_notes().await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].user_id, updated.user_id);
}

#[tokio::test]
async fn errors_carry_server_messages() {
    let base = spawn_server().await;
    let mut c = client(&base);
    c.sign_up("al", "al@x.com", "p1").await.unwrap();

    let mut stranger = client(&base);
    match stranger.sign_in("nobody@x.com", "p1").await {
        Err(ClientError::Api { status, msg }) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(msg, "No such user exists");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    match c.delete_note(Uuid::new_v4()).await {
        Err(ClientError::Api { status, msg }) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(msg, "Note Doesn't exist");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn signed_out_client_does_not_call_protected_routes() {
    let base = spawn_server().await;
    let mut c = client(&base);
    c.sign_up("al", "al@x.com", "p1").await.unwrap();
    let token = c.token().unwrap().to_string();

    c.sign_out();
    assert!(matches!(c.list_notes().await, Err(ClientError::NotSignedIn)));

    let restored = client(&base).with_token(token);
    assert!(restored.list_notes().await.unwrap().is_empty());

    let forged = client(&base).with_token("forged");
    let err = forged.list_notes().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
}
