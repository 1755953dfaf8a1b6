//! Unit tests for sending chat messages.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use a0_cli::application::ports::NullObserver;
use a0_cli::application::services::chat::send_message;
use a0_cli::application::services::reconcile::ChatSession;
use a0_cli::domain::context::is_short_id;
use serde_json::json;

use super::mocks::{MemFiles, MockBackend};

#[tokio::test]
async fn test_send_posts_json_to_active_context() {
    let backend = MockBackend::new().reply("/message_async", json!({"context": "abc"}));
    let session = ChatSession::new(&backend, &NullObserver, "UTC");
    session.set_context("abc");

    let receipt = send_message(&session, &MemFiles::new(), "hello", &[]).await.unwrap();

    let sent = backend.requests_to("/message_async");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body["text"], "hello");
    assert_eq!(sent[0].body["context"], "abc");
    assert_eq!(sent[0].body["message_id"], receipt.message_id.as_str());
    assert!(sent[0].form.is_none());
    assert_eq!(receipt.context, "abc");
    assert_eq!(receipt.attachments, 0);
}

#[tokio::test]
async fn test_send_renders_user_message_locally() {
    let backend = MockBackend::new().reply("/message_async", json!({"context": "abc"}));
    let session = ChatSession::new(&backend, &NullObserver, "UTC");
    session.set_context("abc");

    let receipt = send_message(&session, &MemFiles::new(), "hello", &[]).await.unwrap();

    let view = session.view();
    let entry = view.messages.get(&receipt.message_id).unwrap();
    assert_eq!(entry.kind, "user");
    assert_eq!(entry.content, "hello");
}

#[tokio::test]
async fn test_send_without_context_creates_one() {
    let backend = MockBackend::new().reply("/message_async", json!({"context": "srv1"}));
    let session = ChatSession::new(&backend, &NullObserver, "UTC");

    let receipt = send_message(&session, &MemFiles::new(), "hi", &[]).await.unwrap();

    let sent = backend.requests_to("/message_async");
    let generated = sent[0].body["context"].as_str().unwrap();
    assert!(is_short_id(generated), "got {generated}");
    assert_eq!(receipt.context, "srv1");
    assert_eq!(session.context().as_deref(), Some("srv1"));
}

#[tokio::test]
async fn test_send_with_attachments_uses_multipart() {
    let backend = MockBackend::new().reply("/message_async", json!({"context": "abc"}));
    let files = MemFiles::new()
        .with("/tmp/report.pdf", b"%PDF-1.7")
        .with("/tmp/notes.txt", b"notes");
    let session = ChatSession::new(&backend, &NullObserver, "UTC");
    session.set_context("abc");
    let attachments = vec![
        PathBuf::from("/tmp/report.pdf"),
        PathBuf::from("/tmp/notes.txt"),
    ];

    let receipt = send_message(&session, &files, "see attached", &attachments)
        .await
        .unwrap();

    let sent = backend.requests_to("/message_async");
    let form = sent[0].form.as_ref().unwrap();
    assert!(form.fields.contains(&("text".to_string(), "see attached".to_string())));
    assert!(form.fields.contains(&("context".to_string(), "abc".to_string())));
    let names: Vec<&str> = form.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, ["report.pdf", "notes.txt"]);
    assert!(form.files.iter().all(|f| f.field == "attachments"));
    assert_eq!(form.files[0].bytes, b"%PDF-1.7");
    assert_eq!(receipt.attachments, 2);
}

#[tokio::test]
async fn test_send_missing_attachment_fails_before_request() {
    let backend = MockBackend::new().reply("/message_async", json!({"context": "abc"}));
    let session = ChatSession::new(&backend, &NullObserver, "UTC");
    session.set_context("abc");

    let err = send_message(&session, &MemFiles::new(), "x", &[PathBuf::from("/nope.bin")])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("/nope.bin"), "got: {err}");
    assert!(backend.requests_to("/message_async").is_empty());
}

#[tokio::test]
async fn test_send_reply_without_context_is_malformed() {
    let backend = MockBackend::new().reply("/message_async", json!({"message": "ok"}));
    let session = ChatSession::new(&backend, &NullObserver, "UTC");
    session.set_context("abc");

    let err = send_message(&session, &MemFiles::new(), "x", &[]).await.unwrap_err();

    assert!(err.to_string().contains("/message_async"), "got: {err}");
    assert_eq!(session.context().as_deref(), Some("abc"));
}
